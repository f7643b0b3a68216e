use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::leads::domain::{
    ContactRecord, CrmIntegration, LeadId, LeadRecord, LeadSubmission,
};
use crate::leads::relay::{
    CrmDispatch, CrmPublisher, LeadNotification, NotificationPublisher, NotifyError, RelayError,
};
use crate::leads::repository::{LeadFilter, LeadRepository, RepositoryError};
use crate::leads::service::LeadService;

#[derive(Default)]
pub(super) struct MemoryRepository {
    leads: Mutex<HashMap<LeadId, LeadRecord>>,
    contacts: Mutex<HashMap<String, ContactRecord>>,
    integrations: Mutex<Vec<CrmIntegration>>,
}

impl LeadRepository for MemoryRepository {
    fn insert(&self, record: LeadRecord) -> Result<LeadRecord, RepositoryError> {
        let mut guard = self.leads.lock().expect("repository mutex poisoned");
        if guard.values().any(|lead| lead.email == record.email) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id, record.clone());
        Ok(record)
    }

    fn update(&self, record: LeadRecord) -> Result<(), RepositoryError> {
        let mut guard = self.leads.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            guard.insert(record.id, record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: LeadId) -> Result<Option<LeadRecord>, RepositoryError> {
        let guard = self.leads.lock().expect("repository mutex poisoned");
        Ok(guard.get(&id).cloned())
    }

    fn fetch_by_email(&self, email: &str) -> Result<Option<LeadRecord>, RepositoryError> {
        let guard = self.leads.lock().expect("repository mutex poisoned");
        Ok(guard.values().find(|lead| lead.email == email).cloned())
    }

    fn delete(&self, id: LeadId) -> Result<(), RepositoryError> {
        let mut guard = self.leads.lock().expect("repository mutex poisoned");
        guard.remove(&id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn list(&self, filter: &LeadFilter) -> Result<Vec<LeadRecord>, RepositoryError> {
        let guard = self.leads.lock().expect("repository mutex poisoned");
        let mut leads: Vec<LeadRecord> = guard
            .values()
            .filter(|lead| filter.matches(lead))
            .cloned()
            .collect();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(leads)
    }

    fn snapshot(&self) -> Result<Vec<LeadRecord>, RepositoryError> {
        let guard = self.leads.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn upsert_contact(&self, record: ContactRecord) -> Result<ContactRecord, RepositoryError> {
        let mut guard = self.contacts.lock().expect("repository mutex poisoned");
        guard.insert(record.email.clone(), record.clone());
        Ok(record)
    }

    fn find_contact(&self, email: &str) -> Result<Option<ContactRecord>, RepositoryError> {
        let guard = self.contacts.lock().expect("repository mutex poisoned");
        Ok(guard.get(email).cloned())
    }

    fn add_integration(
        &self,
        integration: CrmIntegration,
    ) -> Result<CrmIntegration, RepositoryError> {
        let mut guard = self.integrations.lock().expect("repository mutex poisoned");
        guard.push(integration.clone());
        Ok(integration)
    }

    fn integrations(&self) -> Result<Vec<CrmIntegration>, RepositoryError> {
        let guard = self.integrations.lock().expect("repository mutex poisoned");
        Ok(guard.clone())
    }
}

/// Repository double whose every operation fails, for surface-level error
/// mapping tests.
pub(super) struct UnavailableRepository;

impl LeadRepository for UnavailableRepository {
    fn insert(&self, _record: LeadRecord) -> Result<LeadRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn update(&self, _record: LeadRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn fetch(&self, _id: LeadId) -> Result<Option<LeadRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn fetch_by_email(&self, _email: &str) -> Result<Option<LeadRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn delete(&self, _id: LeadId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn list(&self, _filter: &LeadFilter) -> Result<Vec<LeadRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn snapshot(&self) -> Result<Vec<LeadRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn upsert_contact(&self, _record: ContactRecord) -> Result<ContactRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn find_contact(&self, _email: &str) -> Result<Option<ContactRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn add_integration(
        &self,
        _integration: CrmIntegration,
    ) -> Result<CrmIntegration, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }

    fn integrations(&self) -> Result<Vec<CrmIntegration>, RepositoryError> {
        Err(RepositoryError::Unavailable("storage offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifications {
    events: Mutex<Vec<LeadNotification>>,
}

impl NotificationPublisher for MemoryNotifications {
    fn publish(&self, notification: LeadNotification) -> Result<(), NotifyError> {
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        guard.push(notification);
        Ok(())
    }
}

impl MemoryNotifications {
    pub(super) fn events(&self) -> Vec<LeadNotification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

#[derive(Default)]
pub(super) struct MemoryCrm {
    dispatches: Mutex<Vec<CrmDispatch>>,
}

impl CrmPublisher for MemoryCrm {
    fn publish(&self, dispatch: CrmDispatch) -> Result<(), RelayError> {
        let mut guard = self.dispatches.lock().expect("dispatch mutex poisoned");
        guard.push(dispatch);
        Ok(())
    }
}

pub(super) type MemoryService = LeadService<MemoryRepository, MemoryNotifications, MemoryCrm>;

pub(super) fn build_service() -> (
    Arc<MemoryService>,
    Arc<MemoryRepository>,
    Arc<MemoryNotifications>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let notifications = Arc::new(MemoryNotifications::default());
    let crm = Arc::new(MemoryCrm::default());
    let service = Arc::new(LeadService::new(
        repository.clone(),
        notifications.clone(),
        crm,
    ));
    (service, repository, notifications)
}

pub(super) fn submission() -> LeadSubmission {
    LeadSubmission {
        first_name: Some("Dana".to_string()),
        last_name: Some("Whitfield".to_string()),
        email: Some("dana@example.com".to_string()),
        phone: Some("+447700900123".to_string()),
        investment: Some("1000-1499".to_string()),
        utm_medium: Some("cpc".to_string()),
        referrer: Some("https://google.com".to_string()),
        ..LeadSubmission::default()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("json body")
}
