use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use leadflow::leads::{
    ContactRecord, CrmDispatch, CrmIntegration, CrmPublisher, LeadFilter, LeadId,
    LeadNotification, LeadRecord, LeadRepository, NotificationPublisher, NotifyError, RelayError,
    RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryLeadRepository {
    leads: Arc<Mutex<HashMap<LeadId, LeadRecord>>>,
    contacts: Arc<Mutex<HashMap<String, ContactRecord>>>,
    integrations: Arc<Mutex<Vec<CrmIntegration>>>,
}

impl LeadRepository for InMemoryLeadRepository {
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

/// Records outbound staff and lead emails. SMTP delivery plugs in behind the
/// same trait with `SmtpConfig` once a mail relay is provisioned.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNotificationPublisher {
    events: Arc<Mutex<Vec<LeadNotification>>>,
}

impl NotificationPublisher for InMemoryNotificationPublisher {
    fn publish(&self, notification: LeadNotification) -> Result<(), NotifyError> {
        tracing::info!(subject = %notification.subject, "email queued");
        let mut guard = self.events.lock().expect("notification mutex poisoned");
        guard.push(notification);
        Ok(())
    }
}

impl InMemoryNotificationPublisher {
    #[cfg(test)]
    pub(crate) fn events(&self) -> Vec<LeadNotification> {
        self.events.lock().expect("notification mutex poisoned").clone()
    }
}

/// Records outbound CRM payloads instead of delivering them over HTTP.
#[derive(Default, Clone)]
pub(crate) struct InMemoryCrmPublisher {
    dispatches: Arc<Mutex<Vec<CrmDispatch>>>,
}

impl CrmPublisher for InMemoryCrmPublisher {
    fn publish(&self, dispatch: CrmDispatch) -> Result<(), RelayError> {
        tracing::info!(endpoint = %dispatch.endpoint, "crm dispatch queued");
        let mut guard = self.dispatches.lock().expect("dispatch mutex poisoned");
        guard.push(dispatch);
        Ok(())
    }
}

impl InMemoryCrmPublisher {
    #[cfg(test)]
    pub(crate) fn dispatches(&self) -> Vec<CrmDispatch> {
        self.dispatches.lock().expect("dispatch mutex poisoned").clone()
    }
}
