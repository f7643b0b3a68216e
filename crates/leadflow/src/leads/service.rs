use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::analytics::{self, views::DashboardReport, views::FunnelReport, views::QualityReport};
use super::domain::{
    ContactRecord, ContactSubmission, CrmIntegration, LeadId, LeadRecord, LeadStatus,
    LeadSubmission, LeadUpdate,
};
use super::export::{self, ExportError};
use super::relay::{
    bulk_export_dispatch, contact_dispatch, dispatch_for, new_lead_alert, status_change_alert,
    welcome_message, CrmPublisher, NotificationPublisher, RelayError,
};
use super::repository::{LeadFilter, LeadRepository, RepositoryError};
use super::scoring;

/// Service composing the storage, notification, and CRM seams around the
/// scoring and analytics cores.
pub struct LeadService<R, N, C> {
    repository: Arc<R>,
    notifications: Arc<N>,
    crm: Arc<C>,
}

static LEAD_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static CONTACT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static INTEGRATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_lead_id() -> LeadId {
    LeadId(LEAD_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// Whether a submission created a new record or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadOutcome {
    Created,
    Updated,
}

/// One page of an admin lead listing.
#[derive(Debug, Clone, Serialize)]
pub struct LeadPage {
    pub leads: Vec<LeadRecord>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<R, N, C> LeadService<R, N, C>
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    pub fn new(repository: Arc<R>, notifications: Arc<N>, crm: Arc<C>) -> Self {
        Self {
            repository,
            notifications,
            crm,
        }
    }

    /// Capture a form submission. Submissions are keyed by email: a repeat
    /// submission updates the mutable fields of the stored record but keeps
    /// `quality_score` and `created_at` untouched; a first submission is
    /// scored once and persisted.
    ///
    /// Email and CRM relay failures are logged and swallowed so a flaky
    /// collaborator never loses a captured lead.
    pub fn submit(
        &self,
        submission: LeadSubmission,
        client_ip: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(LeadRecord, LeadOutcome), LeadServiceError> {
        let email = non_empty(submission.email.as_deref())
            .ok_or_else(|| LeadServiceError::Validation("email and phone are required".into()))?
            .to_string();
        let phone = non_empty(submission.phone.as_deref())
            .ok_or_else(|| LeadServiceError::Validation("email and phone are required".into()))?
            .to_string();
        let first_name = submission.first_name.clone().unwrap_or_default();
        let last_name = submission.last_name.clone().unwrap_or_default();
        if first_name.is_empty() && last_name.is_empty() {
            return Err(LeadServiceError::Validation("name is required".into()));
        }

        let notes = submission.composed_notes();
        let investment = submission
            .investment
            .clone()
            .unwrap_or_else(|| "Not specified".to_string());
        let source = submission
            .source
            .clone()
            .unwrap_or_else(|| "website".to_string());

        if let Some(mut existing) = self.repository.fetch_by_email(&email)? {
            existing.first_name = first_name;
            existing.last_name = last_name;
            existing.phone = phone;
            existing.investment = investment;
            existing.source = source;
            existing.notes = notes;
            existing.updated_at = now;
            existing.last_activity = Some(now);
            // quality_score deliberately untouched: scored once at creation.
            self.repository.update(existing.clone())?;
            self.relay_to_crm(&existing);
            return Ok((existing, LeadOutcome::Updated));
        }

        let quality_score = scoring::quality_score(&submission);
        let record = LeadRecord {
            id: next_lead_id(),
            first_name,
            last_name,
            email,
            phone,
            investment,
            source,
            status: LeadStatus::New,
            notes,
            utm_source: submission.utm_source.clone(),
            utm_medium: submission.utm_medium.clone(),
            utm_campaign: submission.utm_campaign.clone(),
            utm_term: submission.utm_term.clone(),
            utm_content: submission.utm_content.clone(),
            referrer: submission.referrer.clone(),
            landing_page: submission.landing_page.clone(),
            user_agent: submission.user_agent.clone(),
            device_type: submission.device_type.as_deref().map(super::domain::DeviceType::parse),
            ip_address: client_ip,
            conversion_value: submission.conversion_value.unwrap_or(0.0),
            quality_score,
            last_activity: Some(now),
            created_at: now,
            updated_at: now,
        };

        let stored = self.repository.insert(record)?;

        if let Err(err) = self.notifications.publish(new_lead_alert(&stored)) {
            warn!(lead_id = stored.id.0, error = %err, "new lead alert failed");
        }
        if let Err(err) = self.notifications.publish(welcome_message(&stored)) {
            warn!(lead_id = stored.id.0, error = %err, "welcome email failed");
        }
        self.relay_to_crm(&stored);

        Ok((stored, LeadOutcome::Created))
    }

    fn relay_to_crm(&self, lead: &LeadRecord) {
        let integrations = match self.repository.active_integrations() {
            Ok(integrations) => integrations,
            Err(err) => {
                warn!(error = %err, "unable to load CRM integrations");
                return;
            }
        };

        for integration in integrations {
            let Some(dispatch) = dispatch_for(lead, &integration) else {
                continue;
            };
            if let Err(err) = self.crm.publish(dispatch) {
                warn!(
                    lead_id = lead.id.0,
                    connector = integration.connector.label(),
                    error = %err,
                    "crm relay failed"
                );
            }
        }
    }

    /// Admin update. A status transition triggers a staff notification;
    /// failures there are logged and do not fail the write.
    pub fn update(
        &self,
        id: LeadId,
        update: LeadUpdate,
        now: DateTime<Utc>,
    ) -> Result<LeadRecord, LeadServiceError> {
        let mut record = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        let old_status = record.status;
        if let Some(first_name) = update.first_name {
            record.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            record.last_name = last_name;
        }
        if let Some(email) = update.email {
            record.email = email;
        }
        if let Some(phone) = update.phone {
            record.phone = phone;
        }
        if let Some(investment) = update.investment {
            record.investment = investment;
        }
        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(notes) = update.notes {
            record.notes = notes;
        }
        record.updated_at = now;
        record.last_activity = Some(now);

        self.repository.update(record.clone())?;

        if record.status != old_status {
            let alert =
                status_change_alert(&record, old_status.label(), record.status.label());
            if let Err(err) = self.notifications.publish(alert) {
                warn!(lead_id = record.id.0, error = %err, "status change alert failed");
            }
        }

        Ok(record)
    }

    pub fn get(&self, id: LeadId) -> Result<LeadRecord, LeadServiceError> {
        Ok(self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    pub fn delete(&self, id: LeadId) -> Result<(), LeadServiceError> {
        self.repository.delete(id)?;
        Ok(())
    }

    /// Paginated admin listing, newest first.
    pub fn list(
        &self,
        filter: &LeadFilter,
        page: usize,
        per_page: usize,
    ) -> Result<LeadPage, LeadServiceError> {
        let matching = self.repository.list(filter)?;
        let total = matching.len();
        let per_page = per_page.max(1);
        let page = page.max(1);
        let total_pages = total.div_ceil(per_page);
        let leads = matching
            .into_iter()
            .skip((page - 1) * per_page)
            .take(per_page)
            .collect();

        Ok(LeadPage {
            leads,
            total,
            page,
            per_page,
            total_pages,
        })
    }

    /// Education-page contact capture, upserted by email and relayed to
    /// webhook integrations only.
    pub fn submit_contact(
        &self,
        submission: ContactSubmission,
        now: DateTime<Utc>,
    ) -> Result<(ContactRecord, LeadOutcome), LeadServiceError> {
        let full_name = non_empty(submission.full_name.as_deref())
            .ok_or_else(|| missing_field("fullName"))?
            .to_string();
        let email = non_empty(submission.email.as_deref())
            .ok_or_else(|| missing_field("email"))?
            .to_string();
        let phone = non_empty(submission.phone.as_deref())
            .ok_or_else(|| missing_field("phone"))?
            .to_string();
        let country = non_empty(submission.country.as_deref())
            .ok_or_else(|| missing_field("country"))?
            .to_string();

        let (record, outcome) = match self.repository.find_contact(&email)? {
            Some(mut existing) => {
                existing.full_name = full_name;
                existing.phone = phone;
                existing.country = country;
                existing.experience = submission.experience.unwrap_or_default();
                existing.message = submission.message.unwrap_or_default();
                existing.updated_at = now;
                (
                    self.repository.upsert_contact(existing)?,
                    LeadOutcome::Updated,
                )
            }
            None => {
                let record = ContactRecord {
                    id: CONTACT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
                    full_name,
                    email,
                    phone,
                    country,
                    experience: submission.experience.unwrap_or_default(),
                    message: submission.message.unwrap_or_default(),
                    source: "education-page".to_string(),
                    status: LeadStatus::New,
                    created_at: now,
                    updated_at: now,
                };
                (
                    self.repository.upsert_contact(record)?,
                    LeadOutcome::Created,
                )
            }
        };

        match self.repository.active_integrations() {
            Ok(integrations) => {
                for integration in integrations {
                    let Some(dispatch) = contact_dispatch(&record, &integration) else {
                        continue;
                    };
                    if let Err(err) = self.crm.publish(dispatch) {
                        warn!(contact_id = record.id, error = %err, "contact relay failed");
                    }
                }
            }
            Err(err) => warn!(error = %err, "unable to load CRM integrations"),
        }

        Ok((record, outcome))
    }

    pub fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardReport, LeadServiceError> {
        let snapshot = self.repository.snapshot()?;
        Ok(analytics::dashboard_overview(&snapshot, now))
    }

    pub fn funnel(&self) -> Result<FunnelReport, LeadServiceError> {
        let snapshot = self.repository.snapshot()?;
        Ok(analytics::conversion_funnel(&snapshot))
    }

    pub fn quality(&self) -> Result<QualityReport, LeadServiceError> {
        let snapshot = self.repository.snapshot()?;
        Ok(analytics::quality_distribution(&snapshot))
    }

    /// Render all leads (newest first) as the admin CSV export.
    pub fn export_csv(&self) -> Result<String, LeadServiceError> {
        let leads = self.repository.list(&LeadFilter::default())?;
        Ok(export::render_csv(&leads)?)
    }

    /// Push the selected leads (all when `lead_ids` is empty) to an ad-hoc
    /// webhook URL as one bulk payload. Unlike capture-time relay, this is
    /// an explicit admin action, so transport failures surface as errors.
    pub fn send_webhook(
        &self,
        url: &str,
        lead_ids: &[u64],
        now: DateTime<Utc>,
    ) -> Result<usize, LeadServiceError> {
        let all = self.repository.list(&LeadFilter::default())?;
        let selected: Vec<LeadRecord> = if lead_ids.is_empty() {
            all
        } else {
            all.into_iter()
                .filter(|lead| lead_ids.contains(&lead.id.0))
                .collect()
        };

        if selected.is_empty() {
            return Err(LeadServiceError::EmptySelection);
        }

        let count = selected.len();
        self.crm
            .publish(bulk_export_dispatch(&selected, url, now))?;
        Ok(count)
    }

    pub fn add_integration(
        &self,
        connector: super::domain::CrmConnector,
        api_key: Option<String>,
        webhook_url: Option<String>,
        is_active: bool,
    ) -> Result<CrmIntegration, LeadServiceError> {
        let integration = CrmIntegration {
            id: INTEGRATION_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            connector,
            api_key,
            webhook_url,
            is_active,
        };
        Ok(self.repository.add_integration(integration)?)
    }

    pub fn integrations(&self) -> Result<Vec<CrmIntegration>, LeadServiceError> {
        Ok(self.repository.integrations()?)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

fn missing_field(field: &str) -> LeadServiceError {
    LeadServiceError::Validation(format!("missing required field: {field}"))
}

/// Error raised by the lead service.
#[derive(Debug, thiserror::Error)]
pub enum LeadServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("no leads matched the request")]
    EmptySelection,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error(transparent)]
    Export(#[from] ExportError),
}
