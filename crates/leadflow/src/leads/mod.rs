//! Lead capture, scoring, analytics, and relay.
//!
//! `scoring` and `analytics` hold the pure decision logic; `repository` and
//! `relay` are the seams to the storage, email, and CRM collaborators; and
//! `service` plus `router` compose them into the operations the HTTP layer
//! exposes.

pub mod analytics;
pub mod domain;
pub mod export;
pub mod relay;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use analytics::views::{DashboardReport, FunnelReport, QualityReport};
pub use domain::{
    ContactRecord, ContactSubmission, CrmConnector, CrmIntegration, DeviceType, LeadId,
    LeadRecord, LeadStatus, LeadSubmission, LeadUpdate,
};
pub use relay::{
    CrmDispatch, CrmPublisher, LeadNotification, NotificationPublisher, NotificationTemplate,
    NotifyError, Recipient, RelayError,
};
pub use repository::{LeadFilter, LeadRepository, RepositoryError};
pub use router::lead_router;
pub use service::{LeadOutcome, LeadPage, LeadService, LeadServiceError};
