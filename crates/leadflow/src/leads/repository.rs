use super::domain::{ContactRecord, CrmIntegration, LeadId, LeadRecord, LeadStatus};

/// Storage abstraction so intake and analytics can be exercised without a
/// real database. Implementations own uniqueness enforcement (one record
/// per email) and durable ordering; the core only reads snapshots and
/// writes whole records.
pub trait LeadRepository: Send + Sync {
    fn insert(&self, record: LeadRecord) -> Result<LeadRecord, RepositoryError>;
    fn update(&self, record: LeadRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: LeadId) -> Result<Option<LeadRecord>, RepositoryError>;
    fn fetch_by_email(&self, email: &str) -> Result<Option<LeadRecord>, RepositoryError>;
    fn delete(&self, id: LeadId) -> Result<(), RepositoryError>;
    /// Newest-first listing narrowed by the filter predicates.
    fn list(&self, filter: &LeadFilter) -> Result<Vec<LeadRecord>, RepositoryError>;
    /// The full record set used as aggregation input.
    fn snapshot(&self) -> Result<Vec<LeadRecord>, RepositoryError>;

    fn upsert_contact(&self, record: ContactRecord) -> Result<ContactRecord, RepositoryError>;
    fn find_contact(&self, email: &str) -> Result<Option<ContactRecord>, RepositoryError>;

    fn add_integration(&self, integration: CrmIntegration)
        -> Result<CrmIntegration, RepositoryError>;
    fn integrations(&self) -> Result<Vec<CrmIntegration>, RepositoryError>;

    fn active_integrations(&self) -> Result<Vec<CrmIntegration>, RepositoryError> {
        Ok(self
            .integrations()?
            .into_iter()
            .filter(|integration| integration.is_active)
            .collect())
    }
}

/// Predicates for admin lead listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    /// Case-insensitive substring match over name, email, and phone.
    pub search: Option<String>,
}

impl LeadFilter {
    pub fn matches(&self, record: &LeadRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let haystacks = [
                record.first_name.as_str(),
                record.last_name.as_str(),
                record.email.as_str(),
                record.phone.as_str(),
            ];
            if !haystacks
                .iter()
                .any(|value| value.to_lowercase().contains(&needle))
            {
                return false;
            }
        }
        true
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
