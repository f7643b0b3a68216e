use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for captured leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeadId(pub u64);

/// Closed status set tracked through the sales pipeline. The funnel stages
/// consume the first four; `Hot` feeds the hot-leads dashboard metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Hot,
    Lost,
}

impl LeadStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Converted => "converted",
            LeadStatus::Hot => "hot",
            LeadStatus::Lost => "lost",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "new" => Some(Self::New),
            "contacted" => Some(Self::Contacted),
            "qualified" => Some(Self::Qualified),
            "converted" => Some(Self::Converted),
            "hot" => Some(Self::Hot),
            "lost" => Some(Self::Lost),
            _ => None,
        }
    }
}

/// Device classification derived from client hints at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
    Unknown,
}

impl DeviceType {
    pub const fn label(self) -> &'static str {
        match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Unknown => "unknown",
        }
    }

    /// Unrecognized hints collapse to `Unknown` rather than failing intake.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "desktop" => Self::Desktop,
            "mobile" => Self::Mobile,
            "tablet" => Self::Tablet,
            _ => Self::Unknown,
        }
    }
}

/// Wire-format lead capture payload. Every field is optional with a neutral
/// default so malformed or partial form posts degrade instead of erroring;
/// required-field policy lives in the intake service, not the schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadSubmission {
    #[serde(default, rename = "firstName", alias = "first_name")]
    pub first_name: Option<String>,
    #[serde(default, rename = "lastName", alias = "last_name")]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub investment: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, rename = "hasDeposit", alias = "has_deposit")]
    pub has_deposit: Option<String>,
    #[serde(default, rename = "callTime", alias = "call_time")]
    pub call_time: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub utm_term: Option<String>,
    #[serde(default)]
    pub utm_content: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub landing_page: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub conversion_value: Option<f64>,
}

impl LeadSubmission {
    /// Collapses the auxiliary intake answers into the stored notes string.
    /// Neutral answers ("unknown" deposit, "anytime" call window) are left
    /// out so the notes only carry information the visitor actually gave.
    pub fn composed_notes(&self) -> String {
        let mut parts = vec![format!(
            "Country: {}",
            self.country.as_deref().unwrap_or("Not specified")
        )];

        if let Some(deposit) = self.has_deposit.as_deref() {
            if deposit != "unknown" {
                parts.push(format!("Has Deposit: {deposit}"));
            }
        }
        if let Some(call_time) = self.call_time.as_deref() {
            if call_time != "anytime" {
                parts.push(format!("Call Time: {call_time}"));
            }
        }
        if let Some(experience) = self.experience.as_deref() {
            if !experience.is_empty() {
                parts.push(format!("Experience: {experience}"));
            }
        }
        if let Some(message) = self.message.as_deref() {
            if !message.is_empty() {
                parts.push(format!("Message: {message}"));
            }
        }

        parts.join(", ")
    }
}

/// Partial admin update. Absent fields keep their stored values; the quality
/// score is deliberately not part of an update (scored once at creation).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub investment: Option<String>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Persisted unit of analysis. `created_at` and `quality_score` are set at
/// creation and never rewritten by intake updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: LeadId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub investment: String,
    pub source: String,
    pub status: LeadStatus,
    pub notes: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub referrer: Option<String>,
    pub landing_page: Option<String>,
    pub user_agent: Option<String>,
    pub device_type: Option<DeviceType>,
    pub ip_address: Option<String>,
    pub conversion_value: f64,
    pub quality_score: u8,
    pub last_activity: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LeadRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Education-page contact form payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactSubmission {
    #[serde(default, rename = "fullName", alias = "full_name")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Stored contact submission, upserted by email like leads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub id: u64,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub experience: String,
    pub message: String,
    pub source: String,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Supported third-party CRM targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrmConnector {
    Hubspot,
    Pipedrive,
    Webhook,
}

impl CrmConnector {
    pub const fn label(self) -> &'static str {
        match self {
            CrmConnector::Hubspot => "hubspot",
            CrmConnector::Pipedrive => "pipedrive",
            CrmConnector::Webhook => "webhook",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hubspot" => Some(Self::Hubspot),
            "pipedrive" => Some(Self::Pipedrive),
            "webhook" => Some(Self::Webhook),
            _ => None,
        }
    }
}

/// Registered CRM relay target. Credentials stay opaque to the core; they
/// are only threaded into dispatch endpoints and headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrmIntegration {
    pub id: u64,
    pub connector: CrmConnector,
    pub api_key: Option<String>,
    pub webhook_url: Option<String>,
    pub is_active: bool,
}
