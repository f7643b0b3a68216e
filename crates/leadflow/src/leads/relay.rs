//! Outbound collaborator seams: staff email notification and CRM delivery.
//!
//! Composition and transport (SMTP, HTTP) live behind these traits; the core
//! only decides *what* gets sent and to whom. Payload builders here produce
//! the exact shapes the third-party endpoints consume.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::domain::{ContactRecord, CrmConnector, CrmIntegration, LeadRecord};

/// Email templates the notification collaborator knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    NewLeadAlert,
    Welcome,
    StatusChange,
}

impl NotificationTemplate {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationTemplate::NewLeadAlert => "new_lead_alert",
            NotificationTemplate::Welcome => "welcome",
            NotificationTemplate::StatusChange => "status_change",
        }
    }
}

/// Delivery target. `Admin` resolves to the configured staff address inside
/// the publisher implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    Admin,
    Lead(String),
}

/// Notification payload handed to the email collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadNotification {
    pub template: NotificationTemplate,
    pub recipient: Recipient,
    pub subject: String,
    pub details: BTreeMap<String, String>,
}

/// Trait describing the outbound email hook.
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, notification: LeadNotification) -> Result<(), NotifyError>;
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}

fn lead_details(lead: &LeadRecord) -> BTreeMap<String, String> {
    let mut details = BTreeMap::new();
    details.insert("name".to_string(), lead.full_name());
    details.insert("email".to_string(), lead.email.clone());
    details.insert("phone".to_string(), lead.phone.clone());
    details.insert("investment".to_string(), lead.investment.clone());
    details.insert("source".to_string(), lead.source.clone());
    details.insert(
        "quality_score".to_string(),
        lead.quality_score.to_string(),
    );
    if !lead.notes.is_empty() {
        details.insert("notes".to_string(), lead.notes.clone());
    }
    details
}

/// Staff alert for a freshly captured lead.
pub fn new_lead_alert(lead: &LeadRecord) -> LeadNotification {
    LeadNotification {
        template: NotificationTemplate::NewLeadAlert,
        recipient: Recipient::Admin,
        subject: format!("New Lead: {}", lead.full_name()),
        details: lead_details(lead),
    }
}

/// Welcome message sent to the lead's own address.
pub fn welcome_message(lead: &LeadRecord) -> LeadNotification {
    let mut details = BTreeMap::new();
    details.insert("first_name".to_string(), lead.first_name.clone());
    LeadNotification {
        template: NotificationTemplate::Welcome,
        recipient: Recipient::Lead(lead.email.clone()),
        subject: "Welcome! Your consultation is being scheduled".to_string(),
        details,
    }
}

/// Staff alert raised when an admin moves a lead between pipeline statuses.
pub fn status_change_alert(lead: &LeadRecord, old_status: &str, new_status: &str) -> LeadNotification {
    let mut details = lead_details(lead);
    details.insert("old_status".to_string(), old_status.to_string());
    details.insert("new_status".to_string(), new_status.to_string());
    LeadNotification {
        template: NotificationTemplate::StatusChange,
        recipient: Recipient::Admin,
        subject: format!(
            "Lead status change: {} ({old_status} -> {new_status})",
            lead.full_name()
        ),
        details,
    }
}

/// One outbound CRM delivery: where to post and what to post.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrmDispatch {
    pub connector: CrmConnector,
    pub endpoint: String,
    pub payload: Value,
}

/// Trait describing the outbound CRM transport (HTTP in production,
/// recording doubles in tests).
pub trait CrmPublisher: Send + Sync {
    fn publish(&self, dispatch: CrmDispatch) -> Result<(), RelayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("crm transport unavailable: {0}")]
    Transport(String),
    #[error("integration is missing its webhook url")]
    MissingWebhookUrl,
}

/// Builds the delivery for one lead against one registered integration.
/// Returns `None` when the integration lacks what its connector needs
/// (e.g. a webhook integration without a URL), so intake can skip it.
pub fn dispatch_for(lead: &LeadRecord, integration: &CrmIntegration) -> Option<CrmDispatch> {
    match integration.connector {
        CrmConnector::Hubspot => Some(CrmDispatch {
            connector: CrmConnector::Hubspot,
            endpoint: "https://api.hubapi.com/contacts/v1/contact".to_string(),
            payload: json!({
                "properties": [
                    { "property": "firstname", "value": lead.first_name },
                    { "property": "lastname", "value": lead.last_name },
                    { "property": "email", "value": lead.email },
                    { "property": "phone", "value": lead.phone },
                    { "property": "investment_amount", "value": lead.investment },
                    { "property": "lead_source", "value": lead.source },
                ],
            }),
        }),
        CrmConnector::Pipedrive => {
            let api_token = integration.api_key.as_deref().unwrap_or_default();
            Some(CrmDispatch {
                connector: CrmConnector::Pipedrive,
                endpoint: format!("https://api.pipedrive.com/v1/persons?api_token={api_token}"),
                payload: json!({
                    "name": lead.full_name(),
                    "email": [lead.email],
                    "phone": [lead.phone],
                    "custom_fields": {
                        "investment_amount": lead.investment,
                        "lead_source": lead.source,
                    },
                }),
            })
        }
        CrmConnector::Webhook => {
            let url = integration.webhook_url.clone()?;
            Some(CrmDispatch {
                connector: CrmConnector::Webhook,
                endpoint: url,
                payload: serde_json::to_value(lead).unwrap_or(Value::Null),
            })
        }
    }
}

/// Contact submissions only relay to plain webhook integrations.
pub fn contact_dispatch(
    contact: &ContactRecord,
    integration: &CrmIntegration,
) -> Option<CrmDispatch> {
    let url = integration.webhook_url.clone()?;
    Some(CrmDispatch {
        connector: CrmConnector::Webhook,
        endpoint: url,
        payload: serde_json::to_value(contact).unwrap_or(Value::Null),
    })
}

/// Bulk admin export pushed to an ad-hoc webhook URL.
pub fn bulk_export_dispatch(
    leads: &[LeadRecord],
    url: &str,
    timestamp: DateTime<Utc>,
) -> CrmDispatch {
    CrmDispatch {
        connector: CrmConnector::Webhook,
        endpoint: url.to_string(),
        payload: json!({
            "event": "leads_export",
            "timestamp": timestamp.to_rfc3339(),
            "count": leads.len(),
            "leads": leads,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::domain::{DeviceType, LeadId, LeadStatus};
    use chrono::TimeZone;

    fn lead() -> LeadRecord {
        let created = Utc
            .with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
            .single()
            .expect("valid timestamp");
        LeadRecord {
            id: LeadId(7),
            first_name: "Iris".to_string(),
            last_name: "Meyer".to_string(),
            email: "iris@example.com".to_string(),
            phone: "+4915112345678".to_string(),
            investment: "1500+".to_string(),
            source: "website".to_string(),
            status: LeadStatus::New,
            notes: "Country: DE".to_string(),
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
            utm_term: None,
            utm_content: None,
            referrer: None,
            landing_page: None,
            user_agent: None,
            device_type: Some(DeviceType::Desktop),
            ip_address: None,
            conversion_value: 0.0,
            quality_score: 85,
            last_activity: None,
            created_at: created,
            updated_at: created,
        }
    }

    fn integration(connector: CrmConnector, webhook_url: Option<&str>) -> CrmIntegration {
        CrmIntegration {
            id: 1,
            connector,
            api_key: Some("token-123".to_string()),
            webhook_url: webhook_url.map(str::to_string),
            is_active: true,
        }
    }

    #[test]
    fn new_lead_alert_targets_admin_with_score() {
        let notification = new_lead_alert(&lead());
        assert_eq!(notification.recipient, Recipient::Admin);
        assert_eq!(notification.subject, "New Lead: Iris Meyer");
        assert_eq!(
            notification.details.get("quality_score").map(String::as_str),
            Some("85")
        );
    }

    #[test]
    fn welcome_goes_to_the_lead_address() {
        let notification = welcome_message(&lead());
        assert_eq!(
            notification.recipient,
            Recipient::Lead("iris@example.com".to_string())
        );
        assert_eq!(notification.template, NotificationTemplate::Welcome);
    }

    #[test]
    fn hubspot_dispatch_carries_property_list() {
        let dispatch = dispatch_for(&lead(), &integration(CrmConnector::Hubspot, None))
            .expect("hubspot dispatch builds");
        assert!(dispatch.endpoint.contains("hubapi.com"));
        let properties = dispatch.payload["properties"]
            .as_array()
            .expect("property list");
        assert_eq!(properties.len(), 6);
        assert_eq!(properties[0]["value"], "Iris");
    }

    #[test]
    fn pipedrive_dispatch_threads_the_api_token() {
        let dispatch = dispatch_for(&lead(), &integration(CrmConnector::Pipedrive, None))
            .expect("pipedrive dispatch builds");
        assert!(dispatch.endpoint.ends_with("api_token=token-123"));
        assert_eq!(dispatch.payload["name"], "Iris Meyer");
    }

    #[test]
    fn webhook_dispatch_requires_a_url() {
        assert!(dispatch_for(&lead(), &integration(CrmConnector::Webhook, None)).is_none());
        let dispatch = dispatch_for(
            &lead(),
            &integration(CrmConnector::Webhook, Some("https://crm.example.com/hook")),
        )
        .expect("webhook dispatch builds");
        assert_eq!(dispatch.endpoint, "https://crm.example.com/hook");
        assert_eq!(dispatch.payload["email"], "iris@example.com");
    }

    #[test]
    fn bulk_export_payload_counts_its_leads() {
        let leads = vec![lead()];
        let timestamp = Utc
            .with_ymd_and_hms(2025, 6, 2, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        let dispatch = bulk_export_dispatch(&leads, "https://crm.example.com/bulk", timestamp);
        assert_eq!(dispatch.payload["event"], "leads_export");
        assert_eq!(dispatch.payload["count"], 1);
        assert_eq!(dispatch.payload["leads"][0]["id"], 7);
    }
}
