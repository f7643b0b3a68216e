use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::{ContactSubmission, CrmConnector, LeadId, LeadStatus, LeadSubmission};
use super::relay::CrmPublisher;
use super::repository::{LeadFilter, LeadRepository, RepositoryError};
use super::service::{LeadOutcome, LeadService, LeadServiceError};
use super::NotificationPublisher;

/// Router builder exposing the capture, admin, analytics, and relay
/// endpoints over a shared [`LeadService`].
pub fn lead_router<R, N, C>(service: Arc<LeadService<R, N, C>>) -> Router
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    Router::new()
        .route(
            "/api/leads",
            post(create_lead_handler::<R, N, C>).get(list_leads_handler::<R, N, C>),
        )
        .route(
            "/api/leads/:lead_id",
            put(update_lead_handler::<R, N, C>).delete(delete_lead_handler::<R, N, C>),
        )
        .route(
            "/api/leads/send-webhook",
            post(send_webhook_handler::<R, N, C>),
        )
        .route("/api/contact", post(contact_handler::<R, N, C>))
        .route(
            "/api/integrations",
            get(list_integrations_handler::<R, N, C>).post(create_integration_handler::<R, N, C>),
        )
        .route(
            "/api/analytics/dashboard",
            get(dashboard_handler::<R, N, C>),
        )
        .route("/api/analytics/funnel", get(funnel_handler::<R, N, C>))
        .route("/api/analytics/quality", get(quality_handler::<R, N, C>))
        .route("/api/export/csv", get(export_csv_handler::<R, N, C>))
        .with_state(service)
}

fn error_response(error: LeadServiceError) -> Response {
    let status = match &error {
        LeadServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        LeadServiceError::EmptySelection => StatusCode::NOT_FOUND,
        LeadServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        LeadServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

/// First hop of `X-Forwarded-For` when present, falling back to nothing;
/// socket addresses are not threaded through here.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers.get("x-forwarded-for")?.to_str().ok()?;
    forwarded
        .split(',')
        .next()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) async fn create_lead_handler<R, N, C>(
    State(service): State<Arc<LeadService<R, N, C>>>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<LeadSubmission>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    match service.submit(submission, client_ip(&headers), Utc::now()) {
        Ok((lead, LeadOutcome::Created)) => {
            let payload = json!({ "message": "Lead created successfully", "lead": lead });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Ok((lead, LeadOutcome::Updated)) => {
            let payload = json!({ "message": "Lead updated successfully", "lead": lead });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LeadListQuery {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    page: Option<usize>,
    #[serde(default)]
    per_page: Option<usize>,
}

pub(crate) async fn list_leads_handler<R, N, C>(
    State(service): State<Arc<LeadService<R, N, C>>>,
    Query(query): Query<LeadListQuery>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => match LeadStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                let payload = json!({ "error": format!("unknown status '{raw}'") });
                return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
            }
        },
    };

    let filter = LeadFilter {
        status,
        search: query.search,
    };
    match service.list(
        &filter,
        query.page.unwrap_or(1),
        query.per_page.unwrap_or(50),
    ) {
        Ok(page) => {
            let payload = json!({
                "leads": page.leads,
                "total": page.total,
                "page": page.page,
                "per_page": page.per_page,
                "total_pages": page.total_pages,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_lead_handler<R, N, C>(
    State(service): State<Arc<LeadService<R, N, C>>>,
    Path(lead_id): Path<u64>,
    axum::Json(update): axum::Json<super::domain::LeadUpdate>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    match service.update(LeadId(lead_id), update, Utc::now()) {
        Ok(lead) => {
            let payload = json!({ "message": "Lead updated successfully", "lead": lead });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_lead_handler<R, N, C>(
    State(service): State<Arc<LeadService<R, N, C>>>,
    Path(lead_id): Path<u64>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    match service.delete(LeadId(lead_id)) {
        Ok(()) => {
            let payload = json!({ "message": "Lead deleted successfully" });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn contact_handler<R, N, C>(
    State(service): State<Arc<LeadService<R, N, C>>>,
    axum::Json(submission): axum::Json<ContactSubmission>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    match service.submit_contact(submission, Utc::now()) {
        Ok((record, LeadOutcome::Created)) => {
            let payload = json!({
                "message": "Contact submission received successfully",
                "submission": record,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Ok((record, LeadOutcome::Updated)) => {
            let payload = json!({
                "message": "Contact submission updated successfully",
                "submission": record,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendWebhookRequest {
    webhook_url: Option<String>,
    #[serde(default)]
    lead_ids: Vec<u64>,
}

pub(crate) async fn send_webhook_handler<R, N, C>(
    State(service): State<Arc<LeadService<R, N, C>>>,
    axum::Json(request): axum::Json<SendWebhookRequest>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    let Some(url) = request.webhook_url.filter(|url| !url.is_empty()) else {
        let payload = json!({ "error": "Webhook URL is required" });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    match service.send_webhook(&url, &request.lead_ids, Utc::now()) {
        Ok(count) => {
            let payload = json!({
                "message": format!("Successfully sent {count} leads to webhook"),
                "count": count,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct IntegrationRequest {
    name: String,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    webhook_url: Option<String>,
    #[serde(default)]
    is_active: bool,
}

pub(crate) async fn create_integration_handler<R, N, C>(
    State(service): State<Arc<LeadService<R, N, C>>>,
    axum::Json(request): axum::Json<IntegrationRequest>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    let Some(connector) = CrmConnector::parse(&request.name) else {
        let payload = json!({ "error": format!("unknown integration '{}'", request.name) });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    match service.add_integration(
        connector,
        request.api_key,
        request.webhook_url,
        request.is_active,
    ) {
        Ok(integration) => {
            let payload = json!({
                "message": "Integration created successfully",
                "integration": integration,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_integrations_handler<R, N, C>(
    State(service): State<Arc<LeadService<R, N, C>>>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    match service.integrations() {
        Ok(integrations) => {
            let views: Vec<_> = integrations
                .iter()
                .map(|integration| {
                    json!({
                        "id": integration.id,
                        "name": integration.connector.label(),
                        "is_active": integration.is_active,
                    })
                })
                .collect();
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn dashboard_handler<R, N, C>(
    State(service): State<Arc<LeadService<R, N, C>>>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    match service.dashboard(Utc::now()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn funnel_handler<R, N, C>(
    State(service): State<Arc<LeadService<R, N, C>>>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    match service.funnel() {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn quality_handler<R, N, C>(
    State(service): State<Arc<LeadService<R, N, C>>>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    match service.quality() {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn export_csv_handler<R, N, C>(
    State(service): State<Arc<LeadService<R, N, C>>>,
) -> Response
where
    R: LeadRepository + 'static,
    N: NotificationPublisher + 'static,
    C: CrmPublisher + 'static,
{
    match service.export_csv() {
        Ok(body) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"leads_export.csv\"",
                ),
            ],
            body,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}
