use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{BuyBoxId, DealId, SwipeAction, TenantId, UserId};
use super::repository::{AlertPublisher, MatchingStore};
use super::service::{
    BuyBoxMatchOptions, MatchesQuery, MatchingService, MatchingServiceError,
};
use crate::workflows::underwriting::AssumptionOverrides;

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const USER_HEADER: &str = "x-user-id";

/// Router builder exposing the underwriting and matching endpoints. Tenant and
/// user context arrive in headers set by the upstream auth collaborator; they
/// are threaded explicitly through every call, never read from globals.
pub fn matching_router<S, A>(service: Arc<MatchingService<S, A>>) -> Router
where
    S: MatchingStore + 'static,
    A: AlertPublisher + 'static,
{
    Router::new()
        .route(
            "/api/v1/deals/:deal_id/analyze",
            post(analyze_handler::<S, A>).get(metrics_handler::<S, A>),
        )
        .route(
            "/api/v1/deals/:deal_id/match",
            post(match_deal_handler::<S, A>).get(deal_matches_handler::<S, A>),
        )
        .route("/api/v1/deals/:deal_id/swipe", post(swipe_handler::<S, A>))
        .route("/api/v1/deals/import", post(import_handler::<S, A>))
        .route(
            "/api/v1/buy-boxes/:buy_box_id/match",
            post(match_buy_box_handler::<S, A>),
        )
        .route(
            "/api/v1/buy-boxes/:buy_box_id/matches",
            get(buy_box_matches_handler::<S, A>),
        )
        .with_state(service)
}

/// Tenant and user scope for one request, resolved by the auth layer upstream.
#[derive(Debug, Clone, Copy)]
pub struct RequestScope {
    pub tenant_id: TenantId,
    pub user_id: UserId,
}

fn request_scope(headers: &HeaderMap) -> Result<RequestScope, Response> {
    let tenant_raw = headers
        .get(TENANT_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            let payload = json!({ "error": "missing tenant context" });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        })?;
    let user_raw = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            let payload = json!({ "error": "missing user context" });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        })?;

    let tenant_id = TenantId::parse(tenant_raw).map_err(|_| invalid_id("tenant id"))?;
    let user_id = UserId::parse(user_raw).map_err(|_| invalid_id("user id"))?;
    Ok(RequestScope { tenant_id, user_id })
}

fn invalid_id(what: &str) -> Response {
    let payload = json!({ "error": format!("invalid {what} format") });
    (StatusCode::BAD_REQUEST, Json(payload)).into_response()
}

fn error_response(err: MatchingServiceError) -> Response {
    match err {
        MatchingServiceError::Underwriting(inner) => {
            let payload = json!({
                "error": inner.to_string(),
                "missing_fields": inner.fields(),
            });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        MatchingServiceError::DealNotFound | MatchingServiceError::BuyBoxNotFound => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        MatchingServiceError::Criteria(inner) => {
            let payload = json!({ "error": inner.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        MatchingServiceError::Import(inner) => {
            let payload = json!({ "error": inner.to_string() });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        MatchingServiceError::Store(inner) => {
            error!(error = %inner, "store failure while serving request");
            let payload = json!({ "error": "internal server error" });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AnalyzeRequest {
    #[serde(default)]
    pub(crate) assumptions: AssumptionOverrides,
}

pub(crate) async fn analyze_handler<S, A>(
    State(service): State<Arc<MatchingService<S, A>>>,
    Path(deal_id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<AnalyzeRequest>>,
) -> Response
where
    S: MatchingStore + 'static,
    A: AlertPublisher + 'static,
{
    let scope = match request_scope(&headers) {
        Ok(scope) => scope,
        Err(response) => return response,
    };
    let Ok(deal_id) = DealId::parse(&deal_id) else {
        return invalid_id("deal id");
    };
    let overrides = body.map(|Json(request)| request.assumptions).unwrap_or_default();

    match service.analyze_deal(scope.tenant_id, deal_id, &overrides) {
        Ok(record) => {
            let payload = json!({
                "deal_id": deal_id,
                "analysis": record.metrics,
                "calculated_at": record.calculated_at,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn metrics_handler<S, A>(
    State(service): State<Arc<MatchingService<S, A>>>,
    Path(deal_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: MatchingStore + 'static,
    A: AlertPublisher + 'static,
{
    let scope = match request_scope(&headers) {
        Ok(scope) => scope,
        Err(response) => return response,
    };
    let Ok(deal_id) = DealId::parse(&deal_id) else {
        return invalid_id("deal id");
    };

    match service.latest_metrics(scope.tenant_id, deal_id) {
        Ok(Some(record)) => {
            let payload = json!({ "deal_id": deal_id, "metrics": record });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(None) => {
            let payload = json!({
                "error": "no analysis found for this deal",
                "needs_analysis": true,
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn match_deal_handler<S, A>(
    State(service): State<Arc<MatchingService<S, A>>>,
    Path(deal_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: MatchingStore + 'static,
    A: AlertPublisher + 'static,
{
    let scope = match request_scope(&headers) {
        Ok(scope) => scope,
        Err(response) => return response,
    };
    let Ok(deal_id) = DealId::parse(&deal_id) else {
        return invalid_id("deal id");
    };

    match service.match_deal(scope.tenant_id, deal_id) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn deal_matches_handler<S, A>(
    State(service): State<Arc<MatchingService<S, A>>>,
    Path(deal_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    S: MatchingStore + 'static,
    A: AlertPublisher + 'static,
{
    let scope = match request_scope(&headers) {
        Ok(scope) => scope,
        Err(response) => return response,
    };
    let Ok(deal_id) = DealId::parse(&deal_id) else {
        return invalid_id("deal id");
    };

    match service.matches_for_deal(scope.tenant_id, deal_id) {
        Ok(records) => {
            let total_matches = records.len();
            let payload = json!({
                "deal_id": deal_id,
                "matches": records,
                "total_matches": total_matches,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SwipeRequest {
    pub(crate) action: String,
}

pub(crate) async fn swipe_handler<S, A>(
    State(service): State<Arc<MatchingService<S, A>>>,
    Path(deal_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<SwipeRequest>,
) -> Response
where
    S: MatchingStore + 'static,
    A: AlertPublisher + 'static,
{
    let scope = match request_scope(&headers) {
        Ok(scope) => scope,
        Err(response) => return response,
    };
    let Ok(deal_id) = DealId::parse(&deal_id) else {
        return invalid_id("deal id");
    };
    let action = match request.action.as_str() {
        "save" => SwipeAction::Save,
        "pass" => SwipeAction::Pass,
        other => {
            let payload = json!({
                "error": format!("invalid action '{other}': must be 'save' or 'pass'"),
            });
            return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
        }
    };

    match service.swipe(scope.tenant_id, scope.user_id, deal_id, action) {
        Ok(summary) => {
            let payload = json!({
                "success": true,
                "status": summary.status.label(),
                "match_count": summary.match_count,
                "top_score": summary.top_score,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn import_handler<S, A>(
    State(service): State<Arc<MatchingService<S, A>>>,
    headers: HeaderMap,
    body: String,
) -> Response
where
    S: MatchingStore + 'static,
    A: AlertPublisher + 'static,
{
    let scope = match request_scope(&headers) {
        Ok(scope) => scope,
        Err(response) => return response,
    };

    match service.import_deals(scope.tenant_id, scope.user_id, &body) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn match_buy_box_handler<S, A>(
    State(service): State<Arc<MatchingService<S, A>>>,
    Path(buy_box_id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<BuyBoxMatchOptions>>,
) -> Response
where
    S: MatchingStore + 'static,
    A: AlertPublisher + 'static,
{
    let scope = match request_scope(&headers) {
        Ok(scope) => scope,
        Err(response) => return response,
    };
    let Ok(buy_box_id) = BuyBoxId::parse(&buy_box_id) else {
        return invalid_id("buy box id");
    };
    let options = body.map(|Json(options)| options).unwrap_or_default();

    match service.match_buy_box(scope.tenant_id, buy_box_id, options) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn buy_box_matches_handler<S, A>(
    State(service): State<Arc<MatchingService<S, A>>>,
    Path(buy_box_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<MatchesQuery>,
) -> Response
where
    S: MatchingStore + 'static,
    A: AlertPublisher + 'static,
{
    let scope = match request_scope(&headers) {
        Ok(scope) => scope,
        Err(response) => return response,
    };
    let Ok(buy_box_id) = BuyBoxId::parse(&buy_box_id) else {
        return invalid_id("buy box id");
    };

    match service.matches_for_buy_box(scope.tenant_id, buy_box_id, query) {
        Ok(paged) => (StatusCode::OK, Json(paged)).into_response(),
        Err(err) => error_response(err),
    }
}
