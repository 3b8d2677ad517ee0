use crate::{
    access::{self, UserContext},
    entities::{service_follow_up, warranty_follow_up},
    errors::ServiceError,
    scheduling::FollowUpPriority,
    services::follow_ups::ServiceFollowUpFilter,
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub fn warranty_routes() -> Router<AppState> {
    Router::new().route("/", get(list_warranty_follow_ups))
}

pub fn service_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_service_follow_ups))
        .route("/:id", get(get_service_follow_up))
}

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WarrantyFollowUpQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub installation_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ServiceFollowUpQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub installation_id: Option<Uuid>,
    pub completed: Option<bool>,
    /// overdue, due_soon, pending or done
    pub priority: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WarrantyFollowUpSummary {
    pub id: Uuid,
    pub installation_id: Uuid,
    /// time_term or working_hours
    pub warranty_type: String,
    pub warranty_value: Decimal,
    pub end_of_warranty_date: DateTime<Utc>,
    pub calculation_notes: String,
    /// True when an assumed constant stood in for real inputs
    pub used_fallback: bool,
    pub is_active: bool,
    pub days_remaining: i64,
    pub created_at: DateTime<Utc>,
}

impl From<warranty_follow_up::Model> for WarrantyFollowUpSummary {
    fn from(model: warranty_follow_up::Model) -> Self {
        let now = Utc::now();
        let is_active = model.is_active(now);
        let days_remaining = model.days_remaining(now);
        Self {
            id: model.id,
            installation_id: model.installation_id,
            warranty_type: model.warranty_type,
            warranty_value: model.warranty_value,
            end_of_warranty_date: model.end_of_warranty_date,
            calculation_notes: model.calculation_notes,
            used_fallback: model.used_fallback,
            is_active,
            days_remaining,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceFollowUpSummary {
    pub id: Uuid,
    pub installation_id: Uuid,
    /// time_term or working_hours
    pub service_type: String,
    pub service_value: Decimal,
    pub next_service_date: DateTime<Utc>,
    pub is_completed: bool,
    pub completed_date: Option<DateTime<Utc>>,
    pub calculation_notes: String,
    pub used_fallback: bool,
    /// overdue, due_soon, pending or done; derived, never stored
    pub priority: String,
    pub created_at: DateTime<Utc>,
}

impl From<service_follow_up::Model> for ServiceFollowUpSummary {
    fn from(model: service_follow_up::Model) -> Self {
        let priority = model.priority(Utc::now()).to_string();
        Self {
            id: model.id,
            installation_id: model.installation_id,
            service_type: model.service_type,
            service_value: model.service_value,
            next_service_date: model.next_service_date,
            is_completed: model.is_completed,
            completed_date: model.completed_date,
            calculation_notes: model.calculation_notes,
            used_fallback: model.used_fallback,
            priority,
            created_at: model.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/warranty-follow-ups",
    params(WarrantyFollowUpQuery),
    responses(
        (status = 200, description = "Warranty follow-ups listed", body = ApiResponse<PaginatedResponse<WarrantyFollowUpSummary>>)
    ),
    tag = "follow-ups"
)]
pub async fn list_warranty_follow_ups(
    State(state): State<AppState>,
    user: UserContext,
    Query(query): Query<WarrantyFollowUpQuery>,
) -> ApiResult<PaginatedResponse<WarrantyFollowUpSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    let (records, total) = state
        .follow_up_service()
        .list_warranty_follow_ups(&scope, query.installation_id, page, limit)
        .await?;

    let items: Vec<WarrantyFollowUpSummary> = records
        .into_iter()
        .map(WarrantyFollowUpSummary::from)
        .collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-follow-ups",
    params(ServiceFollowUpQuery),
    responses(
        (status = 200, description = "Service follow-ups listed", body = ApiResponse<PaginatedResponse<ServiceFollowUpSummary>>),
        (status = 400, description = "Invalid priority filter", body = crate::errors::ErrorResponse)
    ),
    tag = "follow-ups"
)]
pub async fn list_service_follow_ups(
    State(state): State<AppState>,
    user: UserContext,
    Query(query): Query<ServiceFollowUpQuery>,
) -> ApiResult<PaginatedResponse<ServiceFollowUpSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let priority = match query.priority.as_deref() {
        Some(raw) => Some(raw.parse::<FollowUpPriority>().map_err(|_| {
            ServiceError::ValidationError(format!("unknown priority '{raw}'"))
        })?),
        None => None,
    };

    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    let (records, total) = state
        .follow_up_service()
        .list_service_follow_ups(
            &scope,
            ServiceFollowUpFilter {
                installation_id: query.installation_id,
                completed: query.completed,
                priority,
            },
            page,
            limit,
        )
        .await?;

    let items: Vec<ServiceFollowUpSummary> = records
        .into_iter()
        .map(ServiceFollowUpSummary::from)
        .collect();
    let total_pages = (total + limit - 1) / limit;

    Ok(Json(ApiResponse::success(PaginatedResponse {
        items,
        total,
        page,
        limit,
        total_pages,
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/service-follow-ups/{id}",
    params(("id" = Uuid, Path, description = "Service follow-up ID")),
    responses(
        (status = 200, description = "Service follow-up fetched", body = ApiResponse<ServiceFollowUpSummary>),
        (status = 404, description = "Service follow-up not found", body = crate::errors::ErrorResponse)
    ),
    tag = "follow-ups"
)]
pub async fn get_service_follow_up(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> ApiResult<ServiceFollowUpSummary> {
    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    let follow_up = state
        .follow_up_service()
        .get_service_follow_up(&scope, id)
        .await?;
    Ok(Json(ApiResponse::success(ServiceFollowUpSummary::from(
        follow_up,
    ))))
}
