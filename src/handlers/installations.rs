use crate::{
    access::{self, UserContext},
    entities::installation,
    errors::ServiceError,
    handlers::follow_ups::{ServiceFollowUpSummary, WarrantyFollowUpSummary},
    services::installations::{CreateInstallation, UpdateInstallation},
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
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_installations).post(create_installation))
        .route("/:id", get(get_installation).put(update_installation))
}

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InstallationListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub customer_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InstallationSummary {
    pub id: Uuid,
    pub installer_id: Uuid,
    pub inventory_item_id: Uuid,
    pub customer_id: Uuid,
    pub setup_date: DateTime<Utc>,
    pub location_latitude: Option<Decimal>,
    pub location_longitude: Option<Decimal>,
    pub location_address: Option<String>,
    pub installation_notes: Option<String>,
    pub has_location: bool,
    pub created_at: DateTime<Utc>,
}

impl From<installation::Model> for InstallationSummary {
    fn from(model: installation::Model) -> Self {
        let has_location = model.has_location();
        Self {
            id: model.id,
            installer_id: model.installer_id,
            inventory_item_id: model.inventory_item_id,
            customer_id: model.customer_id,
            setup_date: model.setup_date,
            location_latitude: model.location_latitude,
            location_longitude: model.location_longitude,
            location_address: model.location_address,
            installation_notes: model.installation_notes,
            has_location,
            created_at: model.created_at,
        }
    }
}

/// Create response: the installation plus every follow-up the fan-out
/// produced for it.
#[derive(Debug, Serialize, ToSchema)]
pub struct InstallationCreatedResponse {
    pub installation: InstallationSummary,
    pub warranty_follow_ups: Vec<WarrantyFollowUpSummary>,
    pub service_follow_ups: Vec<ServiceFollowUpSummary>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "inventory_item_id": "550e8400-e29b-41d4-a716-446655440000",
    "customer_id": "123e4567-e89b-12d3-a456-426614174000",
    "setup_date": "2024-01-01T00:00:00Z",
    "location_address": "Machine hall 2, line 4",
    "installation_notes": "Commissioned together with the dryer unit"
}))]
pub struct CreateInstallationRequest {
    pub inventory_item_id: Uuid,
    pub customer_id: Uuid,
    /// Defaults to now when omitted
    pub setup_date: Option<DateTime<Utc>>,
    pub location_latitude: Option<Decimal>,
    pub location_longitude: Option<Decimal>,
    pub location_address: Option<String>,
    pub installation_notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateInstallationRequest {
    /// Swap the installed unit; the old one is freed
    pub inventory_item_id: Option<Uuid>,
    pub location_latitude: Option<Decimal>,
    pub location_longitude: Option<Decimal>,
    pub location_address: Option<String>,
    pub installation_notes: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/installations",
    params(InstallationListQuery),
    responses(
        (status = 200, description = "Installations listed", body = ApiResponse<PaginatedResponse<InstallationSummary>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "installations"
)]
pub async fn list_installations(
    State(state): State<AppState>,
    user: UserContext,
    Query(query): Query<InstallationListQuery>,
) -> ApiResult<PaginatedResponse<InstallationSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    let (records, total) = state
        .installation_service()
        .list_installations(&scope, page, limit, query.customer_id)
        .await?;

    let items: Vec<InstallationSummary> =
        records.into_iter().map(InstallationSummary::from).collect();
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
    path = "/api/v1/installations/{id}",
    params(("id" = Uuid, Path, description = "Installation ID")),
    responses(
        (status = 200, description = "Installation fetched", body = ApiResponse<InstallationSummary>),
        (status = 404, description = "Installation not found", body = crate::errors::ErrorResponse)
    ),
    tag = "installations"
)]
pub async fn get_installation(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> ApiResult<InstallationSummary> {
    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    let found = state
        .installation_service()
        .get_installation(&scope, id)
        .await?;
    Ok(Json(ApiResponse::success(InstallationSummary::from(found))))
}

#[utoipa::path(
    post,
    path = "/api/v1/installations",
    request_body = CreateInstallationRequest,
    responses(
        (status = 200, description = "Installation created with fan-out", body = ApiResponse<InstallationCreatedResponse>),
        (status = 400, description = "Item in use or customer not an end user", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer or item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "installations"
)]
pub async fn create_installation(
    State(state): State<AppState>,
    user: UserContext,
    Json(payload): Json<CreateInstallationRequest>,
) -> ApiResult<InstallationCreatedResponse> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let (created, report) = state
        .installation_service()
        .create_installation(CreateInstallation {
            installer_id: user.user_id,
            inventory_item_id: payload.inventory_item_id,
            customer_id: payload.customer_id,
            setup_date: payload.setup_date,
            location_latitude: payload.location_latitude,
            location_longitude: payload.location_longitude,
            location_address: payload.location_address,
            installation_notes: payload.installation_notes,
        })
        .await?;

    Ok(Json(ApiResponse::success(InstallationCreatedResponse {
        installation: InstallationSummary::from(created),
        warranty_follow_ups: report
            .warranty_follow_ups
            .into_iter()
            .map(WarrantyFollowUpSummary::from)
            .collect(),
        service_follow_ups: report
            .service_follow_ups
            .into_iter()
            .map(ServiceFollowUpSummary::from)
            .collect(),
    })))
}

#[utoipa::path(
    put,
    path = "/api/v1/installations/{id}",
    request_body = UpdateInstallationRequest,
    params(("id" = Uuid, Path, description = "Installation ID")),
    responses(
        (status = 200, description = "Installation updated", body = ApiResponse<InstallationSummary>),
        (status = 400, description = "Replacement item already in use", body = crate::errors::ErrorResponse),
        (status = 404, description = "Installation not found", body = crate::errors::ErrorResponse)
    ),
    tag = "installations"
)]
pub async fn update_installation(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateInstallationRequest>,
) -> ApiResult<InstallationSummary> {
    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    let updated = state
        .installation_service()
        .update_installation(
            &scope,
            id,
            UpdateInstallation {
                inventory_item_id: payload.inventory_item_id,
                location_latitude: payload.location_latitude,
                location_longitude: payload.location_longitude,
                location_address: payload.location_address,
                installation_notes: payload.installation_notes,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(InstallationSummary::from(
        updated,
    ))))
}
