use crate::{
    access::{self, UserContext},
    entities::{maintenance_record, maintenance_record::MaintenanceKind},
    entities::{service_form_entry, spare_part_usage},
    errors::ServiceError,
    handlers::follow_ups::ServiceFollowUpSummary,
    services::maintenance::{
        CompleteMaintenance, MaintenanceRecordDetail, ServiceFormInput, SparePartInput,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_maintenance_records).post(complete_maintenance))
        .route("/:id", get(get_maintenance_record))
}

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MaintenanceListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub installation_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MaintenanceRecordSummary {
    pub id: Uuid,
    pub service_follow_up_id: Uuid,
    /// periodic or breakdown
    pub maintenance_type: String,
    pub technician_id: Uuid,
    pub breakdown_reason: Option<String>,
    pub notes: Option<String>,
    pub service_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<maintenance_record::Model> for MaintenanceRecordSummary {
    fn from(model: maintenance_record::Model) -> Self {
        Self {
            id: model.id,
            service_follow_up_id: model.service_follow_up_id,
            maintenance_type: model.maintenance_type,
            technician_id: model.technician_id,
            breakdown_reason: model.breakdown_reason,
            notes: model.notes,
            service_date: model.service_date,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SparePartUsageSummary {
    pub id: Uuid,
    pub item_master_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
}

impl From<spare_part_usage::Model> for SparePartUsageSummary {
    fn from(model: spare_part_usage::Model) -> Self {
        Self {
            id: model.id,
            item_master_id: model.item_master_id,
            quantity: model.quantity,
            notes: model.notes,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceFormEntrySummary {
    pub id: Uuid,
    pub form_name: String,
    pub completed: bool,
}

impl From<service_form_entry::Model> for ServiceFormEntrySummary {
    fn from(model: service_form_entry::Model) -> Self {
        Self {
            id: model.id,
            form_name: model.form_name,
            completed: model.completed,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MaintenanceRecordDetailResponse {
    pub record: MaintenanceRecordSummary,
    pub spare_parts: Vec<SparePartUsageSummary>,
    pub service_forms: Vec<ServiceFormEntrySummary>,
}

impl From<MaintenanceRecordDetail> for MaintenanceRecordDetailResponse {
    fn from(detail: MaintenanceRecordDetail) -> Self {
        Self {
            record: MaintenanceRecordSummary::from(detail.record),
            spare_parts: detail
                .spare_parts
                .into_iter()
                .map(SparePartUsageSummary::from)
                .collect(),
            service_forms: detail
                .service_forms
                .into_iter()
                .map(ServiceFormEntrySummary::from)
                .collect(),
        }
    }
}

/// Completion response: the record, the follow-up it closed, and the
/// successor scheduled in its place.
#[derive(Debug, Serialize, ToSchema)]
pub struct MaintenanceCompletedResponse {
    pub record: MaintenanceRecordSummary,
    pub completed_follow_up: ServiceFollowUpSummary,
    pub successor: ServiceFollowUpSummary,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SparePartRequest {
    pub item_master_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ServiceFormRequest {
    #[validate(length(min = 1))]
    pub form_name: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "service_follow_up_id": "550e8400-e29b-41d4-a716-446655440000",
    "maintenance_type": "breakdown",
    "breakdown_reason": "Coolant pump seized",
    "service_date": "2024-06-15T09:30:00Z",
    "spare_parts": [{"item_master_id": "123e4567-e89b-12d3-a456-426614174000", "quantity": 1}]
}))]
pub struct CompleteMaintenanceRequest {
    pub service_follow_up_id: Uuid,
    /// periodic or breakdown
    pub maintenance_type: String,
    /// Required for breakdown maintenance
    pub breakdown_reason: Option<String>,
    pub notes: Option<String>,
    /// When the work was done; defaults to now
    pub service_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub spare_parts: Vec<SparePartRequest>,
    #[serde(default)]
    pub service_forms: Vec<ServiceFormRequest>,
}

#[utoipa::path(
    post,
    path = "/api/v1/maintenance-records",
    request_body = CompleteMaintenanceRequest,
    responses(
        (status = 200, description = "Maintenance recorded, chain advanced", body = ApiResponse<MaintenanceCompletedResponse>),
        (status = 400, description = "Missing breakdown reason", body = crate::errors::ErrorResponse),
        (status = 404, description = "Follow-up not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Follow-up already completed", body = crate::errors::ErrorResponse)
    ),
    tag = "maintenance"
)]
pub async fn complete_maintenance(
    State(state): State<AppState>,
    user: UserContext,
    Json(payload): Json<CompleteMaintenanceRequest>,
) -> ApiResult<MaintenanceCompletedResponse> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let maintenance_type = payload.maintenance_type.parse::<MaintenanceKind>().map_err(|_| {
        ServiceError::ValidationError(format!(
            "unknown maintenance type '{}'",
            payload.maintenance_type
        ))
    })?;

    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    let outcome = state
        .maintenance_service()
        .complete_maintenance(
            &scope,
            CompleteMaintenance {
                service_follow_up_id: payload.service_follow_up_id,
                maintenance_type,
                technician_id: user.user_id,
                breakdown_reason: payload.breakdown_reason,
                notes: payload.notes,
                service_date: payload.service_date,
                spare_parts: payload
                    .spare_parts
                    .into_iter()
                    .map(|part| SparePartInput {
                        item_master_id: part.item_master_id,
                        quantity: part.quantity,
                        notes: part.notes,
                    })
                    .collect(),
                service_forms: payload
                    .service_forms
                    .into_iter()
                    .map(|form| ServiceFormInput {
                        form_name: form.form_name,
                        completed: form.completed,
                    })
                    .collect(),
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(MaintenanceCompletedResponse {
        record: MaintenanceRecordSummary::from(outcome.record),
        completed_follow_up: ServiceFollowUpSummary::from(outcome.completed_follow_up),
        successor: ServiceFollowUpSummary::from(outcome.successor),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/maintenance-records",
    params(MaintenanceListQuery),
    responses(
        (status = 200, description = "Maintenance records listed", body = ApiResponse<PaginatedResponse<MaintenanceRecordSummary>>)
    ),
    tag = "maintenance"
)]
pub async fn list_maintenance_records(
    State(state): State<AppState>,
    user: UserContext,
    Query(query): Query<MaintenanceListQuery>,
) -> ApiResult<PaginatedResponse<MaintenanceRecordSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    let (records, total) = state
        .maintenance_service()
        .list_maintenance_records(&scope, page, limit, query.installation_id)
        .await?;

    let items: Vec<MaintenanceRecordSummary> = records
        .into_iter()
        .map(MaintenanceRecordSummary::from)
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
    path = "/api/v1/maintenance-records/{id}",
    params(("id" = Uuid, Path, description = "Maintenance record ID")),
    responses(
        (status = 200, description = "Maintenance record fetched", body = ApiResponse<MaintenanceRecordDetailResponse>),
        (status = 404, description = "Maintenance record not found", body = crate::errors::ErrorResponse)
    ),
    tag = "maintenance"
)]
pub async fn get_maintenance_record(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> ApiResult<MaintenanceRecordDetailResponse> {
    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    let detail = state
        .maintenance_service()
        .get_maintenance_record(&scope, id)
        .await?;
    Ok(Json(ApiResponse::success(
        MaintenanceRecordDetailResponse::from(detail),
    )))
}
