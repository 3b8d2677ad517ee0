use crate::{
    access::{self, UserContext},
    entities::{company, company::CompanyType, working_hours},
    errors::ServiceError,
    services::customers::{CreateCustomer, UpsertWorkingHours},
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
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/:id", get(get_customer))
        .route(
            "/:id/working-hours",
            get(get_working_hours).put(upsert_working_hours),
        )
}

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    /// main, distributor or enduser
    pub company_type: String,
    pub related_company_id: Option<Uuid>,
    pub related_manager_id: Option<Uuid>,
    pub tax_number: Option<String>,
    pub email: Option<String>,
    pub telephone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<company::Model> for CustomerSummary {
    fn from(model: company::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            company_type: model.company_type,
            related_company_id: model.related_company_id,
            related_manager_id: model.related_manager_id,
            tax_number: model.tax_number,
            email: model.email,
            telephone: model.telephone,
            active: model.active,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WorkingHoursSummary {
    pub id: Uuid,
    pub company_id: Uuid,
    pub daily_working_hours: f64,
    pub working_on_saturday: bool,
    pub working_on_sunday: bool,
    pub working_days_per_week: u8,
    pub weekly_working_hours: f64,
}

impl From<working_hours::Model> for WorkingHoursSummary {
    fn from(model: working_hours::Model) -> Self {
        let working_days_per_week = model.working_days_per_week();
        let weekly_working_hours = model.weekly_working_hours();
        Self {
            id: model.id,
            company_id: model.company_id,
            daily_working_hours: model.daily_working_hours,
            working_on_saturday: model.working_on_saturday,
            working_on_sunday: model.working_on_sunday,
            working_days_per_week,
            weekly_working_hours,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1))]
    pub name: String,
    /// main, distributor or enduser
    pub company_type: String,
    pub related_company_id: Option<Uuid>,
    pub related_manager_id: Option<Uuid>,
    pub tax_number: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub telephone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpsertWorkingHoursRequest {
    pub daily_working_hours: f64,
    #[serde(default)]
    pub working_on_saturday: bool,
    #[serde(default)]
    pub working_on_sunday: bool,
}

#[utoipa::path(
    get,
    path = "/api/v1/customers",
    params(CustomerListQuery),
    responses(
        (status = 200, description = "Customers listed", body = ApiResponse<PaginatedResponse<CustomerSummary>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn list_customers(
    State(state): State<AppState>,
    user: UserContext,
    Query(query): Query<CustomerListQuery>,
) -> ApiResult<PaginatedResponse<CustomerSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    let (records, total) = state
        .customer_service()
        .list_customers(&scope, page, limit)
        .await?;

    let items: Vec<CustomerSummary> = records.into_iter().map(CustomerSummary::from).collect();
    let total_pages = total.div_ceil(limit);

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
    path = "/api/v1/customers/{id}",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Customer fetched", body = ApiResponse<CustomerSummary>),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> ApiResult<CustomerSummary> {
    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    let customer = state.customer_service().get_customer(&scope, id).await?;
    Ok(Json(ApiResponse::success(CustomerSummary::from(customer))))
}

#[utoipa::path(
    post,
    path = "/api/v1/customers",
    request_body = CreateCustomerRequest,
    responses(
        (status = 200, description = "Customer created", body = ApiResponse<CustomerSummary>),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Duplicate name", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn create_customer(
    State(state): State<AppState>,
    _user: UserContext,
    Json(payload): Json<CreateCustomerRequest>,
) -> ApiResult<CustomerSummary> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let company_type = payload.company_type.parse::<CompanyType>().map_err(|_| {
        ServiceError::ValidationError(format!(
            "unknown company type '{}'",
            payload.company_type
        ))
    })?;

    let created = state
        .customer_service()
        .create_customer(CreateCustomer {
            name: payload.name,
            company_type,
            related_company_id: payload.related_company_id,
            related_manager_id: payload.related_manager_id,
            tax_number: payload.tax_number,
            email: payload.email,
            telephone: payload.telephone,
        })
        .await?;

    Ok(Json(ApiResponse::success(CustomerSummary::from(created))))
}

#[utoipa::path(
    get,
    path = "/api/v1/customers/{id}/working-hours",
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Working hours fetched", body = ApiResponse<WorkingHoursSummary>),
        (status = 404, description = "No profile configured", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn get_working_hours(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<Uuid>,
) -> ApiResult<WorkingHoursSummary> {
    use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    // Reuse the scoped lookup so a hidden company reads as absent
    state.customer_service().get_customer(&scope, id).await?;

    let profile = working_hours::Entity::find()
        .filter(working_hours::Column::CompanyId.eq(id))
        .one(state.db.as_ref())
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Company {} has no working-hours profile", id))
        })?;

    Ok(Json(ApiResponse::success(WorkingHoursSummary::from(
        profile,
    ))))
}

#[utoipa::path(
    put,
    path = "/api/v1/customers/{id}/working-hours",
    request_body = UpsertWorkingHoursRequest,
    params(("id" = Uuid, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Working hours saved", body = ApiResponse<WorkingHoursSummary>),
        (status = 400, description = "Invalid hours", body = crate::errors::ErrorResponse),
        (status = 404, description = "Customer not found", body = crate::errors::ErrorResponse)
    ),
    tag = "customers"
)]
pub async fn upsert_working_hours(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpsertWorkingHoursRequest>,
) -> ApiResult<WorkingHoursSummary> {
    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    let saved = state
        .customer_service()
        .upsert_working_hours(
            &scope,
            id,
            UpsertWorkingHours {
                daily_working_hours: payload.daily_working_hours,
                working_on_saturday: payload.working_on_saturday,
                working_on_sunday: payload.working_on_sunday,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(WorkingHoursSummary::from(saved))))
}
