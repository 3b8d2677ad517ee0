use crate::{
    access::UserContext,
    entities::{inventory_item, item_master, item_service_rule, item_warranty_rule},
    errors::ServiceError,
    scheduling::RuleKind,
    services::catalog::{CreateInventoryItem, CreateItemMaster, InventoryFilter},
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

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_item_masters).post(create_item_master))
        .route("/:id", get(get_item_master))
        .route(
            "/:id/warranty-rules",
            get(list_warranty_rules).post(add_warranty_rule),
        )
        .route(
            "/:id/service-rules",
            get(list_service_rules).post(add_service_rule),
        )
}

pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory_items).post(create_inventory_item))
        .route("/:id", get(get_inventory_item))
}

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Default, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InventoryListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub item_master_id: Option<Uuid>,
    pub in_use: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemMasterSummary {
    pub id: Uuid,
    pub shortcode: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<item_master::Model> for ItemMasterSummary {
    fn from(model: item_master::Model) -> Self {
        Self {
            id: model.id,
            shortcode: model.shortcode,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
        }
    }
}

/// Catalog rule as exposed to clients; shape is shared by warranty and
/// service rules.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogRuleSummary {
    pub id: Uuid,
    pub item_master_id: Uuid,
    /// time_term or working_hours
    pub rule_kind: String,
    pub value: Decimal,
}

impl From<item_warranty_rule::Model> for CatalogRuleSummary {
    fn from(model: item_warranty_rule::Model) -> Self {
        Self {
            id: model.id,
            item_master_id: model.item_master_id,
            rule_kind: model.rule_kind,
            value: model.value,
        }
    }
}

impl From<item_service_rule::Model> for CatalogRuleSummary {
    fn from(model: item_service_rule::Model) -> Self {
        Self {
            id: model.id,
            item_master_id: model.item_master_id,
            rule_kind: model.rule_kind,
            value: model.value,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryItemSummary {
    pub id: Uuid,
    pub item_master_id: Uuid,
    pub serial_no: String,
    pub production_date: Option<DateTime<Utc>>,
    pub in_use: bool,
    pub created_at: DateTime<Utc>,
}

impl From<inventory_item::Model> for InventoryItemSummary {
    fn from(model: inventory_item::Model) -> Self {
        Self {
            id: model.id,
            item_master_id: model.item_master_id,
            serial_no: model.serial_no,
            production_date: model.production_date,
            in_use: model.in_use,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemMasterRequest {
    #[validate(length(min = 1, max = 10))]
    pub shortcode: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({"rule_kind": "time_term", "value": 12}))]
pub struct AddRuleRequest {
    /// time_term (months) or working_hours (hours)
    pub rule_kind: String,
    pub value: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateInventoryItemRequest {
    pub item_master_id: Uuid,
    #[validate(length(min = 1))]
    pub serial_no: String,
    pub production_date: Option<DateTime<Utc>>,
}

fn parse_rule_kind(raw: &str) -> Result<RuleKind, ServiceError> {
    raw.parse::<RuleKind>()
        .map_err(|_| ServiceError::ValidationError(format!("unknown rule kind '{raw}'")))
}

#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(ItemListQuery),
    responses(
        (status = 200, description = "Item masters listed", body = ApiResponse<PaginatedResponse<ItemMasterSummary>>)
    ),
    tag = "items"
)]
pub async fn list_item_masters(
    State(state): State<AppState>,
    _user: UserContext,
    Query(query): Query<ItemListQuery>,
) -> ApiResult<PaginatedResponse<ItemMasterSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (records, total) = state
        .catalog_service()
        .list_item_masters(page, limit, query.search)
        .await?;

    let items: Vec<ItemMasterSummary> =
        records.into_iter().map(ItemMasterSummary::from).collect();
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
    path = "/api/v1/items/{id}",
    params(("id" = Uuid, Path, description = "Item master ID")),
    responses(
        (status = 200, description = "Item master fetched", body = ApiResponse<ItemMasterSummary>),
        (status = 404, description = "Item master not found", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn get_item_master(
    State(state): State<AppState>,
    _user: UserContext,
    Path(id): Path<Uuid>,
) -> ApiResult<ItemMasterSummary> {
    let item = state.catalog_service().get_item_master(id).await?;
    Ok(Json(ApiResponse::success(ItemMasterSummary::from(item))))
}

#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateItemMasterRequest,
    responses(
        (status = 200, description = "Item master created", body = ApiResponse<ItemMasterSummary>),
        (status = 409, description = "Duplicate shortcode", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn create_item_master(
    State(state): State<AppState>,
    _user: UserContext,
    Json(payload): Json<CreateItemMasterRequest>,
) -> ApiResult<ItemMasterSummary> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .catalog_service()
        .create_item_master(CreateItemMaster {
            shortcode: payload.shortcode,
            name: payload.name,
            description: payload.description,
        })
        .await?;

    Ok(Json(ApiResponse::success(ItemMasterSummary::from(created))))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}/warranty-rules",
    params(("id" = Uuid, Path, description = "Item master ID")),
    responses(
        (status = 200, description = "Warranty rules listed", body = ApiResponse<Vec<CatalogRuleSummary>>)
    ),
    tag = "items"
)]
pub async fn list_warranty_rules(
    State(state): State<AppState>,
    _user: UserContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<CatalogRuleSummary>> {
    let rules = state.catalog_service().warranty_rules(id).await?;
    Ok(Json(ApiResponse::success(
        rules.into_iter().map(CatalogRuleSummary::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/warranty-rules",
    request_body = AddRuleRequest,
    params(("id" = Uuid, Path, description = "Item master ID")),
    responses(
        (status = 200, description = "Warranty rule attached", body = ApiResponse<CatalogRuleSummary>),
        (status = 400, description = "Invalid rule", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn add_warranty_rule(
    State(state): State<AppState>,
    _user: UserContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddRuleRequest>,
) -> ApiResult<CatalogRuleSummary> {
    let kind = parse_rule_kind(&payload.rule_kind)?;
    let rule = state
        .catalog_service()
        .add_warranty_rule(id, kind, payload.value)
        .await?;
    Ok(Json(ApiResponse::success(CatalogRuleSummary::from(rule))))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}/service-rules",
    params(("id" = Uuid, Path, description = "Item master ID")),
    responses(
        (status = 200, description = "Service rules listed", body = ApiResponse<Vec<CatalogRuleSummary>>)
    ),
    tag = "items"
)]
pub async fn list_service_rules(
    State(state): State<AppState>,
    _user: UserContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<CatalogRuleSummary>> {
    let rules = state.catalog_service().service_rules(id).await?;
    Ok(Json(ApiResponse::success(
        rules.into_iter().map(CatalogRuleSummary::from).collect(),
    )))
}

#[utoipa::path(
    post,
    path = "/api/v1/items/{id}/service-rules",
    request_body = AddRuleRequest,
    params(("id" = Uuid, Path, description = "Item master ID")),
    responses(
        (status = 200, description = "Service rule attached", body = ApiResponse<CatalogRuleSummary>),
        (status = 400, description = "Invalid rule", body = crate::errors::ErrorResponse)
    ),
    tag = "items"
)]
pub async fn add_service_rule(
    State(state): State<AppState>,
    _user: UserContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddRuleRequest>,
) -> ApiResult<CatalogRuleSummary> {
    let kind = parse_rule_kind(&payload.rule_kind)?;
    let rule = state
        .catalog_service()
        .add_service_rule(id, kind, payload.value)
        .await?;
    Ok(Json(ApiResponse::success(CatalogRuleSummary::from(rule))))
}

#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(InventoryListQuery),
    responses(
        (status = 200, description = "Inventory items listed", body = ApiResponse<PaginatedResponse<InventoryItemSummary>>)
    ),
    tag = "inventory"
)]
pub async fn list_inventory_items(
    State(state): State<AppState>,
    _user: UserContext,
    Query(query): Query<InventoryListQuery>,
) -> ApiResult<PaginatedResponse<InventoryItemSummary>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);

    let (records, total) = state
        .catalog_service()
        .list_inventory_items(
            page,
            limit,
            InventoryFilter {
                item_master_id: query.item_master_id,
                in_use: query.in_use,
            },
        )
        .await?;

    let items: Vec<InventoryItemSummary> = records
        .into_iter()
        .map(InventoryItemSummary::from)
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
    path = "/api/v1/inventory/{id}",
    params(("id" = Uuid, Path, description = "Inventory item ID")),
    responses(
        (status = 200, description = "Inventory item fetched", body = ApiResponse<InventoryItemSummary>),
        (status = 404, description = "Inventory item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_inventory_item(
    State(state): State<AppState>,
    _user: UserContext,
    Path(id): Path<Uuid>,
) -> ApiResult<InventoryItemSummary> {
    let item = state.catalog_service().get_inventory_item(id).await?;
    Ok(Json(ApiResponse::success(InventoryItemSummary::from(item))))
}

#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = CreateInventoryItemRequest,
    responses(
        (status = 200, description = "Inventory item created", body = ApiResponse<InventoryItemSummary>),
        (status = 404, description = "Item master not found", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_inventory_item(
    State(state): State<AppState>,
    user: UserContext,
    Json(payload): Json<CreateInventoryItemRequest>,
) -> ApiResult<InventoryItemSummary> {
    payload
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

    let created = state
        .catalog_service()
        .create_inventory_item(CreateInventoryItem {
            item_master_id: payload.item_master_id,
            serial_no: payload.serial_no,
            production_date: payload.production_date,
            created_by: Some(user.user_id),
        })
        .await?;

    Ok(Json(ApiResponse::success(InventoryItemSummary::from(
        created,
    ))))
}
