use crate::{
    db::DbPool,
    entities::{inventory_item, item_master, item_service_rule, item_warranty_rule},
    errors::ServiceError,
    scheduling::RuleKind,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreateItemMaster {
    pub shortcode: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateInventoryItem {
    pub item_master_id: Uuid,
    pub serial_no: String,
    pub production_date: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryFilter {
    pub item_master_id: Option<Uuid>,
    pub in_use: Option<bool>,
}

/// Service for the item catalog and the physical inventory behind it
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_item_master(
        &self,
        input: CreateItemMaster,
    ) -> Result<item_master::Model, ServiceError> {
        let shortcode = input.shortcode.trim().to_string();
        let name = input.name.trim().to_string();
        if shortcode.is_empty() || name.is_empty() {
            return Err(ServiceError::ValidationError(
                "shortcode and name cannot be empty".to_string(),
            ));
        }

        let db = self.db.as_ref();

        let existing = item_master::Entity::find()
            .filter(item_master::Column::Shortcode.eq(shortcode.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "item master with shortcode '{}' already exists",
                shortcode
            )));
        }

        let created = item_master::ActiveModel {
            id: Set(Uuid::new_v4()),
            shortcode: Set(shortcode),
            name: Set(name),
            description: Set(input.description),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_item_master(&self, id: Uuid) -> Result<item_master::Model, ServiceError> {
        item_master::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Item master {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_item_masters(
        &self,
        page: u64,
        limit: u64,
        search: Option<String>,
    ) -> Result<(Vec<item_master::Model>, u64), ServiceError> {
        let db = self.db.as_ref();

        let mut query = item_master::Entity::find();
        if let Some(term) = search.filter(|t| !t.trim().is_empty()) {
            query = query.filter(item_master::Column::Name.contains(term.trim()));
        }

        let total = query.clone().count(db).await?;
        let offset = page.saturating_sub(1) * limit;
        let items = query
            .order_by_asc(item_master::Column::Name)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok((items, total))
    }

    /// Attaches a warranty rule to a catalog item. Get-or-create keyed by
    /// (item, kind, value).
    #[instrument(skip(self))]
    pub async fn add_warranty_rule(
        &self,
        item_master_id: Uuid,
        kind: RuleKind,
        value: Decimal,
    ) -> Result<item_warranty_rule::Model, ServiceError> {
        validate_rule_value(value)?;
        let db = self.db.as_ref();
        self.get_item_master(item_master_id).await?;

        let existing = item_warranty_rule::Entity::find()
            .filter(item_warranty_rule::Column::ItemMasterId.eq(item_master_id))
            .filter(item_warranty_rule::Column::RuleKind.eq(kind.as_str()))
            .filter(item_warranty_rule::Column::Value.eq(value))
            .one(db)
            .await?;
        if let Some(rule) = existing {
            return Ok(rule);
        }

        let created = item_warranty_rule::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_master_id: Set(item_master_id),
            rule_kind: Set(kind.as_str().to_string()),
            value: Set(value),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(created)
    }

    /// Attaches a maintenance-schedule rule to a catalog item.
    #[instrument(skip(self))]
    pub async fn add_service_rule(
        &self,
        item_master_id: Uuid,
        kind: RuleKind,
        value: Decimal,
    ) -> Result<item_service_rule::Model, ServiceError> {
        validate_rule_value(value)?;
        let db = self.db.as_ref();
        self.get_item_master(item_master_id).await?;

        let existing = item_service_rule::Entity::find()
            .filter(item_service_rule::Column::ItemMasterId.eq(item_master_id))
            .filter(item_service_rule::Column::RuleKind.eq(kind.as_str()))
            .filter(item_service_rule::Column::Value.eq(value))
            .one(db)
            .await?;
        if let Some(rule) = existing {
            return Ok(rule);
        }

        let created = item_service_rule::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_master_id: Set(item_master_id),
            rule_kind: Set(kind.as_str().to_string()),
            value: Set(value),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn warranty_rules(
        &self,
        item_master_id: Uuid,
    ) -> Result<Vec<item_warranty_rule::Model>, ServiceError> {
        let rules = item_warranty_rule::Entity::find()
            .filter(item_warranty_rule::Column::ItemMasterId.eq(item_master_id))
            .order_by_asc(item_warranty_rule::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(rules)
    }

    #[instrument(skip(self))]
    pub async fn service_rules(
        &self,
        item_master_id: Uuid,
    ) -> Result<Vec<item_service_rule::Model>, ServiceError> {
        let rules = item_service_rule::Entity::find()
            .filter(item_service_rule::Column::ItemMasterId.eq(item_master_id))
            .order_by_asc(item_service_rule::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;
        Ok(rules)
    }

    #[instrument(skip(self))]
    pub async fn create_inventory_item(
        &self,
        input: CreateInventoryItem,
    ) -> Result<inventory_item::Model, ServiceError> {
        let db = self.db.as_ref();
        self.get_item_master(input.item_master_id).await?;

        let created = inventory_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_master_id: Set(input.item_master_id),
            serial_no: Set(input.serial_no.trim().to_string()),
            production_date: Set(input.production_date),
            created_by: Set(input.created_by),
            in_use: Set(false),
            ..Default::default()
        }
        .insert(db)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get_inventory_item(
        &self,
        id: Uuid,
    ) -> Result<inventory_item::Model, ServiceError> {
        inventory_item::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Inventory item {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn list_inventory_items(
        &self,
        page: u64,
        limit: u64,
        filter: InventoryFilter,
    ) -> Result<(Vec<inventory_item::Model>, u64), ServiceError> {
        let db = self.db.as_ref();

        let mut query = inventory_item::Entity::find();
        if let Some(item_master_id) = filter.item_master_id {
            query = query.filter(inventory_item::Column::ItemMasterId.eq(item_master_id));
        }
        if let Some(in_use) = filter.in_use {
            query = query.filter(inventory_item::Column::InUse.eq(in_use));
        }

        let total = query.clone().count(db).await?;
        let offset = page.saturating_sub(1) * limit;
        let items = query
            .order_by_desc(inventory_item::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok((items, total))
    }
}

fn validate_rule_value(value: Decimal) -> Result<(), ServiceError> {
    if value <= Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "rule value must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Marks an inventory item as in use, if and only if it is currently free.
///
/// Single conditional UPDATE; the affected-row count is the success signal,
/// so two concurrent installations of the same item cannot both win.
pub(crate) async fn reserve_inventory_item<C: ConnectionTrait>(
    db: &C,
    item_id: Uuid,
) -> Result<bool, sea_orm::DbErr> {
    let result = inventory_item::Entity::update_many()
        .col_expr(inventory_item::Column::InUse, Expr::value(true))
        .col_expr(
            inventory_item::Column::UpdatedAt,
            Expr::value(Some(Utc::now())),
        )
        .filter(inventory_item::Column::Id.eq(item_id))
        .filter(inventory_item::Column::InUse.eq(false))
        .exec(db)
        .await?;

    Ok(result.rows_affected == 1)
}

/// Frees an inventory item, e.g. after it was swapped out of an installation.
pub(crate) async fn release_inventory_item<C: ConnectionTrait>(
    db: &C,
    item_id: Uuid,
) -> Result<(), sea_orm::DbErr> {
    inventory_item::Entity::update_many()
        .col_expr(inventory_item::Column::InUse, Expr::value(false))
        .col_expr(
            inventory_item::Column::UpdatedAt,
            Expr::value(Some(Utc::now())),
        )
        .filter(inventory_item::Column::Id.eq(item_id))
        .exec(db)
        .await?;
    Ok(())
}
