use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One inventory item placed at one end-user customer site. Creating an
/// installation fans out warranty and service follow-ups.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "installations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// User who performed the installation.
    pub installer_id: Uuid,
    pub inventory_item_id: Uuid,
    pub customer_id: Uuid,
    pub setup_date: DateTime<Utc>,
    pub location_latitude: Option<Decimal>,
    pub location_longitude: Option<Decimal>,
    pub location_address: Option<String>,
    pub installation_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn has_location(&self) -> bool {
        self.location_latitude.is_some() && self.location_longitude.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CustomerId",
        to = "super::company::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::inventory_item::Entity",
        from = "Column::InventoryItemId",
        to = "super::inventory_item::Column::Id"
    )]
    InventoryItem,
    #[sea_orm(has_many = "super::warranty_follow_up::Entity")]
    WarrantyFollowUps,
    #[sea_orm(has_many = "super::service_follow_up::Entity")]
    ServiceFollowUps,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
    }
}

impl Related<super::inventory_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InventoryItem.def()
    }
}

impl Related<super::warranty_follow_up::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WarrantyFollowUps.def()
    }
}

impl Related<super::service_follow_up::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceFollowUps.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        }

        active_model.updated_at = Set(Some(now));

        Ok(active_model)
    }
}
