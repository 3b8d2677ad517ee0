use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// What kind of maintenance was performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceKind {
    Periodic,
    Breakdown,
}

impl MaintenanceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceKind::Periodic => "periodic",
            MaintenanceKind::Breakdown => "breakdown",
        }
    }
}

/// What was actually done when a service follow-up was completed.
/// One-to-one with its follow-up.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "maintenance_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_follow_up_id: Uuid,
    pub maintenance_type: String,
    pub technician_id: Uuid,
    /// Required non-empty for breakdown maintenance.
    pub breakdown_reason: Option<String>,
    pub notes: Option<String>,
    pub service_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_follow_up::Entity",
        from = "Column::ServiceFollowUpId",
        to = "super::service_follow_up::Column::Id"
    )]
    ServiceFollowUp,
    #[sea_orm(has_many = "super::spare_part_usage::Entity")]
    SparePartUsages,
    #[sea_orm(has_many = "super::service_form_entry::Entity")]
    ServiceFormEntries,
}

impl Related<super::service_follow_up::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceFollowUp.def()
    }
}

impl Related<super::spare_part_usage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SparePartUsages.def()
    }
}

impl Related<super::service_form_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceFormEntries.def()
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
