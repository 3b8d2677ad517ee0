use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scheduling::{self, FollowUpPriority};

/// One link of a maintenance chain. Completion closes the row and spawns a
/// successor with a freshly computed due date; completed rows are the audit
/// trail and are never deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_follow_ups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub installation_id: Uuid,
    pub service_type: String,
    pub service_value: Decimal,
    pub next_service_date: DateTime<Utc>,
    pub is_completed: bool,
    pub completed_date: Option<DateTime<Utc>>,
    pub calculation_notes: String,
    pub used_fallback: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && now >= self.next_service_date
    }

    pub fn priority(&self, now: DateTime<Utc>) -> FollowUpPriority {
        scheduling::priority(self.next_service_date, self.is_completed, now)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::installation::Entity",
        from = "Column::InstallationId",
        to = "super::installation::Column::Id"
    )]
    Installation,
    #[sea_orm(has_one = "super::maintenance_record::Entity")]
    MaintenanceRecord,
}

impl Related<super::installation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Installation.def()
    }
}

impl Related<super::maintenance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MaintenanceRecord.def()
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
