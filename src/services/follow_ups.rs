use crate::{
    access::CompanyScope,
    db::DbPool,
    entities::{installation, service_follow_up, warranty_follow_up},
    errors::ServiceError,
    scheduling::{FollowUpPriority, DUE_SOON_WINDOW_DAYS},
};
use chrono::{Duration, Utc};
use sea_orm::{
    ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait, Select,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ServiceFollowUpFilter {
    pub installation_id: Option<Uuid>,
    pub completed: Option<bool>,
    pub priority: Option<FollowUpPriority>,
}

/// Aggregate counts shown on the dashboard, computed within the caller's
/// company scope.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_installations: u64,
    pub active_warranties: u64,
    /// Warranties expiring within the next 30 days.
    pub expiring_warranties: u64,
    pub open_services: u64,
    pub overdue_services: u64,
    pub completed_services: u64,
}

/// Read-side service over warranty and service follow-ups
#[derive(Clone)]
pub struct FollowUpService {
    db: Arc<DbPool>,
}

impl FollowUpService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, scope))]
    pub async fn list_warranty_follow_ups(
        &self,
        scope: &CompanyScope,
        installation_id: Option<Uuid>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<warranty_follow_up::Model>, u64), ServiceError> {
        let db = self.db.as_ref();

        let mut query = warranty_follow_up::Entity::find();
        match scope {
            CompanyScope::Unrestricted => {}
            CompanyScope::Companies(ids) => {
                if ids.is_empty() {
                    return Ok((Vec::new(), 0));
                }
                query = scoped_by_installation(query, ids.clone());
            }
        }
        if let Some(installation_id) = installation_id {
            query = query.filter(warranty_follow_up::Column::InstallationId.eq(installation_id));
        }

        let total = query.clone().count(db).await?;
        let offset = page.saturating_sub(1) * limit;
        let rows = query
            .order_by_asc(warranty_follow_up::Column::EndOfWarrantyDate)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok((rows, total))
    }

    #[instrument(skip(self, scope))]
    pub async fn get_service_follow_up(
        &self,
        scope: &CompanyScope,
        id: Uuid,
    ) -> Result<service_follow_up::Model, ServiceError> {
        let db = self.db.as_ref();
        let follow_up = service_follow_up::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Service follow-up {} not found", id)))?;

        let parent = installation::Entity::find_by_id(follow_up.installation_id)
            .one(db)
            .await?;
        match parent {
            Some(installation) if scope.permits(installation.customer_id) => Ok(follow_up),
            _ => Err(ServiceError::NotFound(format!(
                "Service follow-up {} not found",
                id
            ))),
        }
    }

    #[instrument(skip(self, scope))]
    pub async fn list_service_follow_ups(
        &self,
        scope: &CompanyScope,
        filter: ServiceFollowUpFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<service_follow_up::Model>, u64), ServiceError> {
        let db = self.db.as_ref();

        let mut query = service_follow_up::Entity::find();
        match scope {
            CompanyScope::Unrestricted => {}
            CompanyScope::Companies(ids) => {
                if ids.is_empty() {
                    return Ok((Vec::new(), 0));
                }
                query = query
                    .join(
                        JoinType::InnerJoin,
                        service_follow_up::Relation::Installation.def(),
                    )
                    .filter(installation::Column::CustomerId.is_in(ids.clone()));
            }
        }

        if let Some(installation_id) = filter.installation_id {
            query = query.filter(service_follow_up::Column::InstallationId.eq(installation_id));
        }
        if let Some(completed) = filter.completed {
            query = query.filter(service_follow_up::Column::IsCompleted.eq(completed));
        }
        if let Some(priority) = filter.priority {
            let now = Utc::now();
            let due_soon_edge = now + Duration::days(DUE_SOON_WINDOW_DAYS);
            query = match priority {
                FollowUpPriority::Done => {
                    query.filter(service_follow_up::Column::IsCompleted.eq(true))
                }
                FollowUpPriority::Overdue => query
                    .filter(service_follow_up::Column::IsCompleted.eq(false))
                    .filter(service_follow_up::Column::NextServiceDate.lte(now)),
                FollowUpPriority::DueSoon => query
                    .filter(service_follow_up::Column::IsCompleted.eq(false))
                    .filter(service_follow_up::Column::NextServiceDate.gt(now))
                    .filter(service_follow_up::Column::NextServiceDate.lte(due_soon_edge)),
                FollowUpPriority::Pending => query
                    .filter(service_follow_up::Column::IsCompleted.eq(false))
                    .filter(service_follow_up::Column::NextServiceDate.gt(due_soon_edge)),
            };
        }

        let total = query.clone().count(db).await?;
        let offset = page.saturating_sub(1) * limit;
        let rows = query
            .order_by_asc(service_follow_up::Column::NextServiceDate)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok((rows, total))
    }

    #[instrument(skip(self, scope))]
    pub async fn dashboard_stats(
        &self,
        scope: &CompanyScope,
    ) -> Result<DashboardStats, ServiceError> {
        let db = self.db.as_ref();
        let now = Utc::now();
        let expiring_edge = now + Duration::days(DUE_SOON_WINDOW_DAYS);

        if scope.is_empty() {
            return Ok(DashboardStats {
                total_installations: 0,
                active_warranties: 0,
                expiring_warranties: 0,
                open_services: 0,
                overdue_services: 0,
                completed_services: 0,
            });
        }

        let mut installations = installation::Entity::find();
        let mut warranties = warranty_follow_up::Entity::find();
        let mut warranties_expiring = warranty_follow_up::Entity::find();
        let mut services_open = service_follow_up::Entity::find();
        let mut services_overdue = service_follow_up::Entity::find();
        let mut services_done = service_follow_up::Entity::find();

        if let CompanyScope::Companies(ids) = scope {
            installations =
                installations.filter(installation::Column::CustomerId.is_in(ids.clone()));
            warranties = scoped_by_installation(warranties, ids.clone());
            warranties_expiring = scoped_by_installation(warranties_expiring, ids.clone());
            services_open = scoped_service_by_installation(services_open, ids.clone());
            services_overdue = scoped_service_by_installation(services_overdue, ids.clone());
            services_done = scoped_service_by_installation(services_done, ids.clone());
        }

        let total_installations = installations.count(db).await?;
        let active_warranties = warranties
            .filter(warranty_follow_up::Column::EndOfWarrantyDate.gt(now))
            .count(db)
            .await?;
        let expiring_warranties = warranties_expiring
            .filter(warranty_follow_up::Column::EndOfWarrantyDate.gt(now))
            .filter(warranty_follow_up::Column::EndOfWarrantyDate.lte(expiring_edge))
            .count(db)
            .await?;
        let open_services = services_open
            .filter(service_follow_up::Column::IsCompleted.eq(false))
            .count(db)
            .await?;
        let overdue_services = services_overdue
            .filter(service_follow_up::Column::IsCompleted.eq(false))
            .filter(service_follow_up::Column::NextServiceDate.lte(now))
            .count(db)
            .await?;
        let completed_services = services_done
            .filter(service_follow_up::Column::IsCompleted.eq(true))
            .count(db)
            .await?;

        Ok(DashboardStats {
            total_installations,
            active_warranties,
            expiring_warranties,
            open_services,
            overdue_services,
            completed_services,
        })
    }
}

fn scoped_by_installation(
    query: Select<warranty_follow_up::Entity>,
    company_ids: Vec<Uuid>,
) -> Select<warranty_follow_up::Entity> {
    query
        .join(
            JoinType::InnerJoin,
            warranty_follow_up::Relation::Installation.def(),
        )
        .filter(installation::Column::CustomerId.is_in(company_ids))
}

fn scoped_service_by_installation(
    query: Select<service_follow_up::Entity>,
    company_ids: Vec<Uuid>,
) -> Select<service_follow_up::Entity> {
    query
        .join(
            JoinType::InnerJoin,
            service_follow_up::Relation::Installation.def(),
        )
        .filter(installation::Column::CustomerId.is_in(company_ids))
}
