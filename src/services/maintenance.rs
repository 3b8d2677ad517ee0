use crate::{
    access::CompanyScope,
    db::DbPool,
    entities::{installation, maintenance_record, maintenance_record::MaintenanceKind},
    entities::{service_follow_up, service_form_entry, spare_part_usage},
    errors::ServiceError,
    events::{Event, EventSender},
    scheduling::{self, RuleKind},
    services::customers,
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

lazy_static! {
    static ref MAINTENANCE_COMPLETIONS: IntCounter = IntCounter::new(
        "maintenance_completions_total",
        "Total number of maintenance completions processed"
    )
    .expect("metric can be created");
    static ref MAINTENANCE_COMPLETION_FAILURES: IntCounter = IntCounter::new(
        "maintenance_completion_failures_total",
        "Total number of failed maintenance completions"
    )
    .expect("metric can be created");
}

#[derive(Debug, Clone)]
pub struct SparePartInput {
    pub item_master_id: Uuid,
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServiceFormInput {
    pub form_name: String,
    pub completed: bool,
}

#[derive(Debug, Clone)]
pub struct CompleteMaintenance {
    pub service_follow_up_id: Uuid,
    pub maintenance_type: MaintenanceKind,
    pub technician_id: Uuid,
    pub breakdown_reason: Option<String>,
    pub notes: Option<String>,
    /// When the work was actually done; base date of the successor.
    pub service_date: Option<DateTime<Utc>>,
    pub spare_parts: Vec<SparePartInput>,
    pub service_forms: Vec<ServiceFormInput>,
}

/// Result of one chain advancement: the closed follow-up, the record of the
/// work done, and the freshly scheduled successor.
#[derive(Debug)]
pub struct MaintenanceOutcome {
    pub record: maintenance_record::Model,
    pub completed_follow_up: service_follow_up::Model,
    pub successor: service_follow_up::Model,
}

/// Maintenance records plus their child rows.
#[derive(Debug)]
pub struct MaintenanceRecordDetail {
    pub record: maintenance_record::Model,
    pub spare_parts: Vec<spare_part_usage::Model>,
    pub service_forms: Vec<service_form_entry::Model>,
}

/// Service for recording maintenance and advancing the follow-up chain
#[derive(Clone)]
pub struct MaintenanceService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl MaintenanceService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Completes a service follow-up: closes it, records the work, and
    /// schedules the next follow-up in the chain.
    #[instrument(skip(self, scope))]
    pub async fn complete_maintenance(
        &self,
        scope: &CompanyScope,
        input: CompleteMaintenance,
    ) -> Result<MaintenanceOutcome, ServiceError> {
        let result = self.complete_maintenance_inner(scope, input).await;
        match &result {
            Ok(_) => MAINTENANCE_COMPLETIONS.inc(),
            Err(_) => MAINTENANCE_COMPLETION_FAILURES.inc(),
        }
        result
    }

    async fn complete_maintenance_inner(
        &self,
        scope: &CompanyScope,
        input: CompleteMaintenance,
    ) -> Result<MaintenanceOutcome, ServiceError> {
        // The only hard validation gate in the chain: breakdowns need a
        // reason, checked before any state change.
        if input.maintenance_type == MaintenanceKind::Breakdown
            && input
                .breakdown_reason
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .is_empty()
        {
            return Err(ServiceError::ValidationError(
                "breakdown maintenance requires a breakdown reason".to_string(),
            ));
        }
        if input.spare_parts.iter().any(|part| part.quantity < 1) {
            return Err(ServiceError::ValidationError(
                "spare part quantity must be at least 1".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let follow_up = service_follow_up::Entity::find_by_id(input.service_follow_up_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Service follow-up {} not found",
                    input.service_follow_up_id
                ))
            })?;

        let parent = installation::Entity::find_by_id(follow_up.installation_id)
            .one(&txn)
            .await?
            .filter(|i| scope.permits(i.customer_id))
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Service follow-up {} not found",
                    input.service_follow_up_id
                ))
            })?;

        let now = Utc::now();
        let service_date = input.service_date.unwrap_or(now);

        // Close the follow-up with a conditional update; losing the race to
        // another completion surfaces as zero affected rows, not a double
        // state transition.
        let closed = service_follow_up::Entity::update_many()
            .col_expr(service_follow_up::Column::IsCompleted, Expr::value(true))
            .col_expr(
                service_follow_up::Column::CompletedDate,
                Expr::value(Some(service_date)),
            )
            .col_expr(
                service_follow_up::Column::UpdatedAt,
                Expr::value(Some(now)),
            )
            .filter(service_follow_up::Column::Id.eq(follow_up.id))
            .filter(service_follow_up::Column::IsCompleted.eq(false))
            .exec(&txn)
            .await?;
        if closed.rows_affected == 0 {
            return Err(ServiceError::Conflict(format!(
                "service follow-up {} is already completed",
                follow_up.id
            )));
        }

        let record = maintenance_record::ActiveModel {
            id: Set(Uuid::new_v4()),
            service_follow_up_id: Set(follow_up.id),
            maintenance_type: Set(input.maintenance_type.as_str().to_string()),
            technician_id: Set(input.technician_id),
            breakdown_reason: Set(input.breakdown_reason.clone()),
            notes: Set(input.notes.clone()),
            service_date: Set(service_date),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for part in &input.spare_parts {
            spare_part_usage::ActiveModel {
                id: Set(Uuid::new_v4()),
                maintenance_record_id: Set(record.id),
                item_master_id: Set(part.item_master_id),
                quantity: Set(part.quantity),
                notes: Set(part.notes.clone()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        for form in &input.service_forms {
            service_form_entry::ActiveModel {
                id: Set(Uuid::new_v4()),
                maintenance_record_id: Set(record.id),
                form_name: Set(form.form_name.clone()),
                completed: Set(form.completed),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        let successor = spawn_successor(&txn, &follow_up, &parent, service_date).await?;

        let completed_follow_up = service_follow_up::Entity::find_by_id(follow_up.id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "service follow-up {} vanished during completion",
                    follow_up.id
                ))
            })?;

        txn.commit().await?;

        info!(
            follow_up_id = %follow_up.id,
            record_id = %record.id,
            successor_id = %successor.id,
            next_due = %successor.next_service_date,
            "Maintenance completed, chain advanced"
        );

        self.event_sender
            .send_or_log(Event::ServiceFollowUpCompleted {
                follow_up_id: follow_up.id,
                maintenance_record_id: record.id,
                successor_id: successor.id,
            })
            .await;
        self.event_sender
            .send_or_log(Event::ServiceFollowUpScheduled {
                installation_id: parent.id,
                follow_up_id: successor.id,
                next_service_date: successor.next_service_date,
            })
            .await;

        Ok(MaintenanceOutcome {
            record,
            completed_follow_up,
            successor,
        })
    }

    #[instrument(skip(self, scope))]
    pub async fn get_maintenance_record(
        &self,
        scope: &CompanyScope,
        id: Uuid,
    ) -> Result<MaintenanceRecordDetail, ServiceError> {
        let db = self.db.as_ref();

        let record = maintenance_record::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Maintenance record {} not found", id))
            })?;

        let follow_up = service_follow_up::Entity::find_by_id(record.service_follow_up_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Maintenance record {} not found", id))
            })?;
        let parent = installation::Entity::find_by_id(follow_up.installation_id)
            .one(db)
            .await?;
        if !matches!(parent, Some(ref i) if scope.permits(i.customer_id)) {
            return Err(ServiceError::NotFound(format!(
                "Maintenance record {} not found",
                id
            )));
        }

        let spare_parts = spare_part_usage::Entity::find()
            .filter(spare_part_usage::Column::MaintenanceRecordId.eq(record.id))
            .all(db)
            .await?;
        let service_forms = service_form_entry::Entity::find()
            .filter(service_form_entry::Column::MaintenanceRecordId.eq(record.id))
            .all(db)
            .await?;

        Ok(MaintenanceRecordDetail {
            record,
            spare_parts,
            service_forms,
        })
    }

    #[instrument(skip(self, scope))]
    pub async fn list_maintenance_records(
        &self,
        scope: &CompanyScope,
        page: u64,
        limit: u64,
        installation_id: Option<Uuid>,
    ) -> Result<(Vec<maintenance_record::Model>, u64), ServiceError> {
        let db = self.db.as_ref();

        let mut query = maintenance_record::Entity::find();
        let needs_join = !matches!(scope, CompanyScope::Unrestricted) || installation_id.is_some();
        if needs_join {
            query = query.join(
                JoinType::InnerJoin,
                maintenance_record::Relation::ServiceFollowUp.def(),
            );
        }

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
        if let Some(installation_id) = installation_id {
            query = query.filter(service_follow_up::Column::InstallationId.eq(installation_id));
        }

        let total = query.clone().count(db).await?;
        let offset = page.saturating_sub(1) * limit;
        let records = query
            .order_by_desc(maintenance_record::Column::ServiceDate)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok((records, total))
    }
}

/// Schedules the next follow-up in the chain: same rule, base date = the
/// maintenance's actual service date. A failed working-hours profile lookup
/// degrades to a fixed six-month interval instead of propagating.
async fn spawn_successor<C: ConnectionTrait>(
    db: &C,
    predecessor: &service_follow_up::Model,
    parent: &installation::Model,
    base: DateTime<Utc>,
) -> Result<service_follow_up::Model, ServiceError> {
    let computed = match predecessor.service_type.parse::<RuleKind>() {
        Ok(kind) => match customers::work_week_for(db, parent.customer_id).await {
            Ok(work_week) => scheduling::due_date(
                kind,
                predecessor.service_value,
                base,
                work_week.as_ref(),
            ),
            Err(err) => {
                warn!(
                    follow_up_id = %predecessor.id,
                    error = %err,
                    "Working-hours lookup failed, scheduling successor with fixed interval"
                );
                scheduling::fallback_due(base)
            }
        },
        Err(_) => {
            warn!(
                follow_up_id = %predecessor.id,
                service_type = %predecessor.service_type,
                "Unknown service type, scheduling successor with fixed interval"
            );
            scheduling::fallback_due(base)
        }
    };

    let (due, notes, used_fallback) = computed.into_parts();
    let successor = service_follow_up::ActiveModel {
        id: Set(Uuid::new_v4()),
        installation_id: Set(predecessor.installation_id),
        service_type: Set(predecessor.service_type.clone()),
        service_value: Set(predecessor.service_value),
        next_service_date: Set(due),
        is_completed: Set(false),
        completed_date: Set(None),
        calculation_notes: Set(notes),
        used_fallback: Set(used_fallback),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(successor)
}
