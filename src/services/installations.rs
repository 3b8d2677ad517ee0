use crate::{
    access::CompanyScope,
    db::DbPool,
    entities::{company, installation, inventory_item, item_warranty_rule},
    entities::{item_service_rule, service_follow_up, warranty_follow_up},
    errors::ServiceError,
    events::{Event, EventSender},
    scheduling::{self, RuleKind},
    services::{catalog, customers},
};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use prometheus::IntCounter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Warranty rule applied when the catalog item carries none.
const DEFAULT_WARRANTY_MONTHS: i64 = 6;
/// Service rules applied when the catalog item carries none.
const DEFAULT_SERVICE_MONTHS: i64 = 6;
const DEFAULT_SERVICE_HOURS: i64 = 1000;

lazy_static! {
    static ref INSTALLATION_CREATIONS: IntCounter = IntCounter::new(
        "installation_creations_total",
        "Total number of installations created"
    )
    .expect("metric can be created");
    static ref INSTALLATION_CREATION_FAILURES: IntCounter = IntCounter::new(
        "installation_creation_failures_total",
        "Total number of failed installation creations"
    )
    .expect("metric can be created");
    static ref FOLLOW_UPS_FANNED_OUT: IntCounter = IntCounter::new(
        "follow_ups_fanned_out_total",
        "Total number of follow-up rows created by installation fan-out"
    )
    .expect("metric can be created");
}

#[derive(Debug, Clone)]
pub struct CreateInstallation {
    pub installer_id: Uuid,
    pub inventory_item_id: Uuid,
    pub customer_id: Uuid,
    pub setup_date: Option<DateTime<Utc>>,
    pub location_latitude: Option<Decimal>,
    pub location_longitude: Option<Decimal>,
    pub location_address: Option<String>,
    pub installation_notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateInstallation {
    pub inventory_item_id: Option<Uuid>,
    pub location_latitude: Option<Decimal>,
    pub location_longitude: Option<Decimal>,
    pub location_address: Option<String>,
    pub installation_notes: Option<String>,
}

/// Follow-up rows produced by one fan-out pass. Rows that already existed
/// (get-or-create hits) are not listed.
#[derive(Debug, Default)]
pub struct FanOutReport {
    pub warranty_follow_ups: Vec<warranty_follow_up::Model>,
    pub service_follow_ups: Vec<service_follow_up::Model>,
}

impl FanOutReport {
    pub fn created_count(&self) -> usize {
        self.warranty_follow_ups.len() + self.service_follow_ups.len()
    }
}

/// Service for equipment installations and their follow-up fan-out
#[derive(Clone)]
pub struct InstallationService {
    db: Arc<DbPool>,
    event_sender: EventSender,
}

impl InstallationService {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Creates an installation, reserving the inventory item and fanning out
    /// warranty and service follow-ups in the same transaction.
    #[instrument(skip(self))]
    pub async fn create_installation(
        &self,
        input: CreateInstallation,
    ) -> Result<(installation::Model, FanOutReport), ServiceError> {
        let result = self.create_installation_inner(input).await;
        match &result {
            Ok(_) => INSTALLATION_CREATIONS.inc(),
            Err(_) => INSTALLATION_CREATION_FAILURES.inc(),
        }
        result
    }

    async fn create_installation_inner(
        &self,
        input: CreateInstallation,
    ) -> Result<(installation::Model, FanOutReport), ServiceError> {
        let txn = self.db.begin().await?;

        let customer = company::Entity::find_by_id(input.customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Company {} not found", input.customer_id))
            })?;
        if !customer.is_enduser() {
            return Err(ServiceError::ValidationError(
                "installations can only be made for end-user customers".to_string(),
            ));
        }

        let item = inventory_item::Entity::find_by_id(input.inventory_item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Inventory item {} not found",
                    input.inventory_item_id
                ))
            })?;

        if !catalog::reserve_inventory_item(&txn, item.id).await? {
            return Err(ServiceError::ValidationError(format!(
                "inventory item {} is already in use",
                item.id
            )));
        }

        let created = installation::ActiveModel {
            id: Set(Uuid::new_v4()),
            installer_id: Set(input.installer_id),
            inventory_item_id: Set(item.id),
            customer_id: Set(customer.id),
            setup_date: Set(input.setup_date.unwrap_or_else(Utc::now)),
            location_latitude: Set(input.location_latitude),
            location_longitude: Set(input.location_longitude),
            location_address: Set(input.location_address),
            installation_notes: Set(input.installation_notes),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let report = fan_out_follow_ups(&txn, &created).await?;

        txn.commit().await?;

        FOLLOW_UPS_FANNED_OUT.inc_by(report.created_count() as u64);
        info!(
            installation_id = %created.id,
            warranty_follow_ups = report.warranty_follow_ups.len(),
            service_follow_ups = report.service_follow_ups.len(),
            "Installation created"
        );

        self.event_sender
            .send_or_log(Event::InstallationCreated(created.id))
            .await;
        for follow_up in &report.warranty_follow_ups {
            self.event_sender
                .send_or_log(Event::WarrantyFollowUpScheduled {
                    installation_id: created.id,
                    follow_up_id: follow_up.id,
                    end_of_warranty_date: follow_up.end_of_warranty_date,
                })
                .await;
        }
        for follow_up in &report.service_follow_ups {
            self.event_sender
                .send_or_log(Event::ServiceFollowUpScheduled {
                    installation_id: created.id,
                    follow_up_id: follow_up.id,
                    next_service_date: follow_up.next_service_date,
                })
                .await;
        }

        Ok((created, report))
    }

    /// Re-runs the fan-out for an existing installation. Idempotent:
    /// rows already present for a (kind, value) key are left untouched.
    #[instrument(skip(self))]
    pub async fn fan_out(&self, installation_id: Uuid) -> Result<FanOutReport, ServiceError> {
        let txn = self.db.begin().await?;
        let installation = installation::Entity::find_by_id(installation_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Installation {} not found", installation_id))
            })?;
        let report = fan_out_follow_ups(&txn, &installation).await?;
        txn.commit().await?;
        Ok(report)
    }

    /// Updates mutable installation fields. Swapping the inventory item
    /// reserves the new item and frees the previous one; follow-ups are not
    /// recomputed.
    #[instrument(skip(self, scope))]
    pub async fn update_installation(
        &self,
        scope: &CompanyScope,
        id: Uuid,
        input: UpdateInstallation,
    ) -> Result<installation::Model, ServiceError> {
        let txn = self.db.begin().await?;

        let existing = installation::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .filter(|i| scope.permits(i.customer_id))
            .ok_or_else(|| ServiceError::NotFound(format!("Installation {} not found", id)))?;

        let previous_item_id = existing.inventory_item_id;
        let mut active: installation::ActiveModel = existing.into();

        if let Some(new_item_id) = input.inventory_item_id {
            if new_item_id != previous_item_id {
                inventory_item::Entity::find_by_id(new_item_id)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Inventory item {} not found", new_item_id))
                    })?;
                if !catalog::reserve_inventory_item(&txn, new_item_id).await? {
                    return Err(ServiceError::ValidationError(format!(
                        "inventory item {} is already in use",
                        new_item_id
                    )));
                }
                catalog::release_inventory_item(&txn, previous_item_id).await?;
                active.inventory_item_id = Set(new_item_id);
            }
        }

        if let Some(latitude) = input.location_latitude {
            active.location_latitude = Set(Some(latitude));
        }
        if let Some(longitude) = input.location_longitude {
            active.location_longitude = Set(Some(longitude));
        }
        if let Some(address) = input.location_address {
            active.location_address = Set(Some(address));
        }
        if let Some(notes) = input.installation_notes {
            active.installation_notes = Set(Some(notes));
        }

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::InstallationUpdated(updated.id))
            .await;

        Ok(updated)
    }

    #[instrument(skip(self, scope))]
    pub async fn get_installation(
        &self,
        scope: &CompanyScope,
        id: Uuid,
    ) -> Result<installation::Model, ServiceError> {
        installation::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .filter(|i| scope.permits(i.customer_id))
            .ok_or_else(|| ServiceError::NotFound(format!("Installation {} not found", id)))
    }

    #[instrument(skip(self, scope))]
    pub async fn list_installations(
        &self,
        scope: &CompanyScope,
        page: u64,
        limit: u64,
        customer_id: Option<Uuid>,
    ) -> Result<(Vec<installation::Model>, u64), ServiceError> {
        let db = self.db.as_ref();

        let mut query = installation::Entity::find();
        match scope {
            CompanyScope::Unrestricted => {}
            CompanyScope::Companies(ids) => {
                if ids.is_empty() {
                    return Ok((Vec::new(), 0));
                }
                query = query.filter(installation::Column::CustomerId.is_in(ids.clone()));
            }
        }
        if let Some(customer_id) = customer_id {
            query = query.filter(installation::Column::CustomerId.eq(customer_id));
        }

        let total = query.clone().count(db).await?;
        let offset = page.saturating_sub(1) * limit;
        let installations = query
            .order_by_desc(installation::Column::SetupDate)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok((installations, total))
    }
}

/// Creates every follow-up implied by the installed item's catalog rules.
///
/// Get-or-create per (installation, kind, value): a second pass over the
/// same installation adds nothing. Items with no catalog warranty rules get
/// one default time-term rule; items with no service rules get a time-term
/// and a working-hours default.
async fn fan_out_follow_ups<C: ConnectionTrait>(
    db: &C,
    installation: &installation::Model,
) -> Result<FanOutReport, ServiceError> {
    let item = inventory_item::Entity::find_by_id(installation.inventory_item_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!(
                "Inventory item {} not found",
                installation.inventory_item_id
            ))
        })?;

    let work_week = customers::work_week_for(db, installation.customer_id).await?;

    let mut warranty_rules: Vec<(RuleKind, Decimal)> = item_warranty_rule::Entity::find()
        .filter(item_warranty_rule::Column::ItemMasterId.eq(item.item_master_id))
        .order_by_asc(item_warranty_rule::Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|rule| {
            rule.rule_kind
                .parse::<RuleKind>()
                .ok()
                .map(|kind| (kind, rule.value))
        })
        .collect();
    if warranty_rules.is_empty() {
        warranty_rules.push((RuleKind::TimeTerm, Decimal::from(DEFAULT_WARRANTY_MONTHS)));
    }

    let mut service_rules: Vec<(RuleKind, Decimal)> = item_service_rule::Entity::find()
        .filter(item_service_rule::Column::ItemMasterId.eq(item.item_master_id))
        .order_by_asc(item_service_rule::Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|rule| {
            rule.rule_kind
                .parse::<RuleKind>()
                .ok()
                .map(|kind| (kind, rule.value))
        })
        .collect();
    if service_rules.is_empty() {
        service_rules.push((RuleKind::TimeTerm, Decimal::from(DEFAULT_SERVICE_MONTHS)));
        service_rules.push((RuleKind::WorkingHours, Decimal::from(DEFAULT_SERVICE_HOURS)));
    }

    let mut report = FanOutReport::default();

    for (kind, value) in warranty_rules {
        let existing = warranty_follow_up::Entity::find()
            .filter(warranty_follow_up::Column::InstallationId.eq(installation.id))
            .filter(warranty_follow_up::Column::WarrantyType.eq(kind.as_str()))
            .filter(warranty_follow_up::Column::WarrantyValue.eq(value))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        let (due, notes, used_fallback) =
            scheduling::due_date(kind, value, installation.setup_date, work_week.as_ref())
                .into_parts();
        let row = warranty_follow_up::ActiveModel {
            id: Set(Uuid::new_v4()),
            installation_id: Set(installation.id),
            warranty_type: Set(kind.as_str().to_string()),
            warranty_value: Set(value),
            end_of_warranty_date: Set(due),
            calculation_notes: Set(notes),
            used_fallback: Set(used_fallback),
            ..Default::default()
        }
        .insert(db)
        .await?;
        report.warranty_follow_ups.push(row);
    }

    for (kind, value) in service_rules {
        let existing = service_follow_up::Entity::find()
            .filter(service_follow_up::Column::InstallationId.eq(installation.id))
            .filter(service_follow_up::Column::ServiceType.eq(kind.as_str()))
            .filter(service_follow_up::Column::ServiceValue.eq(value))
            .filter(service_follow_up::Column::IsCompleted.eq(false))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        let (due, notes, used_fallback) =
            scheduling::due_date(kind, value, installation.setup_date, work_week.as_ref())
                .into_parts();
        let row = service_follow_up::ActiveModel {
            id: Set(Uuid::new_v4()),
            installation_id: Set(installation.id),
            service_type: Set(kind.as_str().to_string()),
            service_value: Set(value),
            next_service_date: Set(due),
            is_completed: Set(false),
            completed_date: Set(None),
            calculation_notes: Set(notes),
            used_fallback: Set(used_fallback),
            ..Default::default()
        }
        .insert(db)
        .await?;
        report.service_follow_ups.push(row);
    }

    Ok(report)
}
