mod common;

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use servicetrack_api::{
    entities::{maintenance_record::MaintenanceKind, service_follow_up},
    errors::ServiceError,
    services::installations::CreateInstallation,
    services::maintenance::{CompleteMaintenance, ServiceFormInput, SparePartInput},
};
use uuid::Uuid;

use common::TestApp;

struct ChainFixture {
    app: TestApp,
    installation_id: Uuid,
    time_term_follow_up: service_follow_up::Model,
    working_hours_follow_up: service_follow_up::Model,
}

async fn fixture(with_working_hours: bool) -> ChainFixture {
    let app = TestApp::new().await;
    let customer = app.seed_enduser("Chain Co").await;
    if with_working_hours {
        app.set_working_hours(customer.id, 8.0, false, false).await;
    }
    let item = app.seed_item("PRS-1", "Hydraulic Press").await;
    let unit = app.seed_unit(item.id, "SN-100").await;

    let (installation, report) = app
        .state
        .installation_service()
        .create_installation(CreateInstallation {
            installer_id: Uuid::new_v4(),
            inventory_item_id: unit.id,
            customer_id: customer.id,
            setup_date: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            location_latitude: None,
            location_longitude: None,
            location_address: None,
            installation_notes: None,
        })
        .await
        .expect("create installation");

    let time_term_follow_up = report
        .service_follow_ups
        .iter()
        .find(|f| f.service_type == "time_term")
        .unwrap()
        .clone();
    let working_hours_follow_up = report
        .service_follow_ups
        .iter()
        .find(|f| f.service_type == "working_hours")
        .unwrap()
        .clone();

    ChainFixture {
        app,
        installation_id: installation.id,
        time_term_follow_up,
        working_hours_follow_up,
    }
}

fn completion(follow_up_id: Uuid, kind: MaintenanceKind) -> CompleteMaintenance {
    CompleteMaintenance {
        service_follow_up_id: follow_up_id,
        maintenance_type: kind,
        technician_id: Uuid::new_v4(),
        breakdown_reason: None,
        notes: None,
        service_date: None,
        spare_parts: Vec::new(),
        service_forms: Vec::new(),
    }
}

#[tokio::test]
async fn completion_closes_the_row_and_spawns_one_successor() {
    let fx = fixture(false).await;
    let service_date = Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap();

    let outcome = fx
        .app
        .state
        .maintenance_service()
        .complete_maintenance(
            &fx.app.unrestricted(),
            CompleteMaintenance {
                service_date: Some(service_date),
                ..completion(fx.time_term_follow_up.id, MaintenanceKind::Periodic)
            },
        )
        .await
        .expect("complete maintenance");

    // The completed row survives as the audit trail
    assert_eq!(outcome.completed_follow_up.id, fx.time_term_follow_up.id);
    assert!(outcome.completed_follow_up.is_completed);
    assert_eq!(
        outcome.completed_follow_up.completed_date,
        Some(service_date)
    );

    // Exactly one successor: same rule, base date = the actual service date
    assert_ne!(outcome.successor.id, fx.time_term_follow_up.id);
    assert!(!outcome.successor.is_completed);
    assert_eq!(outcome.successor.service_type, "time_term");
    assert_eq!(
        outcome.successor.service_value,
        fx.time_term_follow_up.service_value
    );
    assert_eq!(
        outcome.successor.next_service_date,
        service_date + Duration::days(180)
    );

    let chain_rows = service_follow_up::Entity::find()
        .filter(service_follow_up::Column::InstallationId.eq(fx.installation_id))
        .filter(service_follow_up::Column::ServiceType.eq("time_term"))
        .all(fx.app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(chain_rows.len(), 2);
    assert_eq!(chain_rows.iter().filter(|r| !r.is_completed).count(), 1);
}

#[tokio::test]
async fn successor_uses_the_customer_working_hours() {
    let fx = fixture(true).await;
    let service_date = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();

    let outcome = fx
        .app
        .state
        .maintenance_service()
        .complete_maintenance(
            &fx.app.unrestricted(),
            CompleteMaintenance {
                service_date: Some(service_date),
                ..completion(fx.working_hours_follow_up.id, MaintenanceKind::Periodic)
            },
        )
        .await
        .unwrap();

    // 1000h at 40h/week = 175 days from the service date
    assert_eq!(
        outcome.successor.next_service_date,
        service_date + Duration::days(175)
    );
    assert!(!outcome.successor.used_fallback);
}

#[tokio::test]
async fn successor_degrades_to_assumed_week_without_a_profile() {
    let fx = fixture(false).await;
    let service_date = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();

    let outcome = fx
        .app
        .state
        .maintenance_service()
        .complete_maintenance(
            &fx.app.unrestricted(),
            CompleteMaintenance {
                service_date: Some(service_date),
                ..completion(fx.working_hours_follow_up.id, MaintenanceKind::Periodic)
            },
        )
        .await
        .unwrap();

    assert_eq!(
        outcome.successor.next_service_date,
        service_date + Duration::days(175)
    );
    assert!(outcome.successor.used_fallback);
}

#[tokio::test]
async fn breakdown_requires_a_reason_before_any_state_change() {
    let fx = fixture(false).await;

    let result = fx
        .app
        .state
        .maintenance_service()
        .complete_maintenance(
            &fx.app.unrestricted(),
            completion(fx.time_term_follow_up.id, MaintenanceKind::Breakdown),
        )
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    // Blank reasons do not pass the gate either
    let result = fx
        .app
        .state
        .maintenance_service()
        .complete_maintenance(
            &fx.app.unrestricted(),
            CompleteMaintenance {
                breakdown_reason: Some("   ".to_string()),
                ..completion(fx.time_term_follow_up.id, MaintenanceKind::Breakdown)
            },
        )
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    // Nothing changed: the follow-up is still open, no record exists
    let follow_up = service_follow_up::Entity::find_by_id(fx.time_term_follow_up.id)
        .one(fx.app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert!(!follow_up.is_completed);
    let records = servicetrack_api::entities::maintenance_record::Entity::find()
        .all(fx.app.state.db.as_ref())
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn breakdown_with_reason_is_recorded() {
    let fx = fixture(false).await;

    let outcome = fx
        .app
        .state
        .maintenance_service()
        .complete_maintenance(
            &fx.app.unrestricted(),
            CompleteMaintenance {
                breakdown_reason: Some("Coolant pump seized".to_string()),
                ..completion(fx.time_term_follow_up.id, MaintenanceKind::Breakdown)
            },
        )
        .await
        .expect("breakdown completion");

    assert_eq!(outcome.record.maintenance_type, "breakdown");
    assert_eq!(
        outcome.record.breakdown_reason.as_deref(),
        Some("Coolant pump seized")
    );
}

#[tokio::test]
async fn completing_twice_conflicts_and_adds_nothing() {
    let fx = fixture(false).await;

    fx.app
        .state
        .maintenance_service()
        .complete_maintenance(
            &fx.app.unrestricted(),
            completion(fx.time_term_follow_up.id, MaintenanceKind::Periodic),
        )
        .await
        .expect("first completion");

    let result = fx
        .app
        .state
        .maintenance_service()
        .complete_maintenance(
            &fx.app.unrestricted(),
            completion(fx.time_term_follow_up.id, MaintenanceKind::Periodic),
        )
        .await;
    assert_matches!(result, Err(ServiceError::Conflict(_)));

    // Still exactly one successor in the chain
    let chain_rows = service_follow_up::Entity::find()
        .filter(service_follow_up::Column::InstallationId.eq(fx.installation_id))
        .filter(service_follow_up::Column::ServiceType.eq("time_term"))
        .all(fx.app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(chain_rows.len(), 2);
}

#[tokio::test]
async fn spare_parts_and_forms_are_stored_with_the_record() {
    let fx = fixture(false).await;
    let spare = fx.app.seed_item("SPR-1", "Seal Kit").await;

    let outcome = fx
        .app
        .state
        .maintenance_service()
        .complete_maintenance(
            &fx.app.unrestricted(),
            CompleteMaintenance {
                spare_parts: vec![SparePartInput {
                    item_master_id: spare.id,
                    quantity: 2,
                    notes: Some("Front and rear seals".to_string()),
                }],
                service_forms: vec![ServiceFormInput {
                    form_name: "Safety checklist".to_string(),
                    completed: true,
                }],
                ..completion(fx.time_term_follow_up.id, MaintenanceKind::Periodic)
            },
        )
        .await
        .unwrap();

    let detail = fx
        .app
        .state
        .maintenance_service()
        .get_maintenance_record(&fx.app.unrestricted(), outcome.record.id)
        .await
        .unwrap();
    assert_eq!(detail.spare_parts.len(), 1);
    assert_eq!(detail.spare_parts[0].quantity, 2);
    assert_eq!(detail.service_forms.len(), 1);
    assert!(detail.service_forms[0].completed);
}
