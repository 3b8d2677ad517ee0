mod common;

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use servicetrack_api::{
    entities::{inventory_item, service_follow_up, warranty_follow_up},
    errors::ServiceError,
    scheduling::RuleKind,
    services::installations::{CreateInstallation, UpdateInstallation},
};
use uuid::Uuid;

use common::TestApp;

fn create_input(
    customer_id: Uuid,
    inventory_item_id: Uuid,
    setup_date: chrono::DateTime<Utc>,
) -> CreateInstallation {
    CreateInstallation {
        installer_id: Uuid::new_v4(),
        inventory_item_id,
        customer_id,
        setup_date: Some(setup_date),
        location_latitude: None,
        location_longitude: None,
        location_address: None,
        installation_notes: None,
    }
}

#[tokio::test]
async fn item_without_catalog_rules_gets_default_follow_ups() {
    let app = TestApp::new().await;
    let customer = app.seed_enduser("Acme Mills").await;
    let item = app.seed_item("PMP-1", "Coolant Pump").await;
    let unit = app.seed_unit(item.id, "SN-001").await;

    let setup = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let (installation, report) = app
        .state
        .installation_service()
        .create_installation(create_input(customer.id, unit.id, setup))
        .await
        .expect("create installation");

    // One default warranty rule: time_term(6)
    assert_eq!(report.warranty_follow_ups.len(), 1);
    let warranty = &report.warranty_follow_ups[0];
    assert_eq!(warranty.warranty_type, "time_term");
    assert_eq!(warranty.warranty_value, Decimal::from(6));
    assert_eq!(warranty.end_of_warranty_date, setup + Duration::days(180));

    // Two default service rules: time_term(6) and working_hours(1000)
    assert_eq!(report.service_follow_ups.len(), 2);
    let time_term = report
        .service_follow_ups
        .iter()
        .find(|f| f.service_type == "time_term")
        .expect("time_term default");
    assert_eq!(time_term.service_value, Decimal::from(6));
    assert_eq!(time_term.next_service_date, setup + Duration::days(180));
    assert!(!time_term.is_completed);

    // No working-hours profile: assumed 40h week, 1000/40*7 = 175 days,
    // and the row is tagged as degraded
    let working_hours = report
        .service_follow_ups
        .iter()
        .find(|f| f.service_type == "working_hours")
        .expect("working_hours default");
    assert_eq!(working_hours.service_value, Decimal::from(1000));
    assert_eq!(
        working_hours.next_service_date,
        setup + Duration::days(175)
    );
    assert!(working_hours.used_fallback);
    assert!(working_hours
        .calculation_notes
        .contains("default 40 hours/week"));

    let _ = installation;
}

#[tokio::test]
async fn catalog_rules_drive_the_fan_out() {
    let app = TestApp::new().await;
    let customer = app.seed_enduser("Borek Dairy").await;
    // 5 days x 8h = 40h/week
    app.set_working_hours(customer.id, 8.0, false, false).await;

    let item = app.seed_item("CMP-2", "Screw Compressor").await;
    app.state
        .catalog_service()
        .add_warranty_rule(item.id, RuleKind::TimeTerm, Decimal::from(12))
        .await
        .unwrap();
    app.state
        .catalog_service()
        .add_warranty_rule(item.id, RuleKind::WorkingHours, Decimal::from(2000))
        .await
        .unwrap();
    app.state
        .catalog_service()
        .add_service_rule(item.id, RuleKind::WorkingHours, Decimal::from(1000))
        .await
        .unwrap();

    let unit = app.seed_unit(item.id, "SN-002").await;
    let setup = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let (_, report) = app
        .state
        .installation_service()
        .create_installation(create_input(customer.id, unit.id, setup))
        .await
        .expect("create installation");

    assert_eq!(report.warranty_follow_ups.len(), 2);

    // 12 "months" of 30 days each: lands in late December, not on the
    // calendar anniversary
    let time_term = report
        .warranty_follow_ups
        .iter()
        .find(|f| f.warranty_type == "time_term")
        .unwrap();
    assert_eq!(time_term.end_of_warranty_date, setup + Duration::days(360));
    assert_ne!(
        time_term.end_of_warranty_date,
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    );
    assert!(!time_term.used_fallback);

    // 2000h at 40h/week = 50 weeks = 350 days, computed from the real profile
    let hours_based = report
        .warranty_follow_ups
        .iter()
        .find(|f| f.warranty_type == "working_hours")
        .unwrap();
    assert_eq!(
        hours_based.end_of_warranty_date,
        setup + Duration::days(350)
    );
    assert!(!hours_based.used_fallback);

    // Catalog had a service rule, so no defaults are added
    assert_eq!(report.service_follow_ups.len(), 1);
    assert_eq!(
        report.service_follow_ups[0].next_service_date,
        setup + Duration::days(175)
    );
}

#[tokio::test]
async fn fan_out_is_idempotent() {
    let app = TestApp::new().await;
    let customer = app.seed_enduser("Idempotent Co").await;
    let item = app.seed_item("FAN-1", "Axial Fan").await;
    let unit = app.seed_unit(item.id, "SN-003").await;

    let setup = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let (installation, first) = app
        .state
        .installation_service()
        .create_installation(create_input(customer.id, unit.id, setup))
        .await
        .unwrap();
    assert_eq!(first.created_count(), 3);

    let second = app
        .state
        .installation_service()
        .fan_out(installation.id)
        .await
        .expect("re-run fan-out");
    assert_eq!(second.created_count(), 0);

    let warranty_count = warranty_follow_up::Entity::find()
        .filter(warranty_follow_up::Column::InstallationId.eq(installation.id))
        .all(app.state.db.as_ref())
        .await
        .unwrap()
        .len();
    let service_count = service_follow_up::Entity::find()
        .filter(service_follow_up::Column::InstallationId.eq(installation.id))
        .all(app.state.db.as_ref())
        .await
        .unwrap()
        .len();
    assert_eq!(warranty_count, 1);
    assert_eq!(service_count, 2);
}

#[tokio::test]
async fn an_item_can_only_be_installed_once() {
    let app = TestApp::new().await;
    let customer = app.seed_enduser("Single Use Co").await;
    let other = app.seed_enduser("Other Site").await;
    let item = app.seed_item("GEN-1", "Diesel Generator").await;
    let unit = app.seed_unit(item.id, "SN-004").await;

    let setup = Utc::now();
    app.state
        .installation_service()
        .create_installation(create_input(customer.id, unit.id, setup))
        .await
        .expect("first installation succeeds");

    let result = app
        .state
        .installation_service()
        .create_installation(create_input(other.id, unit.id, setup))
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    // The losing attempt wrote nothing
    let installations = servicetrack_api::entities::installation::Entity::find()
        .all(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(installations.len(), 1);
}

#[tokio::test]
async fn installations_require_enduser_customers() {
    let app = TestApp::new().await;
    let distributor = app
        .seed_company(
            "Parts Distributor",
            servicetrack_api::entities::company::CompanyType::Distributor,
            None,
            None,
        )
        .await;
    let item = app.seed_item("VLV-1", "Control Valve").await;
    let unit = app.seed_unit(item.id, "SN-005").await;

    let result = app
        .state
        .installation_service()
        .create_installation(create_input(distributor.id, unit.id, Utc::now()))
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    // The item was not reserved by the failed attempt
    let unit = inventory_item::Entity::find_by_id(unit.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert!(!unit.in_use);
}

#[tokio::test]
async fn swapping_the_item_frees_the_old_unit() {
    let app = TestApp::new().await;
    let customer = app.seed_enduser("Swap Co").await;
    let item = app.seed_item("MTR-1", "Electric Motor").await;
    let old_unit = app.seed_unit(item.id, "SN-006").await;
    let new_unit = app.seed_unit(item.id, "SN-007").await;

    let (installation, _) = app
        .state
        .installation_service()
        .create_installation(create_input(customer.id, old_unit.id, Utc::now()))
        .await
        .unwrap();

    let updated = app
        .state
        .installation_service()
        .update_installation(
            &app.unrestricted(),
            installation.id,
            UpdateInstallation {
                inventory_item_id: Some(new_unit.id),
                ..Default::default()
            },
        )
        .await
        .expect("swap item");
    assert_eq!(updated.inventory_item_id, new_unit.id);

    let old_unit = inventory_item::Entity::find_by_id(old_unit.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    let new_unit = inventory_item::Entity::find_by_id(new_unit.id)
        .one(app.state.db.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert!(!old_unit.in_use);
    assert!(new_unit.in_use);
}
