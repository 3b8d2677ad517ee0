mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use servicetrack_api::{
    events::{self, Event},
    services::installations::CreateInstallation,
    services::notifications::NotificationService,
};
use uuid::Uuid;

use common::TestApp;

#[tokio::test]
async fn sweep_emits_reminders_for_follow_ups_inside_a_lead_window() {
    let app = TestApp::new().await;
    let customer = app.seed_enduser("Reminder Co").await;
    let item = app.seed_item("RMD-1", "Boiler").await;
    let unit = app.seed_unit(item.id, "SN-RMD-1").await;

    // Backdate the installation so the default 6-month (180-day) follow-up
    // lands exactly 3 days from now, inside the [15, 7, 3, 0] lead windows.
    let setup = Utc::now() - Duration::days(177);
    let (_, report) = app
        .state
        .installation_service()
        .create_installation(CreateInstallation {
            installer_id: Uuid::new_v4(),
            inventory_item_id: unit.id,
            customer_id: customer.id,
            setup_date: Some(setup),
            location_latitude: None,
            location_longitude: None,
            location_address: None,
            installation_notes: None,
        })
        .await
        .unwrap();

    let due_follow_up = report
        .service_follow_ups
        .iter()
        .find(|f| f.service_type == "time_term")
        .unwrap();

    let (sender, mut receiver) = events::channel(64);
    let service = NotificationService::new(app.state.db.clone(), sender);

    // The working-hours default (175 days) is already overdue and must not
    // be picked up; only the time-term row due in 3 days matches.
    let emitted = service.sweep_once().await.expect("sweep");
    assert_eq!(emitted, 1);

    let event = receiver.recv().await.expect("reminder event");
    assert_matches!(
        event,
        Event::ServiceDueReminder {
            follow_up_id,
            days_ahead: 3,
            ..
        } if follow_up_id == due_follow_up.id
    );
}

#[tokio::test]
async fn completed_follow_ups_are_never_reminded() {
    let app = TestApp::new().await;
    let customer = app.seed_enduser("Quiet Co").await;
    let item = app.seed_item("RMD-2", "Burner").await;
    let unit = app.seed_unit(item.id, "SN-RMD-2").await;

    let setup = Utc::now() - Duration::days(177);
    let (_, report) = app
        .state
        .installation_service()
        .create_installation(CreateInstallation {
            installer_id: Uuid::new_v4(),
            inventory_item_id: unit.id,
            customer_id: customer.id,
            setup_date: Some(setup),
            location_latitude: None,
            location_longitude: None,
            location_address: None,
            installation_notes: None,
        })
        .await
        .unwrap();

    let due_follow_up = report
        .service_follow_ups
        .iter()
        .find(|f| f.service_type == "time_term")
        .unwrap();

    // Complete it; the successor lands ~180 days out, far from any window
    app.state
        .maintenance_service()
        .complete_maintenance(
            &app.unrestricted(),
            servicetrack_api::services::maintenance::CompleteMaintenance {
                service_follow_up_id: due_follow_up.id,
                maintenance_type:
                    servicetrack_api::entities::maintenance_record::MaintenanceKind::Periodic,
                technician_id: Uuid::new_v4(),
                breakdown_reason: None,
                notes: None,
                service_date: None,
                spare_parts: Vec::new(),
                service_forms: Vec::new(),
            },
        )
        .await
        .unwrap();

    let (sender, _receiver) = events::channel(64);
    let service = NotificationService::new(app.state.db.clone(), sender);
    let emitted = service.sweep_once().await.expect("sweep");
    assert_eq!(emitted, 0);
}
