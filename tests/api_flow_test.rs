mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{TestApp, TestUser};

#[tokio::test]
async fn requests_without_identity_are_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::GET, "/api/v1/installations", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn full_install_and_maintenance_flow_over_http() {
    let app = TestApp::new().await;
    let admin = TestUser::manager_main();

    // Customer
    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/customers",
            Some(&admin),
            Some(json!({
                "name": "Flow Dairy",
                "company_type": "enduser"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let customer_id = body["data"]["id"].as_str().unwrap().to_string();

    // Working-hours profile: 5 x 8h
    let (status, _) = app
        .request_json(
            Method::PUT,
            &format!("/api/v1/customers/{customer_id}/working-hours"),
            Some(&admin),
            Some(json!({"daily_working_hours": 8.0})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Catalog item with one time-based warranty rule
    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/items",
            Some(&admin),
            Some(json!({"shortcode": "FLW-1", "name": "Pasteurizer"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let item_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .request_json(
            Method::POST,
            &format!("/api/v1/items/{item_id}/warranty-rules"),
            Some(&admin),
            Some(json!({"rule_kind": "time_term", "value": 12})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Physical unit
    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/inventory",
            Some(&admin),
            Some(json!({"item_master_id": item_id, "serial_no": "SN-HTTP-1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let unit_id = body["data"]["id"].as_str().unwrap().to_string();

    // Installation triggers the fan-out
    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/installations",
            Some(&admin),
            Some(json!({
                "inventory_item_id": unit_id,
                "customer_id": customer_id,
                "setup_date": "2024-01-01T00:00:00Z"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["warranty_follow_ups"].as_array().unwrap().len(), 1);
    assert_eq!(
        data["warranty_follow_ups"][0]["end_of_warranty_date"]
            .as_str()
            .unwrap(),
        "2024-12-26T00:00:00Z"
    );
    // No catalog service rules: the two defaults appear
    let service_follow_ups = data["service_follow_ups"].as_array().unwrap();
    assert_eq!(service_follow_ups.len(), 2);
    let follow_up_id = service_follow_ups
        .iter()
        .find(|f| f["service_type"] == "time_term")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    // Installing the same unit again is rejected
    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/installations",
            Some(&admin),
            Some(json!({
                "inventory_item_id": unit_id,
                "customer_id": customer_id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Breakdown without a reason is rejected up front
    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/maintenance-records",
            Some(&admin),
            Some(json!({
                "service_follow_up_id": follow_up_id,
                "maintenance_type": "breakdown"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Periodic completion advances the chain
    let (status, body) = app
        .request_json(
            Method::POST,
            "/api/v1/maintenance-records",
            Some(&admin),
            Some(json!({
                "service_follow_up_id": follow_up_id,
                "maintenance_type": "periodic",
                "service_date": "2024-06-15T00:00:00Z"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["completed_follow_up"]["is_completed"], true);
    assert_eq!(data["successor"]["is_completed"], false);
    assert_eq!(
        data["successor"]["next_service_date"].as_str().unwrap(),
        "2024-12-12T00:00:00Z"
    );

    // Completing the same follow-up again conflicts
    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/maintenance-records",
            Some(&admin),
            Some(json!({
                "service_follow_up_id": follow_up_id,
                "maintenance_type": "periodic"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The audit trail and the successor are both listed
    let (status, body) = app
        .request_json(
            Method::GET,
            "/api/v1/service-follow-ups?completed=true",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"].as_u64(), Some(1));

    let (status, body) = app
        .request_json(
            Method::GET,
            "/api/v1/service-follow-ups?completed=false",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"].as_u64(), Some(2));

    // Dashboard aggregates reflect the state
    let (status, body) = app
        .request_json(Method::GET, "/api/v1/dashboard/stats", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"];
    assert_eq!(stats["total_installations"].as_u64(), Some(1));
    assert_eq!(stats["completed_services"].as_u64(), Some(1));
    assert_eq!(stats["open_services"].as_u64(), Some(2));
}

#[tokio::test]
async fn distributor_cannot_see_foreign_installations_over_http() {
    let app = TestApp::new().await;
    let admin = TestUser::manager_main();

    let distributor = app
        .seed_company(
            "Scoped Distributor",
            servicetrack_api::entities::company::CompanyType::Distributor,
            None,
            None,
        )
        .await;
    let foreign = app.seed_enduser("Foreign Site").await;
    let item = app.seed_item("HTTP-2", "Chiller").await;
    let unit = app.seed_unit(item.id, "SN-HTTP-2").await;

    let (status, _) = app
        .request_json(
            Method::POST,
            "/api/v1/installations",
            Some(&admin),
            Some(json!({
                "inventory_item_id": unit.id,
                "customer_id": foreign.id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let scoped_user = TestUser::distributor_manager(distributor.id);
    let (status, body) = app
        .request_json(Method::GET, "/api/v1/installations", Some(&scoped_user), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"].as_u64(), Some(0));
}

#[tokio::test]
async fn invalid_working_hours_are_rejected() {
    let app = TestApp::new().await;
    let admin = TestUser::manager_main();
    let customer = app.seed_enduser("Hours Co").await;

    for daily in [0.0, -1.0, 25.0] {
        let (status, _) = app
            .request_json(
                Method::PUT,
                &format!("/api/v1/customers/{}/working-hours", customer.id),
                Some(&admin),
                Some(json!({"daily_working_hours": daily})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "daily = {daily}");
    }
}
