#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    response::Response,
    Router,
};
use sea_orm::{ConnectOptions, Database};
use serde_json::Value;
use servicetrack_api as api;

use api::{
    access::CompanyScope,
    entities::{company, company::CompanyType, inventory_item, item_master, working_hours},
    services::customers::{CreateCustomer, UpsertWorkingHours},
};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// A caller identity for scoped requests.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub role: Option<&'static str>,
    pub company_id: Option<Uuid>,
}

impl TestUser {
    pub fn manager_main() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Some("manager_main"),
            company_id: None,
        }
    }

    pub fn distributor_manager(company_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Some("manager_distributor"),
            company_id: Some(company_id),
        }
    }
}

/// In-process application over an in-memory SQLite database, with the real
/// migrator and router.
pub struct TestApp {
    pub state: api::AppState,
    pub router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        // A pool of one: every pooled connection to sqlite::memory: would
        // otherwise get its own empty database.
        let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
        options.max_connections(1);
        let db = Database::connect(options).await.expect("connect sqlite");
        api::db::run_migrations(&db).await.expect("run migrations");

        let db = Arc::new(db);
        let (event_sender, mut event_rx) = api::events::channel(256);
        tokio::spawn(async move { while event_rx.recv().await.is_some() {} });

        let services = api::handlers::AppServices::new(db.clone(), event_sender.clone());
        let config = api::config::AppConfig {
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            log_level: None,
            log_json: false,
            auto_migrate: false,
            notifications_enabled: false,
            notification_sweep_secs: 3600,
            environment: "test".to_string(),
        };

        let state = api::AppState {
            db,
            config,
            event_sender,
            services,
        };
        let router = Router::new()
            .nest("/api/v1", api::api_v1_routes())
            .with_state(state.clone());

        Self { state, router }
    }

    pub fn unrestricted(&self) -> CompanyScope {
        CompanyScope::Unrestricted
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-user-id", user.id.to_string());
            if let Some(role) = user.role {
                builder = builder.header("x-user-role", role);
            }
            if let Some(company_id) = user.company_id {
                builder = builder.header("x-company-id", company_id.to_string());
            }
        }

        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("route request")
    }

    pub async fn request_json(
        &self,
        method: Method,
        uri: &str,
        user: Option<&TestUser>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.request(method, uri, user, body).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse response body")
        };
        (status, value)
    }

    // Seed helpers, going through the real services

    pub async fn seed_company(
        &self,
        name: &str,
        company_type: CompanyType,
        related_company_id: Option<Uuid>,
        related_manager_id: Option<Uuid>,
    ) -> company::Model {
        self.state
            .customer_service()
            .create_customer(CreateCustomer {
                name: name.to_string(),
                company_type,
                related_company_id,
                related_manager_id,
                tax_number: None,
                email: None,
                telephone: None,
            })
            .await
            .expect("seed company")
    }

    pub async fn seed_enduser(&self, name: &str) -> company::Model {
        self.seed_company(name, CompanyType::Enduser, None, None)
            .await
    }

    pub async fn set_working_hours(
        &self,
        company_id: Uuid,
        daily: f64,
        saturday: bool,
        sunday: bool,
    ) -> working_hours::Model {
        self.state
            .customer_service()
            .upsert_working_hours(
                &CompanyScope::Unrestricted,
                company_id,
                UpsertWorkingHours {
                    daily_working_hours: daily,
                    working_on_saturday: saturday,
                    working_on_sunday: sunday,
                },
            )
            .await
            .expect("seed working hours")
    }

    pub async fn seed_item(&self, shortcode: &str, name: &str) -> item_master::Model {
        self.state
            .catalog_service()
            .create_item_master(api::services::catalog::CreateItemMaster {
                shortcode: shortcode.to_string(),
                name: name.to_string(),
                description: None,
            })
            .await
            .expect("seed item master")
    }

    pub async fn seed_unit(&self, item_master_id: Uuid, serial: &str) -> inventory_item::Model {
        self.state
            .catalog_service()
            .create_inventory_item(api::services::catalog::CreateInventoryItem {
                item_master_id,
                serial_no: serial.to_string(),
                production_date: None,
                created_by: None,
            })
            .await
            .expect("seed inventory item")
    }
}
