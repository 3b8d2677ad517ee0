use axum::response::Json;
use utoipa::OpenApi;

/// OpenAPI document for the REST surface, served at `/api/v1/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ServiceTrack API",
        description = "Equipment installation tracking, warranty follow-up and maintenance scheduling"
    ),
    paths(
        crate::handlers::customers::list_customers,
        crate::handlers::customers::get_customer,
        crate::handlers::customers::create_customer,
        crate::handlers::customers::get_working_hours,
        crate::handlers::customers::upsert_working_hours,
        crate::handlers::items::list_item_masters,
        crate::handlers::items::get_item_master,
        crate::handlers::items::create_item_master,
        crate::handlers::items::list_warranty_rules,
        crate::handlers::items::add_warranty_rule,
        crate::handlers::items::list_service_rules,
        crate::handlers::items::add_service_rule,
        crate::handlers::items::list_inventory_items,
        crate::handlers::items::get_inventory_item,
        crate::handlers::items::create_inventory_item,
        crate::handlers::installations::list_installations,
        crate::handlers::installations::get_installation,
        crate::handlers::installations::create_installation,
        crate::handlers::installations::update_installation,
        crate::handlers::follow_ups::list_warranty_follow_ups,
        crate::handlers::follow_ups::list_service_follow_ups,
        crate::handlers::follow_ups::get_service_follow_up,
        crate::handlers::maintenance::complete_maintenance,
        crate::handlers::maintenance::list_maintenance_records,
        crate::handlers::maintenance::get_maintenance_record,
        crate::handlers::dashboard::dashboard_stats,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::handlers::customers::CustomerSummary,
        crate::handlers::customers::WorkingHoursSummary,
        crate::handlers::customers::CreateCustomerRequest,
        crate::handlers::customers::UpsertWorkingHoursRequest,
        crate::handlers::items::ItemMasterSummary,
        crate::handlers::items::CatalogRuleSummary,
        crate::handlers::items::InventoryItemSummary,
        crate::handlers::items::CreateItemMasterRequest,
        crate::handlers::items::AddRuleRequest,
        crate::handlers::items::CreateInventoryItemRequest,
        crate::handlers::installations::InstallationSummary,
        crate::handlers::installations::InstallationCreatedResponse,
        crate::handlers::installations::CreateInstallationRequest,
        crate::handlers::installations::UpdateInstallationRequest,
        crate::handlers::follow_ups::WarrantyFollowUpSummary,
        crate::handlers::follow_ups::ServiceFollowUpSummary,
        crate::handlers::maintenance::MaintenanceRecordSummary,
        crate::handlers::maintenance::SparePartUsageSummary,
        crate::handlers::maintenance::ServiceFormEntrySummary,
        crate::handlers::maintenance::MaintenanceRecordDetailResponse,
        crate::handlers::maintenance::MaintenanceCompletedResponse,
        crate::handlers::maintenance::SparePartRequest,
        crate::handlers::maintenance::ServiceFormRequest,
        crate::handlers::maintenance::CompleteMaintenanceRequest,
        crate::services::follow_ups::DashboardStats,
    )),
    tags(
        (name = "customers", description = "Customer companies and working-hours profiles"),
        (name = "items", description = "Item catalog and its warranty/service rules"),
        (name = "inventory", description = "Physical inventory units"),
        (name = "installations", description = "Equipment installations and follow-up fan-out"),
        (name = "follow-ups", description = "Warranty and service follow-ups"),
        (name = "maintenance", description = "Maintenance records and chain advancement"),
        (name = "dashboard", description = "Aggregate statistics")
    )
)]
pub struct ApiDoc;

pub async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_builds_and_lists_core_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/installations"));
        assert!(paths
            .iter()
            .any(|p| p.as_str() == "/api/v1/maintenance-records"));
        assert!(paths
            .iter()
            .any(|p| p.as_str() == "/api/v1/service-follow-ups"));
    }
}
