pub mod customers;
pub mod dashboard;
pub mod follow_ups;
pub mod installations;
pub mod items;
pub mod maintenance;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub customers: Arc<crate::services::customers::CustomerService>,
    pub catalog: Arc<crate::services::catalog::CatalogService>,
    pub installations: Arc<crate::services::installations::InstallationService>,
    pub follow_ups: Arc<crate::services::follow_ups::FollowUpService>,
    pub maintenance: Arc<crate::services::maintenance::MaintenanceService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            customers: Arc::new(crate::services::customers::CustomerService::new(db.clone())),
            catalog: Arc::new(crate::services::catalog::CatalogService::new(db.clone())),
            installations: Arc::new(crate::services::installations::InstallationService::new(
                db.clone(),
                event_sender.clone(),
            )),
            follow_ups: Arc::new(crate::services::follow_ups::FollowUpService::new(db.clone())),
            maintenance: Arc::new(crate::services::maintenance::MaintenanceService::new(
                db,
                event_sender,
            )),
        }
    }
}
