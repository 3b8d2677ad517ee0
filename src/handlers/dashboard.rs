use crate::{
    access::{self, UserContext},
    services::follow_ups::DashboardStats,
    ApiResponse, ApiResult, AppState,
};
use axum::{extract::State, response::Json, routing::get, Router};

pub fn routes() -> Router<AppState> {
    Router::new().route("/stats", get(dashboard_stats))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = ApiResponse<DashboardStats>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    tag = "dashboard"
)]
pub async fn dashboard_stats(
    State(state): State<AppState>,
    user: UserContext,
) -> ApiResult<DashboardStats> {
    let scope = access::resolve_scope(state.db.as_ref(), &user).await?;
    let stats = state.follow_up_service().dashboard_stats(&scope).await?;
    Ok(Json(ApiResponse::success(stats)))
}
