use axum::routing::{get, post};
use axum::Router;

use crate::handlers::runs;
use crate::state::AppState;

/// ```text
/// GET    /workspaces/{id}/runs    -> list_runs
/// POST   /workspaces/{id}/runs    -> create_run
/// GET    /runs/{id}               -> get_run
/// GET    /runs/{id}/plan-log      -> get_plan_log
/// GET    /runs/{id}/apply-log     -> get_apply_log
/// POST   /runs/{id}/approve       -> approve_run
/// POST   /runs/{id}/discard       -> discard_run
/// POST   /runs/{id}/cancel        -> cancel_run
/// POST   /runs/{id}/progress      -> report_progress
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/workspaces/{id}/runs",
            get(runs::list_runs).post(runs::create_run),
        )
        .route("/runs/{id}", get(runs::get_run))
        .route("/runs/{id}/plan-log", get(runs::get_plan_log))
        .route("/runs/{id}/apply-log", get(runs::get_apply_log))
        .route("/runs/{id}/approve", post(runs::approve_run))
        .route("/runs/{id}/discard", post(runs::discard_run))
        .route("/runs/{id}/cancel", post(runs::cancel_run))
        .route("/runs/{id}/progress", post(runs::report_progress))
}
