use crate::handlers;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route(
            "/api/symptoms",
            get(handlers::list_symptoms).post(handlers::create_symptom),
        )
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/reports/stats", get(handlers::get_stats))
        .route("/api/reports/stats/markdown", get(handlers::get_stats_markdown))
        .route("/api/ai-summary", get(handlers::get_ai_summary))
        .with_state(state)
}
