pub mod app;
pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod report;
pub mod state;
pub mod stats;
pub mod storage;
pub mod summary;
pub mod weather;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use stats::{compute_dashboard, compute_report, compute_report_with, CorrelationPolicy};
pub use storage::load_data;
