//! HTTP API handlers for mira-review

pub mod chart;
pub mod export;
pub mod health;
pub mod review;
pub mod sessions;
pub mod stats;
pub mod sync;
pub mod ui;
pub mod upload;

pub use export::export_routes;
pub use health::health_routes;
pub use review::review_routes;
pub use sessions::session_routes;
pub use stats::stats_routes;
pub use sync::sync_routes;
pub use ui::ui_routes;
pub use upload::upload_routes;
