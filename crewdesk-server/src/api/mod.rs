//! HTTP API handlers for crewdesk-server

pub mod accounting;
pub mod dashboard;
pub mod health;
pub mod sync;
pub mod workers;

pub use accounting::accounting_routes;
pub use dashboard::dashboard_routes;
pub use health::health_routes;
pub use sync::sync_routes;
pub use workers::worker_routes;
