//! Integration adapters and the domain logic built on top of them

pub mod dashboard;
pub mod luca_client;
pub mod myphoner_client;
pub mod reconcile;
pub mod wordpress_client;

pub use dashboard::{compute_dashboard_stats, DashboardStats};
pub use luca_client::{AccountingClient, AccountingError};
pub use myphoner_client::{CallStatsClient, CallStatsError};
pub use reconcile::{reconcile_directory, reconcile_stats, sync_all_stats};
pub use wordpress_client::{DirectoryClient, DirectoryError};

use serde::Deserialize;

const USER_AGENT: &str = concat!("crewdesk/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client setup for every upstream
fn build_http_client(timeout: std::time::Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    message: Option<String>,
}

/// Error text for a non-2xx upstream response: the body's `message` field
/// when present, else `HTTP <code>: <reason>`
async fn describe_failure(response: reqwest::Response) -> String {
    let status = response.status();
    let message = response
        .json::<UpstreamErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message)
        .filter(|m| !m.trim().is_empty());

    message.unwrap_or_else(|| {
        format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )
    })
}
