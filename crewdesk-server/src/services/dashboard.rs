//! Dashboard summary figures, recomputed from the full worker list on every
//! request

use chrono::NaiveDate;
use crewdesk_common::models::round_one_decimal;
use crewdesk_common::{time, Worker, WorkerStatus};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_workers: usize,
    pub active_workers: usize,
    pub total_meetings: u64,
    pub total_hours: f64,
    pub total_owed: f64,
    pub days_until_payday: i64,
    pub pending_onboarding: usize,
}

pub fn compute_dashboard_stats(workers: &[Worker], today: NaiveDate) -> DashboardStats {
    let count_status = |status: WorkerStatus| workers.iter().filter(|w| w.status == status).count();

    DashboardStats {
        total_workers: workers.len(),
        active_workers: count_status(WorkerStatus::Active),
        total_meetings: workers.iter().map(|w| w.stats.meetings_booked).sum(),
        total_hours: round_one_decimal(workers.iter().map(|w| w.stats.hours_called).sum()),
        total_owed: workers.iter().map(|w| w.payment_info.total_owed).sum(),
        days_until_payday: time::days_until_payday(today),
        pending_onboarding: count_status(WorkerStatus::Onboarding),
    }
}
