//! Reconciliation of external data into the worker store
//!
//! Directory sync upserts each member by email and optionally prunes
//! directory-created workers that vanished upstream. Stats sync overwrites
//! each worker's stats record. Both loops record per-item failures and
//! carry on; neither is transactional.

use crewdesk_common::{
    DirectoryMember, Result, StatsCounts, StatsInterval, Worker, WorkerStatus,
};
use serde::Serialize;
use tracing::{info, warn};

use super::myphoner_client::{CallStatsClient, CallStatsError};
use crate::store::WorkerStore;

/// Failure for a single item inside a bulk sync
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemError {
    pub email: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectoryReconcileReport {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// Members received from the directory
    pub total: usize,
    pub errors: Vec<ItemError>,
}

impl DirectoryReconcileReport {
    pub fn message(&self) -> String {
        let mut message = format!(
            "Synced {} employees from WordPress. Added {} new, updated {}.",
            self.total, self.added, self.updated
        );
        if self.removed > 0 {
            message.push_str(&format!(" Removed {}.", self.removed));
        }
        message
    }
}

/// Outcome of stats sync for one worker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSyncResult {
    pub id: String,
    pub name: String,
    pub synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatsSyncResult {
    fn synced(worker: &Worker) -> Self {
        Self {
            id: worker.id.clone(),
            name: worker.name.clone(),
            synced: true,
            error: None,
        }
    }

    fn failed(worker: &Worker, error: impl Into<String>) -> Self {
        Self {
            id: worker.id.clone(),
            name: worker.name.clone(),
            synced: false,
            error: Some(error.into()),
        }
    }
}

/// Upsert every directory member, then prune when asked
///
/// Pruning only ever removes workers carrying a `foreignId`; manually added
/// workers are left alone.
pub async fn reconcile_directory(
    store: &WorkerStore,
    members: &[DirectoryMember],
    prune: bool,
) -> DirectoryReconcileReport {
    let mut report = DirectoryReconcileReport {
        total: members.len(),
        ..Default::default()
    };

    for member in members {
        match store.upsert_by_email(member).await {
            Ok(outcome) if outcome.is_added() => report.added += 1,
            Ok(_) => report.updated += 1,
            Err(e) => {
                warn!(email = %member.email, error = %e, "Failed to upsert directory member");
                report.errors.push(ItemError {
                    email: member.email.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if prune {
        let stale: Vec<Worker> = store
            .list()
            .await
            .into_iter()
            .filter(|w| w.foreign_id.is_some())
            .filter(|w| !members.iter().any(|m| w.has_email(&m.email)))
            .collect();

        for worker in stale {
            match store.remove(&worker.id).await {
                Ok(true) => report.removed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(worker_id = %worker.id, error = %e, "Failed to prune worker");
                    report.errors.push(ItemError {
                        email: worker.email.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    info!(
        added = report.added,
        updated = report.updated,
        removed = report.removed,
        errors = report.errors.len(),
        "Directory reconciliation complete"
    );
    report
}

/// Overwrite one worker's stats; `None` when the worker is gone
pub async fn reconcile_stats(
    store: &WorkerStore,
    worker_id: &str,
    counts: StatsCounts,
) -> Result<Option<Worker>> {
    store.overwrite_stats(worker_id, counts).await
}

/// Sync stats for every worker in turn
///
/// Inactive workers are skipped. Each failure is recorded against its
/// worker and the loop moves on.
pub async fn sync_all_stats(
    store: &WorkerStore,
    client: &CallStatsClient,
    interval: StatsInterval,
) -> Vec<StatsSyncResult> {
    let workers = store.list().await;
    let mut results = Vec::with_capacity(workers.len());

    for worker in &workers {
        if worker.status == WorkerStatus::Inactive {
            results.push(StatsSyncResult::failed(worker, "Inactive worker"));
            continue;
        }

        let result = match client.fetch_stats_for_member(&worker.email, interval).await {
            Ok(agent_stats) => match reconcile_stats(store, &worker.id, agent_stats.counts).await {
                Ok(Some(_)) => StatsSyncResult::synced(worker),
                Ok(None) => StatsSyncResult::failed(worker, "Worker not found"),
                Err(e) => StatsSyncResult::failed(worker, e.to_string()),
            },
            Err(CallStatsError::NotFound(_)) => {
                StatsSyncResult::failed(worker, "Agent not found in MyPhoner")
            }
            Err(e) => {
                warn!(worker_id = %worker.id, error = %e, "Stats sync failed");
                StatsSyncResult::failed(worker, e.to_string())
            }
        };
        results.push(result);
    }

    info!(
        interval = %interval,
        synced = results.iter().filter(|r| r.synced).count(),
        total = results.len(),
        "Stats sync complete"
    );
    results
}
