//! Worker Store
//!
//! Canonical list of workers, held in memory and mirrored to a JSON file.
//!
//! Writes go through [`WorkerStore::mutate`]: the write lock is taken, the
//! change is applied to a copy, the copy is persisted, and only then does it
//! replace the in-memory list. The lock makes the store a single writer so
//! concurrent requests cannot lose each other's updates, and a failed file
//! write leaves memory and disk in agreement.
//!
//! Lookups of unknown ids return `None`; callers turn that into a 404.

mod json_file;

pub use json_file::JsonFile;

use crewdesk_common::time;
use crewdesk_common::{
    CallStats, ChecklistKey, DirectoryMember, Error, NewWorker, Note, Result, StatsCounts,
    Worker, WorkerPatch,
};
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Outcome of an upsert by email
#[derive(Debug, Clone, PartialEq)]
pub enum Upserted {
    Added(Worker),
    Updated(Worker),
}

impl Upserted {
    pub fn worker(&self) -> &Worker {
        match self {
            Upserted::Added(w) | Upserted::Updated(w) => w,
        }
    }

    pub fn is_added(&self) -> bool {
        matches!(self, Upserted::Added(_))
    }
}

pub struct WorkerStore {
    workers: RwLock<Vec<Worker>>,
    file: Option<JsonFile>,
}

impl WorkerStore {
    /// Open a file-backed store, loading the existing file wholesale
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let file = JsonFile::new(path);
        let workers = file.load().await?;
        Ok(Self {
            workers: RwLock::new(workers),
            file: Some(file),
        })
    }

    /// Store without persistence
    pub fn in_memory() -> Self {
        Self::with_workers(Vec::new())
    }

    /// In-memory store seeded with `workers`
    pub fn with_workers(workers: Vec<Worker>) -> Self {
        Self {
            workers: RwLock::new(workers),
            file: None,
        }
    }

    pub async fn list(&self) -> Vec<Worker> {
        self.workers.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.workers.read().await.len()
    }

    pub async fn get(&self, id: &str) -> Option<Worker> {
        self.workers.read().await.iter().find(|w| w.id == id).cloned()
    }

    pub async fn find_by_email(&self, email: &str) -> Option<Worker> {
        self.workers
            .read()
            .await
            .iter()
            .find(|w| w.has_email(email))
            .cloned()
    }

    /// Create a worker with a fresh id and default checklist, stats and
    /// payment schedule
    pub async fn add(&self, input: NewWorker) -> Result<Worker> {
        if input.name.trim().is_empty() || input.email.trim().is_empty() {
            return Err(Error::InvalidInput("Name and email are required".to_string()));
        }

        let created = self
            .mutate(|workers| {
                if workers.iter().any(|w| w.has_email(&input.email)) {
                    return Err(duplicate_email(&input.email));
                }
                let worker = Worker::create(input, time::today());
                workers.push(worker.clone());
                Ok(Some(worker))
            })
            .await?
            .ok_or_else(|| Error::Internal("Worker was not created".to_string()))?;

        info!(worker_id = %created.id, email = %created.email, "Added worker");
        Ok(created)
    }

    /// Shallow-merge `patch` into the worker and restamp `updatedAt`
    pub async fn update(&self, id: &str, patch: WorkerPatch) -> Result<Option<Worker>> {
        let blank = |value: &Option<String>| value.as_deref().map_or(false, |v| v.trim().is_empty());
        if blank(&patch.name) || blank(&patch.email) {
            return Err(Error::InvalidInput("Name and email cannot be empty".to_string()));
        }

        self.mutate(|workers| {
            if let Some(email) = &patch.email {
                if workers.iter().any(|w| w.id != id && w.has_email(email)) {
                    return Err(duplicate_email(email));
                }
            }
            let Some(worker) = workers.iter_mut().find(|w| w.id == id) else {
                return Ok(None);
            };
            worker.apply_patch(patch);
            worker.updated_at = time::today();
            Ok(Some(worker.clone()))
        })
        .await
    }

    /// Insert or refresh a worker seen in the directory
    ///
    /// An existing worker (matched by case-insensitive email) only gets its
    /// `name` and `foreignId` refreshed; checklist, notes, stats and payment
    /// info stay untouched.
    pub async fn upsert_by_email(&self, member: &DirectoryMember) -> Result<Upserted> {
        if member.email.trim().is_empty() {
            return Err(Error::InvalidInput("Directory member has no email".to_string()));
        }

        self.mutate(|workers| {
            let today = time::today();
            if let Some(worker) = workers.iter_mut().find(|w| w.has_email(&member.email)) {
                worker.name = member.name.clone();
                worker.foreign_id = Some(member.foreign_id.clone());
                worker.updated_at = today;
                return Ok(Some(Upserted::Updated(worker.clone())));
            }

            let worker = Worker::create(
                NewWorker {
                    name: member.name.clone(),
                    email: member.email.clone(),
                    foreign_id: Some(member.foreign_id.clone()),
                    ..Default::default()
                },
                today,
            );
            workers.push(worker.clone());
            Ok(Some(Upserted::Added(worker)))
        })
        .await?
        .ok_or_else(|| Error::Internal("Upsert produced no worker".to_string()))
    }

    /// Delete a worker; `false` when the id is unknown
    pub async fn remove(&self, id: &str) -> Result<bool> {
        let removed = self
            .mutate(|workers| {
                let Some(index) = workers.iter().position(|w| w.id == id) else {
                    return Ok(None);
                };
                Ok(Some(workers.remove(index)))
            })
            .await?;

        match removed {
            Some(worker) => {
                info!(worker_id = %worker.id, email = %worker.email, "Removed worker");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn set_checklist_item(
        &self,
        id: &str,
        key: ChecklistKey,
        value: bool,
    ) -> Result<Option<Worker>> {
        self.mutate(|workers| {
            let Some(worker) = workers.iter_mut().find(|w| w.id == id) else {
                return Ok(None);
            };
            worker.checklist.set(key, value);
            worker.updated_at = time::today();
            debug!(worker_id = %id, key = %key, value, "Checklist item set");
            Ok(Some(worker.clone()))
        })
        .await
    }

    /// Append a note; earlier notes are never touched
    pub async fn append_note(&self, id: &str, content: &str, author: &str) -> Result<Option<Note>> {
        self.mutate(|workers| {
            let Some(worker) = workers.iter_mut().find(|w| w.id == id) else {
                return Ok(None);
            };
            let note = Note::new(content, author);
            worker.notes.push(note.clone());
            worker.updated_at = time::today();
            Ok(Some(note))
        })
        .await
    }

    /// Replace the stats record wholesale and stamp the sync time
    pub async fn overwrite_stats(&self, id: &str, counts: StatsCounts) -> Result<Option<Worker>> {
        self.mutate(|workers| {
            let Some(worker) = workers.iter_mut().find(|w| w.id == id) else {
                return Ok(None);
            };
            worker.stats = CallStats::from_counts(counts, Some(chrono::Utc::now()));
            worker.updated_at = time::today();
            Ok(Some(worker.clone()))
        })
        .await
    }

    /// Apply `change` to a copy of the list under the write lock
    ///
    /// `Ok(None)` means nothing changed: no write happens.
    async fn mutate<T, F>(&self, change: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut Vec<Worker>) -> Result<Option<T>>,
    {
        let mut guard = self.workers.write().await;
        let mut next = guard.clone();

        let Some(out) = change(&mut next)? else {
            return Ok(None);
        };

        if let Some(file) = &self.file {
            file.save(&next).await?;
        }
        *guard = next;
        Ok(Some(out))
    }
}

fn duplicate_email(email: &str) -> Error {
    Error::Conflict(format!("A worker with email {} already exists", email.trim()))
}
