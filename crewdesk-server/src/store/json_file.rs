//! Whole-file JSON persistence for the worker list
//!
//! The file holds a single JSON array of workers. Reads load it wholesale;
//! writes replace it wholesale through a temp file and rename, so a crash
//! mid-write never leaves a truncated file behind.

use crewdesk_common::{Result, Worker};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load all workers; a missing file is an empty list
    pub async fn load(&self) -> Result<Vec<Worker>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(Vec::new());
                }
                let workers: Vec<Worker> = serde_json::from_slice(&bytes)?;
                info!(
                    count = workers.len(),
                    path = %self.path.display(),
                    "Loaded workers from data file"
                );
                Ok(workers)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No data file yet, starting empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the file contents with `workers`
    pub async fn save(&self, workers: &[Worker]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(workers)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        debug!(count = workers.len(), path = %self.path.display(), "Saved workers");
        Ok(())
    }
}
