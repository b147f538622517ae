//! Temporary artifact store backing url-mode responses.
//!
//! Artifacts are uuid-named files under one directory, served by a generic
//! static-file responder mounted at `/temp`. The namespace is append-only:
//! names are generated per request, nothing is ever overwritten. Writes go
//! through a `.part` file renamed into place, so a failed write never
//! leaves a servable artifact behind.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write artifact {name}: {source}")]
    Write {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Generate a unique artifact name: random identifier plus the format
/// extension.
pub fn unique_name(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4(), extension)
}

pub struct TempStore {
    dir: PathBuf,
}

impl TempStore {
    /// Open the store, creating the directory if missing.
    pub async fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist an artifact and return its public retrieval path.
    pub async fn put(&self, name: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let final_path = self.dir.join(name);
        let part_path = self.dir.join(format!("{name}.part"));

        let write_err = |source| StoreError::Write {
            name: name.to_string(),
            source,
        };
        tokio::fs::write(&part_path, bytes).await.map_err(write_err)?;
        tokio::fs::rename(&part_path, &final_path)
            .await
            .map_err(write_err)?;

        Ok(format!("/temp/{name}"))
    }

    /// Remove artifacts older than `ttl`. Returns the number removed.
    pub async fn sweep_expired(&self, ttl: Duration) -> io::Result<usize> {
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let expired = metadata
                .modified()
                .ok()
                .and_then(|modified| modified.elapsed().ok())
                .map(|age| age >= ttl)
                .unwrap_or(false);
            if expired && tokio::fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Spawn the background retention sweep. The store has no retention at
    /// all unless this is started (TEMP_TTL_SECS=0 keeps the original
    /// grow-forever behavior).
    pub fn spawn_sweeper(self: &Arc<Self>, ttl: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let period = ttl.min(Duration::from_secs(300)).max(Duration::from_secs(1));
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match store.sweep_expired(ttl).await {
                    Ok(removed) if removed > 0 => {
                        tracing::info!(removed, "swept expired temp artifacts");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("temp artifact sweep failed: {}", e),
                }
            }
        })
    }
}
