//! Daily dataset snapshot cache
//!
//! Maintains at most one materialized copy of the master dataset per
//! calendar day under the configured cache directory and exposes the
//! security-filtered view built from it.
//!
//! Locking discipline: mutations (stale-snapshot cleanup and the fetch
//! itself) serialize behind one async mutex; reads of a completed snapshot
//! never take the lock. A fetch can therefore not be torn down by a
//! concurrent cleanup pass, and concurrent same-day callers either observe
//! the finished file or wait for the single in-flight fetch.

use crate::error::CacheError;
use crate::table::DataTable;
use chrono::Utc;
use serde_json::Value;
use sqa_core::{ObjectStore, PipelineConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::sync::Mutex;

/// Owner of the snapshot lifecycle. No other component reads or writes the
/// snapshot file directly.
pub struct DatasetCache {
    cache_dir: PathBuf,
    store: Arc<dyn ObjectStore>,
    container: String,
    blob: String,
    scope_column: String,
    timeout: Duration,
    mutate: Mutex<()>,
}

impl DatasetCache {
    /// Create a cache manager over the given object store
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, config: &PipelineConfig) -> Self {
        Self {
            cache_dir: config.cache_dir.clone(),
            store,
            container: config.blob_container.clone(),
            blob: config.blob_name.clone(),
            scope_column: config.scope_column.clone(),
            timeout: config.backend_timeout(),
            mutate: Mutex::new(()),
        }
    }

    fn today_key() -> String {
        Utc::now().format("%Y-%m-%d").to_string()
    }

    fn snapshot_name(date_key: &str) -> String {
        format!("master_{date_key}.json")
    }

    /// Ensure today's snapshot exists locally and return its path.
    ///
    /// Fetches through the object store on the first call of the day,
    /// evicting every snapshot whose date key does not match. The fetch is
    /// atomic: bytes land in a `.partial` sibling which is renamed into
    /// place, and a failed fetch removes the partial before the error
    /// propagates. Idempotent and safe to call concurrently.
    pub async fn ensure_today(&self) -> Result<PathBuf, CacheError> {
        let date_key = Self::today_key();
        let target = self.cache_dir.join(Self::snapshot_name(&date_key));

        // Fast path: completed snapshots are stable for the rest of the day.
        if fs::try_exists(&target).await? {
            tracing::debug!(path = %target.display(), "snapshot cache hit");
            return Ok(target);
        }

        let _guard = self.mutate.lock().await;

        // Another caller may have finished the fetch while we waited.
        if fs::try_exists(&target).await? {
            return Ok(target);
        }

        fs::create_dir_all(&self.cache_dir).await?;
        self.cleanup_stale(&date_key).await;

        tracing::info!(
            container = %self.container,
            blob = %self.blob,
            path = %target.display(),
            "fetching master dataset"
        );

        let bytes = match tokio::time::timeout(
            self.timeout,
            self.store.download(&self.container, &self.blob),
        )
        .await
        {
            Err(_) => {
                return Err(CacheError::FetchFailed(format!(
                    "download timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
            Ok(Err(e)) => return Err(CacheError::FetchFailed(e.to_string())),
            Ok(Ok(bytes)) => bytes,
        };

        let partial = self.cache_dir.join(format!(
            "{}.partial",
            Self::snapshot_name(&date_key)
        ));
        if let Err(e) = fs::write(&partial, &bytes).await {
            let _ = fs::remove_file(&partial).await;
            return Err(CacheError::Io(e));
        }
        if let Err(e) = fs::rename(&partial, &target).await {
            let _ = fs::remove_file(&partial).await;
            return Err(CacheError::Io(e));
        }

        tracing::info!(bytes = bytes.len(), "master dataset materialized");
        Ok(target)
    }

    /// Remove snapshots (and leftover partials) whose date key is not
    /// `current`. Failures are logged and skipped; eviction is best-effort.
    async fn cleanup_stale(&self, current: &str) {
        let keep = Self::snapshot_name(current);
        let Ok(mut entries) = fs::read_dir(&self.cache_dir).await else {
            return;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let is_snapshot = name.starts_with("master_")
                && (name.ends_with(".json") || name.ends_with(".json.partial"));
            if is_snapshot && name != keep {
                match fs::remove_file(entry.path()).await {
                    Ok(()) => tracing::info!(file = name, "evicted stale snapshot"),
                    Err(e) => tracing::warn!(file = name, error = %e, "failed to evict snapshot"),
                }
            }
        }
    }

    /// Load today's snapshot restricted to the caller's scope.
    ///
    /// Row membership is "any element in common" between the row's scope
    /// list and `scope`. An empty scope returns an empty table without
    /// touching the object store. A snapshot without the scoping column
    /// degrades to an empty table with a logged warning.
    pub async fn load_filtered(&self, scope: &sqa_scope::ScopeSet) -> Result<DataTable, CacheError> {
        if scope.is_empty() {
            tracing::warn!("empty scope for analytics load, returning empty view");
            return Ok(DataTable::empty());
        }

        let path = self.ensure_today().await?;
        let bytes = fs::read(&path).await?;
        let records: Vec<Value> =
            serde_json::from_slice(&bytes).map_err(|e| CacheError::Malformed(e.to_string()))?;

        if records.is_empty() {
            return Ok(DataTable::empty());
        }

        let has_scope_column = records
            .iter()
            .filter_map(Value::as_object)
            .any(|map| map.contains_key(&self.scope_column));
        if !has_scope_column {
            tracing::warn!(
                column = %self.scope_column,
                "scoping column missing from snapshot, returning empty view"
            );
            return Ok(DataTable::empty());
        }

        let matching: Vec<Value> = records
            .into_iter()
            .filter(|record| {
                record
                    .get(&self.scope_column)
                    .and_then(Value::as_array)
                    .is_some_and(|codes| {
                        scope.intersects(codes.iter().filter_map(Value::as_str))
                    })
            })
            .collect();

        let table = DataTable::from_records(&matching);
        tracing::info!(
            rows = table.row_count(),
            scope_count = scope.len(),
            "loaded filtered view"
        );
        Ok(table)
    }
}

impl std::fmt::Debug for DatasetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetCache")
            .field("cache_dir", &self.cache_dir)
            .field("container", &self.container)
            .field("blob", &self.blob)
            .finish_non_exhaustive()
    }
}
