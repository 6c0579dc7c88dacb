//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one pipeline instance.
///
/// Result limits are fixed here rather than derived per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Final result count for the retrieval branch
    pub top_k: usize,
    /// Vector candidate pool size for the retrieval branch
    pub vector_k: usize,
    /// Directory holding daily dataset snapshots
    pub cache_dir: PathBuf,
    /// Search index field carrying a document's scope collection
    pub scope_field: String,
    /// Dataset column carrying a row's scope collection
    pub scope_column: String,
    /// Object store container holding the master dataset
    pub blob_container: String,
    /// Blob name of the master dataset
    pub blob_name: String,
    /// Upper bound on any single external collaborator call, in seconds
    pub backend_timeout_secs: u64,
    /// Temperature for answer synthesis
    pub answer_temperature: f32,
    /// Temperature for analytics code generation
    pub codegen_temperature: f32,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With retrieval result limits
    #[inline]
    #[must_use]
    pub fn with_limits(mut self, top_k: usize, vector_k: usize) -> Self {
        self.top_k = top_k;
        self.vector_k = vector_k;
        self
    }

    /// With snapshot cache directory
    #[inline]
    #[must_use]
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// With master dataset blob location
    #[inline]
    #[must_use]
    pub fn with_blob(mut self, container: impl Into<String>, blob: impl Into<String>) -> Self {
        self.blob_container = container.into();
        self.blob_name = blob.into();
        self
    }

    /// With backend call timeout
    #[inline]
    #[must_use]
    pub fn with_backend_timeout_secs(mut self, secs: u64) -> Self {
        self.backend_timeout_secs = secs;
        self
    }

    /// Backend call timeout as a `Duration`
    #[inline]
    #[must_use]
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            vector_k: 30,
            cache_dir: PathBuf::from("data_cache"),
            scope_field: "consignee_code_ids".to_string(),
            scope_column: "consignee_codes".to_string(),
            blob_container: "uploads".to_string(),
            blob_name: "master_ds.json".to_string(),
            backend_timeout_secs: 30,
            answer_temperature: 0.2,
            codegen_temperature: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_fixed_limits() {
        let config = PipelineConfig::new();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.vector_k, 30);
    }

    #[test]
    fn builder_overrides() {
        let config = PipelineConfig::new()
            .with_limits(3, 10)
            .with_cache_dir("/tmp/snapshots")
            .with_backend_timeout_secs(5);

        assert_eq!(config.top_k, 3);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/snapshots"));
        assert_eq!(config.backend_timeout(), Duration::from_secs(5));
    }
}
