//! Error types for the analytics subsystem

/// Failure of the snapshot cache.
///
/// `FetchFailed` is fatal for the current request: no stale snapshot is
/// silently served in its place. Everything else degrades at the call site.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Object store unreachable, missing blob, or missing credentials
    #[error("master dataset fetch failed: {0}")]
    FetchFailed(String),

    /// Snapshot file exists but does not parse as a record array
    #[error("snapshot is malformed: {0}")]
    Malformed(String),

    /// Filesystem failure while managing snapshot files
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the ad-hoc analytics executor before or during code
/// generation. Sandbox-side failures are *not* errors at this level; they
/// come back inside [`crate::ExecutionOutcome::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// Chat collaborator failed while generating analysis code
    #[error("code generation failed: {0}")]
    Generation(String),

    /// The model produced no code at all
    #[error("model produced no code")]
    EmptyCode,

    /// Generation or execution exceeded its bounded timeout
    #[error("analytics step timed out after {0}s")]
    Timeout(u64),
}
