//! Error kinds surfaced by the engine core.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the container engine core. Commands propagate
/// these unchanged to the CLI boundary; the exit code does not distinguish
/// between kinds.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Container or image referenced by name or ID does not exist.
    #[error("{kind} {name} does not exist")]
    NotFound { kind: &'static str, name: String },

    /// Container name collision at create time or rename destination collision.
    #[error("{kind} {name} already exists")]
    AlreadyExists { kind: &'static str, name: String },

    /// Malformed image reference.
    #[error("invalid image reference '{0}'")]
    BadReference(String),

    /// HTTP non-2xx or transport failure while fetching a manifest.
    #[error("failed to fetch manifest for '{reference}': {reason}")]
    ManifestFetch { reference: String, reason: String },

    /// HTTP non-2xx or transport failure while fetching a blob.
    #[error("failed to fetch blob {digest}: {reason}")]
    BlobFetch { digest: String, reason: String },

    /// Downloaded blob hash does not match the expected digest.
    #[error("digest mismatch for {path}: expected sha256:{expected}")]
    DigestMismatch { path: PathBuf, expected: String },

    /// A mount syscall failed.
    #[error("failed to mount {target}: {source}")]
    MountFailed {
        target: PathBuf,
        #[source]
        source: nix::Error,
    },

    /// pivot_root into the container rootfs failed.
    #[error("pivot root into {path} failed: {reason}")]
    PivotFailed { path: PathBuf, reason: String },

    /// Creating or entering a namespace failed.
    #[error("namespace operation failed: {0}")]
    NamespaceFailed(#[source] nix::Error),

    /// Writing the subuid/subgid mapping failed.
    #[error("failed to map ids for pid {pid}: {reason}")]
    MapFailed { pid: i32, reason: String },

    /// Operation requires a running container.
    #[error("container {0} is not running")]
    NotRunning(String),

    /// Operation requires a stopped container.
    #[error("container {0} is already running")]
    AlreadyRunning(String),

    /// JSON decode failure or a logically inconsistent configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A required host helper is absent and not recoverable.
    #[error("failed to find dependency {0}, can't recover")]
    DependencyMissing(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
