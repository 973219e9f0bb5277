//! Diagram processing errors.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Error returned by diagram processing.
///
/// Recoverable renderer diagnostics are not errors: they are logged and
/// collected as warnings by the processor.
#[derive(Debug, thiserror::Error)]
pub enum DiagramError {
    /// Filesystem operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Renderer executable could not be started or waited on.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Renderer exited unsuccessfully without a recognized diagnostic.
    #[error("renderer failed: `{command}`: {output}")]
    RenderFailed { command: String, output: String },

    /// Renderer did not finish within the configured timeout.
    #[error("renderer timed out after {}s: `{command}`", timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    /// Configuration or options could not be serialized for the cache key.
    #[error("failed to serialize cache key input: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

impl DiagramError {
    /// Adapter for `map_err` on filesystem calls.
    pub(crate) fn io(path: &Path) -> impl FnOnce(io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
