//! CLI error types.

use diagmark_config::ConfigError;
use diagmark_diagrams::DiagramError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Diagram(#[from] DiagramError),
}
