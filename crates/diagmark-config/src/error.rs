//! Configuration errors.

use std::path::PathBuf;

/// Error loading or validating `diagmark.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("config file {} does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value parsed but is unusable.
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// `${VAR}` referenced an unset variable with no default.
    #[error("cannot expand {field}: {message}")]
    EnvVar {
        /// Dotted field name, e.g. `diagrams.cache_dir`.
        field: String,
        message: String,
    },
}
