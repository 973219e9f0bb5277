//! Configuration management for diagmark.
//!
//! Reads `diagmark.toml`, either from an explicit path or the nearest one in
//! the working directory and its ancestors. Relative directories resolve
//! against the file's directory. Without a file, defaults resolve against the
//! working directory. [`CliSettings`] override the result.
//!
//! ## Example
//!
//! ```toml
//! [docs]
//! source_dir = "docs"
//!
//! [diagrams]
//! cache_dir = ".diagramscache"
//! seqdiag_path = "/opt/blockdiag/bin/seqdiag"
//! timeout = 60
//!
//! [diagrams.params]
//! antialias = true
//! format = "svg"
//! ```
//!
//! ## Environment Variables
//!
//! `docs.source_dir`, `diagrams.cache_dir` and the `diagrams.*_path`
//! executables may reference `${VAR}` (an error if unset) or
//! `${VAR:-default}`.

mod error;
mod expand;
mod file;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use diagmark_diagrams::{DiagramKind, Options};

pub use error::ConfigError;
use file::ConfigFile;

/// Default cache directory, relative to the project directory.
pub const DEFAULT_CACHE_DIR: &str = ".diagramscache";

/// Default Markdown directory, relative to the project directory.
pub const DEFAULT_SOURCE_DIR: &str = "docs";

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "diagmark.toml";

/// Command-line overrides, applied after the file is resolved.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub source_dir: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
}

/// Resolved configuration.
#[derive(Debug)]
pub struct Config {
    /// Directory relative paths were resolved against.
    pub project_dir: PathBuf,
    /// File the configuration came from, if any.
    pub config_path: Option<PathBuf>,
    pub docs: DocsConfig,
    pub diagrams: DiagramsConfig,
}

/// Documentation settings.
#[derive(Debug, Clone)]
pub struct DocsConfig {
    /// Directory scanned for Markdown documents.
    pub source_dir: PathBuf,
}

/// Diagram rendering settings.
#[derive(Debug, Clone)]
pub struct DiagramsConfig {
    pub cache_dir: PathBuf,
    /// Executable per kind. Kinds without an entry run the program named
    /// after the kind.
    pub executables: BTreeMap<DiagramKind, String>,
    /// Per-render timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Default renderer options in file order, applied under every block's
    /// own options.
    pub params: Options,
}

impl DiagramsConfig {
    fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            executables: BTreeMap::new(),
            timeout: None,
            params: Options::new(),
        }
    }

    /// Executable configured for `kind`.
    #[must_use]
    pub fn executable(&self, kind: DiagramKind) -> &str {
        self.executables
            .get(&kind)
            .map_or(kind.as_str(), String::as_str)
    }
}

impl Config {
    /// Load configuration, then apply `cli_settings`.
    ///
    /// With `config_path` that file must exist. Otherwise the nearest
    /// `diagmark.toml` is used, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, malformed, or
    /// fails validation.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().unwrap_or_default();
        let path = match config_path {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Some(path) => Some(path.to_path_buf()),
            None => find_config(&cwd),
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::with_defaults(&cwd),
        };

        if let Some(settings) = cli_settings {
            config.override_with(settings);
        }
        Ok(config)
    }

    /// Defaults resolved against `base`.
    #[must_use]
    pub fn with_defaults(base: &Path) -> Self {
        let (docs, diagrams) = ConfigFile::default().resolve(base);
        Self {
            project_dir: base.to_path_buf(),
            config_path: None,
            docs,
            diagrams,
        }
    }

    /// Check values that parse but cannot be used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let diagrams = &self.diagrams;

        if diagrams.cache_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "diagrams.cache_dir cannot be empty".to_owned(),
            ));
        }

        for kind in DiagramKind::ALL {
            if diagrams.executable(kind).trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "diagrams.{kind}_path cannot be empty"
                )));
            }
        }

        if diagrams.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Validation(
                "diagrams.timeout must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file = ConfigFile::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        file.expand_env()?;

        let project_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let (docs, diagrams) = file.resolve(&project_dir);
        let config = Self {
            project_dir,
            config_path: Some(path.to_path_buf()),
            docs,
            diagrams,
        };
        config.validate()?;
        Ok(config)
    }

    fn override_with(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.docs.source_dir.clone_from(source_dir);
        }
        if let Some(cache_dir) = &settings.cache_dir {
            self.diagrams.cache_dir.clone_from(cache_dir);
        }
    }
}

/// Nearest `diagmark.toml` in `start` or its ancestors.
fn find_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use diagmark_diagrams::OptionValue;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn assert_validation_error(config: &Config, expected: &[&str]) {
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected {
            assert!(msg.contains(s), "Expected error to contain '{s}', got: {msg}");
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::with_defaults(Path::new("/site"));

        assert_eq!(config.project_dir, PathBuf::from("/site"));
        assert_eq!(config.config_path, None);
        assert_eq!(config.docs.source_dir, PathBuf::from("/site/docs"));
        assert_eq!(config.diagrams.cache_dir, PathBuf::from("/site/.diagramscache"));
        assert_eq!(config.diagrams.executable(DiagramKind::ActDiag), "actdiag");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_override_with_cli_settings() {
        let mut config = Config::with_defaults(Path::new("/site"));
        config.override_with(&CliSettings {
            cache_dir: Some(PathBuf::from("/tmp/diagrams")),
            ..CliSettings::default()
        });

        assert_eq!(config.diagrams.cache_dir, PathBuf::from("/tmp/diagrams"));
        assert_eq!(config.docs.source_dir, PathBuf::from("/site/docs"));

        config.override_with(&CliSettings::default());
        assert_eq!(config.diagrams.cache_dir, PathBuf::from("/tmp/diagrams"));
    }

    #[test]
    fn test_validate_blank_executable() {
        let mut config = Config::with_defaults(Path::new("/site"));
        config
            .diagrams
            .executables
            .insert(DiagramKind::SeqDiag, "  ".to_owned());
        assert_validation_error(&config, &["diagrams.seqdiag_path", "empty"]);
    }

    #[test]
    fn test_validate_empty_cache_dir() {
        let mut config = Config::with_defaults(Path::new("/site"));
        config.diagrams.cache_dir = PathBuf::new();
        assert_validation_error(&config, &["diagrams.cache_dir", "empty"]);
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::with_defaults(Path::new("/site"));
        config.diagrams.timeout = Some(Duration::ZERO);
        assert_validation_error(&config, &["diagrams.timeout", "greater than 0"]);
    }

    #[test]
    fn test_find_config_in_ancestor() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("docs/guide");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            find_config(&nested),
            Some(tmp.path().join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_find_config_ignores_directories() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join(CONFIG_FILENAME)).unwrap();

        assert_ne!(
            find_config(tmp.path()),
            Some(tmp.path().join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load(Some(&tmp.path().join(CONFIG_FILENAME)), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_explicit_file_resolves_against_its_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[diagrams]\ncache_dir = \"cache\"\n\n[diagrams.params]\nformat = \"svg\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.config_path, Some(path.clone()));
        assert_eq!(config.project_dir, tmp.path());
        assert_eq!(config.diagrams.cache_dir, tmp.path().join("cache"));
        assert_eq!(config.docs.source_dir, tmp.path().join("docs"));
        assert_eq!(
            config.diagrams.params.get("format"),
            Some(&OptionValue::Str("svg".to_owned()))
        );
    }

    #[test]
    fn test_load_applies_cli_settings_last() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[docs]\nsource_dir = \"documentation\"\n").unwrap();

        let settings = CliSettings {
            source_dir: Some(PathBuf::from("/elsewhere")),
            ..CliSettings::default()
        };
        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.docs.source_dir, PathBuf::from("/elsewhere"));
    }

    #[test]
    fn test_load_malformed_file_names_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[diagrams\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(CONFIG_FILENAME));
    }

    #[test]
    fn test_load_invalid_file_fails_validation() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[diagrams]\ntimeout = 0\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
