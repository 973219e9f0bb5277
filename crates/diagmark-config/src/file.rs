//! `diagmark.toml` as written on disk.
//!
//! Every field is optional. Strings are expanded for environment variables
//! and then resolved against the directory holding the file.

use std::path::Path;
use std::time::Duration;

use diagmark_diagrams::{DiagramKind, Options};
use serde::Deserialize;

use crate::expand::expand_env;
use crate::{ConfigError, DEFAULT_CACHE_DIR, DEFAULT_SOURCE_DIR, DiagramsConfig, DocsConfig};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ConfigFile {
    docs: DocsSection,
    diagrams: DiagramsSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DocsSection {
    source_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DiagramsSection {
    cache_dir: Option<String>,
    blockdiag_path: Option<String>,
    seqdiag_path: Option<String>,
    actdiag_path: Option<String>,
    nwdiag_path: Option<String>,
    /// Seconds.
    timeout: Option<u64>,
    /// Kept in file order.
    params: Options,
}

impl DiagramsSection {
    fn executable_mut(&mut self, kind: DiagramKind) -> &mut Option<String> {
        match kind {
            DiagramKind::BlockDiag => &mut self.blockdiag_path,
            DiagramKind::SeqDiag => &mut self.seqdiag_path,
            DiagramKind::ActDiag => &mut self.actdiag_path,
            DiagramKind::NwDiag => &mut self.nwdiag_path,
        }
    }
}

impl ConfigFile {
    pub(crate) fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Expand `${VAR}` references in path and executable fields.
    pub(crate) fn expand_env(&mut self) -> Result<(), ConfigError> {
        expand_field(&mut self.docs.source_dir, "docs.source_dir")?;
        expand_field(&mut self.diagrams.cache_dir, "diagrams.cache_dir")?;
        for kind in DiagramKind::ALL {
            let field = format!("diagrams.{kind}_path");
            expand_field(self.diagrams.executable_mut(kind), &field)?;
        }
        Ok(())
    }

    /// Resolve relative directories against `base`, filling in defaults.
    pub(crate) fn resolve(mut self, base: &Path) -> (DocsConfig, DiagramsConfig) {
        let docs = DocsConfig {
            source_dir: base.join(
                self.docs
                    .source_dir
                    .as_deref()
                    .unwrap_or(DEFAULT_SOURCE_DIR),
            ),
        };

        let mut diagrams = DiagramsConfig::with_cache_dir(
            base.join(self.diagrams.cache_dir.as_deref().unwrap_or(DEFAULT_CACHE_DIR)),
        );
        for kind in DiagramKind::ALL {
            if let Some(path) = self.diagrams.executable_mut(kind).take() {
                diagrams.executables.insert(kind, path);
            }
        }
        diagrams.timeout = self.diagrams.timeout.map(Duration::from_secs);
        diagrams.params = self.diagrams.params;

        (docs, diagrams)
    }
}

fn expand_field(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(raw) = value.as_deref() {
        *value = Some(expand_env(raw, field)?);
    }
    Ok(())
}
