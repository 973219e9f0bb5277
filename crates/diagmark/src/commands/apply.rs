//! `diagmark apply` command implementation.

use std::path::PathBuf;

use clap::Args;
use diagmark_config::{CliSettings, Config, DiagramsConfig};
use diagmark_diagrams::{DiagramKind, DiagramProcessor, DocumentRewriter, ProcessorConfig};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the apply command.
#[derive(Args)]
pub(crate) struct ApplyArgs {
    /// Path to configuration file (default: auto-discover diagmark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Markdown source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Directory for rendered diagrams (overrides config).
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Suppress warnings and the summary line.
    #[arg(short, long)]
    pub(crate) quiet: bool,

    /// Enable debug logging for diagmark crates.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl ApplyArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new().quiet(self.quiet);

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            cache_dir: self.cache_dir,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        config.validate()?;
        tracing::debug!(config = ?config.config_path, "configuration loaded");

        let source_dir = &config.docs.source_dir;
        output.info(&format!("Source: {}", source_dir.display()));
        output.info(&format!(
            "Cache: {}",
            config.diagrams.cache_dir.display()
        ));

        let mut processor = DiagramProcessor::new(processor_config(&config.diagrams));
        let result = DocumentRewriter::new(source_dir).rewrite(&mut processor);

        // Report warnings even when the rewrite failed
        output.warnings(processor.warnings());
        output.summary(&result?);
        Ok(())
    }
}

/// Build the processor settings from resolved configuration.
fn processor_config(diagrams: &DiagramsConfig) -> ProcessorConfig {
    let mut config = ProcessorConfig::new(&diagrams.cache_dir);
    for kind in DiagramKind::ALL {
        config
            .executables
            .insert(kind, diagrams.executable(kind).to_owned());
    }
    config.params.clone_from(&diagrams.params);
    config.timeout = diagrams.timeout;
    config
}
