//! diagmark CLI - render diagrams embedded in Markdown.
//!
//! Provides commands for:
//! - `apply`: Render blockdiag/seqdiag/actdiag/nwdiag blocks and rewrite
//!   the documents to reference the rendered images

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::ApplyArgs;
use output::Output;

/// Log filter used by `--verbose`.
const VERBOSE_FILTER: &str = "diagmark=debug,diagmark_diagrams=debug,diagmark_config=debug";

/// diagmark - blockdiag preprocessor for Markdown documentation.
#[derive(Parser)]
#[command(name = "diagmark", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render diagram blocks and replace them with image references.
    Apply(ApplyArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Apply(args) if args.verbose);

    // --verbose enables DEBUG for diagmark crates, otherwise RUST_LOG (default: warn)
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Apply(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply_flags() {
        let cli = Cli::try_parse_from([
            "diagmark",
            "apply",
            "--config",
            "site/diagmark.toml",
            "--quiet",
            "-v",
        ])
        .unwrap();

        let Commands::Apply(args) = cli.command;
        assert!(args.verbose);
        assert!(args.quiet);
    }
}
