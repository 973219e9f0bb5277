//! Renderer command line construction.

use std::fmt;
use std::path::Path;

use crate::consts::{CAPTION_OPTION, FORMAT_OPTION};
use crate::options::Options;

/// A renderer invocation: program plus arguments.
///
/// Displays as the space-joined command line, which is what gets logged and
/// attached to errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCommand {
    program: String,
    args: Vec<String>,
}

impl RenderCommand {
    /// Create a command from a program and its arguments.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Executable to run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments, source path last.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for RenderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Build the renderer command for a diagram source file.
///
/// `options` are the effective options (configured params merged with the
/// block's own). Rules, first match wins:
///
/// 1. `caption` is skipped
/// 2. `true` becomes `--name`
/// 3. `format` becomes `-T value`
/// 4. anything else becomes `--name=value`
///
/// Underscores in names are written as hyphens. The source path comes last.
#[must_use]
pub fn build_command(program: &str, options: &Options, source_path: &Path) -> RenderCommand {
    let mut args = Vec::with_capacity(options.len() + 2);

    for (name, value) in options.iter() {
        if name == CAPTION_OPTION {
            continue;
        }
        if value.is_true() {
            args.push(format!("--{}", flag_name(name)));
        } else if name == FORMAT_OPTION {
            args.push("-T".to_owned());
            args.push(value.to_string());
        } else {
            args.push(format!("--{}={value}", flag_name(name)));
        }
    }

    args.push(source_path.display().to_string());
    RenderCommand::new(program, args)
}

fn flag_name(name: &str) -> String {
    name.replace('_', "-")
}
