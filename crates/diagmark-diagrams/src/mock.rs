//! Mock renderer for testing.
//!
//! Provides [`MockRenderer`] for exercising the processor without the
//! blockdiag executables installed.

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::command::RenderCommand;
use crate::consts::DEFAULT_FORMAT;
use crate::error::DiagramError;
use crate::renderer::{RenderOutput, Renderer};

/// Mock renderer.
///
/// Records every command it receives. Each call consumes the next queued
/// failure, if any; otherwise it succeeds and, like the real renderers,
/// writes the artifact next to the source file (`<source stem>.<format>`).
///
/// # Example
///
/// ```ignore
/// use diagmark_diagrams::MockRenderer;
///
/// let renderer = MockRenderer::new().with_failure(1, "ERROR: bad syntax\n");
/// ```
#[derive(Debug, Default)]
pub struct MockRenderer {
    failures: Mutex<VecDeque<RenderOutput>>,
    calls: Mutex<Vec<RenderCommand>>,
}

impl MockRenderer {
    /// Create a mock that renders everything successfully.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failing run with the given exit code and combined output.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_failure(self, code: i32, output: impl Into<String>) -> Self {
        self.failures.lock().unwrap().push_back(RenderOutput {
            code: Some(code),
            output: output.into(),
        });
        self
    }

    /// Commands received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn calls(&self) -> Vec<RenderCommand> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of commands received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// Artifact path the real renderers would write for `command`.
fn artifact_path(command: &RenderCommand) -> Option<PathBuf> {
    let args = command.args();
    let source = PathBuf::from(args.last()?);
    let format = args
        .iter()
        .position(|arg| arg == "-T")
        .and_then(|i| args.get(i + 1))
        .map_or(DEFAULT_FORMAT, String::as_str);
    Some(source.with_extension(format))
}

impl Renderer for MockRenderer {
    fn render(&self, command: &RenderCommand) -> Result<RenderOutput, DiagramError> {
        self.calls.lock().unwrap().push(command.clone());

        if let Some(failure) = self.failures.lock().unwrap().pop_front() {
            return Ok(failure);
        }

        if let Some(path) = artifact_path(command) {
            fs::write(&path, format!("rendered by {}", command.program()))
                .map_err(DiagramError::io(&path))?;
        }

        Ok(RenderOutput {
            code: Some(0),
            output: String::new(),
        })
    }
}
