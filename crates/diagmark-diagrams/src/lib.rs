//! Blockdiag-family diagram rendering for diagmark.
//!
//! This crate finds `blockdiag`, `seqdiag`, `actdiag` and `nwdiag` blocks in
//! Markdown, renders each with the matching external executable, and replaces
//! the block with an image reference to the rendered file:
//! - Lazy block discovery with typed inline options
//! - Renderer command lines built from configured params and block options
//! - Content-addressed cache: one artifact per body and configuration
//! - In-place rewriting of a directory of Markdown documents
//!
//! # Architecture
//!
//! The crate is organized into modules:
//! - [`kind`]: Diagram kinds (`DiagramKind`)
//! - [`options`]: Inline option parsing (`Options`, `OptionValue`)
//! - [`locator`]: Block discovery (`locate_blocks`, `DiagramBlock`)
//! - [`command`]: Renderer command construction (`build_command`)
//! - [`cache`]: Cache key hashing (`DiagramKey`)
//! - [`renderer`]: Process boundary (`Renderer`, `ProcessRenderer`)
//! - [`processor`]: Render-or-reuse orchestration (`DiagramProcessor`)
//! - [`rewriter`]: Directory rewriting (`DocumentRewriter`)
//!
//! # Example
//!
//! ```no_run
//! use diagmark_diagrams::{DiagramProcessor, DocumentRewriter, ProcessorConfig};
//!
//! let mut processor = DiagramProcessor::new(ProcessorConfig::new(".diagramscache"));
//! let summary = DocumentRewriter::new("docs").rewrite(&mut processor)?;
//!
//! for warning in processor.warnings() {
//!     eprintln!("{warning}");
//! }
//! println!("{} documents rewritten", summary.rewritten);
//! # Ok::<(), diagmark_diagrams::DiagramError>(())
//! ```

mod cache;
mod command;
mod consts;
mod error;
mod kind;
mod locator;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod options;
mod processor;
mod renderer;
mod rewriter;

pub use cache::DiagramKey;
pub use command::{RenderCommand, build_command};
pub use consts::{DEFAULT_FORMAT, RENDERER_ERROR_PREFIX};
pub use error::DiagramError;
pub use kind::DiagramKind;
pub use locator::{BlockLocator, DiagramBlock, locate_blocks};
#[cfg(feature = "mock")]
pub use mock::MockRenderer;
pub use options::{OptionValue, Options};
pub use processor::{CachePaths, DiagramProcessor, ProcessStats, ProcessorConfig};
pub use renderer::{ProcessRenderer, RenderOutput, Renderer};
pub use rewriter::{DocumentRewriter, RewriteSummary};
