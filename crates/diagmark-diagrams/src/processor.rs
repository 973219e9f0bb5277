//! Diagram rendering with a content-addressed file cache.
//!
//! This module provides [`DiagramProcessor`], which turns located diagram
//! blocks into Markdown image references, rendering each diagram at most once
//! per distinct body and configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::cache::DiagramKey;
use crate::command::{RenderCommand, build_command};
use crate::consts::{
    CAPTION_OPTION, DEFAULT_FORMAT, FORMAT_OPTION, RENDERER_ERROR_PREFIX, SOURCE_EXTENSION,
};
use crate::error::DiagramError;
use crate::kind::DiagramKind;
use crate::locator::{DiagramBlock, locate_blocks};
use crate::options::{OptionValue, Options};
use crate::renderer::{ProcessRenderer, RenderOutput, Renderer};

/// Configuration for diagram processing (immutable after setup).
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Root of the diagram cache; artifacts go to `<cache_dir>/<kind>/`.
    pub cache_dir: PathBuf,
    /// Executable per diagram kind. Missing kinds use the kind name.
    pub executables: BTreeMap<DiagramKind, String>,
    /// Default renderer options, overridden per block.
    pub params: Options,
    /// Per-render timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl ProcessorConfig {
    /// Create a configuration with default executables and no params.
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            executables: DiagramKind::ALL
                .iter()
                .map(|kind| (*kind, kind.as_str().to_owned()))
                .collect(),
            params: Options::new(),
            timeout: None,
        }
    }

    /// Executable configured for `kind`.
    #[must_use]
    pub fn executable(&self, kind: DiagramKind) -> &str {
        self.executables
            .get(&kind)
            .map_or(kind.as_str(), String::as_str)
    }

    /// Stable serialization of the settings that affect rendering output.
    ///
    /// Excludes the cache directory and timeout. Params are keyed by name,
    /// so their order does not matter.
    fn fingerprint(&self) -> Result<String, DiagramError> {
        #[derive(Serialize)]
        struct Settings<'a> {
            executables: BTreeMap<DiagramKind, &'a str>,
            params: BTreeMap<&'a str, &'a OptionValue>,
        }

        let settings = Settings {
            executables: DiagramKind::ALL
                .iter()
                .map(|kind| (*kind, self.executable(*kind)))
                .collect(),
            params: self.params.by_name(),
        };
        Ok(serde_json::to_string(&settings)?)
    }
}

/// Per-block counters, accumulated over the processor's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    /// Blocks processed.
    pub blocks: usize,
    /// Renderer invocations.
    pub renders: usize,
    /// Blocks served from an existing artifact.
    pub cache_hits: usize,
    /// Renders that failed with a recoverable renderer diagnostic.
    pub failures: usize,
}

impl ProcessStats {
    /// Counters accumulated since `earlier`.
    #[must_use]
    pub fn since(&self, earlier: &Self) -> Self {
        Self {
            blocks: self.blocks - earlier.blocks,
            renders: self.renders - earlier.renders,
            cache_hits: self.cache_hits - earlier.cache_hits,
            failures: self.failures - earlier.failures,
        }
    }
}

/// Files backing one diagram in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    /// Diagram source written before rendering (`<hash>.diag`).
    pub source: PathBuf,
    /// Rendered image (`<hash>.<format>`).
    pub artifact: PathBuf,
}

/// Renders diagram blocks and substitutes image references.
///
/// # Example
///
/// ```no_run
/// use diagmark_diagrams::{DiagramProcessor, ProcessorConfig};
///
/// let mut processor = DiagramProcessor::new(ProcessorConfig::new(".diagramscache"));
/// let markdown = processor.process_content("<blockdiag>\n{ A -> B; }\n</blockdiag>")?;
/// assert!(markdown.starts_with("![]("));
/// # Ok::<(), diagmark_diagrams::DiagramError>(())
/// ```
pub struct DiagramProcessor<R = ProcessRenderer> {
    /// Configuration (immutable after setup).
    config: ProcessorConfig,
    /// Renderer invocation boundary.
    renderer: R,
    /// Recoverable renderer failures, ready for user-facing output.
    warnings: Vec<String>,
    stats: ProcessStats,
}

impl DiagramProcessor {
    /// Create a processor that runs the configured executables.
    #[must_use]
    pub fn new(config: ProcessorConfig) -> Self {
        let renderer = ProcessRenderer::new().timeout(config.timeout);
        Self::with_renderer(config, renderer)
    }
}

impl<R: Renderer> DiagramProcessor<R> {
    /// Create a processor with a custom renderer.
    #[must_use]
    pub fn with_renderer(config: ProcessorConfig, renderer: R) -> Self {
        tracing::debug!(?config, "diagram processor initialized");
        Self {
            config,
            renderer,
            warnings: Vec::new(),
            stats: ProcessStats::default(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Recoverable failures collected so far.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Take the collected warnings, leaving none behind.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    #[must_use]
    pub fn stats(&self) -> &ProcessStats {
        &self.stats
    }

    /// Compute where a diagram lives in the cache.
    ///
    /// `options` are the block's own options; the configured params are
    /// merged underneath.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::Fingerprint`] if the options cannot be serialized.
    pub fn cache_paths(
        &self,
        kind: DiagramKind,
        options: &Options,
        body: &str,
    ) -> Result<CachePaths, DiagramError> {
        let effective = self.config.params.merged(options);
        self.cache_paths_for(kind, &effective, body)
    }

    fn cache_paths_for(
        &self,
        kind: DiagramKind,
        effective: &Options,
        body: &str,
    ) -> Result<CachePaths, DiagramError> {
        let settings = self.config.fingerprint()?;
        let options = serde_json::to_string(&effective.without(CAPTION_OPTION).by_name())?;
        let hash = DiagramKey {
            kind,
            body,
            settings: &settings,
            options: &options,
        }
        .compute_hash();

        let format = effective
            .get(FORMAT_OPTION)
            .map_or_else(|| DEFAULT_FORMAT.to_owned(), ToString::to_string);

        let dir = self.config.cache_dir.join(kind.as_str());
        Ok(CachePaths {
            source: dir.join(format!("{hash}.{SOURCE_EXTENSION}")),
            artifact: dir.join(format!("{hash}.{format}")),
        })
    }

    /// Render one block (or reuse its cached artifact) and return the image reference.
    ///
    /// A renderer failure whose output starts with `ERROR: ` is recorded as a
    /// warning and the reference is still returned, pointing at the missing
    /// artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache cannot be written, the renderer cannot be
    /// run, or it fails without a recognized diagnostic.
    pub fn process_block(&mut self, block: &DiagramBlock<'_>) -> Result<String, DiagramError> {
        tracing::debug!(kind = %block.kind, options = ?block.options, body = block.body, "processing diagram");
        self.stats.blocks += 1;

        let effective = self.config.params.merged(&block.options);
        let paths = self.cache_paths_for(block.kind, &effective, block.body)?;

        let caption = block
            .options
            .get(CAPTION_OPTION)
            .map(ToString::to_string)
            .unwrap_or_default();
        let image_ref = image_reference(&caption, &paths.artifact)?;

        if paths.artifact.exists() {
            tracing::debug!(path = %paths.artifact.display(), "diagram found in cache");
            self.stats.cache_hits += 1;
            return Ok(image_ref);
        }

        if let Some(dir) = paths.source.parent() {
            fs::create_dir_all(dir).map_err(DiagramError::io(dir))?;
        }
        fs::write(&paths.source, block.body).map_err(DiagramError::io(&paths.source))?;
        tracing::debug!(path = %paths.source.display(), "saved diagram source");

        let command = build_command(self.config.executable(block.kind), &effective, &paths.source);
        tracing::debug!(%command, "running renderer");

        let result = self.renderer.render(&command)?;
        self.stats.renders += 1;

        if !result.success() {
            self.handle_failure(&command, &paths.source, result)?;
        }

        tracing::debug!(%image_ref, "replacing diagram definition");
        Ok(image_ref)
    }

    /// Replace every diagram block in `content`, left to right.
    ///
    /// Text outside the blocks is copied unchanged.
    ///
    /// # Errors
    ///
    /// Stops at the first fatal block error; see [`process_block`](Self::process_block).
    pub fn process_content(&mut self, content: &str) -> Result<String, DiagramError> {
        let mut result = String::with_capacity(content.len());
        let mut last = 0;

        for block in locate_blocks(content) {
            result.push_str(&content[last..block.span.start]);
            result.push_str(&self.process_block(&block)?);
            last = block.span.end;
        }

        result.push_str(&content[last..]);
        Ok(result)
    }

    fn handle_failure(
        &mut self,
        command: &RenderCommand,
        source: &Path,
        result: RenderOutput,
    ) -> Result<(), DiagramError> {
        tracing::error!(%command, code = ?result.code, output = %result.output, "renderer failed");

        if !result.output.starts_with(RENDERER_ERROR_PREFIX) {
            return Err(DiagramError::RenderFailed {
                command: command.to_string(),
                output: result.output,
            });
        }

        let message = format!(
            "Processing of diagram {} failed: {}",
            source.display(),
            result.output.trim_end()
        );
        tracing::error!("{message}");
        self.stats.failures += 1;
        self.warnings.push(message);
        Ok(())
    }
}

/// Markdown image reference to an artifact, with an absolute path.
fn image_reference(caption: &str, artifact: &Path) -> Result<String, DiagramError> {
    let absolute = std::path::absolute(artifact).map_err(DiagramError::io(artifact))?;
    Ok(format!("![{caption}]({})", absolute.display()))
}
