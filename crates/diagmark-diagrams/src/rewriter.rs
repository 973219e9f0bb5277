//! In-place rewriting of Markdown documents.
//!
//! [`DocumentRewriter`] walks a working directory, runs every `.md` file
//! through a [`DiagramProcessor`], and writes back the files whose content
//! changed.

use std::fs;
use std::path::{Path, PathBuf};

use crate::consts::DOCUMENT_EXTENSION;
use crate::error::DiagramError;
use crate::processor::{DiagramProcessor, ProcessStats};
use crate::renderer::Renderer;

/// Outcome of a rewrite pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    /// Documents read.
    pub documents: usize,
    /// Documents written back.
    pub rewritten: usize,
    /// Diagram counters for this pass.
    pub diagrams: ProcessStats,
}

/// Rewrites diagram blocks in all Markdown files under a directory.
#[derive(Debug, Clone)]
pub struct DocumentRewriter {
    working_dir: PathBuf,
}

impl DocumentRewriter {
    /// Create a rewriter rooted at `working_dir`.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    /// Find Markdown documents under the working directory, recursively.
    ///
    /// Returns an empty Vec if the directory doesn't exist. Paths are sorted
    /// within each directory; symlinked directories are not followed.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be listed.
    pub fn scan(&self) -> Result<Vec<PathBuf>, DiagramError> {
        let mut documents = Vec::new();
        if self.working_dir.is_dir() {
            collect_documents(&self.working_dir, &mut documents)?;
        } else {
            tracing::warn!(path = %self.working_dir.display(), "working directory not found");
        }
        Ok(documents)
    }

    /// Process every document, writing back those that changed.
    ///
    /// # Errors
    ///
    /// Aborts on the first I/O or fatal renderer error. Documents already
    /// written stay written; the failing document is left untouched.
    pub fn rewrite<R: Renderer>(
        &self,
        processor: &mut DiagramProcessor<R>,
    ) -> Result<RewriteSummary, DiagramError> {
        tracing::info!(path = %self.working_dir.display(), "rewriting diagram blocks");

        let before = *processor.stats();
        let mut summary = RewriteSummary::default();

        for path in self.scan()? {
            summary.documents += 1;
            if rewrite_document(&path, processor)? {
                summary.rewritten += 1;
            }
        }

        summary.diagrams = processor.stats().since(&before);
        tracing::info!(
            documents = summary.documents,
            rewritten = summary.rewritten,
            renders = summary.diagrams.renders,
            cache_hits = summary.diagrams.cache_hits,
            "diagram blocks rewritten"
        );
        Ok(summary)
    }
}

/// Rewrite one document. Returns whether it was written.
fn rewrite_document<R: Renderer>(
    path: &Path,
    processor: &mut DiagramProcessor<R>,
) -> Result<bool, DiagramError> {
    let content = fs::read_to_string(path).map_err(DiagramError::io(path))?;
    let processed = processor.process_content(&content)?;

    if processed == content {
        return Ok(false);
    }

    fs::write(path, processed).map_err(DiagramError::io(path))?;
    tracing::info!(path = %path.display(), "document rewritten");
    Ok(true)
}

fn collect_documents(dir: &Path, documents: &mut Vec<PathBuf>) -> Result<(), DiagramError> {
    let mut entries = fs::read_dir(dir)
        .map_err(DiagramError::io(dir))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(DiagramError::io(dir))?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(DiagramError::io(&path))?;

        if file_type.is_dir() {
            collect_documents(&path, documents)?;
        } else if path.extension().is_some_and(|e| e == DOCUMENT_EXTENSION) {
            documents.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRenderer;
    use crate::processor::ProcessorConfig;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("docs/guide")).unwrap();
        tmp
    }

    fn processor(tmp: &TempDir) -> DiagramProcessor<MockRenderer> {
        DiagramProcessor::with_renderer(
            ProcessorConfig::new(tmp.path().join(".diagramscache")),
            MockRenderer::new(),
        )
    }

    #[test]
    fn test_scan_finds_markdown_recursively() {
        let tmp = create_test_dir();
        let docs = tmp.path().join("docs");
        fs::write(docs.join("b.md"), "").unwrap();
        fs::write(docs.join("a.md"), "").unwrap();
        fs::write(docs.join("notes.txt"), "").unwrap();
        fs::write(docs.join("guide/intro.md"), "").unwrap();

        let found = DocumentRewriter::new(&docs).scan().unwrap();

        assert_eq!(
            found,
            vec![
                docs.join("a.md"),
                docs.join("b.md"),
                docs.join("guide/intro.md"),
            ]
        );
    }

    #[test]
    fn test_scan_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let found = DocumentRewriter::new(tmp.path().join("missing")).scan().unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_rewrite_replaces_blocks_and_keeps_other_files() {
        let tmp = create_test_dir();
        let docs = tmp.path().join("docs");
        let with_diagram = "# Guide\n\n<blockdiag caption=\"Flow\">\n{ A -> B; }\n</blockdiag>\n\nEnd.\n";
        let plain = "# Plain\n\nNo diagrams.\n";
        fs::write(docs.join("guide/flow.md"), with_diagram).unwrap();
        fs::write(docs.join("plain.md"), plain).unwrap();

        let mut processor = processor(&tmp);
        let summary = DocumentRewriter::new(&docs).rewrite(&mut processor).unwrap();

        assert_eq!(summary.documents, 2);
        assert_eq!(summary.rewritten, 1);
        assert_eq!(summary.diagrams.renders, 1);

        let rewritten = fs::read_to_string(docs.join("guide/flow.md")).unwrap();
        assert!(rewritten.starts_with("# Guide\n\n![Flow]("), "got {rewritten}");
        assert!(rewritten.ends_with(".png)\n\nEnd.\n"), "got {rewritten}");
        assert_eq!(fs::read_to_string(docs.join("plain.md")).unwrap(), plain);
    }

    #[test]
    fn test_second_run_is_pure_cache_hit() {
        let tmp = create_test_dir();
        let docs = tmp.path().join("docs");
        let original = "<seqdiag>{ a -> b; }</seqdiag>\n<actdiag format=svg>{ x -> y; }</actdiag>\n";
        fs::write(docs.join("page.md"), original).unwrap();
        fs::write(docs.join("copy.md"), original).unwrap();

        let mut first = processor(&tmp);
        let first_summary = DocumentRewriter::new(&docs).rewrite(&mut first).unwrap();
        let after_first = fs::read_to_string(docs.join("page.md")).unwrap();

        // Same diagrams in two documents render once
        assert_eq!(first_summary.diagrams.renders, 2);
        assert_eq!(first_summary.diagrams.cache_hits, 2);

        // Restore the sources and run again with a fresh processor
        fs::write(docs.join("page.md"), original).unwrap();
        let mut second = processor(&tmp);
        let second_summary = DocumentRewriter::new(&docs).rewrite(&mut second).unwrap();

        assert_eq!(second.renderer().call_count(), 0);
        assert_eq!(second_summary.diagrams.cache_hits, 2);
        assert_eq!(second_summary.rewritten, 1);
        assert_eq!(fs::read_to_string(docs.join("page.md")).unwrap(), after_first);
    }

    #[test]
    fn test_rewritten_documents_are_not_touched_again() {
        let tmp = create_test_dir();
        let docs = tmp.path().join("docs");
        fs::write(docs.join("page.md"), "<nwdiag>{ network { a; } }</nwdiag>").unwrap();

        let mut processor = processor(&tmp);
        let rewriter = DocumentRewriter::new(&docs);
        rewriter.rewrite(&mut processor).unwrap();
        let summary = rewriter.rewrite(&mut processor).unwrap();

        assert_eq!(summary.rewritten, 0);
        assert_eq!(summary.diagrams, ProcessStats::default());
    }

    #[test]
    fn test_fatal_error_leaves_document_untouched() {
        let tmp = create_test_dir();
        let docs = tmp.path().join("docs");
        let original = "<blockdiag>{ A -> B; }</blockdiag>\n";
        fs::write(docs.join("page.md"), original).unwrap();

        let mut processor = DiagramProcessor::with_renderer(
            ProcessorConfig::new(tmp.path().join(".diagramscache")),
            MockRenderer::new().with_failure(127, "sh: blockdiag: not found\n"),
        );
        let err = DocumentRewriter::new(&docs)
            .rewrite(&mut processor)
            .unwrap_err();

        assert!(matches!(err, DiagramError::RenderFailed { .. }));
        assert_eq!(fs::read_to_string(docs.join("page.md")).unwrap(), original);
    }

    #[test]
    fn test_recoverable_error_still_rewrites_document() {
        let tmp = create_test_dir();
        let docs = tmp.path().join("docs");
        fs::write(docs.join("page.md"), "<blockdiag>{ A -> }</blockdiag>\n").unwrap();

        let mut processor = DiagramProcessor::with_renderer(
            ProcessorConfig::new(tmp.path().join(".diagramscache")),
            MockRenderer::new().with_failure(1, "ERROR: syntax error\n"),
        );
        let summary = DocumentRewriter::new(&docs).rewrite(&mut processor).unwrap();

        assert_eq!(summary.rewritten, 1);
        assert_eq!(summary.diagrams.failures, 1);
        assert_eq!(processor.warnings().len(), 1);
        let content = fs::read_to_string(docs.join("page.md")).unwrap();
        assert!(content.starts_with("![]("), "got {content}");
    }
}
