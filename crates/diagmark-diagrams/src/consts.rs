//! Internal constants for diagram rendering.

/// Output format used when neither the params nor the block set `format`.
pub const DEFAULT_FORMAT: &str = "png";

/// Extension of the diagram source files written next to the artifacts.
pub const SOURCE_EXTENSION: &str = "diag";

/// Prefix the blockdiag renderers put on their own diagnostics.
pub const RENDERER_ERROR_PREFIX: &str = "ERROR: ";

/// Extension of the documents scanned for diagram blocks.
pub const DOCUMENT_EXTENSION: &str = "md";

/// Option consumed by the image reference. Never passed to the renderer.
pub const CAPTION_OPTION: &str = "caption";

/// Option selecting the output type (`-T` on the renderer command line).
pub const FORMAT_OPTION: &str = "format";
