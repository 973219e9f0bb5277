//! Diagram kinds handled by the blockdiag family of renderers.

use std::fmt;

use serde::Serialize;

/// Supported diagram kinds.
///
/// Each kind doubles as the tag name of its blocks (`<seqdiag>...</seqdiag>`),
/// the default executable name, and the cache subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagramKind {
    BlockDiag,
    SeqDiag,
    ActDiag,
    NwDiag,
}

impl DiagramKind {
    /// All kinds, in tag-pattern order.
    pub const ALL: [Self; 4] = [Self::BlockDiag, Self::SeqDiag, Self::ActDiag, Self::NwDiag];

    /// Parse a kind from its tag name.
    ///
    /// Tag names are case-sensitive, matching the block syntax.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "blockdiag" => Some(Self::BlockDiag),
            "seqdiag" => Some(Self::SeqDiag),
            "actdiag" => Some(Self::ActDiag),
            "nwdiag" => Some(Self::NwDiag),
            _ => None,
        }
    }

    /// Tag name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BlockDiag => "blockdiag",
            Self::SeqDiag => "seqdiag",
            Self::ActDiag => "actdiag",
            Self::NwDiag => "nwdiag",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
