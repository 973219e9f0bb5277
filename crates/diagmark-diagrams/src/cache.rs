//! Diagram cache key computation.
//!
//! Provides [`DiagramKey`] for computing the content hash that names a
//! diagram's source and artifact files in the cache directory.

use sha2::{Digest, Sha256};

use crate::kind::DiagramKind;

/// Everything that affects a rendered diagram.
#[derive(Debug)]
pub struct DiagramKey<'a> {
    /// Diagram kind.
    pub kind: DiagramKind,
    /// Diagram source between the tags.
    pub body: &'a str,
    /// Serialized global configuration (executables and params).
    pub settings: &'a str,
    /// Serialized effective renderer options (caption excluded).
    pub options: &'a str,
}

impl DiagramKey<'_> {
    /// Compute a content hash for this diagram key.
    ///
    /// # Hash Format
    ///
    /// SHA-256 of `"{kind}:{settings}:{options}:{body}"`, hex-encoded.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let content = format!(
            "{}:{}:{}:{}",
            self.kind, self.settings, self.options, self.body
        );
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let result = hasher.finalize();
        hex::encode(result)
    }
}
