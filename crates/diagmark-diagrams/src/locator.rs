//! Diagram block discovery in Markdown text.
//!
//! A block is an opening tag with an optional option string, a body, and the
//! closing tag of the same kind:
//!
//! ```text
//! <blockdiag caption="Diagram" format=svg>
//! { A -> B; }
//! </blockdiag>
//! ```
//!
//! The body ends at the first matching closing tag. An opening tag without
//! one is not a block and its text is left alone.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::kind::DiagramKind;
use crate::options::Options;

static OPEN_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let tags: Vec<_> = DiagramKind::ALL.iter().map(|k| k.as_str()).collect();
    Regex::new(&format!(
        r"<(?P<tag>{})(?:\s(?P<options>[^<>]*))?>",
        tags.join("|")
    ))
    .unwrap()
});

/// A diagram block located in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramBlock<'a> {
    /// Diagram kind, taken from the tag name.
    pub kind: DiagramKind,
    /// Options parsed from the opening tag.
    pub options: Options,
    /// Raw diagram source between the tags.
    pub body: &'a str,
    /// Byte range of the whole block, tags included.
    pub span: Range<usize>,
}

/// Lazy iterator over the diagram blocks of a document, in document order.
///
/// Created by [`locate_blocks`].
#[derive(Debug)]
pub struct BlockLocator<'a> {
    content: &'a str,
    pos: usize,
}

/// Locate diagram blocks in `content`.
///
/// # Example
///
/// ```
/// use diagmark_diagrams::{DiagramKind, locate_blocks};
///
/// let text = "intro\n<seqdiag>\n{ a -> b; }\n</seqdiag>\noutro";
/// let blocks: Vec<_> = locate_blocks(text).collect();
///
/// assert_eq!(blocks.len(), 1);
/// assert_eq!(blocks[0].kind, DiagramKind::SeqDiag);
/// assert_eq!(blocks[0].body, "\n{ a -> b; }\n");
/// ```
#[must_use]
pub fn locate_blocks(content: &str) -> BlockLocator<'_> {
    BlockLocator { content, pos: 0 }
}

impl<'a> Iterator for BlockLocator<'a> {
    type Item = DiagramBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.content.len() {
            let caps = OPEN_TAG_PATTERN.captures_at(self.content, self.pos)?;
            let open = caps.get(0)?;

            let Some(kind) = DiagramKind::parse(&caps["tag"]) else {
                self.pos = open.start() + 1;
                continue;
            };

            let closing = format!("</{kind}>");
            let body_start = open.end();
            let Some(body_len) = self.content[body_start..].find(&closing) else {
                tracing::debug!(offset = open.start(), "skipping unclosed <{kind}> tag");
                // `<` is one byte, so this stays on a char boundary
                self.pos = open.start() + 1;
                continue;
            };

            let body_end = body_start + body_len;
            let end = body_end + closing.len();
            self.pos = end;

            let options = caps
                .name("options")
                .map_or_else(Options::new, |m| Options::parse(m.as_str()));

            return Some(DiagramBlock {
                kind,
                options,
                body: &self.content[body_start..body_end],
                span: open.start()..end,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::OptionValue;
    use pretty_assertions::assert_eq;

    fn locate(content: &str) -> Vec<DiagramBlock<'_>> {
        locate_blocks(content).collect()
    }

    #[test]
    fn test_locate_single_block_with_options() {
        let content = "# Title\n\n<blockdiag caption=\"Diagram\" format=svg>\n{ A -> B; }\n</blockdiag>\n\nText";
        let blocks = locate(content);

        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.kind, DiagramKind::BlockDiag);
        assert_eq!(block.body, "\n{ A -> B; }\n");
        assert_eq!(
            block.options.get("caption"),
            Some(&OptionValue::Str("Diagram".to_owned()))
        );
        assert_eq!(
            block.options.get("format"),
            Some(&OptionValue::Str("svg".to_owned()))
        );
        assert_eq!(
            &content[block.span.clone()],
            "<blockdiag caption=\"Diagram\" format=svg>\n{ A -> B; }\n</blockdiag>"
        );
    }

    #[test]
    fn test_locate_without_options() {
        let blocks = locate("<nwdiag>{ network { a; } }</nwdiag>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, DiagramKind::NwDiag);
        assert!(blocks[0].options.is_empty());
        assert_eq!(blocks[0].body, "{ network { a; } }");
    }

    #[test]
    fn test_locate_multiple_kinds_in_order() {
        let content = "<seqdiag>s</seqdiag> mid <actdiag>a</actdiag> <blockdiag>b</blockdiag>";
        let kinds: Vec<_> = locate(content).iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagramKind::SeqDiag, DiagramKind::ActDiag, DiagramKind::BlockDiag]
        );
    }

    #[test]
    fn test_body_ends_at_first_closing_tag() {
        let blocks = locate("<blockdiag>one</blockdiag><blockdiag>two</blockdiag>");
        let bodies: Vec<_> = blocks.iter().map(|b| b.body).collect();
        assert_eq!(bodies, vec!["one", "two"]);
    }

    #[test]
    fn test_closing_tag_must_match_kind() {
        let blocks = locate("<blockdiag>body</seqdiag> more </blockdiag>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "body</seqdiag> more ");
    }

    #[test]
    fn test_unclosed_tag_is_skipped() {
        let content = "<blockdiag>never closed\n<seqdiag>x</seqdiag>";
        let blocks = locate(content);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, DiagramKind::SeqDiag);
        assert_eq!(blocks[0].body, "x");
    }

    #[test]
    fn test_stray_closing_tag_is_ignored() {
        assert!(locate("text </blockdiag> more").is_empty());
    }

    #[test]
    fn test_similar_tag_names_are_not_blocks() {
        assert!(locate("<blockdiagram>x</blockdiagram>").is_empty());
        assert!(locate("<BlockDiag>x</BlockDiag>").is_empty());
        assert!(locate("<packetdiag>x</packetdiag>").is_empty());
    }

    #[test]
    fn test_option_string_may_span_lines() {
        let blocks = locate("<actdiag\n  caption=\"Flow\"\n  antialias>\nbody</actdiag>");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].options.get("antialias"), Some(&OptionValue::Bool(true)));
    }

    #[test]
    fn test_unicode_content_around_blocks() {
        let content = "Схема: <seqdiag>{ а -> б; }</seqdiag> конец";
        let blocks = locate(content);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body, "{ а -> б; }");
        assert_eq!(&content[blocks[0].span.clone()], "<seqdiag>{ а -> б; }</seqdiag>");
    }

    #[test]
    fn test_locator_is_lazy() {
        let content = "<blockdiag>a</blockdiag><blockdiag>b</blockdiag>";
        let mut locator = locate_blocks(content);
        assert_eq!(locator.next().map(|b| b.body), Some("a"));
        assert_eq!(locator.next().map(|b| b.body), Some("b"));
        assert_eq!(locator.next(), None);
    }
}
