//! Wraps saved words found in page text with marker elements.
//!
//! A pass collects candidate text nodes first, skipping script/style
//! subtrees, the tooltip and existing markers, then rewrites each node on its
//! own. Markers are never rescanned, so running a pass twice changes nothing
//! the second time.

use crate::dom::{Document, NodeId, NodeSpec};
use crate::error::DomError;
use crate::preprocess::is_word_char;
use crate::tooltip::TOOLTIP_ID;
use crate::vocabulary::VocabularyIndex;

pub const MARKER_CLASS: &str = "my-highvocab-highlight";
pub const STYLE_ID: &str = "my-highvocab-style";
pub const ORIGINAL_WORD_ATTR: &str = "data-original-word";
pub const TRANSLATION_ATTR: &str = "data-translation";

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "textarea"];

const MARKER_STYLESHEET: &str = "
.my-highvocab-highlight {
    background-color: #ffeb3b;
    cursor: pointer;
    border-bottom: 1px dashed #cddc39;
    font-weight: bold;
    position: relative;
}
.my-highvocab-highlight:hover {
    background-color: #ffc107;
}
";

/// Whole-word occurrence of a vocabulary key, in char offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordMatch<'a> {
    pub start: usize,
    pub end: usize,
    pub key: &'a str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighlightReport {
    pub scanned: usize,
    pub rewritten: usize,
    pub markers: usize,
    pub failures: usize,
}

/// Run one highlighting pass over the document body.
pub fn highlight(doc: &mut Document, index: &VocabularyIndex) -> HighlightReport {
    let mut report = HighlightReport::default();
    if index.is_empty() {
        return report;
    }

    if let Err(e) = ensure_stylesheet(doc) {
        tracing::warn!("Could not inject marker stylesheet: {e}");
    }

    for node in candidate_text_nodes(doc) {
        report.scanned += 1;
        let Some(text) = doc.text(node).map(str::to_string) else {
            continue;
        };

        let matches = find_matches(&text, index);
        if matches.is_empty() {
            continue;
        }

        match replace_text_node(doc, node, &matches, index) {
            Ok(_) => {
                report.rewritten += 1;
                report.markers += matches.len();
            }
            Err(e) => {
                report.failures += 1;
                tracing::warn!("Skipping text node {node}: {e}");
            }
        }
    }

    tracing::debug!(
        scanned = report.scanned,
        markers = report.markers,
        failures = report.failures,
        "Highlight pass finished"
    );
    report
}

/// Case-insensitive whole-word matches, leftmost first; on overlap the
/// longer key wins.
pub fn find_matches<'a>(text: &str, index: &'a VocabularyIndex) -> Vec<WordMatch<'a>> {
    let chars: Vec<char> = text.chars().collect();
    let mut found = Vec::new();

    for (key, _) in index.iter() {
        let key_chars: Vec<char> = key.chars().collect();
        if key_chars.is_empty() || key_chars.len() > chars.len() {
            continue;
        }
        for start in 0..=chars.len() - key_chars.len() {
            let end = start + key_chars.len();
            if is_boundary(&chars, start)
                && is_boundary(&chars, end)
                && chars[start..end]
                    .iter()
                    .zip(&key_chars)
                    .all(|(&a, &b)| chars_match(a, b))
            {
                found.push(WordMatch { start, end, key });
            }
        }
    }

    found.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    let mut accepted: Vec<WordMatch<'a>> = Vec::with_capacity(found.len());
    for m in found {
        if accepted.last().is_none_or(|last| m.start >= last.end) {
            accepted.push(m);
        }
    }
    accepted
}

/// Interleaved text and marker specs replacing `text`. Empty text pieces
/// are dropped.
pub fn split_into_fragments(text: &str, matches: &[WordMatch<'_>], index: &VocabularyIndex) -> Vec<NodeSpec> {
    let chars: Vec<char> = text.chars().collect();
    let mut fragments = Vec::with_capacity(matches.len() * 2 + 1);
    let mut cursor = 0;

    for m in matches {
        if m.start > cursor {
            fragments.push(NodeSpec::text(chars[cursor..m.start].iter().collect::<String>()));
        }
        let matched: String = chars[m.start..m.end].iter().collect();
        let translation = index.get(m.key).unwrap_or_default();
        fragments.push(marker_spec(&matched, translation));
        cursor = m.end;
    }
    if cursor < chars.len() {
        fragments.push(NodeSpec::text(chars[cursor..].iter().collect::<String>()));
    }
    fragments
}

pub fn marker_spec(matched: &str, translation: &str) -> NodeSpec {
    NodeSpec::element(
        "span",
        &[
            ("class", MARKER_CLASS),
            (ORIGINAL_WORD_ATTR, matched),
            (TRANSLATION_ATTR, translation),
        ],
        vec![NodeSpec::text(matched)],
    )
}

/// Swap one text node for its fragment list in a single splice.
pub fn replace_text_node(
    doc: &mut Document,
    node: NodeId,
    matches: &[WordMatch<'_>],
    index: &VocabularyIndex,
) -> Result<Vec<NodeId>, DomError> {
    let text = doc.text(node).ok_or(DomError::NotText(node))?.to_string();
    let fragments = split_into_fragments(&text, matches, index);
    doc.replace_node(node, fragments)
}

/// Inject the marker stylesheet once per document.
pub fn ensure_stylesheet(doc: &mut Document) -> Result<NodeId, DomError> {
    if let Some(existing) = doc.get_element_by_id(STYLE_ID) {
        return Ok(existing);
    }
    let style = doc.create_element("style");
    doc.set_attribute(style, "id", STYLE_ID)?;
    let css = doc.create_text(MARKER_STYLESHEET);
    doc.append_child(style, css)?;
    doc.append_child(doc.head(), style)?;
    Ok(style)
}

pub fn is_marker(doc: &Document, node: NodeId) -> bool {
    doc.element(node).is_some_and(|el| el.has_class(MARKER_CLASS))
}

/// Text nodes eligible for scanning, in document order.
fn candidate_text_nodes(doc: &Document) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![doc.body()];
    while let Some(node) = stack.pop() {
        if doc.is_text(node) {
            out.push(node);
            continue;
        }
        if let Some(el) = doc.element(node)
            && (SKIPPED_TAGS.iter().any(|t| el.is(t))
                || el.id() == Some(TOOLTIP_ID)
                || el.has_class(MARKER_CLASS))
        {
            continue;
        }
        stack.extend(doc.children(node).iter().rev());
    }
    out
}

/// `\b` semantics: word-ness differs on either side of `pos`.
fn is_boundary(chars: &[char], pos: usize) -> bool {
    let before = pos > 0 && is_word_char(chars[pos - 1]);
    let after = pos < chars.len() && is_word_char(chars[pos]);
    before != after
}

fn chars_match(text: char, key: char) -> bool {
    text == key || text.to_lowercase().eq(key.to_lowercase())
}
