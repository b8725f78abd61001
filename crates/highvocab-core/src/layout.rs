use highvocab_config::layout::LayoutConfig;
use highvocab_types::Rect;

use crate::dom::{Document, NodeId};

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "div", "footer", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "li", "main", "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

const UNRENDERED_TAGS: &[&str] = &["head", "script", "style", "noscript", "template"];

/// Single-font, non-wrapping layout: blocks start new lines, inline content
/// flows left to right. Only text nodes receive rectangles.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceLayout {
    pub char_width: f64,
    pub line_height: f64,
}

impl MonospaceLayout {
    pub fn new(char_width: f64, line_height: f64) -> Self {
        Self {
            char_width,
            line_height,
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(config.char_width, config.line_height)
    }

    pub fn apply(&self, doc: &mut Document) {
        for node in doc.descendants(doc.root()) {
            doc.set_rect(node, None);
        }
        let mut cursor = Cursor::default();
        self.flow(doc, doc.body(), &mut cursor);
    }

    fn flow(&self, doc: &mut Document, node: NodeId, cursor: &mut Cursor) {
        if let Some(text) = doc.text(node) {
            let width = text.chars().count() as f64 * self.char_width;
            let rect = Rect::new(cursor.x, cursor.y, width, self.line_height);
            cursor.x += width;
            doc.set_rect(node, Some(rect));
            return;
        }

        let Some(element) = doc.element(node) else {
            return;
        };
        if UNRENDERED_TAGS.iter().any(|t| element.is(t)) || is_out_of_flow(element.attribute("style")) {
            return;
        }
        let block = BLOCK_TAGS.iter().any(|t| element.is(t));

        if block {
            self.break_line(cursor);
        }
        for child in doc.children(node).to_vec() {
            self.flow(doc, child, cursor);
        }
        if block {
            self.break_line(cursor);
        }
    }

    fn break_line(&self, cursor: &mut Cursor) {
        if cursor.x > 0.0 {
            cursor.x = 0.0;
            cursor.y += self.line_height;
        }
    }
}

#[derive(Default)]
struct Cursor {
    x: f64,
    y: f64,
}

fn is_out_of_flow(style: Option<&str>) -> bool {
    style.is_some_and(|s| s.contains("position: absolute") || s.contains("display: none"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeSpec;

    #[test]
    fn paragraphs_stack_vertically() {
        let mut doc = Document::new();
        let body = doc.body();
        let nodes = doc
            .append_specs(
                body,
                vec![
                    NodeSpec::element("p", &[], vec![NodeSpec::text("hello world")]),
                    NodeSpec::element("p", &[], vec![NodeSpec::text("bye")]),
                ],
            )
            .unwrap();

        MonospaceLayout::new(8.0, 16.0).apply(&mut doc);

        let first = doc.children(nodes[0])[0];
        let second = doc.children(nodes[1])[0];
        assert_eq!(doc.rect(first), Some(Rect::new(0.0, 0.0, 88.0, 16.0)));
        assert_eq!(doc.rect(second), Some(Rect::new(0.0, 16.0, 24.0, 16.0)));
        assert_eq!(doc.bounding_rect(nodes[1]), doc.rect(second));
    }
}
