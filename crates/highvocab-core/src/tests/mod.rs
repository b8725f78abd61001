mod tooltip_tests;

use highvocab_types::Point;

use crate::dom::{Document, NodeId, NodeSpec};
use crate::layout::MonospaceLayout;

pub(crate) const CHAR_WIDTH: f64 = 8.0;
pub(crate) const LINE_HEIGHT: f64 = 16.0;

pub(crate) fn layout() -> MonospaceLayout {
    MonospaceLayout::new(CHAR_WIDTH, LINE_HEIGHT)
}

/// One `<p>` per line, laid out; returns the paragraph nodes.
pub(crate) fn page(lines: &[&str]) -> (Document, Vec<NodeId>) {
    let mut doc = Document::new();
    let specs = lines
        .iter()
        .map(|line| NodeSpec::element("p", &[], vec![NodeSpec::text(*line)]))
        .collect();
    let body = doc.body();
    let paragraphs = doc.append_specs(body, specs).unwrap();
    doc.take_mutations();
    layout().apply(&mut doc);
    (doc, paragraphs)
}

/// Client point over the middle of a character cell.
pub(crate) fn at(column: usize, line: usize) -> Point {
    Point::new(
        column as f64 * CHAR_WIDTH + CHAR_WIDTH / 2.0,
        line as f64 * LINE_HEIGHT + LINE_HEIGHT / 2.0,
    )
}
