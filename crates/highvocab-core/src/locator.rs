use highvocab_types::{Point, Rect};

use crate::dom::{Document, Element, NodeId};
use crate::highlighter::{MARKER_CLASS, ORIGINAL_WORD_ATTR, TRANSLATION_ATTR};
use crate::preprocess::{WordShape, char_slice, expand_word};
use crate::tooltip::TOOLTIP_ID;

/// Elements whose content is never offered for translation.
pub const IGNORED_TAGS: &[&str] = &[
    "script", "style", "noscript", "textarea", "input", "select", "option", "button",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub target: NodeId,
    pub client: Point,
    pub related_target: Option<NodeId>,
}

impl PointerEvent {
    pub fn new(target: NodeId, client: Point) -> Self {
        Self {
            target,
            client,
            related_target: None,
        }
    }
}

/// Word found under the pointer for a single event.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverCandidate {
    pub text: String,
    pub anchor: Option<Rect>,
    /// Set when the word came from an existing marker.
    pub known_translation: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocatorOutcome {
    Candidate(HoverCandidate),
    NoCandidate,
}

impl LocatorOutcome {
    pub fn candidate(&self) -> Option<&HoverCandidate> {
        match self {
            LocatorOutcome::Candidate(c) => Some(c),
            LocatorOutcome::NoCandidate => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WordLocator {
    shape: WordShape,
}

impl WordLocator {
    pub fn new(shape: WordShape) -> Self {
        Self { shape }
    }

    pub fn locate(&self, doc: &Document, event: &PointerEvent) -> LocatorOutcome {
        let target = event.target;

        if doc.closest(target, is_excluded_surface).is_some() {
            return LocatorOutcome::NoCandidate;
        }

        if let Some(selected) = doc.selection_text() {
            let selected = selected.trim();
            if !selected.is_empty() {
                return self.accept(selected, doc.selection_rect(), None);
            }
        }

        if let Some(marker) = doc.closest(target, |el| el.has_class(MARKER_CLASS)) {
            let Some(el) = doc.element(marker) else {
                return LocatorOutcome::NoCandidate;
            };
            let word = el
                .attribute(ORIGINAL_WORD_ATTR)
                .map(str::to_string)
                .unwrap_or_else(|| doc.text_content(marker));
            let translation = el.attribute(TRANSLATION_ATTR).unwrap_or_default().to_string();
            return self.accept(word.trim(), doc.bounding_rect(marker), Some(translation));
        }

        if doc.element(target).is_some() {
            let content = doc.text_content(target);
            let mut tokens = content.split_whitespace();
            if let (Some(token), None) = (tokens.next(), tokens.next()) {
                return self.accept(token, doc.bounding_rect(target), None);
            }
        }

        let Some(caret) = doc.caret_from_point(event.client) else {
            return LocatorOutcome::NoCandidate;
        };
        if !doc.contains(target, caret.node) {
            return LocatorOutcome::NoCandidate;
        }
        let Some(text) = doc.text(caret.node) else {
            return LocatorOutcome::NoCandidate;
        };
        let (start, end) = expand_word(text, caret.offset);
        let word = char_slice(text, start, end);
        let anchor = doc
            .parent(caret.node)
            .and_then(|parent| doc.bounding_rect(parent));
        self.accept(word.trim(), anchor, None)
    }

    fn accept(&self, text: &str, anchor: Option<Rect>, known_translation: Option<String>) -> LocatorOutcome {
        if !self.shape.accepts(text) {
            return LocatorOutcome::NoCandidate;
        }
        LocatorOutcome::Candidate(HoverCandidate {
            text: text.to_string(),
            anchor,
            known_translation,
        })
    }
}

fn is_excluded_surface(el: &Element) -> bool {
    IGNORED_TAGS.iter().any(|t| el.is(t)) || el.id() == Some(TOOLTIP_ID)
}
