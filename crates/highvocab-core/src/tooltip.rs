//! Tooltip state machine.
//!
//! [`TooltipController`] owns every piece of mutable hover UI state: the
//! current phase, the tooltip's DOM nodes and the two scheduled-task slots
//! (hide delay and post-action dismissal). Callers feed it events along with
//! the current instant and carry out the [`TooltipEffect`]s it hands back.

use highvocab_config::tooltip::TooltipConfig;
use highvocab_types::{Point, Rect, RelayOutcome};
use tokio::time::Instant;

use crate::dom::{Document, NodeId};
use crate::error::DomError;
use crate::highlighter::is_marker;
use crate::locator::{HoverCandidate, LocatorOutcome, PointerEvent};
use crate::preprocess::normalize_key;
use crate::vocabulary::VocabularyIndex;

pub const TOOLTIP_ID: &str = "my-highvocab-tooltip";
pub const TOOLTIP_TEXT_ID: &str = "my-highvocab-tooltip-text";
pub const SAVE_BUTTON_CLASS: &str = "my-highvocab-save";

pub const PENDING_TEXT: &str = "Click to translate";
pub const FETCHING_TEXT: &str = "Translating...";
pub const NO_SAVED_TRANSLATION: &str = "No saved translation.";
pub const SAVE_GUIDANCE: &str = "Translate the word before saving it.";
const SAVE_LABEL: &str = "Save";

#[derive(Debug, Clone, PartialEq)]
pub enum TooltipPhase {
    Hidden,
    PendingTranslate {
        word: String,
        anchor: Option<Rect>,
    },
    ShowingKnown {
        word: String,
        translation: String,
        anchor: Option<Rect>,
    },
    Fetching {
        word: String,
        anchor: Option<Rect>,
    },
    ShowingResult {
        word: String,
        translation: String,
        anchor: Option<Rect>,
    },
    SavedConfirmation {
        word: String,
    },
    ShowingError {
        word: String,
        message: String,
    },
    /// Transient guidance, e.g. saving before a translation exists.
    ShowingNotice {
        word: String,
        message: String,
    },
}

impl TooltipPhase {
    pub fn word(&self) -> Option<&str> {
        match self {
            TooltipPhase::Hidden => None,
            TooltipPhase::PendingTranslate { word, .. }
            | TooltipPhase::ShowingKnown { word, .. }
            | TooltipPhase::Fetching { word, .. }
            | TooltipPhase::ShowingResult { word, .. }
            | TooltipPhase::SavedConfirmation { word }
            | TooltipPhase::ShowingError { word, .. }
            | TooltipPhase::ShowingNotice { word, .. } => Some(word),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayedText {
    Empty,
    PendingClick,
    Fetching,
    Result(String),
    SavedConfirmation(String),
    Error(String),
    Notice(String),
}

impl DisplayedText {
    pub fn label(&self) -> String {
        match self {
            DisplayedText::Empty => String::new(),
            DisplayedText::PendingClick => PENDING_TEXT.to_string(),
            DisplayedText::Fetching => FETCHING_TEXT.to_string(),
            DisplayedText::Result(text) if text.is_empty() => NO_SAVED_TRANSLATION.to_string(),
            DisplayedText::Result(text) => text.clone(),
            DisplayedText::SavedConfirmation(word) => format!("\"{word}\" saved!"),
            DisplayedText::Error(message) | DisplayedText::Notice(message) => message.clone(),
        }
    }
}

/// Read-only projection of the tooltip for rendering and inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipView {
    pub current_word: Option<String>,
    pub text: DisplayedText,
    pub visible: bool,
    pub save_visible: bool,
    pub position: Point,
}

/// Work the controller asks its owner to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TooltipEffect {
    Translate { word: String },
    Persist { word: String, translation: String },
    Rehighlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TooltipHit {
    Outside,
    Body,
    SaveButton,
}

/// Cancellable deadline; cancelling is dropping it from its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledTask {
    deadline: Instant,
}

impl ScheduledTask {
    pub fn at(deadline: Instant) -> Self {
        Self { deadline }
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

#[derive(Debug, Clone, Copy)]
struct TooltipElements {
    root: NodeId,
    text: NodeId,
    save_button: NodeId,
}

pub struct TooltipController {
    config: TooltipConfig,
    phase: TooltipPhase,
    position: Point,
    vocabulary: VocabularyIndex,
    hide_task: Option<ScheduledTask>,
    dismiss_task: Option<ScheduledTask>,
    save_in_flight: bool,
    elements: Option<TooltipElements>,
}

impl TooltipController {
    pub fn new(config: TooltipConfig) -> Self {
        Self {
            config,
            phase: TooltipPhase::Hidden,
            position: Point::default(),
            vocabulary: VocabularyIndex::default(),
            hide_task: None,
            dismiss_task: None,
            save_in_flight: false,
            elements: None,
        }
    }

    pub fn phase(&self) -> &TooltipPhase {
        &self.phase
    }

    pub fn current_word(&self) -> Option<&str> {
        self.phase.word()
    }

    pub fn set_vocabulary(&mut self, vocabulary: VocabularyIndex) {
        self.vocabulary = vocabulary;
    }

    /// Fold in a freshly loaded index. Saved words are never removed, so the
    /// union is the current vocabulary.
    pub fn merge_vocabulary(&mut self, loaded: VocabularyIndex) {
        self.vocabulary.extend(loaded);
    }

    pub fn vocabulary(&self) -> &VocabularyIndex {
        &self.vocabulary
    }

    pub fn hide_pending(&self) -> bool {
        self.hide_task.is_some()
    }

    /// Earliest outstanding scheduled task.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.hide_task, self.dismiss_task]
            .into_iter()
            .flatten()
            .map(|task| task.deadline())
            .min()
    }

    pub fn root_node(&self) -> Option<NodeId> {
        self.elements.map(|el| el.root)
    }

    pub fn save_button_node(&self) -> Option<NodeId> {
        self.elements.map(|el| el.save_button)
    }

    pub fn view(&self) -> TooltipView {
        let text = match &self.phase {
            TooltipPhase::Hidden => DisplayedText::Empty,
            TooltipPhase::PendingTranslate { .. } => DisplayedText::PendingClick,
            TooltipPhase::Fetching { .. } => DisplayedText::Fetching,
            TooltipPhase::ShowingKnown { translation, .. } | TooltipPhase::ShowingResult { translation, .. } => {
                DisplayedText::Result(translation.clone())
            }
            TooltipPhase::SavedConfirmation { word } => DisplayedText::SavedConfirmation(word.clone()),
            TooltipPhase::ShowingError { message, .. } => DisplayedText::Error(message.clone()),
            TooltipPhase::ShowingNotice { message, .. } => DisplayedText::Notice(message.clone()),
        };

        TooltipView {
            current_word: self.current_word().map(str::to_string),
            text,
            visible: self.phase != TooltipPhase::Hidden,
            save_visible: self.save_visible(),
            position: self.position,
        }
    }

    /// Which part of the tooltip, if any, `target` belongs to.
    pub fn hit(&self, doc: &Document, target: NodeId) -> TooltipHit {
        match self.elements {
            Some(el) if doc.contains(el.save_button, target) => TooltipHit::SaveButton,
            Some(el) if doc.contains(el.root, target) => TooltipHit::Body,
            _ => TooltipHit::Outside,
        }
    }

    pub fn on_pointer_over(&mut self, doc: &mut Document, event: &PointerEvent, outcome: LocatorOutcome, now: Instant) {
        self.hide_task = None;

        match outcome {
            LocatorOutcome::Candidate(candidate) => self.show_candidate(doc, candidate, event.client),
            LocatorOutcome::NoCandidate => {
                if self.hit(doc, event.target) == TooltipHit::Outside && !is_marker(doc, event.target) {
                    self.schedule_hide(now);
                }
            }
        }
    }

    pub fn on_pointer_out(&mut self, doc: &Document, related_target: Option<NodeId>, now: Instant) {
        if let Some(related) = related_target
            && (self.hit(doc, related) != TooltipHit::Outside || is_marker(doc, related))
        {
            return;
        }
        self.schedule_hide(now);
    }

    /// Click on the tooltip body: starts a fetch for a pending word.
    pub fn on_tooltip_click(&mut self, doc: &mut Document) -> Option<TooltipEffect> {
        let TooltipPhase::PendingTranslate { word, anchor } = &self.phase else {
            return None;
        };
        let (word, anchor) = (word.clone(), *anchor);
        self.phase = TooltipPhase::Fetching {
            word: word.clone(),
            anchor,
        };
        tracing::debug!("Fetching translation for '{word}'");
        self.render(doc);
        Some(TooltipEffect::Translate { word })
    }

    pub fn on_translation(&mut self, doc: &mut Document, word: &str, outcome: RelayOutcome) {
        let anchor = match &self.phase {
            TooltipPhase::Fetching { word: current, anchor } | TooltipPhase::PendingTranslate { word: current, anchor }
                if current == word =>
            {
                *anchor
            }
            _ => {
                tracing::debug!("Discarding stale translation for '{word}'");
                return;
            }
        };

        self.phase = match outcome {
            RelayOutcome::Translated(translation) => TooltipPhase::ShowingResult {
                word: word.to_string(),
                translation,
                anchor,
            },
            RelayOutcome::Failed(message) => TooltipPhase::ShowingError {
                word: word.to_string(),
                message,
            },
        };
        self.render(doc);
    }

    pub fn on_save_click(&mut self, doc: &mut Document, now: Instant) -> Option<TooltipEffect> {
        if self.save_in_flight || !self.save_visible() {
            return None;
        }

        match &self.phase {
            TooltipPhase::ShowingResult { word, translation, .. }
                if translation != FETCHING_TEXT && !translation.trim().is_empty() =>
            {
                let effect = TooltipEffect::Persist {
                    word: word.clone(),
                    translation: translation.clone(),
                };
                self.save_in_flight = true;
                self.render(doc);
                Some(effect)
            }
            phase => {
                let word = phase.word().unwrap_or_default().to_string();
                self.phase = TooltipPhase::ShowingNotice {
                    word,
                    message: SAVE_GUIDANCE.to_string(),
                };
                self.dismiss_task = Some(ScheduledTask::at(now + self.config.notice_display()));
                self.render(doc);
                None
            }
        }
    }

    pub fn on_save_completed(
        &mut self,
        doc: &mut Document,
        word: &str,
        translation: &str,
        result: Result<(), String>,
        now: Instant,
    ) -> Option<TooltipEffect> {
        self.save_in_flight = false;
        let showing = self
            .current_word()
            .is_some_and(|current| normalize_key(current) == normalize_key(word));

        match result {
            Ok(()) => {
                self.vocabulary.insert(word, translation);
                if showing {
                    self.phase = TooltipPhase::SavedConfirmation {
                        word: word.to_string(),
                    };
                    self.dismiss_task = Some(ScheduledTask::at(now + self.config.saved_display()));
                    self.render(doc);
                }
                Some(TooltipEffect::Rehighlight)
            }
            Err(message) => {
                tracing::warn!("Saving '{word}' failed: {message}");
                if showing {
                    self.phase = TooltipPhase::ShowingError {
                        word: word.to_string(),
                        message: format!("Could not save: {message}"),
                    };
                    self.dismiss_task = Some(ScheduledTask::at(now + self.config.save_error_display()));
                    self.render(doc);
                }
                None
            }
        }
    }

    /// Scrolling invalidates anchors: hide now and drop both slots.
    pub fn on_scroll(&mut self, doc: &mut Document) {
        self.hide_task = None;
        self.dismiss_task = None;
        self.hide(doc);
    }

    /// Fire whichever scheduled tasks are due at `now`.
    pub fn on_timer(&mut self, doc: &mut Document, now: Instant) {
        let hide_due = self.hide_task.is_some_and(|task| task.is_due(now));
        let dismiss_due = self.dismiss_task.is_some_and(|task| task.is_due(now));
        if hide_due {
            self.hide_task = None;
        }
        if dismiss_due {
            self.dismiss_task = None;
        }
        if hide_due || dismiss_due {
            self.hide(doc);
        }
    }

    fn show_candidate(&mut self, doc: &mut Document, candidate: HoverCandidate, client: Point) {
        if self
            .current_word()
            .is_some_and(|current| current.eq_ignore_ascii_case(&candidate.text))
        {
            return;
        }

        self.dismiss_task = None;
        self.save_in_flight = false;
        self.position = self.position_for(doc, candidate.anchor, client);

        let known = candidate
            .known_translation
            .or_else(|| self.vocabulary.get(&candidate.text).map(str::to_string));
        self.phase = match known {
            Some(translation) => TooltipPhase::ShowingKnown {
                word: candidate.text,
                translation,
                anchor: candidate.anchor,
            },
            None => TooltipPhase::PendingTranslate {
                word: candidate.text,
                anchor: candidate.anchor,
            },
        };
        tracing::debug!("Tooltip now {:?}", self.phase);
        self.render(doc);
    }

    fn schedule_hide(&mut self, now: Instant) {
        if self.phase == TooltipPhase::Hidden {
            return;
        }
        self.hide_task = Some(ScheduledTask::at(now + self.config.hide_delay()));
    }

    fn hide(&mut self, doc: &mut Document) {
        if self.phase != TooltipPhase::Hidden {
            tracing::debug!("Hiding tooltip");
        }
        self.phase = TooltipPhase::Hidden;
        self.save_in_flight = false;
        self.render(doc);
    }

    fn save_visible(&self) -> bool {
        let offered = matches!(
            self.phase,
            TooltipPhase::PendingTranslate { .. } | TooltipPhase::Fetching { .. } | TooltipPhase::ShowingResult { .. }
        );
        offered
            && !self.save_in_flight
            && self
                .current_word()
                .is_some_and(|word| !self.vocabulary.contains(word))
    }

    fn position_for(&self, doc: &Document, anchor: Option<Rect>, client: Point) -> Point {
        let scroll = doc.scroll_offset();
        match anchor {
            Some(rect) => Point::new(
                rect.left + scroll.x,
                rect.bottom() + scroll.y + self.config.anchor_gap_px,
            ),
            None => Point::new(
                client.x + scroll.x + self.config.pointer_offset_px,
                client.y + scroll.y + self.config.pointer_offset_px,
            ),
        }
    }

    /// Mirror the current view into the tooltip's DOM nodes, creating them
    /// on first use.
    fn render(&mut self, doc: &mut Document) {
        let view = self.view();
        if self.elements.is_none() && !view.visible {
            return;
        }
        if let Err(e) = self.try_render(doc, &view) {
            tracing::warn!("Tooltip render failed: {e}");
        }
    }

    fn try_render(&mut self, doc: &mut Document, view: &TooltipView) -> Result<(), DomError> {
        let elements = self.ensure_elements(doc)?;

        let label = view.text.label();
        if doc.text_content(elements.text) != label {
            doc.set_text_content(elements.text, &label)?;
        }
        doc.set_attribute(
            elements.root,
            "style",
            format!(
                "position: absolute; left: {}px; top: {}px; opacity: {}",
                view.position.x,
                view.position.y,
                if view.visible { 1 } else { 0 }
            ),
        )?;
        doc.set_attribute(
            elements.save_button,
            "style",
            if view.save_visible {
                "display: inline-block"
            } else {
                "display: none"
            },
        )?;
        Ok(())
    }

    fn ensure_elements(&mut self, doc: &mut Document) -> Result<TooltipElements, DomError> {
        if let Some(elements) = self.elements
            && doc.is_attached(elements.root)
        {
            return Ok(elements);
        }

        let root = doc.create_element("div");
        doc.set_attribute(root, "id", TOOLTIP_ID)?;
        let text = doc.create_element("span");
        doc.set_attribute(text, "id", TOOLTIP_TEXT_ID)?;
        let save_button = doc.create_element("button");
        doc.set_attribute(save_button, "class", SAVE_BUTTON_CLASS)?;
        let save_label = doc.create_text(SAVE_LABEL);

        doc.append_child(save_button, save_label)?;
        doc.append_child(root, text)?;
        doc.append_child(root, save_button)?;
        doc.append_child(doc.body(), root)?;

        let elements = TooltipElements {
            root,
            text,
            save_button,
        };
        self.elements = Some(elements);
        Ok(elements)
    }
}
