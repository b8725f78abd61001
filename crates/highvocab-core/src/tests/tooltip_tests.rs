use std::time::Duration;

use highvocab_config::tooltip::TooltipConfig;
use highvocab_types::{Point, Rect, RelayOutcome};
use tokio::time::Instant;

use crate::dom::{Document, NodeId};
use crate::locator::{HoverCandidate, LocatorOutcome, PointerEvent};
use crate::tests::{at, page};
use crate::tooltip::{
    DisplayedText, NO_SAVED_TRANSLATION, SAVE_GUIDANCE, TooltipController, TooltipEffect, TooltipHit, TooltipPhase,
};
use crate::vocabulary::VocabularyIndex;

const ANCHOR: Rect = Rect::new(16.0, 32.0, 40.0, 16.0);

fn candidate(word: &str) -> LocatorOutcome {
    LocatorOutcome::Candidate(HoverCandidate {
        text: word.to_string(),
        anchor: Some(ANCHOR),
        known_translation: None,
    })
}

fn setup() -> (Document, NodeId, TooltipController) {
    let (doc, paragraphs) = page(&["some page text"]);
    (doc, paragraphs[0], TooltipController::new(TooltipConfig::default()))
}

fn hover(doc: &mut Document, target: NodeId, tooltip: &mut TooltipController, word: &str, now: Instant) {
    tooltip.on_pointer_over(doc, &PointerEvent::new(target, at(0, 0)), candidate(word), now);
}

#[test]
fn unknown_word_waits_for_click() {
    let (mut doc, p, mut tooltip) = setup();
    hover(&mut doc, p, &mut tooltip, "hello", Instant::now());

    let view = tooltip.view();
    assert!(view.visible);
    assert!(view.save_visible);
    assert_eq!(view.text, DisplayedText::PendingClick);
    assert_eq!(view.current_word.as_deref(), Some("hello"));
    assert_eq!(view.position, Point::new(16.0, 53.0));
}

#[test]
fn position_accounts_for_scroll_and_missing_anchor() {
    let (mut doc, p, mut tooltip) = setup();
    doc.set_scroll_offset(Point::new(0.0, 100.0));

    let outcome = LocatorOutcome::Candidate(HoverCandidate {
        text: "hello".into(),
        anchor: None,
        known_translation: None,
    });
    tooltip.on_pointer_over(&mut doc, &PointerEvent::new(p, Point::new(50.0, 60.0)), outcome, Instant::now());

    assert_eq!(tooltip.view().position, Point::new(60.0, 170.0));
}

#[test]
fn marker_translation_is_shown_without_save() {
    let (mut doc, p, mut tooltip) = setup();
    let outcome = LocatorOutcome::Candidate(HoverCandidate {
        text: "Hello".into(),
        anchor: Some(ANCHOR),
        known_translation: Some("hola".into()),
    });
    tooltip.on_pointer_over(&mut doc, &PointerEvent::new(p, at(0, 0)), outcome, Instant::now());

    let view = tooltip.view();
    assert_eq!(view.text, DisplayedText::Result("hola".into()));
    assert!(!view.save_visible);
}

#[test]
fn empty_saved_translation_has_placeholder() {
    let (mut doc, p, mut tooltip) = setup();
    let mut vocabulary = VocabularyIndex::default();
    vocabulary.insert("hello", "");
    tooltip.set_vocabulary(vocabulary);

    hover(&mut doc, p, &mut tooltip, "Hello", Instant::now());

    assert_eq!(tooltip.view().text.label(), NO_SAVED_TRANSLATION);
}

#[test]
fn click_fetches_and_result_is_shown() {
    let (mut doc, p, mut tooltip) = setup();
    hover(&mut doc, p, &mut tooltip, "hello", Instant::now());

    let effect = tooltip.on_tooltip_click(&mut doc);
    assert_eq!(effect, Some(TooltipEffect::Translate { word: "hello".into() }));
    assert_eq!(tooltip.view().text, DisplayedText::Fetching);

    // A second click while fetching does nothing.
    assert_eq!(tooltip.on_tooltip_click(&mut doc), None);

    tooltip.on_translation(&mut doc, "hello", RelayOutcome::Translated("hola".into()));
    let view = tooltip.view();
    assert_eq!(view.text, DisplayedText::Result("hola".into()));
    assert!(view.save_visible);
}

#[test]
fn failed_translation_shows_message() {
    let (mut doc, p, mut tooltip) = setup();
    hover(&mut doc, p, &mut tooltip, "hello", Instant::now());
    tooltip.on_tooltip_click(&mut doc);

    tooltip.on_translation(&mut doc, "hello", RelayOutcome::Failed("DeepL API key is not configured.".into()));

    assert_eq!(tooltip.view().text.label(), "DeepL API key is not configured.");
}

#[test]
fn stale_translation_is_discarded() {
    let (mut doc, p, mut tooltip) = setup();
    let now = Instant::now();
    hover(&mut doc, p, &mut tooltip, "alpha", now);
    tooltip.on_tooltip_click(&mut doc);
    hover(&mut doc, p, &mut tooltip, "beta", now);

    tooltip.on_translation(&mut doc, "alpha", RelayOutcome::Translated("ALPHA".into()));

    assert_eq!(
        tooltip.phase(),
        &TooltipPhase::PendingTranslate {
            word: "beta".into(),
            anchor: Some(ANCHOR),
        }
    );
}

#[test]
fn hovering_the_same_word_keeps_state() {
    let (mut doc, p, mut tooltip) = setup();
    let now = Instant::now();
    hover(&mut doc, p, &mut tooltip, "hello", now);
    tooltip.on_tooltip_click(&mut doc);

    tooltip.on_pointer_out(&doc, None, now);
    assert!(tooltip.hide_pending());
    hover(&mut doc, p, &mut tooltip, "Hello", now);

    assert!(!tooltip.hide_pending());
    assert_eq!(tooltip.view().text, DisplayedText::Fetching);
}

#[test]
fn hides_only_after_delay() {
    let (mut doc, p, mut tooltip) = setup();
    let now = Instant::now();
    hover(&mut doc, p, &mut tooltip, "hello", now);
    tooltip.on_pointer_out(&doc, None, now);

    assert_eq!(tooltip.next_deadline(), Some(now + Duration::from_millis(300)));
    tooltip.on_timer(&mut doc, now + Duration::from_millis(299));
    assert!(tooltip.view().visible);

    tooltip.on_timer(&mut doc, now + Duration::from_millis(300));
    assert!(!tooltip.view().visible);
    assert_eq!(tooltip.current_word(), None);
    assert_eq!(tooltip.next_deadline(), None);
}

#[test]
fn leaving_into_the_tooltip_keeps_it_open() {
    let (mut doc, p, mut tooltip) = setup();
    let now = Instant::now();
    hover(&mut doc, p, &mut tooltip, "hello", now);
    let root = tooltip.root_node().unwrap();

    tooltip.on_pointer_out(&doc, Some(root), now);
    assert!(!tooltip.hide_pending());

    // Pointer leaves the word for blank space, then reaches the tooltip.
    tooltip.on_pointer_out(&doc, Some(doc.body()), now);
    assert!(tooltip.hide_pending());
    let text = doc.children(root)[0];
    tooltip.on_pointer_over(&mut doc, &PointerEvent::new(text, at(0, 0)), LocatorOutcome::NoCandidate, now);
    assert!(!tooltip.hide_pending());
    assert_eq!(tooltip.hit(&doc, text), TooltipHit::Body);
}

#[test]
fn blank_space_schedules_hide() {
    let (mut doc, _, mut tooltip) = setup();
    let now = Instant::now();
    let body = doc.body();

    // Nothing to hide yet.
    tooltip.on_pointer_over(&mut doc, &PointerEvent::new(body, at(0, 5)), LocatorOutcome::NoCandidate, now);
    assert!(!tooltip.hide_pending());

    hover(&mut doc, body, &mut tooltip, "hello", now);
    tooltip.on_pointer_over(&mut doc, &PointerEvent::new(body, at(0, 5)), LocatorOutcome::NoCandidate, now);
    assert!(tooltip.hide_pending());
}

#[test]
fn scroll_hides_immediately() {
    let (mut doc, p, mut tooltip) = setup();
    let now = Instant::now();
    hover(&mut doc, p, &mut tooltip, "hello", now);
    tooltip.on_pointer_out(&doc, None, now);

    tooltip.on_scroll(&mut doc);

    assert!(!tooltip.view().visible);
    assert_eq!(tooltip.next_deadline(), None);
}

#[test]
fn saving_without_translation_shows_guidance() {
    let (mut doc, p, mut tooltip) = setup();
    let now = Instant::now();
    hover(&mut doc, p, &mut tooltip, "hello", now);

    assert_eq!(tooltip.on_save_click(&mut doc, now), None);
    assert_eq!(tooltip.view().text.label(), SAVE_GUIDANCE);
    assert!(!tooltip.view().save_visible);

    tooltip.on_timer(&mut doc, now + Duration::from_millis(1500));
    assert!(!tooltip.view().visible);
}

#[test]
fn save_success_confirms_and_rehighlights() {
    let (mut doc, p, mut tooltip) = setup();
    let now = Instant::now();
    hover(&mut doc, p, &mut tooltip, "hello", now);
    tooltip.on_tooltip_click(&mut doc);
    tooltip.on_translation(&mut doc, "hello", RelayOutcome::Translated("hola".into()));

    let effect = tooltip.on_save_click(&mut doc, now);
    assert_eq!(
        effect,
        Some(TooltipEffect::Persist {
            word: "hello".into(),
            translation: "hola".into(),
        })
    );
    assert!(!tooltip.view().save_visible);
    assert_eq!(tooltip.on_save_click(&mut doc, now), None);

    let effect = tooltip.on_save_completed(&mut doc, "hello", "hola", Ok(()), now);
    assert_eq!(effect, Some(TooltipEffect::Rehighlight));
    assert_eq!(tooltip.view().text.label(), "\"hello\" saved!");
    assert_eq!(tooltip.vocabulary().get("hello"), Some("hola"));

    tooltip.on_timer(&mut doc, now + Duration::from_millis(1499));
    assert!(tooltip.view().visible);
    tooltip.on_timer(&mut doc, now + Duration::from_millis(1500));
    assert!(!tooltip.view().visible);
}

#[test]
fn save_failure_reports_error() {
    let (mut doc, p, mut tooltip) = setup();
    let now = Instant::now();
    hover(&mut doc, p, &mut tooltip, "hello", now);
    tooltip.on_tooltip_click(&mut doc);
    tooltip.on_translation(&mut doc, "hello", RelayOutcome::Translated("hola".into()));
    tooltip.on_save_click(&mut doc, now);

    let effect = tooltip.on_save_completed(&mut doc, "hello", "hola", Err("disk full".into()), now);

    assert_eq!(effect, None);
    assert_eq!(tooltip.view().text.label(), "Could not save: disk full");
    assert!(!tooltip.vocabulary().contains("hello"));
    tooltip.on_timer(&mut doc, now + Duration::from_millis(2500));
    assert!(!tooltip.view().visible);
}

#[test]
fn dom_mirrors_the_view() {
    let (mut doc, p, mut tooltip) = setup();
    let now = Instant::now();
    hover(&mut doc, p, &mut tooltip, "hello", now);

    let root = tooltip.root_node().unwrap();
    let save = tooltip.save_button_node().unwrap();
    let style = doc.element(root).unwrap().attribute("style").unwrap().to_string();
    assert!(style.contains("left: 16px"));
    assert!(style.contains("opacity: 1"));
    assert_eq!(doc.text_content(doc.children(root)[0]), "Click to translate");
    assert_eq!(doc.element(save).unwrap().attribute("style"), Some("display: inline-block"));

    tooltip.on_scroll(&mut doc);
    let style = doc.element(root).unwrap().attribute("style").unwrap().to_string();
    assert!(style.contains("opacity: 0"));
    assert_eq!(tooltip.hit(&doc, save), TooltipHit::SaveButton);
}
