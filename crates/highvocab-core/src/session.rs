//! One page's content script: owns the document, the tooltip and the
//! highlighter, and reacts to [`PageEvent`]s.
//!
//! Every mutable piece of hover state lives inside the session and is only
//! touched from [`ContentSession::handle_event`]. Slow work (translation,
//! saving) runs on spawned tasks that report back through the same event
//! channel, so completions are ordered against user input.

use std::sync::Arc;

use highvocab_config::Config;
use highvocab_types::{Point, RelayOutcome};
use kanal::{AsyncReceiver, AsyncSender};
use tokio::sync::oneshot;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::dom::{Document, NodeId, NodeSpec, Selection, TextPosition};
use crate::highlighter::{HighlightReport, MARKER_CLASS, highlight};
use crate::layout::MonospaceLayout;
use crate::locator::{PointerEvent, WordLocator};
use crate::observer::MutationObserver;
use crate::preprocess::WordShape;
use crate::relay::TranslationRelay;
use crate::storage::KeyValueStore;
use crate::tooltip::{TooltipController, TooltipEffect, TooltipHit, TooltipView};
use crate::vocabulary::{VocabularyIndex, VocabularyStore};

/// Highlight passes run for one batch of mutations before giving up.
const MAX_PASSES: usize = 4;

#[derive(Debug)]
pub enum PageEvent {
    PointerOver(PointerEvent),
    PointerOut {
        target: NodeId,
        related_target: Option<NodeId>,
    },
    /// Pointer moved to a client point; the session hit-tests it and
    /// synthesizes out/over events.
    PointerMove {
        client: Point,
    },
    Click {
        target: NodeId,
    },
    Scroll {
        offset: Point,
    },
    SelectionChanged(Option<Selection>),
    /// Select the text between two client points.
    SelectBetween {
        from: Point,
        to: Point,
    },
    /// Script-inserted content.
    InsertNodes {
        parent: NodeId,
        nodes: Vec<NodeSpec>,
    },
    TranslationResolved {
        word: String,
        outcome: RelayOutcome,
    },
    SaveCompleted {
        word: String,
        translation: String,
        result: Result<(), String>,
    },
    /// Index re-read from the store after the page changed.
    VocabularyLoaded(Result<VocabularyIndex, String>),
    Inspect(oneshot::Sender<PageSnapshot>),
}

#[derive(Debug, Clone)]
pub struct PageSnapshot {
    pub tooltip: TooltipView,
    pub tooltip_node: Option<NodeId>,
    pub save_button: Option<NodeId>,
    pub body: NodeId,
    pub markers: usize,
    pub html: String,
}

pub struct ContentSession<S, R> {
    doc: Document,
    tooltip: TooltipController,
    locator: WordLocator,
    layout: Option<MonospaceLayout>,
    observer: MutationObserver,
    vocabulary: Arc<VocabularyStore<S>>,
    relay: Arc<R>,
    events: AsyncSender<PageEvent>,
    hovered: Option<NodeId>,
    refreshing: bool,
    refresh_again: bool,
}

impl<S, R> ContentSession<S, R>
where
    S: KeyValueStore + 'static,
    R: TranslationRelay + 'static,
{
    /// `events` is the sending half of the channel the session is driven
    /// from; spawned work reports back on it.
    pub fn new(doc: Document, config: &Config, store: S, relay: R, events: AsyncSender<PageEvent>) -> Self {
        let tooltip_config = config.tooltip.clone();
        let shape = WordShape::new(tooltip_config.min_word_len, tooltip_config.max_word_len);
        Self {
            doc,
            tooltip: TooltipController::new(tooltip_config),
            locator: WordLocator::new(shape),
            layout: None,
            observer: MutationObserver::new(),
            vocabulary: Arc::new(VocabularyStore::new(store)),
            relay: Arc::new(relay),
            events,
            hovered: None,
            refreshing: false,
            refresh_again: false,
        }
    }

    /// Lay the document out after every structural change.
    pub fn with_layout(mut self, layout: MonospaceLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn tooltip(&self) -> &TooltipController {
        &self.tooltip
    }

    pub fn view(&self) -> TooltipView {
        self.tooltip.view()
    }

    pub fn tooltip_node(&self) -> Option<NodeId> {
        self.tooltip.root_node()
    }

    pub fn save_button(&self) -> Option<NodeId> {
        self.tooltip.save_button_node()
    }

    pub fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            tooltip: self.tooltip.view(),
            tooltip_node: self.tooltip.root_node(),
            save_button: self.tooltip.save_button_node(),
            body: self.doc.body(),
            markers: self.marker_count(),
            html: self.doc.to_html(),
        }
    }

    pub fn marker_count(&self) -> usize {
        self.doc
            .descendants(self.doc.body())
            .into_iter()
            .filter(|&n| self.doc.element(n).is_some_and(|el| el.has_class(MARKER_CLASS)))
            .count()
    }

    /// Load the vocabulary and run the initial highlight pass. A store
    /// failure leaves the page unhighlighted.
    pub async fn start(&mut self) -> HighlightReport {
        let index = match self.vocabulary.index().await {
            Ok(index) => index,
            Err(e) => {
                tracing::error!("Could not load saved words: {e}");
                VocabularyIndex::default()
            }
        };
        tracing::info!("Loaded {} saved words", index.len());
        self.tooltip.set_vocabulary(index);

        self.relayout();
        let report = self.rehighlight();
        // Mutations from the initial pass are our own.
        self.doc.take_mutations();
        report
    }

    /// Drive the session until cancelled or the channel closes.
    pub async fn run(mut self, rx: AsyncReceiver<PageEvent>, cancel: CancellationToken) -> anyhow::Result<()> {
        tracing::info!("Page session started");
        loop {
            let deadline = self.tooltip.next_deadline();
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Page session cancelled");
                    break;
                }
                event = rx.recv() => match event {
                    Ok(event) => self.handle_event(event),
                    Err(e) => {
                        tracing::debug!("Page event channel closed: {e}");
                        break;
                    }
                },
                _ = wait_until(deadline) => self.fire_due_timers(Instant::now()),
            }
        }
        Ok(())
    }

    pub fn handle_event(&mut self, event: PageEvent) {
        let now = Instant::now();
        match event {
            PageEvent::PointerOver(event) => self.pointer_over(event, now),
            PageEvent::PointerOut {
                target,
                related_target,
            } => {
                tracing::trace!("Pointer out of {target}");
                self.tooltip.on_pointer_out(&self.doc, related_target, now);
            }
            PageEvent::PointerMove { client } => self.pointer_move(client, now),
            PageEvent::Click { target } => self.click(target, now),
            PageEvent::Scroll { offset } => {
                self.doc.set_scroll_offset(offset);
                self.tooltip.on_scroll(&mut self.doc);
            }
            PageEvent::SelectionChanged(selection) => self.doc.set_selection(selection),
            PageEvent::SelectBetween { from, to } => {
                let selection = match (self.doc.caret_from_point(from), self.doc.caret_from_point(to)) {
                    (Some(anchor), Some(focus)) => Some(Selection {
                        anchor,
                        focus: TextPosition {
                            node: focus.node,
                            offset: focus.offset + 1,
                        },
                    }),
                    _ => None,
                };
                self.doc.set_selection(selection);
            }
            PageEvent::InsertNodes { parent, nodes } => {
                if let Err(e) = self.doc.append_specs(parent, nodes) {
                    tracing::warn!("Could not insert nodes under {parent}: {e}");
                }
            }
            PageEvent::TranslationResolved { word, outcome } => {
                self.tooltip.on_translation(&mut self.doc, &word, outcome);
            }
            PageEvent::SaveCompleted {
                word,
                translation,
                result,
            } => {
                let effect = self
                    .tooltip
                    .on_save_completed(&mut self.doc, &word, &translation, result, now);
                self.dispatch(effect);
            }
            PageEvent::VocabularyLoaded(result) => self.vocabulary_loaded(result),
            PageEvent::Inspect(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
        self.flush_mutations();
    }

    pub fn fire_due_timers(&mut self, now: Instant) {
        self.tooltip.on_timer(&mut self.doc, now);
        self.flush_mutations();
    }

    /// Highlight with the tooltip's current vocabulary.
    pub fn rehighlight(&mut self) -> HighlightReport {
        let report = highlight(&mut self.doc, self.tooltip.vocabulary());
        self.relayout();
        report
    }

    /// React to recorded mutations, rescanning until the page settles.
    pub fn flush_mutations(&mut self) {
        if let Some(root) = self.tooltip.root_node() {
            self.observer.ignore(root);
        }

        let mut passes = 0;
        loop {
            let records = self.doc.take_mutations();
            if !self.observer.wants_rescan(&self.doc, &records) {
                break;
            }
            if passes == MAX_PASSES {
                tracing::warn!("Page still changing after {MAX_PASSES} highlight passes");
                break;
            }
            passes += 1;
            highlight(&mut self.doc, self.tooltip.vocabulary());
        }

        if passes > 0 {
            self.relayout();
            self.refresh_vocabulary();
        }
    }

    /// Re-read the saved words in the background; other pages may have
    /// added some. At most one read is in flight.
    fn refresh_vocabulary(&mut self) {
        if self.refreshing {
            self.refresh_again = true;
            return;
        }
        self.refreshing = true;

        let vocabulary = Arc::clone(&self.vocabulary);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = vocabulary.index().await.map_err(|e| e.to_string());
            if let Err(e) = events.send(PageEvent::VocabularyLoaded(result)).await {
                tracing::debug!("Dropping saved words, page is gone: {e}");
            }
        });
    }

    fn vocabulary_loaded(&mut self, result: Result<VocabularyIndex, String>) {
        self.refreshing = false;
        match result {
            Ok(index) => {
                self.tooltip.merge_vocabulary(index);
                let report = self.rehighlight();
                // Our own markers must not trigger another read.
                self.doc.take_mutations();
                tracing::debug!(markers = report.markers, "Rehighlighted with stored words");
            }
            Err(e) => tracing::warn!("Could not reload saved words: {e}"),
        }
        if std::mem::take(&mut self.refresh_again) {
            self.refresh_vocabulary();
        }
    }

    fn pointer_over(&mut self, event: PointerEvent, now: Instant) {
        let outcome = self.locator.locate(&self.doc, &event);
        tracing::trace!("Pointer over {}: {:?}", event.target, outcome);
        self.tooltip.on_pointer_over(&mut self.doc, &event, outcome, now);
    }

    /// Each move counts as entering the element under the pointer.
    fn pointer_move(&mut self, client: Point, now: Instant) {
        let target = self.hit_test(client);
        if let Some(previous) = self.hovered
            && previous != target
        {
            self.tooltip.on_pointer_out(&self.doc, Some(target), now);
        }
        self.hovered = Some(target);

        let event = PointerEvent {
            target,
            client,
            related_target: None,
        };
        self.pointer_over(event, now);
    }

    fn click(&mut self, target: NodeId, now: Instant) {
        let effect = match self.tooltip.hit(&self.doc, target) {
            TooltipHit::SaveButton => self.tooltip.on_save_click(&mut self.doc, now),
            TooltipHit::Body => self.tooltip.on_tooltip_click(&mut self.doc),
            TooltipHit::Outside => None,
        };
        self.dispatch(effect);
    }

    /// Element owning the text under `client`, or the body.
    fn hit_test(&self, client: Point) -> NodeId {
        self.doc
            .caret_from_point(client)
            .and_then(|caret| self.doc.parent(caret.node))
            .unwrap_or_else(|| self.doc.body())
    }

    fn dispatch(&mut self, effect: Option<TooltipEffect>) {
        match effect {
            None => {}
            Some(TooltipEffect::Translate { word }) => {
                let relay = Arc::clone(&self.relay);
                let events = self.events.clone();
                tokio::spawn(async move {
                    let outcome = relay.translate(&word).await;
                    if let Err(e) = events.send(PageEvent::TranslationResolved { word, outcome }).await {
                        tracing::debug!("Dropping translation, page is gone: {e}");
                    }
                });
            }
            Some(TooltipEffect::Persist { word, translation }) => {
                let vocabulary = Arc::clone(&self.vocabulary);
                let events = self.events.clone();
                tokio::spawn(async move {
                    let result = vocabulary
                        .save(&word, &translation)
                        .await
                        .map(|_| ())
                        .map_err(|e| e.to_string());
                    let event = PageEvent::SaveCompleted {
                        word,
                        translation,
                        result,
                    };
                    if let Err(e) = events.send(event).await {
                        tracing::debug!("Dropping save result, page is gone: {e}");
                    }
                });
            }
            Some(TooltipEffect::Rehighlight) => {
                let report = self.rehighlight();
                self.doc.take_mutations();
                tracing::debug!(markers = report.markers, "Rehighlighted after save");
                self.refresh_vocabulary();
            }
        }
    }

    fn relayout(&mut self) {
        if let Some(layout) = self.layout {
            layout.apply(&mut self.doc);
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
