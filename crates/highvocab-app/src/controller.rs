use std::sync::Arc;

use highvocab_background::BackgroundService;
use highvocab_core::layout::MonospaceLayout;
use highvocab_core::relay::{BackgroundRelay, RelayEnvelope};
use highvocab_core::{ContentSession, Document, PageEvent};
use highvocab_translator::Translator;
use kanal::{AsyncReceiver, AsyncSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::state::AppState;

/// Centralized channel management
pub struct ChannelSet {
    pub page: (AsyncSender<PageEvent>, AsyncReceiver<PageEvent>),
    pub relay: (AsyncSender<RelayEnvelope>, AsyncReceiver<RelayEnvelope>),
}

impl ChannelSet {
    pub fn new(page_capacity: usize) -> Self {
        Self {
            page: kanal::bounded_async(page_capacity),
            relay: kanal::bounded_async(64),
        }
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    state: Arc<AppState>,
    cancel_token: CancellationToken,
}

impl AppController {
    pub async fn new(state: Arc<AppState>) -> Self {
        let capacity = state.config.read().await.event_capacity;
        Self {
            channels: ChannelSet::new(capacity),
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Sender for driving the page session.
    pub fn page_events(&self) -> AsyncSender<PageEvent> {
        self.channels.page.0.clone()
    }

    pub async fn spawn_tasks<T>(&self, doc: Document, translator: T) -> JoinSet<anyhow::Result<()>>
    where
        T: Translator + 'static,
    {
        let mut tasks = JoinSet::new();
        let config = self.state.config.read().await.clone();

        // Background service
        let service = Arc::new(BackgroundService::new(
            Arc::clone(&self.state.store),
            translator,
            &config.translator,
        ));
        tasks.spawn(service.serve(self.channels.relay.1.clone(), self.cancel_token.child_token()));

        // Page session
        let relay = BackgroundRelay::new(self.channels.relay.0.clone());
        let mut session = ContentSession::new(
            doc,
            &config,
            Arc::clone(&self.state.store),
            relay,
            self.channels.page.0.clone(),
        )
        .with_layout(MonospaceLayout::from_config(&config.layout));
        let rx = self.channels.page.1.clone();
        let cancel = self.cancel_token.child_token();
        let span = tracing::info_span!("page", session = %Uuid::new_v4());
        tasks.spawn(
            async move {
                let report = session.start().await;
                tracing::info!(markers = report.markers, "Initial highlight done");
                session.run(rx, cancel).await
            }
            .instrument(span),
        );

        tasks
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
