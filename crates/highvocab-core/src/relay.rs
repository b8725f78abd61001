use async_trait::async_trait;
use highvocab_types::{RelayOutcome, RelayRequest, RelayResponse};
use kanal::AsyncSender;
use tokio::sync::oneshot;

pub const UNKNOWN_TRANSLATION_ERROR: &str = "Unknown translation error.";

/// Page-side access to the translation service.
#[async_trait]
pub trait TranslationRelay: Send + Sync {
    /// Never fails: transport problems come back as [`RelayOutcome::Failed`].
    async fn translate(&self, word: &str) -> RelayOutcome;
}

/// Request plus the channel its reply goes back on.
#[derive(Debug)]
pub struct RelayEnvelope {
    pub request: RelayRequest,
    pub reply: oneshot::Sender<RelayResponse>,
}

/// Relay that forwards requests to a background service over a channel.
#[derive(Clone)]
pub struct BackgroundRelay {
    tx: AsyncSender<RelayEnvelope>,
}

impl BackgroundRelay {
    pub fn new(tx: AsyncSender<RelayEnvelope>) -> Self {
        Self { tx }
    }

    async fn request(&self, request: RelayRequest) -> Result<RelayResponse, String> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(RelayEnvelope { request, reply })
            .await
            .map_err(|e| e.to_string())?;
        response.await.map_err(|e| e.to_string())
    }
}

#[async_trait]
impl TranslationRelay for BackgroundRelay {
    async fn translate(&self, word: &str) -> RelayOutcome {
        let request = RelayRequest::TranslateWord {
            word: word.to_string(),
        };
        match self.request(request).await {
            Ok(response) => normalize_response(response),
            Err(e) => {
                tracing::error!("Translation relay unavailable: {e}");
                RelayOutcome::Failed(format!("Internal error: {e}"))
            }
        }
    }
}

/// An error wins over a translation; an empty reply is an unknown error.
pub fn normalize_response(response: RelayResponse) -> RelayOutcome {
    match response {
        RelayResponse { error: Some(error), .. } => RelayOutcome::Failed(error),
        RelayResponse {
            translation: Some(text),
            ..
        } if !text.trim().is_empty() => RelayOutcome::Translated(text),
        _ => RelayOutcome::Failed(UNKNOWN_TRANSLATION_ERROR.to_string()),
    }
}
