use std::sync::Arc;

use highvocab_config::translator::TranslatorConfig;
use highvocab_core::KeyValueStore;
use highvocab_core::relay::RelayEnvelope;
use highvocab_translator::Translator;
use highvocab_types::{RelayRequest, RelayResponse};
use kanal::AsyncReceiver;
use tokio_util::sync::CancellationToken;

use crate::error::BackgroundError;
use crate::settings::read_api_key;

/// Holds the credential and answers translation requests from pages.
pub struct BackgroundService<S, T> {
    store: S,
    translator: T,
    source_lang: String,
    target_lang: String,
}

impl<S, T> BackgroundService<S, T>
where
    S: KeyValueStore,
    T: Translator,
{
    pub fn new(store: S, translator: T, config: &TranslatorConfig) -> Self {
        Self {
            store,
            translator,
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The credential is read on every request so a key saved from the
    /// settings surface applies immediately.
    pub async fn translate_word(&self, word: &str) -> Result<String, BackgroundError> {
        let key = read_api_key(&self.store)
            .await?
            .ok_or(BackgroundError::ConfigurationMissing)?;

        let translation = self
            .translator
            .translate(word, self.source_lang.clone(), self.target_lang.clone(), &key)
            .await?;

        if translation.text.trim().is_empty() {
            return Err(BackgroundError::NoTranslation);
        }
        Ok(translation.text)
    }

    pub async fn handle(&self, request: RelayRequest) -> RelayResponse {
        match request {
            RelayRequest::TranslateWord { word } => match self.translate_word(&word).await {
                Ok(translation) => {
                    tracing::debug!("Translated '{word}'");
                    RelayResponse::translation(translation)
                }
                Err(e) => {
                    tracing::warn!("Translation of '{word}' failed: {e}");
                    RelayResponse::error(e.to_string())
                }
            },
        }
    }
}

impl<S, T> BackgroundService<S, T>
where
    S: KeyValueStore + 'static,
    T: Translator + 'static,
{
    /// Answer envelopes until cancelled; each request runs on its own task.
    pub async fn serve(
        self: Arc<Self>,
        rx: AsyncReceiver<RelayEnvelope>,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        tracing::info!("Background service started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Background service stopping");
                    break;
                }
                envelope = rx.recv() => {
                    let RelayEnvelope { request, reply } = match envelope {
                        Ok(envelope) => envelope,
                        Err(e) => {
                            tracing::debug!("Relay channel closed: {e}");
                            break;
                        }
                    };
                    let service = Arc::clone(&self);
                    tokio::spawn(async move {
                        let response = service.handle(request).await;
                        if reply.send(response).is_err() {
                            tracing::debug!("Requesting page went away before the reply");
                        }
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use highvocab_core::MemoryStore;
    use highvocab_core::relay::{BackgroundRelay, TranslationRelay};
    use highvocab_translator::{LanguageCode, ProviderMetadata, TranslateError, Translation};
    use highvocab_types::RelayOutcome;
    use serde_json::json;

    use super::*;
    use crate::settings::API_KEY_STORAGE_KEY;

    type Reply = Box<dyn Fn() -> Result<String, TranslateError> + Send + Sync>;

    struct MockTranslator {
        reply: Reply,
        calls: Mutex<Vec<(String, String, String, String)>>,
    }

    impl MockTranslator {
        fn new(reply: impl Fn() -> Result<String, TranslateError> + Send + Sync + 'static) -> Self {
            Self {
                reply: Box::new(reply),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Translator for MockTranslator {
        async fn translate(
            &self,
            text: &str,
            from: LanguageCode,
            to: LanguageCode,
            auth_key: &str,
        ) -> Result<Translation, TranslateError> {
            self.calls
                .lock()
                .unwrap()
                .push((text.into(), from.clone(), to.clone(), auth_key.into()));
            (self.reply)().map(|text| Translation {
                text,
                from,
                to,
                provider: "mock".into(),
            })
        }

        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata {
                name: "mock".into(),
                requires_api_key: true,
                free_tier_available: true,
            }
        }
    }

    fn keyed_store() -> MemoryStore {
        MemoryStore::with_value(API_KEY_STORAGE_KEY, json!("secret"))
    }

    fn service(store: MemoryStore, translator: MockTranslator) -> BackgroundService<MemoryStore, MockTranslator> {
        BackgroundService::new(store, translator, &TranslatorConfig::default())
    }

    fn word(word: &str) -> RelayRequest {
        RelayRequest::TranslateWord { word: word.into() }
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let service = service(MemoryStore::new(), MockTranslator::new(|| Ok("hola".into())));

        let response = service.handle(word("hello")).await;

        assert_eq!(response, RelayResponse::error("DeepL API key is not configured."));
        assert!(service.translator.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn request_carries_languages_and_key() {
        let service = service(keyed_store(), MockTranslator::new(|| Ok("hola".into())));

        let response = service.handle(word("hello")).await;

        assert_eq!(response, RelayResponse::translation("hola"));
        let calls = service.translator.calls.lock().unwrap();
        let expected = ("hello".to_string(), "EN".to_string(), "ES".to_string(), "secret".to_string());
        assert_eq!(*calls, vec![expected]);
    }

    #[tokio::test]
    async fn provider_failures_become_messages() {
        let cases: Vec<(Reply, &str)> = vec![
            (
                Box::new(|| Err(TranslateError::AuthenticationError)),
                "Authentication error. Check your DeepL API key.",
            ),
            (
                Box::new(|| Err(TranslateError::RateLimitExceeded)),
                "DeepL rate limit exceeded. Try again later.",
            ),
            (Box::new(|| Err(TranslateError::NoTranslation)), "No translation found."),
            (
                Box::new(|| {
                    Err(TranslateError::Http {
                        status: 456,
                        body: "Quota exceeded".into(),
                    })
                }),
                "Translation error: DeepL API error: 456 - Quota exceeded",
            ),
            (Box::new(|| Ok("  ".into())), "No translation found."),
        ];

        for (reply, expected) in cases {
            let service = service(
                keyed_store(),
                MockTranslator {
                    reply,
                    calls: Mutex::new(Vec::new()),
                },
            );
            assert_eq!(service.handle(word("hello")).await, RelayResponse::error(expected));
        }
    }

    #[tokio::test]
    async fn serves_page_relay_over_channel() {
        let service = Arc::new(service(keyed_store(), MockTranslator::new(|| Ok("hola".into()))));
        let (tx, rx) = kanal::bounded_async(8);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(Arc::clone(&service).serve(rx, cancel.clone()));

        let relay = BackgroundRelay::new(tx);
        assert_eq!(relay.translate("hello").await, RelayOutcome::Translated("hola".into()));

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }
}
