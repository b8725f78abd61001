use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use highvocab_config::Config;
use highvocab_core::{KeyValueStore, PageEvent, PageSnapshot};
use highvocab_translator::{LanguageCode, ProviderMetadata, TranslateError, Translation, Translator};
use highvocab_types::Point;
use kanal::AsyncSender;
use serde_json::json;
use tokio::time::timeout;

use crate::controller::AppController;
use crate::page::{document_from_text, inspect};
use crate::state::AppState;

struct EchoTranslator;

#[async_trait]
impl Translator for EchoTranslator {
    async fn translate(
        &self,
        text: &str,
        from: LanguageCode,
        to: LanguageCode,
        auth_key: &str,
    ) -> Result<Translation, TranslateError> {
        if auth_key != "secret" {
            return Err(TranslateError::AuthenticationError);
        }
        let text = match text {
            "hello" => "hola",
            _ => return Err(TranslateError::NoTranslation),
        };
        Ok(Translation {
            text: text.to_string(),
            from,
            to,
            provider: "echo".to_string(),
        })
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "echo".to_string(),
            requires_api_key: true,
            free_tier_available: true,
        }
    }
}

async fn wait_for(
    events: &AsyncSender<PageEvent>,
    done: impl Fn(&PageSnapshot) -> bool,
) -> PageSnapshot {
    timeout(Duration::from_secs(2), async {
        loop {
            let snapshot = inspect(events).await.unwrap();
            if done(&snapshot) {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("page never reached the expected state")
}

/// Test 1: Hover, translate and save through the spawned background service
#[tokio::test]
async fn test_page_and_background_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.path = dir.path().join("store.json");
    let state = Arc::new(AppState::new(config));
    state.store.set("deeplApiKey", json!("secret")).await.unwrap();

    let controller = AppController::new(state.clone()).await;
    let doc = document_from_text("hello world").unwrap();
    let mut tasks = controller.spawn_tasks(doc, EchoTranslator).await;
    let events = controller.page_events();

    events
        .send(PageEvent::PointerMove {
            client: Point::new(12.0, 8.0),
        })
        .await
        .unwrap();
    let snapshot = wait_for(&events, |s| s.tooltip.visible).await;
    assert_eq!(snapshot.tooltip.current_word.as_deref(), Some("hello"));

    let tooltip = snapshot.tooltip_node.unwrap();
    events.send(PageEvent::Click { target: tooltip }).await.unwrap();
    let snapshot = wait_for(&events, |s| s.tooltip.text.label() == "hola").await;
    assert!(snapshot.tooltip.save_visible);

    let save = snapshot.save_button.unwrap();
    events.send(PageEvent::Click { target: save }).await.unwrap();
    let snapshot = wait_for(&events, |s| s.markers == 1).await;
    assert_eq!(snapshot.tooltip.text.label(), "\"hello\" saved!");

    assert_eq!(
        state.store.get("markedWords").await.unwrap(),
        Some(json!([{"word": "hello", "translation": "hola"}]))
    );

    controller.shutdown();
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }
}

/// Test 2: Without a key the page shows the configuration error
#[tokio::test]
async fn test_missing_key_is_reported_on_page() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.storage.path = dir.path().join("store.json");
    let state = Arc::new(AppState::new(config));

    let controller = AppController::new(state).await;
    let mut tasks = controller
        .spawn_tasks(document_from_text("hello").unwrap(), EchoTranslator)
        .await;
    let events = controller.page_events();

    events
        .send(PageEvent::PointerMove {
            client: Point::new(4.0, 8.0),
        })
        .await
        .unwrap();
    let snapshot = wait_for(&events, |s| s.tooltip.visible).await;
    events
        .send(PageEvent::Click {
            target: snapshot.tooltip_node.unwrap(),
        })
        .await
        .unwrap();

    wait_for(&events, |s| s.tooltip.text.label() == "DeepL API key is not configured.").await;

    controller.shutdown();
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }
}
