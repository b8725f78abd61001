use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use highvocab_background::{BackgroundService, load_api_key, save_api_key};
use highvocab_core::highlighter::highlight;
use highvocab_core::layout::MonospaceLayout;
use highvocab_core::VocabularyStore;
use highvocab_translator::DeeplTranslator;
use tokio::io::BufReader;
use tokio::signal;

use crate::controller::AppController;
use crate::page::{document_from_text, drive};
use crate::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "highvocab", about = "Hover-translate words and keep a vocabulary", version)]
pub struct Cli {
    /// JSON profile overriding the default configuration.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage file, overrides the configured path.
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage the DeepL API key.
    #[command(subcommand)]
    Key(KeyCommand),
    /// Translate one word through the background service.
    Translate { word: String },
    /// Save a word and its translation.
    Save { word: String, translation: String },
    /// List saved words.
    Words,
    /// Render a text file as a page, highlight saved words and print the markup.
    Highlight { file: PathBuf },
    /// Run an interactive page session over a text file, driven from stdin.
    Page { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum KeyCommand {
    /// Store a new key.
    Set { key: String },
    /// Report whether a key is stored.
    Show,
}

pub async fn run(cli: Cli, state: Arc<AppState>) -> anyhow::Result<()> {
    match cli.command {
        Command::Key(KeyCommand::Set { key }) => {
            let status = save_api_key(state.store.as_ref(), &key).await;
            if status.is_error() {
                bail!("{status}");
            }
            println!("{status}");
        }
        Command::Key(KeyCommand::Show) => {
            let (key, status) = load_api_key(state.store.as_ref()).await;
            if status.is_error() {
                bail!("{status}");
            }
            println!("{status}");
            if let Some(key) = key {
                println!("{}", mask(&key));
            }
        }
        Command::Translate { word } => handle_translate(&state, &word).await?,
        Command::Save { word, translation } => {
            let entry = VocabularyStore::new(Arc::clone(&state.store))
                .save(&word, &translation)
                .await?;
            println!("\"{}\" saved!", entry.word);
        }
        Command::Words => {
            let entries = VocabularyStore::new(Arc::clone(&state.store)).load().await?;
            if entries.is_empty() {
                println!("No saved words.");
            }
            for entry in entries {
                println!("{}\t{}", entry.word, entry.translation);
            }
        }
        Command::Highlight { file } => handle_highlight(&state, &file).await?,
        Command::Page { file } => handle_page(state, &file).await?,
    }
    Ok(())
}

async fn handle_translate(state: &AppState, word: &str) -> anyhow::Result<()> {
    let config = state.config.read().await.translator.clone();
    let translator = DeeplTranslator::new(config.api_url.clone(), config.timeout())?;
    let service = BackgroundService::new(Arc::clone(&state.store), translator, &config);

    let translation = service.translate_word(word).await?;
    println!("{translation}");
    Ok(())
}

async fn handle_highlight(state: &AppState, file: &Path) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let mut doc = document_from_text(&text)?;

    let index = VocabularyStore::new(Arc::clone(&state.store)).index().await?;
    let report = highlight(&mut doc, &index);
    tracing::info!(markers = report.markers, failures = report.failures, "Highlighted {}", file.display());

    println!("{}", doc.to_html());
    Ok(())
}

async fn handle_page(state: Arc<AppState>, file: &Path) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let doc = document_from_text(&text)?;
    let translator = {
        let config = state.config.read().await;
        DeeplTranslator::new(config.translator.api_url.clone(), config.translator.timeout())?
    };

    let controller = AppController::new(state).await;
    let mut tasks = controller.spawn_tasks(doc, translator).await;
    let driver = drive(BufReader::new(tokio::io::stdin()), controller.page_events());

    tokio::select! {
        result = driver => result?,
        _ = signal::ctrl_c() => tracing::info!("Shutdown requested"),
        Some(result) = tasks.join_next() => match result {
            Ok(Ok(())) => tracing::warn!("Task exited early"),
            Ok(Err(e)) => tracing::error!("Task failed: {e}"),
            Err(e) => tracing::error!("Task panicked: {e}"),
        },
    }

    controller.shutdown();
    while let Some(result) = tasks.join_next().await {
        if let Ok(Err(e)) = result {
            tracing::error!("Task failed during shutdown: {e}");
        }
    }
    Ok(())
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{visible}")
}
