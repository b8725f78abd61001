use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use self::layout::LayoutConfig;
use self::storage::StorageConfig;
use self::tooltip::TooltipConfig;
use self::translator::TranslatorConfig;

pub mod layout;
pub mod storage;
pub mod tooltip;
pub mod translator;

fn default_event_capacity() -> usize {
    256
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translator: TranslatorConfig,
    pub tooltip: TooltipConfig,
    pub layout: LayoutConfig,
    pub storage: StorageConfig,

    /// Bound of the page event channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Config {
    /// Defaults overridden by `HIGHVOCAB_*` environment variables.
    pub fn new() -> Self {
        let event_capacity = env::var("HIGHVOCAB_EVENT_CAPACITY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_event_capacity);

        let mut tooltip = TooltipConfig::default();
        if let Some(delay) = env::var("HIGHVOCAB_HIDE_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            tooltip.hide_delay_ms = delay;
        }

        Config {
            translator: TranslatorConfig::new(),
            tooltip,
            layout: LayoutConfig::default(),
            storage: StorageConfig::new(),

            event_capacity,
        }
    }

    /// Load a JSON profile; missing sections fall back to defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        tracing::info!("Loading config from {}", path.display());
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_json::from_reader(reader)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            translator: TranslatorConfig::default(),
            tooltip: TooltipConfig::default(),
            layout: LayoutConfig::default(),
            storage: StorageConfig::default(),
            event_capacity: default_event_capacity(),
        }
    }
}
