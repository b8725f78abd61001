use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_hide_delay_ms() -> u64 {
    300
}

fn default_saved_display_ms() -> u64 {
    1500
}

fn default_save_error_display_ms() -> u64 {
    2500
}

fn default_notice_display_ms() -> u64 {
    1500
}

fn default_anchor_gap_px() -> f64 {
    5.0
}

fn default_pointer_offset_px() -> f64 {
    10.0
}

fn default_min_word_len() -> usize {
    2
}

fn default_max_word_len() -> usize {
    50
}

/// Tooltip timing and word-shape limits.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TooltipConfig {
    /// Grace period before hiding once the pointer leaves a word
    #[serde(default = "default_hide_delay_ms")]
    pub hide_delay_ms: u64,
    #[serde(default = "default_saved_display_ms")]
    pub saved_display_ms: u64,
    #[serde(default = "default_save_error_display_ms")]
    pub save_error_display_ms: u64,
    #[serde(default = "default_notice_display_ms")]
    pub notice_display_ms: u64,
    /// Vertical gap between the anchor's bottom edge and the tooltip
    #[serde(default = "default_anchor_gap_px")]
    pub anchor_gap_px: f64,
    /// Used when the candidate has no anchor rectangle
    #[serde(default = "default_pointer_offset_px")]
    pub pointer_offset_px: f64,
    #[serde(default = "default_min_word_len")]
    pub min_word_len: usize,
    #[serde(default = "default_max_word_len")]
    pub max_word_len: usize,
}

impl TooltipConfig {
    pub fn hide_delay(&self) -> Duration {
        Duration::from_millis(self.hide_delay_ms)
    }

    pub fn saved_display(&self) -> Duration {
        Duration::from_millis(self.saved_display_ms)
    }

    pub fn save_error_display(&self) -> Duration {
        Duration::from_millis(self.save_error_display_ms)
    }

    pub fn notice_display(&self) -> Duration {
        Duration::from_millis(self.notice_display_ms)
    }
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            hide_delay_ms: default_hide_delay_ms(),
            saved_display_ms: default_saved_display_ms(),
            save_error_display_ms: default_save_error_display_ms(),
            notice_display_ms: default_notice_display_ms(),
            anchor_gap_px: default_anchor_gap_px(),
            pointer_offset_px: default_pointer_offset_px(),
            min_word_len: default_min_word_len(),
            max_word_len: default_max_word_len(),
        }
    }
}
