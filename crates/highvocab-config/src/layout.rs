use serde::{Deserialize, Serialize};

fn default_char_width() -> f64 {
    8.0
}

fn default_line_height() -> f64 {
    16.0
}

/// Geometry used when rendering plain-text pages.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LayoutConfig {
    #[serde(default = "default_char_width")]
    pub char_width: f64,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            char_width: default_char_width(),
            line_height: default_line_height(),
        }
    }
}
