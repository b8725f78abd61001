mod error;
mod service;
mod settings;

pub use error::BackgroundError;
pub use service::BackgroundService;
pub use settings::{API_KEY_STORAGE_KEY, SettingsStatus, load_api_key, read_api_key, save_api_key};
