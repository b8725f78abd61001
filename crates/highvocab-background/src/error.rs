use highvocab_core::StoreError;
use highvocab_translator::TranslateError;

/// Failures of a translation request; `Display` is what the page shows.
#[derive(Debug, thiserror::Error)]
pub enum BackgroundError {
    #[error("DeepL API key is not configured.")]
    ConfigurationMissing,

    #[error("Authentication error. Check your DeepL API key.")]
    AuthFailure,

    #[error("DeepL rate limit exceeded. Try again later.")]
    RateLimited,

    #[error("No translation found.")]
    NoTranslation,

    #[error("Translation error: {0}")]
    TransportFailure(String),

    #[error("Could not read settings: {0}")]
    StoreAccessFailure(#[from] StoreError),
}

impl From<TranslateError> for BackgroundError {
    fn from(e: TranslateError) -> Self {
        match e {
            TranslateError::AuthenticationError => BackgroundError::AuthFailure,
            TranslateError::RateLimitExceeded => BackgroundError::RateLimited,
            TranslateError::NoTranslation => BackgroundError::NoTranslation,
            TranslateError::Http { status, body } => {
                BackgroundError::TransportFailure(format!("DeepL API error: {status} - {body}"))
            }
            other => BackgroundError::TransportFailure(other.to_string()),
        }
    }
}
