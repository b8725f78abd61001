mod deepl;

pub use deepl::DeeplTranslator;

pub type LanguageCode = String;

/// Translation provider interface
#[async_trait::async_trait]
pub trait Translator: Send + Sync {
    /// Translate text from source to target language using the caller's credential
    async fn translate(
        &self,
        text: &str,
        from: LanguageCode,
        to: LanguageCode,
        auth_key: &str,
    ) -> Result<Translation, TranslateError>;

    /// Provider metadata
    fn metadata(&self) -> ProviderMetadata;
}

#[derive(Debug, Clone)]
pub struct Translation {
    pub text: String,
    pub from: LanguageCode,
    pub to: LanguageCode,
    pub provider: String,
}

#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub name: String,
    pub requires_api_key: bool,
    pub free_tier_available: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error("HTTP {status} - {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    InvalidResponse(String),

    #[error("No translation found")]
    NoTranslation,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Authentication error")]
    AuthenticationError,
}

impl TranslateError {
    /// HTTP status reported by the provider, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TranslateError::Http { status, .. } => Some(*status),
            TranslateError::RateLimitExceeded => Some(429),
            TranslateError::AuthenticationError => Some(403),
            _ => None,
        }
    }
}
