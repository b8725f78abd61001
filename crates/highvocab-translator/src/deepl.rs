use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::{LanguageCode, ProviderMetadata, TranslateError, Translation, Translator};

#[derive(Clone)]
pub struct DeeplTranslator {
    client: reqwest::Client,
    api_url: String,
}

impl DeeplTranslator {
    pub fn new(api_url: String, timeout: Duration) -> Result<Self, TranslateError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_url })
    }
}

#[async_trait]
impl Translator for DeeplTranslator {
    async fn translate(
        &self,
        text: &str,
        from: LanguageCode,
        to: LanguageCode,
        auth_key: &str,
    ) -> Result<Translation, TranslateError> {
        if auth_key.is_empty() {
            return Err(TranslateError::AuthenticationError);
        }

        let source_lang = from.to_uppercase();
        let target_lang = to.to_uppercase();
        let params = [
            ("text", text),
            ("source_lang", source_lang.as_str()),
            ("target_lang", target_lang.as_str()),
            ("auth_key", auth_key),
        ];

        tracing::debug!("Requesting DeepL translation {source_lang}->{target_lang}");

        let response = self.client.post(&self.api_url).form(&params).send().await?;

        let status = response.status();
        let body = response.text().await?;
        let translated = interpret_response(status, &body)?;

        Ok(Translation {
            text: translated,
            from,
            to,
            provider: "deepl".to_string(),
        })
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "DeepL".to_string(),
            requires_api_key: true,
            free_tier_available: true,
        }
    }
}

/// Map a DeepL HTTP reply onto the translated text or a typed failure.
pub(crate) fn interpret_response(status: StatusCode, body: &str) -> Result<String, TranslateError> {
    if status == StatusCode::FORBIDDEN {
        return Err(TranslateError::AuthenticationError);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(TranslateError::RateLimitExceeded);
    }

    if !status.is_success() {
        return Err(TranslateError::Http {
            status: status.as_u16(),
            body: body.trim().to_string(),
        });
    }

    let json: serde_json::Value =
        serde_json::from_str(body).map_err(|e| TranslateError::InvalidResponse(e.to_string()))?;

    json["translations"]
        .get(0)
        .and_then(|t| t["text"].as_str())
        .map(str::to_string)
        .ok_or(TranslateError::NoTranslation)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_translation() {
        let body = r#"{"translations":[{"detected_source_language":"EN","text":"hola"}]}"#;
        assert_eq!(interpret_response(StatusCode::OK, body).unwrap(), "hola");
    }

    #[test]
    fn forbidden_is_authentication_error() {
        let err = interpret_response(StatusCode::FORBIDDEN, "Forbidden").unwrap_err();
        assert!(matches!(err, TranslateError::AuthenticationError));
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn other_failures_carry_status_and_body() {
        let err = interpret_response(StatusCode::SERVICE_UNAVAILABLE, "try later\n").unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503 - try later");
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn empty_translation_list() {
        let err = interpret_response(StatusCode::OK, r#"{"translations":[]}"#).unwrap_err();
        assert!(matches!(err, TranslateError::NoTranslation));
    }

    #[test]
    fn garbage_body_is_invalid_response() {
        let err = interpret_response(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, TranslateError::InvalidResponse(_)));
    }
}
