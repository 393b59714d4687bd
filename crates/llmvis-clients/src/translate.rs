//! Client for the translation collaborator.

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::http::{build_http_client, endpoint, post_json};

/// Source language sent with every request; the service detects it.
pub const AUTO_DETECT: &str = "auto";

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    source_language: &'a str,
    target_language: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translated_text: String,
}

/// Translation service client.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct TranslationClient {
    client: Client,
    url: Url,
}

impl TranslationClient {
    /// Creates a client that posts to `{base_url}/translate`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ClientError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(timeout_secs, user_agent)?,
            url: endpoint(base_url, "translate")?,
        })
    }

    /// Translates `text` into `target_language`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx reply.
    /// - [`ClientError::Deserialize`] if the reply lacks `translated_text`.
    pub async fn translate(&self, text: &str, target_language: &str) -> Result<String, ClientError> {
        let request = TranslateRequest {
            text,
            source_language: AUTO_DETECT,
            target_language,
        };
        let reply: TranslateResponse = post_json(&self.client, &self.url, &request).await?;
        tracing::debug!(
            target_language,
            chars = reply.translated_text.len(),
            "prompt translated"
        );
        Ok(reply.translated_text)
    }
}
