//! Client for the text-generation query collaborator.

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::http::{build_http_client, endpoint, post_json};

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(alias = "response")]
    response_text: String,
}

/// Query service client.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Debug, Clone)]
pub struct QueryClient {
    client: Client,
    url: Url,
}

impl QueryClient {
    /// Creates a client that posts to `{base_url}/api/query`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ClientError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(timeout_secs, user_agent)?,
            url: endpoint(base_url, "api/query")?,
        })
    }

    /// Sends `prompt` to `model`, optionally scoped to `region`, and returns
    /// the generated text.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure or client-side timeout.
    /// - [`ClientError::UnexpectedStatus`] on a non-2xx reply.
    /// - [`ClientError::Deserialize`] if the reply has no response text.
    pub async fn query(
        &self,
        model: &str,
        prompt: &str,
        region: Option<&str>,
    ) -> Result<String, ClientError> {
        let request = QueryRequest {
            model,
            prompt,
            region,
        };
        let reply: QueryResponse = post_json(&self.client, &self.url, &request).await?;
        Ok(reply.response_text)
    }
}
