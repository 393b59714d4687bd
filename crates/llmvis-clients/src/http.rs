//! Shared plumbing for the JSON-over-HTTP collaborators.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ClientError;

/// Upper bound on how much of an error body is kept in [`ClientError::UnexpectedStatus`].
const MAX_ERROR_BODY_CHARS: usize = 500;

pub(crate) fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, ClientError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Joins `path` onto `base_url`, treating the base as a directory regardless
/// of whether it ends with a slash.
pub(crate) fn endpoint(base_url: &str, path: &str) -> Result<Url, ClientError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    let base = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })?;
    base.join(path.trim_start_matches('/'))
        .map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })
}

/// Sends `body` as JSON, requires a 2xx status, and parses the JSON reply.
///
/// # Errors
///
/// - [`ClientError::Http`] on network failure.
/// - [`ClientError::UnexpectedStatus`] on a non-2xx status.
/// - [`ClientError::Deserialize`] if the reply is not the expected JSON.
pub(crate) async fn post_json<B, R>(client: &Client, url: &Url, body: &B) -> Result<R, ClientError>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = client.post(url.clone()).json(body).send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(ClientError::UnexpectedStatus {
            status: status.as_u16(),
            url: url.to_string(),
            body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }

    serde_json::from_str(&text).map_err(|e| ClientError::Deserialize {
        context: url.to_string(),
        source: e,
    })
}
