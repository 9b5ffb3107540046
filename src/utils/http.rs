// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::{AppError, Result};

/// Create a configured asynchronous HTTP client.
///
/// Per-request timeouts are applied by the callers; `connect_timeout`
/// only bounds the handshake.
pub fn create_async_client(user_agent: &str, connect_timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(connect_timeout)
        .build()?;
    Ok(client)
}

/// Fetch a page body as text, treating non-2xx responses as errors.
pub async fn fetch_text(client: &reqwest::Client, url: &str, timeout: Duration) -> Result<String> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| AppError::fetch(url, e))?;

    let response = response
        .error_for_status()
        .map_err(|e| AppError::fetch(url, e))?;

    response.text().await.map_err(|e| AppError::fetch(url, e))
}
