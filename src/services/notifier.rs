// src/services/notifier.rs

//! Notification delivery.
//!
//! Every send is a single best-effort attempt. Failures come back as
//! `AppError::Delivery` and are never retried.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::NotifierConfig;
use crate::utils::http;

/// Sends a titled message to an external channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn notify(&self, title: &str, message: &str, timeout: Duration) -> Result<()>;
}

/// Build the notifier selected in configuration.
pub fn from_config(
    config: &NotifierConfig,
    user_agent: &str,
    connect_timeout: Duration,
) -> Result<Box<dyn Notifier>> {
    let notifier: Box<dyn Notifier> = match config {
        NotifierConfig::Pushover {
            user_key,
            api_token,
            api_url,
        } => Box::new(PushoverNotifier {
            client: http::create_async_client(user_agent, connect_timeout)?,
            api_url: api_url.clone(),
            user_key: user_key.clone(),
            api_token: api_token.clone(),
        }),
        NotifierConfig::Ntfy { topic, server } => Box::new(NtfyNotifier {
            client: http::create_async_client(user_agent, connect_timeout)?,
            endpoint: ntfy_endpoint(server, topic),
        }),
        NotifierConfig::Log => Box::new(LogNotifier),
    };
    Ok(notifier)
}

fn ntfy_endpoint(server: &str, topic: &str) -> String {
    format!("{}/{}", server.trim_end_matches('/'), topic.trim_start_matches('/'))
}

async fn check_status(response: reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::delivery(format!(
        "notification failed with status {}: {}",
        status,
        body.trim()
    )))
}

/// Pushover messages API.
pub struct PushoverNotifier {
    client: Client,
    api_url: String,
    user_key: String,
    api_token: String,
}

#[async_trait]
impl Notifier for PushoverNotifier {
    fn name(&self) -> &str {
        "pushover"
    }

    async fn notify(&self, title: &str, message: &str, timeout: Duration) -> Result<()> {
        let form = [
            ("token", self.api_token.as_str()),
            ("user", self.user_key.as_str()),
            ("title", title),
            ("message", message),
        ];
        let response = self
            .client
            .post(&self.api_url)
            .timeout(timeout)
            .form(&form)
            .send()
            .await
            .map_err(AppError::delivery)?;
        check_status(response).await
    }
}

/// ntfy topic publisher.
pub struct NtfyNotifier {
    client: Client,
    endpoint: String,
}

#[async_trait]
impl Notifier for NtfyNotifier {
    fn name(&self) -> &str {
        "ntfy"
    }

    async fn notify(&self, title: &str, message: &str, timeout: Duration) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .timeout(timeout)
            .header("Title", title)
            .body(message.to_string())
            .send()
            .await
            .map_err(AppError::delivery)?;
        check_status(response).await
    }
}

/// Writes notifications to the log only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, title: &str, message: &str, _timeout: Duration) -> Result<()> {
        log::info!("[NOTIFY] {}: {}", title, message);
        Ok(())
    }
}
