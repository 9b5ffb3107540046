// src/services/extractor.rs

//! Signal extraction.
//!
//! Fetches a source page and returns the text of the element that holds the
//! count. Network failures, error statuses, missing elements and empty text
//! all come back as `AppError::Fetch`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{ExtractorConfig, RawSignal, parse_selector};
use crate::utils::{http, normalize_whitespace};

/// Turns a source identifier into raw count text.
#[async_trait]
pub trait SignalExtractor: Send + Sync {
    async fn fetch(&self, source: &str, timeout: Duration) -> Result<RawSignal>;
}

/// Extracts the count from server-rendered HTML with CSS selectors.
pub struct HtmlExtractor {
    client: Client,
    count_selector: Selector,
    title_selector: Option<Selector>,
    refinement_selector: Option<Selector>,
}

impl HtmlExtractor {
    /// Build an extractor from configuration.
    pub fn new(config: &ExtractorConfig, connect_timeout: Duration) -> Result<Self> {
        let client = http::create_async_client(&config.user_agent, connect_timeout)?;
        Self::with_client(client, config)
    }

    /// Build an extractor around an existing HTTP client.
    pub fn with_client(client: Client, config: &ExtractorConfig) -> Result<Self> {
        Ok(Self {
            client,
            count_selector: parse_selector(&config.count_selector)?,
            title_selector: config.title_selector().map(parse_selector).transpose()?,
            refinement_selector: config
                .refinement_selector()
                .map(parse_selector)
                .transpose()?,
        })
    }

    /// Pull the count text, the optional title and any active refinements
    /// out of a page body.
    pub fn extract(&self, source: &str, body: &str) -> Result<RawSignal> {
        let document = Html::parse_document(body);

        let element = document
            .select(&self.count_selector)
            .next()
            .ok_or_else(|| AppError::fetch(source, "count element not found"))?;

        let text = normalize_whitespace(&element.text().collect::<String>());
        if text.is_empty() {
            return Err(AppError::fetch(source, "empty stats text received"));
        }

        let title = self.title_selector.as_ref().and_then(|sel| {
            document
                .select(sel)
                .next()
                .map(|el| normalize_whitespace(&el.text().collect::<String>()))
                .filter(|t| !t.is_empty())
        });

        let refinements = self
            .refinement_selector
            .as_ref()
            .map(|sel| {
                document
                    .select(sel)
                    .map(|el| normalize_whitespace(&el.text().collect::<String>()))
                    .filter(|r| !r.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(RawSignal {
            text,
            title,
            refinements,
        })
    }
}

#[async_trait]
impl SignalExtractor for HtmlExtractor {
    async fn fetch(&self, source: &str, timeout: Duration) -> Result<RawSignal> {
        let body = http::fetch_text(&self.client, source, timeout).await?;
        log::debug!("Fetched {} bytes from {}", body.len(), source);
        self.extract(source, &body)
    }
}
