// src/pipeline/poll.rs

//! Poll cycle.
//!
//! For each source: fetch, parse, compare with the tracker, update, notify.
//! Every failure is recovered at the per-source boundary; panics included.

use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;

use crate::error::Result;
use crate::models::{
    ChangePolicy, Config, CycleReport, MonitorConfig, Observation, PollOutcome, SourceReport,
    Transition,
};
use crate::pipeline::{Shutdown, SourceStateTracker};
use crate::services::{HtmlExtractor, Notifier, SignalExtractor, notifier, parse_count};

/// Timeouts and notification rules for a poll cycle.
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub fetch_timeout: Duration,
    pub notify_timeout: Duration,
    pub notify_on: ChangePolicy,
    pub notification_title: String,
}

impl From<&MonitorConfig> for PollSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout(),
            notify_timeout: config.notify_timeout(),
            notify_on: config.notify_on,
            notification_title: config.notification_title.clone(),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

/// Runs fetch → parse → compare → notify for each source.
pub struct PollCycle {
    extractor: Box<dyn SignalExtractor>,
    notifier: Box<dyn Notifier>,
    settings: PollSettings,
    names: HashMap<String, String>,
}

impl PollCycle {
    pub fn new(
        extractor: Box<dyn SignalExtractor>,
        notifier: Box<dyn Notifier>,
        settings: PollSettings,
    ) -> Self {
        Self {
            extractor,
            notifier,
            settings,
            names: HashMap::new(),
        }
    }

    /// Attach display names to sources for logs and reports.
    pub fn with_source_names<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.names.extend(names);
        self
    }

    /// Build the HTML extractor and configured notifier.
    pub fn from_config(config: &Config) -> Result<Self> {
        let connect_timeout = config.monitor.fetch_timeout();
        let extractor = HtmlExtractor::new(&config.extractor, connect_timeout)?;
        let notifier = notifier::from_config(
            &config.notifier,
            &config.extractor.user_agent,
            config.monitor.notify_timeout(),
        )?;
        let names = config
            .sources
            .iter()
            .filter_map(|s| Some((s.url.clone(), s.name.clone()?)));
        Ok(Self::new(
            Box::new(extractor),
            notifier,
            PollSettings::from(&config.monitor),
        )
        .with_source_names(names))
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Configured display name of a source, if any.
    pub fn source_name(&self, source: &str) -> Option<&str> {
        self.names.get(source).map(String::as_str)
    }

    /// `"name (url)"` for named sources, the bare URL otherwise.
    fn describe(&self, source: &str) -> String {
        match self.source_name(source) {
            Some(name) => format!("{name} ({source})"),
            None => source.to_string(),
        }
    }

    /// Visit every tracked source once, in configured order.
    ///
    /// Shutdown is checked before each source and abandons an in-flight
    /// fetch; the report is then marked as interrupted.
    pub async fn run(
        &self,
        cycle: u64,
        tracker: &mut SourceStateTracker,
        shutdown: &mut Shutdown,
    ) -> CycleReport {
        let started_at = Utc::now();
        let sources = tracker.sources().to_vec();
        let mut reports = Vec::with_capacity(sources.len());
        let mut interrupted = false;

        for source in &sources {
            if shutdown.is_triggered() {
                interrupted = true;
                break;
            }

            tokio::select! {
                report = self.poll_source(tracker, source) => reports.push(report),
                _ = shutdown.wait() => {
                    log::info!("Shutdown requested while checking {}", self.describe(source));
                    interrupted = true;
                    break;
                }
            }
        }

        CycleReport {
            cycle,
            started_at,
            finished_at: Utc::now(),
            interrupted,
            sources: reports,
        }
    }

    /// Poll a single source. Never fails; panics become `Failed` outcomes.
    pub async fn poll_source(
        &self,
        tracker: &mut SourceStateTracker,
        source: &str,
    ) -> SourceReport {
        let result = AssertUnwindSafe(self.check_source(tracker, source))
            .catch_unwind()
            .await;

        match result {
            Ok(report) => report,
            Err(panic) => {
                let reason = format!("internal error: {}", panic_message(panic.as_ref()));
                log::error!(
                    "Unexpected failure while checking {}: {}",
                    self.describe(source),
                    reason
                );
                SourceReport {
                    source: source.to_string(),
                    name: self.source_name(source).map(str::to_string),
                    label: None,
                    transition: Transition::new(source, tracker.get(source), None),
                    outcome: PollOutcome::Failed { reason },
                    checked_at: Utc::now(),
                }
            }
        }
    }

    async fn check_source(&self, tracker: &mut SourceStateTracker, source: &str) -> SourceReport {
        let checked_at = Utc::now();
        let shown = self.describe(source);
        let (observation, label) = self.observe(source).await;

        let previous = tracker.get(source);
        let transition = Transition::new(source, previous, observation.count());

        let outcome = match (observation, previous) {
            (Observation::Failure(reason), _) => {
                log::warn!("Error checking listing count for {}: {}", shown, reason);
                PollOutcome::Failed { reason }
            }
            (Observation::Count(current), None) => {
                tracker.set(source, current);
                log::info!("Baseline for {}: {}", shown, current);
                PollOutcome::Baseline { count: current }
            }
            (Observation::Count(current), Some(previous)) if current == previous => {
                log::debug!("No change for {}: {}", shown, current);
                PollOutcome::Unchanged { count: current }
            }
            (Observation::Count(current), Some(previous)) => {
                tracker.set(source, current);
                log::info!(
                    "Listing count updated for {}: {} -> {}",
                    shown,
                    previous,
                    current
                );
                let notified = if self.settings.notify_on.allows(previous, current) {
                    self.send(source, previous, current, label.as_deref()).await
                } else {
                    log::info!(
                        "Notification suppressed by notify_on = {:?}",
                        self.settings.notify_on
                    );
                    false
                };
                PollOutcome::Changed {
                    previous,
                    current,
                    notified,
                }
            }
        };

        SourceReport {
            source: source.to_string(),
            name: self.source_name(source).map(str::to_string),
            label,
            transition,
            outcome,
            checked_at,
        }
    }

    /// Fetch and parse under the fetch timeout.
    async fn observe(&self, source: &str) -> (Observation, Option<String>) {
        let timeout = self.settings.fetch_timeout;
        let signal = match tokio::time::timeout(timeout, self.extractor.fetch(source, timeout)).await
        {
            Ok(Ok(signal)) => signal,
            Ok(Err(e)) => return (Observation::Failure(e.to_string()), None),
            Err(_) => {
                let reason = format!("fetch timed out after {}s", timeout.as_secs());
                return (Observation::Failure(reason), None);
            }
        };

        log::debug!("Stats text for {}: {}", source, signal.text);
        match parse_count(&signal.text) {
            Ok(parsed) => {
                log::debug!(
                    "Extracted {} ({}) from {}",
                    parsed.value,
                    parsed.label.as_deref().unwrap_or("no label"),
                    source
                );
                (Observation::Count(parsed.value), signal.label())
            }
            Err(e) => (Observation::Failure(e.to_string()), signal.label()),
        }
    }

    /// Best-effort delivery; returns whether the notifier accepted it.
    async fn send(&self, source: &str, previous: u64, current: u64, label: Option<&str>) -> bool {
        let message = change_message(source, previous, current, label);
        let timeout = self.settings.notify_timeout;
        let sent = tokio::time::timeout(
            timeout,
            self.notifier
                .notify(&self.settings.notification_title, &message, timeout),
        )
        .await;

        match sent {
            Ok(Ok(())) => {
                log::info!("Notification sent via {}", self.notifier.name());
                true
            }
            Ok(Err(e)) => {
                log::warn!("Failed to send notification for {}: {}", self.describe(source), e);
                false
            }
            Err(_) => {
                log::warn!(
                    "Notification for {} timed out after {}s",
                    self.describe(source),
                    timeout.as_secs()
                );
                false
            }
        }
    }
}

/// Message body for a count change. `label` is the page description from
/// [`RawSignal::label`](crate::models::RawSignal::label).
pub fn change_message(source: &str, previous: u64, current: u64, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("Listings changed from {previous} to {current} at {source} ({label})"),
        None => format!("Listings changed from {previous} to {current} at {source}"),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
