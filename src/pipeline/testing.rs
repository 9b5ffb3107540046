//! Scripted collaborators for pipeline tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::RawSignal;
use crate::services::{Notifier, SignalExtractor};

/// One scripted response from the extractor.
#[derive(Debug, Clone)]
pub enum Step {
    Text(String),
    Signal(RawSignal),
    Fail,
    Hang,
    Panic,
}

/// Count text for a successful fetch.
pub fn count(n: u64) -> Step {
    Step::Text(format!("{n} listings"))
}

/// Extractor that replays a per-source script. An exhausted script fails.
#[derive(Default)]
pub struct ScriptedExtractor {
    script: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, source: &str, steps: impl IntoIterator<Item = Step>) -> Self {
        self.script
            .lock()
            .unwrap()
            .entry(source.to_string())
            .or_default()
            .extend(steps);
        self
    }

    /// Shared log of fetched sources, in call order.
    pub fn calls(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl SignalExtractor for ScriptedExtractor {
    async fn fetch(&self, source: &str, _timeout: Duration) -> Result<RawSignal> {
        self.calls.lock().unwrap().push(source.to_string());
        let step = self
            .script
            .lock()
            .unwrap()
            .get_mut(source)
            .and_then(|steps| steps.pop_front());

        match step {
            Some(Step::Text(text)) => Ok(RawSignal::new(text)),
            Some(Step::Signal(signal)) => Ok(signal),
            Some(Step::Hang) => std::future::pending().await,
            Some(Step::Panic) => panic!("scripted extractor panic for {source}"),
            Some(Step::Fail) | None => Err(AppError::fetch(source, "scripted failure")),
        }
    }
}

/// Notifier that records every message, optionally failing each send.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail: bool,
    hang: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    /// Shared log of `(title, message)` pairs.
    pub fn sent(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        Arc::clone(&self.sent)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, title: &str, message: &str, _timeout: Duration) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail {
            return Err(AppError::delivery("scripted delivery failure"));
        }
        Ok(())
    }
}
