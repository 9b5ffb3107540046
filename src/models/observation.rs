// src/models/observation.rs

//! Per-cycle values produced by the poller.
//!
//! None of these outlive the cycle that created them except as log output
//! or the JSON report of the `check` command.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw text pulled from a page by a signal extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSignal {
    /// Text believed to contain the count, e.g. "1,652 listings"
    pub text: String,
    /// Page heading describing what is counted, when available
    pub title: Option<String>,
    /// Active filter labels shown on the page, in page order
    pub refinements: Vec<String>,
}

impl RawSignal {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title: None,
            refinements: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_refinements<I, S>(mut self, refinements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.refinements = refinements.into_iter().map(Into::into).collect();
        self
    }

    /// Human-readable description of the page: `"<title> (<refinements>)"`,
    /// or whichever half is present.
    pub fn label(&self) -> Option<String> {
        let refinements = (!self.refinements.is_empty()).then(|| self.refinements.join(", "));
        match (self.title.as_deref(), refinements) {
            (Some(title), Some(refinements)) => Some(format!("{title} ({refinements})")),
            (Some(title), None) => Some(title.to_string()),
            (None, refinements) => refinements,
        }
    }
}

/// Outcome of fetching and parsing one source once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Count(u64),
    Failure(String),
}

impl Observation {
    pub fn count(&self) -> Option<u64> {
        match self {
            Observation::Count(n) => Some(*n),
            Observation::Failure(_) => None,
        }
    }
}

/// A cycle's outcome for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub source: String,
    pub previous: Option<u64>,
    pub current: Option<u64>,
    /// True iff both counts are present and differ
    pub changed: bool,
}

impl Transition {
    pub fn new(source: impl Into<String>, previous: Option<u64>, current: Option<u64>) -> Self {
        let changed = matches!((previous, current), (Some(p), Some(c)) if p != c);
        Self {
            source: source.into(),
            previous,
            current,
            changed,
        }
    }
}

/// What the poll cycle decided for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PollOutcome {
    /// First successful observation; stored silently
    Baseline { count: u64 },
    /// Same count as last time
    Unchanged { count: u64 },
    /// Count moved; `notified` is false when suppressed or delivery failed
    Changed {
        previous: u64,
        current: u64,
        notified: bool,
    },
    /// Fetch or parse failed; state left untouched
    Failed { reason: String },
}

/// Per-source entry of a cycle report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    /// Configured display name of the source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Page label from the last fetch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub transition: Transition,
    pub outcome: PollOutcome,
    pub checked_at: DateTime<Utc>,
}

/// Summary of one pass over all sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// True when shutdown arrived before every source was visited
    pub interrupted: bool,
    pub sources: Vec<SourceReport>,
}

impl CycleReport {
    pub fn count_where(&self, pred: impl Fn(&PollOutcome) -> bool) -> usize {
        self.sources.iter().filter(|r| pred(&r.outcome)).count()
    }

    pub fn changed(&self) -> usize {
        self.count_where(|o| matches!(o, PollOutcome::Changed { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count_where(|o| matches!(o, PollOutcome::Failed { .. }))
    }

    pub fn baselines(&self) -> usize {
        self.count_where(|o| matches!(o, PollOutcome::Baseline { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count_where(|o| matches!(o, PollOutcome::Unchanged { .. }))
    }

    /// Transitions that triggered a notification.
    pub fn notifications(&self) -> usize {
        self.count_where(|o| matches!(o, PollOutcome::Changed { notified: true, .. }))
    }
}
