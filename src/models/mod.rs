// src/models/mod.rs

//! Domain models for the monitor.
//!
//! Configuration structures and the short-lived values passed between the
//! extractor, the parser and the poll cycle.

mod config;
mod observation;

// Re-export all public types
pub use config::{
    ChangePolicy, Config, ExtractorConfig, MonitorConfig, NotifierConfig, SourceConfig,
    parse_selector,
};
pub use observation::{
    CycleReport, Observation, PollOutcome, RawSignal, SourceReport, Transition,
};
