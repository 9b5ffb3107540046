//! Service layer for the monitor.
//!
//! This module contains the collaborators the poll cycle calls:
//! - Signal extraction (`SignalExtractor`, `HtmlExtractor`)
//! - Count parsing (`parse_count`)
//! - Notification delivery (`Notifier` and its backends)

mod extractor;
pub mod notifier;
mod parser;

pub use extractor::{HtmlExtractor, SignalExtractor};
pub use notifier::{LogNotifier, Notifier, NtfyNotifier, PushoverNotifier};
pub use parser::{ParsedCount, parse_count};
