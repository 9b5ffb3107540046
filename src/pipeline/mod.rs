//! Change-detection pipeline.
//!
//! - `SourceStateTracker`: last confirmed count per source
//! - `PollCycle`: one pass of fetch → parse → compare → notify
//! - `Scheduler`: runs poll cycles on a fixed interval until shutdown

pub mod poll;
pub mod scheduler;
pub mod shutdown;
pub mod tracker;

#[cfg(test)]
pub(crate) mod testing;

pub use poll::{PollCycle, PollSettings, change_message};
pub use scheduler::{RunSummary, Scheduler, SchedulerState};
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use tracker::SourceStateTracker;
