// src/pipeline/scheduler.rs

//! Scheduler loop.
//!
//! Alternates between `Running` (one poll cycle over every source) and
//! `Idle` (waiting out the interval) until shutdown is requested.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{Config, CycleReport};
use crate::pipeline::{PollCycle, Shutdown, SourceStateTracker};

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Totals over a scheduler run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub notifications: usize,
    pub failures: usize,
}

/// Drives the poll cycle on a fixed interval.
pub struct Scheduler {
    poll: PollCycle,
    tracker: SourceStateTracker,
    interval: Duration,
    max_cycles: Option<u64>,
    state: SchedulerState,
    cycles: u64,
}

impl Scheduler {
    /// Create a scheduler over `sources`, in the given order.
    pub fn new(poll: PollCycle, sources: Vec<String>, interval: Duration) -> Result<Self> {
        if sources.is_empty() {
            return Err(AppError::config("No sources defined"));
        }
        Ok(Self {
            poll,
            tracker: SourceStateTracker::new(sources),
            interval,
            max_cycles: None,
            state: SchedulerState::Idle,
            cycles: 0,
        })
    }

    /// Validate the configuration and build every collaborator from it.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let poll = PollCycle::from_config(config)?;
        Self::new(poll, config.source_ids(), config.monitor.interval())
    }

    /// Stop after `cycles` complete cycles instead of running forever.
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn tracker(&self) -> &SourceStateTracker {
        &self.tracker
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Run one cycle over all sources.
    pub async fn run_cycle(&mut self, shutdown: &mut Shutdown) -> CycleReport {
        self.state = SchedulerState::Running;
        self.cycles += 1;

        let report = self.poll.run(self.cycles, &mut self.tracker, shutdown).await;

        self.state = SchedulerState::Idle;
        log::info!(
            "Cycle {} complete: {} baseline, {} unchanged, {} changed, {} failed{}",
            report.cycle,
            report.baselines(),
            report.unchanged(),
            report.changed(),
            report.failed(),
            if report.interrupted { " (interrupted)" } else { "" }
        );
        report
    }

    /// Loop until shutdown (or the cycle limit) is reached.
    pub async fn run(&mut self, mut shutdown: Shutdown) -> RunSummary {
        let mut summary = RunSummary::default();
        log::info!(
            "Starting the monitoring process for {} sources every {}s. Press Ctrl+C to exit.",
            self.tracker.len(),
            self.interval.as_secs()
        );

        while !shutdown.is_triggered() && !self.limit_reached(&summary) {
            let report = self.run_cycle(&mut shutdown).await;
            summary.cycles += 1;
            summary.notifications += report.notifications();
            summary.failures += report.failed();

            if report.interrupted {
                break;
            }
            if self.limit_reached(&summary) {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.wait() => break,
            }
        }

        log::info!(
            "Monitoring stopped after {} cycles ({} notifications, {} failed checks)",
            summary.cycles,
            summary.notifications,
            summary.failures
        );
        summary
    }

    fn limit_reached(&self, summary: &RunSummary) -> bool {
        self.max_cycles.is_some_and(|max| summary.cycles >= max)
    }
}
