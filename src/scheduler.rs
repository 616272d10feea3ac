use chrono::{Local, NaiveDateTime, TimeDelta};
use log::info;
use std::time::Duration;

use crate::alerts::{CycleReport, NotificationEngine, NotificationState};
use crate::portfolio::Portfolio;

/// Fixed-interval schedule measured from the end of the previous run
#[derive(Debug, Clone)]
pub struct Schedule {
    interval: TimeDelta,
    next_run: Option<NaiveDateTime>,
}

impl Schedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: TimeDelta::from_std(interval).unwrap_or(TimeDelta::hours(1)),
            next_run: None,
        }
    }

    /// The first check is always due
    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.next_run.is_none_or(|next| now >= next)
    }

    pub fn mark_ran(&mut self, finished_at: NaiveDateTime) {
        self.next_run = Some(finished_at + self.interval);
    }

    pub fn next_run(&self) -> Option<NaiveDateTime> {
        self.next_run
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Owns the portfolio and notification state and drives the engine
pub struct Scheduler {
    engine: NotificationEngine,
    portfolio: Portfolio,
    state: NotificationState,
    schedule: Schedule,
    poll_interval: Duration,
}

impl Scheduler {
    pub fn new(
        engine: NotificationEngine,
        portfolio: Portfolio,
        check_interval: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            engine,
            portfolio,
            state: NotificationState::new(local_now().date()),
            schedule: Schedule::new(check_interval),
            poll_interval,
        }
    }

    /// Run the engine if a run is due. `clock` is read before and after the run.
    pub async fn tick<C>(&mut self, clock: &C) -> Option<CycleReport>
    where
        C: Fn() -> NaiveDateTime,
    {
        let started = clock();
        if !self.schedule.is_due(started) {
            return None;
        }

        let previous_day = self.state.day();
        if self.state.roll_over(started.date()) {
            info!("🌅 New day {} (was {previous_day}), alert tiers reset", started.date());
        }

        info!("🔄 Checking {} positions", self.portfolio.len());
        let report = self.engine.run_cycle(&self.portfolio, &mut self.state).await;

        self.schedule.mark_ran(clock());
        if let Some(next) = self.schedule.next_run() {
            info!("⏰ Next check at {}", next.format("%Y-%m-%d %H:%M:%S"));
        }
        Some(report)
    }

    /// Check immediately, then poll for due runs forever
    pub async fn run_forever(mut self) {
        info!(
            "👂 Scheduler started, polling every {:?}",
            self.poll_interval
        );
        loop {
            self.tick(&local_now).await;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    #[cfg(test)]
    fn state(&self) -> &NotificationState {
        &self.state
    }
}
