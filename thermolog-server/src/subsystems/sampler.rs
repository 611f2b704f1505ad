//! Sampler: timer-driven fetch-then-write cycles
//!
//! Every tick fetches the inside and outside temperature concurrently. When
//! both succeed one reading is appended; otherwise each failure goes to the
//! error log and nothing is written. Failed cycles are not retried, the next
//! tick simply tries again.
//!
//! Cycles are awaited inline by the loop and missed ticks are skipped, so at
//! most one cycle (and one append) is ever in flight.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use thermolog_core::config::SamplerConfig;
use thermolog_core::{Reading, ReadingStore, SourceError, StoreError, TemperatureSource};

use super::error_log::ErrorLog;

/// Result of one cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    Recorded(Reading),
    /// At least one source failed; nothing was written.
    Skipped(Vec<SourceError>),
    WriteFailed(StoreError),
}

pub struct Sampler {
    store: ReadingStore,
    inside: Arc<dyn TemperatureSource>,
    outside: Arc<dyn TemperatureSource>,
    error_log: ErrorLog,
    last_created_at: Option<DateTime<Utc>>,
}

impl Sampler {
    /// Build a sampler, resuming the timestamp floor from the newest stored row.
    pub async fn new(
        store: ReadingStore,
        inside: Arc<dyn TemperatureSource>,
        outside: Arc<dyn TemperatureSource>,
        error_log: ErrorLog,
    ) -> Self {
        let last_created_at = match store.latest().await {
            Ok(latest) => latest.map(|r| r.created_at),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read latest reading; starting without a timestamp floor");
                None
            }
        };

        Self {
            store,
            inside,
            outside,
            error_log,
            last_created_at,
        }
    }

    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.run_cycle_at(Utc::now()).await
    }

    /// One cycle stamped with `now` (clamped so timestamps never go backwards).
    pub async fn run_cycle_at(&mut self, now: DateTime<Utc>) -> CycleOutcome {
        let (inside, outside) = tokio::join!(self.inside.fetch(), self.outside.fetch());

        let (inside_temp, outside_temp) = match (inside, outside) {
            (Ok(i), Ok(o)) => (i, o),
            (inside, outside) => {
                let errors: Vec<SourceError> =
                    [inside.err(), outside.err()].into_iter().flatten().collect();
                for e in &errors {
                    tracing::warn!(error = %e, "Sampling cycle skipped");
                    self.error_log.record(&e.to_string()).await;
                }
                return CycleOutcome::Skipped(errors);
            }
        };

        let created_at = self.next_timestamp(now);
        match self.store.append(inside_temp, outside_temp, created_at).await {
            Ok(reading) => {
                self.last_created_at = Some(reading.created_at);
                tracing::info!(
                    inside_temp = reading.inside_temp,
                    outside_temp = reading.outside_temp,
                    "Reading recorded"
                );
                CycleOutcome::Recorded(reading)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to store reading");
                self.error_log.record(&e.to_string()).await;
                CycleOutcome::WriteFailed(e)
            }
        }
    }

    fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.last_created_at {
            Some(last) if now < last => last,
            _ => now,
        }
    }
}

/// Called from main.rs to start the periodic sampling loop.
pub async fn run_sampler_loop(
    sampler: Sampler,
    config: SamplerConfig,
    shutdown: broadcast::Receiver<()>,
) {
    let period = Duration::from_secs(config.interval_minutes.saturating_mul(60));
    tracing::info!(
        interval_min = config.interval_minutes,
        sample_on_startup = config.sample_on_startup,
        "Sampler started"
    );
    run_with_period(sampler, period, config.sample_on_startup, shutdown).await;
}

/// Loop body with an explicit period. Public for tests.
pub async fn run_with_period(
    mut sampler: Sampler,
    period: Duration,
    sample_on_startup: bool,
    mut shutdown: broadcast::Receiver<()>,
) {
    let start = if sample_on_startup {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let CycleOutcome::Skipped(errors) = sampler.run_cycle().await {
                    tracing::debug!(failures = errors.len(), "Waiting for next tick");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Sampler shutting down");
                break;
            }
        }
    }
}
