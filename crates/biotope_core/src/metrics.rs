//! Performance metrics collection for the engine.
//!
//! Provides structured logging and counters for monitoring a running
//! simulation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const BIRTHS: &str = "births";
pub const DEATHS: &str = "deaths";

/// Step and population statistics gathered by the engine.
pub struct Metrics {
    step_count: AtomicU64,
    individual_count: AtomicU64,
    counters: Mutex<HashMap<String, AtomicU64>>,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics")
            .field("steps", &self.step_count())
            .field("individuals", &self.individual_count())
            .finish()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step_count: AtomicU64::new(0),
            individual_count: AtomicU64::new(0),
            counters: Mutex::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Records a completed pipeline pass.
    pub fn record_step(&self, duration: Duration, time: f64, individuals: usize) {
        let step = self.step_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.individual_count
            .store(individuals as u64, Ordering::Relaxed);

        // Log at info level every 1000 steps
        if step.is_multiple_of(1000) {
            tracing::info!(
                step = step,
                time = time,
                individuals = individuals,
                duration_us = duration.as_micros() as u64,
                "Simulation step"
            );
        }
    }

    /// Adds `amount` to a named counter.
    pub fn add_to_counter(&self, name: &str, amount: u64) {
        if amount == 0 {
            return;
        }
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(amount, Ordering::Relaxed);
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count.load(Ordering::Relaxed)
    }

    /// Individuals alive after the last recorded step.
    #[must_use]
    pub fn individual_count(&self) -> u64 {
        self.individual_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Initialize tracing subscriber for logging.
///
/// Honours `RUST_LOG`, falling back to `default_filter`.
pub fn init_logging(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_env_filter(filter)
            .finish(),
    )
    .ok();
}
