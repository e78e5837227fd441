//! # Run Loop
//!
//! Drives the scheduler from a tokio interval until shutdown is requested,
//! logging throughput along the way.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::info;

use crate::config::RunnerConfig;
use crate::encoders::Scheduler;
use crate::transport::Transport;

/// Timing of the run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// How often due ticks are checked. Bounds the jitter of every cadence.
    pub poll_interval: Duration,

    /// How often throughput is logged
    pub stats_interval: Duration,
}

impl From<&RunnerConfig> for RunOptions {
    fn from(config: &RunnerConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            stats_interval: Duration::from_secs(config.stats_interval_s),
        }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from(&RunnerConfig::default())
    }
}

/// Run due encoder ticks until `shutdown` resolves
///
/// Returns the number of messages handed to the transport.
pub async fn run<F>(
    scheduler: &mut Scheduler,
    transport: &mut dyn Transport,
    options: RunOptions,
    shutdown: F,
) -> u64
where
    F: Future<Output = ()>,
{
    let mut poll = interval(options.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut stats = interval_at(Instant::now() + options.stats_interval, options.stats_interval);
    stats.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::pin!(shutdown);

    info!(
        "Running {} encoders, polling every {} ms",
        scheduler.len(),
        options.poll_interval.as_millis()
    );

    let mut total: u64 = 0;
    let mut last_logged: u64 = 0;

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutting down, {} messages sent in total", total);
                break;
            }

            _ = poll.tick() => {
                total += scheduler.run_due(transport) as u64;
            }

            _ = stats.tick() => {
                let window = total - last_logged;
                info!(
                    "Sent {} messages in the last {} s ({:.1}/s), {} total",
                    window,
                    options.stats_interval.as_secs(),
                    window as f64 / options.stats_interval.as_secs_f64(),
                    total
                );
                last_logged = total;
            }
        }
    }

    total
}
