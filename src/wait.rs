//! Fixed-interval polling with deadline and cancellation support.
//!
//! Provides the bounded wait used while instances acquire public addresses:
//! a constant delay between checks, a cap on attempts, a wall-clock timeout,
//! and clean cancellation. Running out of attempts or time is an expected
//! outcome here, not an error — callers decide what partial progress means.

use anyhow::Result;
use backon::{BackoffBuilder, ConstantBuilder};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for a bounded polling loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between checks
    pub interval: Duration,
    /// Maximum number of delayed re-checks before giving up
    pub max_attempts: usize,
    /// Maximum total wall-clock time before giving up
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            max_attempts: 60,
            timeout: Duration::from_secs(300),
        }
    }
}

/// How a polling loop ended when no error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The check reported ready
    Complete,
    /// Attempts or the wall-clock timeout ran out first
    TimedOut,
}

/// Poll until `check` reports ready, attempts run dry, the timeout passes,
/// or the token is cancelled.
///
/// # Arguments
/// * `config` - Interval, attempt, and timeout bounds
/// * `cancel` - Optional cancellation token
/// * `check` - Async function returning `Ok(true)` when ready, `Ok(false)`
///   to keep polling
/// * `what` - Name for logging
///
/// # Returns
/// * `Ok(PollOutcome::Complete)` - The check reported ready
/// * `Ok(PollOutcome::TimedOut)` - Bounds exhausted; partial progress stands
/// * `Err` - Cancelled, or the check returned an error
pub async fn poll_until<F, Fut>(
    config: &PollConfig,
    cancel: Option<&CancellationToken>,
    check: F,
    what: &str,
) -> Result<PollOutcome>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let start = std::time::Instant::now();
    let mut attempts = 0usize;

    let mut delays = ConstantBuilder::default()
        .with_delay(config.interval)
        .with_max_times(config.max_attempts)
        .build()
        .into_iter();

    loop {
        attempts += 1;

        if let Some(token) = cancel {
            if token.is_cancelled() {
                anyhow::bail!("poll for {} cancelled", what);
            }
        }

        if start.elapsed() >= config.timeout {
            debug!(what = %what, attempts, "poll timed out");
            return Ok(PollOutcome::TimedOut);
        }

        match check().await {
            Ok(true) => {
                debug!(what = %what, attempts, "poll complete");
                return Ok(PollOutcome::Complete);
            }
            Ok(false) => {
                let Some(delay) = delays.next() else {
                    debug!(what = %what, attempts, "poll attempts exhausted");
                    return Ok(PollOutcome::TimedOut);
                };
                debug!(
                    what = %what,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "not ready, polling again"
                );

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = async {
                        if let Some(token) = cancel {
                            token.cancelled().await
                        } else {
                            std::future::pending::<()>().await
                        }
                    } => {
                        anyhow::bail!("poll for {} cancelled", what);
                    }
                }
            }
            Err(e) => {
                warn!(what = %what, error = ?e, "poll check failed");
                return Err(e);
            }
        }
    }
}
