use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Backoff policy for connection attempts.
///
/// Delays grow exponentially from `initial_delay_ms` up to `max_delay_ms`.
/// With jitter enabled each delay lands at a random point between 50% and
/// 100% of its nominal value, so a fleet of restarting services does not
/// hammer the database in lockstep.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt. 3 retries means up to 4 attempts total.
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds
    pub initial_delay_ms: u64,

    /// Ceiling for any single delay in milliseconds
    pub max_delay_ms: u64,

    /// Growth factor applied per retry
    pub backoff_multiplier: f64,

    /// Randomize each delay within [50%, 100%] of its nominal value
    pub use_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0,
            use_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Default policy: 3 retries, 100ms initial delay, 5s cap, jitter on.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay_ms: u64) -> Self {
        self.initial_delay_ms = delay_ms;
        self
    }

    pub fn with_max_delay(mut self, delay_ms: u64) -> Self {
        self.max_delay_ms = delay_ms;
        self
    }

    pub fn without_jitter(mut self) -> Self {
        self.use_jitter = false;
        self
    }

    /// Nominal delay before retry number `retry` (1-based), before jitter.
    fn delay_for_retry(&self, retry: u32) -> u64 {
        let factor = self.backoff_multiplier.powi(retry.saturating_sub(1) as i32);
        let nominal = (self.initial_delay_ms as f64) * factor;
        nominal.min(self.max_delay_ms as f64) as u64
    }
}

/// Runs `operation` until it succeeds or the retries are exhausted.
///
/// The last error is returned unchanged once `config.max_retries` retries
/// have failed.
///
/// # Example
/// ```ignore
/// use database::common::{RetryConfig, retry_with_backoff};
///
/// let policy = RetryConfig::new().with_max_retries(5);
/// let db = retry_with_backoff(|| database::postgres::connect(&db_url), policy).await?;
/// ```
pub async fn retry_with_backoff<F, Fut, T, E>(mut operation: F, config: RetryConfig) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut failures = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if failures > 0 {
                    debug!("Operation succeeded after {} failed attempts", failures);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        failures += 1;
        if failures > config.max_retries {
            warn!("Operation failed permanently after {} attempts: {}", failures, err);
            return Err(err);
        }

        let nominal = config.delay_for_retry(failures);
        let delay = if config.use_jitter {
            jittered(nominal)
        } else {
            nominal
        };

        debug!(
            "Operation failed ({}/{} retries used): {}. Next attempt in {}ms",
            failures, config.max_retries, err, delay
        );
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

/// Picks a random point in [delay/2, delay].
///
/// Hashing the current time through a freshly seeded `RandomState` gives
/// enough spread here without pulling in an rng crate.
fn jittered(delay: u64) -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::BuildHasher;

    let entropy = RandomState::new().hash_one(std::time::SystemTime::now());
    let half = delay / 2;
    half + entropy % (half + 1)
}
