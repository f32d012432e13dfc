use log::{debug, warn};
use std::fmt::Display;
use std::thread::sleep;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: u32,
    /// Wait before retry `n` is `delay * n`
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 2,
            delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            retries: 0,
            delay: Duration::ZERO,
        }
    }
}

/// Run `operation` until it succeeds or the policy runs out of retries.
pub fn with_retry<T, E, F>(operation_name: &str, policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    E: Display,
{
    let mut attempt = 0;

    loop {
        match operation() {
            Ok(value) => {
                if attempt > 0 {
                    debug!("{} succeeded after {} retries", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(e) => {
                if attempt >= policy.retries {
                    if policy.retries > 0 {
                        warn!("{} failed after {} attempts: {}", operation_name, attempt + 1, e);
                    }
                    return Err(e);
                }

                attempt += 1;
                let wait = policy.delay * attempt;
                warn!(
                    "{} attempt {}/{} failed: {}. Retrying in {:?}",
                    operation_name,
                    attempt,
                    policy.retries + 1,
                    e,
                    wait
                );
                sleep(wait);
            }
        }
    }
}
