use std::time::Duration;

use crate::foundation::error::{GrabError, GrabResult};

/// Fixed-delay retry policy shared by every remote call.
///
/// A `required` policy never gives up: it keeps retrying past `max_attempts`, logging each
/// failure. Otherwise the final error is wrapped in [`GrabError::Exhausted`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Pause between attempts, in milliseconds.
    pub delay_ms: u64,
    /// Retry forever instead of failing.
    pub required: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::tiles()
    }
}

impl RetryPolicy {
    /// Policy for raw tile requests: 4 attempts, 3s apart.
    pub const fn tiles() -> Self {
        Self {
            max_attempts: 4,
            delay_ms: 3_000,
            required: false,
        }
    }

    /// Policy for metadata calls: 4 attempts, 5s apart.
    pub const fn metadata() -> Self {
        Self {
            max_attempts: 4,
            delay_ms: 5_000,
            required: false,
        }
    }

    /// Same budget and delay, but never giving up.
    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn validate(&self) -> GrabResult<()> {
        if self.max_attempts == 0 {
            return Err(GrabError::validation(
                "retry policy 'max_attempts' must be >= 1",
            ));
        }
        Ok(())
    }

    /// Run `op` until it succeeds or the policy gives up.
    ///
    /// `what` names the resource in log events and in the final error.
    pub fn run<T>(&self, what: &str, mut op: impl FnMut() -> GrabResult<T>) -> GrabResult<T> {
        let budget = self.max_attempts.max(1);
        let mut attempts = 0u32;
        loop {
            attempts = attempts.saturating_add(1);
            let err = match op() {
                Ok(v) => return Ok(v),
                Err(err) => err,
            };

            if !self.required && attempts >= budget {
                tracing::warn!(what, attempts, error = %err, "giving up");
                return Err(GrabError::Exhausted {
                    what: what.to_string(),
                    attempts,
                    last: Box::new(err),
                });
            }

            tracing::warn!(
                what,
                attempt = attempts,
                delay_ms = self.delay_ms,
                error = %err,
                "failed to load, trying again"
            );
            if self.delay_ms > 0 {
                std::thread::sleep(self.delay());
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fetch/retry.rs"]
mod tests;
