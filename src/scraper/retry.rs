//! Fixed-attempt retry policy shared by page fetches and image downloads.

use std::time::Duration;

/// Delay schedule between attempts. Only a constant delay is used today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Constant(Duration),
}

impl Backoff {
    /// Delay to wait after the given failed attempt (1-based).
    pub fn delay_after(&self, _attempt: u32) -> Duration {
        match *self {
            Backoff::Constant(d) => d,
        }
    }
}

/// Run an operation up to `attempts` times, sleeping between failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    /// Constant delay between attempts. `attempts` is clamped to at least 1.
    pub fn constant(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff: Backoff::Constant(delay),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Call `op` with the 1-based attempt number until it succeeds or attempts run out.
    ///
    /// `on_failure` sees every failed attempt and the delay that follows it (zero after the last).
    /// Returns the last error when every attempt fails.
    pub fn run<T, E>(
        &self,
        mut op: impl FnMut(u32) -> Result<T, E>,
        mut on_failure: impl FnMut(u32, &E, Duration),
    ) -> Result<T, E> {
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt >= self.attempts {
                        on_failure(attempt, &e, Duration::ZERO);
                        return Err(e);
                    }
                    let delay = self.backoff.delay_after(attempt);
                    on_failure(attempt, &e, delay);
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
            }
            attempt += 1;
        }
    }
}
