//! Bounded polling for multi-step publication protocols
//!
//! Instagram and TikTok both park a publication server-side and poll a status
//! endpoint until the platform reports a terminal state. The driver here
//! separates the per-attempt status check from the timed wait between
//! attempts, so the bounded-retry contract can be tested without real delays.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::PublishError;

/// Fixed attempt budget and inter-attempt delay for one polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl PollPolicy {
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Run `attempt` up to `max_attempts` times, sleeping `delay` between
    /// attempts. The loop stops at the first `Ready`; a hard error from an
    /// attempt aborts the whole run immediately.
    ///
    /// Exhausting the budget is not an error in itself: the caller receives
    /// the status observed on the final attempt and decides how to report it.
    pub async fn run<T, S, F, Fut>(
        &self,
        mut attempt: F,
    ) -> Result<PollOutcome<T, S>, PublishError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Poll<T, S>, PublishError>>,
    {
        for attempt_number in 1..=self.max_attempts {
            match attempt(attempt_number).await? {
                Poll::Ready(value) => return Ok(PollOutcome::Completed(value)),
                Poll::Pending(status) => {
                    if attempt_number == self.max_attempts {
                        return Ok(PollOutcome::Exhausted { last: status });
                    }
                    debug!(
                        attempt = attempt_number,
                        max_attempts = self.max_attempts,
                        "Status not terminal, waiting before next poll"
                    );
                    tokio::time::sleep(self.delay).await;
                }
            }
        }

        // Only reachable with a zero attempt budget
        Err(PublishError::Timeout(
            "No polling attempts were made".to_string(),
        ))
    }
}

/// Outcome of a single status check.
#[derive(Debug)]
pub enum Poll<T, S> {
    /// Terminal state reached; polling stops
    Ready(T),
    /// Still processing; the observed status is carried for reporting
    Pending(S),
}

/// Terminal outcome of a full polling run.
#[derive(Debug)]
pub enum PollOutcome<T, S> {
    /// The protocol reached its terminal state within budget
    Completed(T),
    /// Attempts exhausted; `last` is the status seen on the final attempt
    Exhausted { last: S },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_poll_ready_on_first_attempt() {
        let calls = Arc::new(Mutex::new(0usize));
        let policy = PollPolicy::new(5, Duration::from_millis(0));

        let counter = calls.clone();
        let outcome = policy
            .run(move |_| {
                let counter = counter.clone();
                async move {
                    *counter.lock().unwrap() += 1;
                    Ok(Poll::<&str, &str>::Ready("FINISHED"))
                }
            })
            .await
            .unwrap();

        assert!(matches!(outcome, PollOutcome::Completed("FINISHED")));
        assert_eq!(*calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_poll_ready_mid_loop() {
        let calls = Arc::new(Mutex::new(0usize));
        let policy = PollPolicy::new(5, Duration::from_millis(0));

        let counter = calls.clone();
        let outcome = policy
            .run(move |attempt| {
                let counter = counter.clone();
                async move {
                    *counter.lock().unwrap() += 1;
                    if attempt == 3 {
                        Ok(Poll::Ready("done"))
                    } else {
                        Ok(Poll::Pending("IN_PROGRESS"))
                    }
                }
            })
            .await
            .unwrap();

        assert!(matches!(outcome, PollOutcome::Completed("done")));
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_poll_exhausted_reports_last_status() {
        let calls = Arc::new(Mutex::new(0usize));
        let policy = PollPolicy::new(4, Duration::from_millis(0));

        let counter = calls.clone();
        let outcome: PollOutcome<(), String> = policy
            .run(move |attempt| {
                let counter = counter.clone();
                async move {
                    *counter.lock().unwrap() += 1;
                    Ok(Poll::Pending(format!("status-{}", attempt)))
                }
            })
            .await
            .unwrap();

        // Exactly max_attempts checks, and the final status is the one reported
        assert_eq!(*calls.lock().unwrap(), 4);
        match outcome {
            PollOutcome::Exhausted { last } => assert_eq!(last, "status-4"),
            other => panic!("Expected exhaustion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_error_aborts_immediately() {
        let calls = Arc::new(Mutex::new(0usize));
        let policy = PollPolicy::new(5, Duration::from_millis(0));

        let counter = calls.clone();
        let result: Result<PollOutcome<(), &str>, _> = policy
            .run(move |attempt| {
                let counter = counter.clone();
                async move {
                    *counter.lock().unwrap() += 1;
                    if attempt == 2 {
                        Err(PublishError::Protocol("FAILED".to_string()))
                    } else {
                        Ok(Poll::Pending("PROCESSING"))
                    }
                }
            })
            .await;

        assert!(matches!(result, Err(PublishError::Protocol(_))));
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_poll_zero_attempts_is_timeout() {
        let policy = PollPolicy::new(0, Duration::from_millis(0));

        let result: Result<PollOutcome<(), &str>, _> = policy
            .run(|_| async { Ok(Poll::Pending("unreached")) })
            .await;

        assert!(matches!(result, Err(PublishError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_poll_sleeps_between_attempts_but_not_after_ready() {
        // Three pending attempts with a 20ms delay: two sleeps expected
        let policy = PollPolicy::new(3, Duration::from_millis(20));
        let start = std::time::Instant::now();
        let _: PollOutcome<(), &str> = policy
            .run(|_| async { Ok(Poll::Pending("waiting")) })
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(40));

        // Ready on the first attempt never sleeps, even with a long delay
        let policy = PollPolicy::new(3, Duration::from_secs(5));
        let start = std::time::Instant::now();
        let outcome = policy
            .run(|_| async { Ok(Poll::<&str, &str>::Ready("done")) })
            .await
            .unwrap();
        assert!(matches!(outcome, PollOutcome::Completed("done")));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
