//! Bounded readiness polling
//!
//! A probe reports one of three outcomes per attempt. [`poll_until_ready`]
//! runs it up to a fixed number of times with a fixed pause in between, and
//! hands the pause to an injected [`Sleeper`] so tests never sleep for real.

use crate::config::PollPolicy;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Result of a single readiness probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The service satisfied the success condition
    Ready,
    /// The service answered but is not ready (e.g. non-200 status)
    NotReadyYet(String),
    /// The service could not be reached
    TransportError(String),
}

impl ProbeOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Result of a bounded polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A probe succeeded on attempt `attempts` (1-indexed)
    Ready { attempts: u32 },
    /// Every attempt failed; `last` is the final probe outcome, if any ran
    Exhausted {
        attempts: u32,
        last: Option<ProbeOutcome>,
    },
}

impl PollOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Number of probes that were issued
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Ready { attempts } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Source of delays between attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Probe until ready or until `policy.max_attempts` probes have been issued
///
/// Both [`ProbeOutcome::NotReadyYet`] and [`ProbeOutcome::TransportError`]
/// lead to a pause and another attempt. No pause follows the final attempt.
///
/// # Arguments
///
/// * `policy` - Attempt count and pause length
/// * `sleeper` - Performs the pauses
/// * `operation_name` - Name of the probed condition (for logging)
/// * `probe` - Async probe, called once per attempt
pub async fn poll_until_ready<S, F, Fut>(
    policy: &PollPolicy,
    sleeper: &S,
    operation_name: &str,
    mut probe: F,
) -> PollOutcome
where
    S: Sleeper + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = ProbeOutcome>,
{
    let mut last = None;

    for attempt in 1..=policy.max_attempts {
        debug!(
            "Attempt {}/{} for {}",
            attempt, policy.max_attempts, operation_name
        );

        match probe().await {
            ProbeOutcome::Ready => {
                debug!("{} ready after {} attempt(s)", operation_name, attempt);
                return PollOutcome::Ready { attempts: attempt };
            }
            outcome => {
                debug!("{} not ready: {:?}", operation_name, outcome);
                last = Some(outcome);
            }
        }

        if attempt < policy.max_attempts {
            sleeper.sleep(policy.interval).await;
        }
    }

    debug!(
        "{} not ready after {} attempt(s): {:?}",
        operation_name, policy.max_attempts, last
    );

    PollOutcome::Exhausted {
        attempts: policy.max_attempts,
        last,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// Sleeper that returns at once and records every requested pause
    #[derive(Debug, Default, Clone)]
    pub(crate) struct InstantSleeper {
        pub(crate) pauses: Arc<Mutex<Vec<Duration>>>,
    }

    impl InstantSleeper {
        pub(crate) fn count(&self) -> usize {
            self.pauses.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Sleeper for InstantSleeper {
        async fn sleep(&self, duration: Duration) {
            self.pauses.lock().unwrap().push(duration);
        }
    }

    /// In-memory log sink for asserting what a run emitted
    #[derive(Debug, Default, Clone)]
    pub(crate) struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl LogCapture {
        /// Subscriber writing plain-text events at `level` and above here
        pub(crate) fn subscriber(
            &self,
            level: tracing::Level,
        ) -> impl tracing::Subscriber + Send + Sync {
            tracing_subscriber::fmt()
                .with_writer(self.clone())
                .with_ansi(false)
                .with_max_level(level)
                .finish()
        }

        pub(crate) fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn policy(max_attempts: u32) -> PollPolicy {
        PollPolicy::new(max_attempts, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_ready_on_first_attempt() {
        let sleeper = InstantSleeper::default();
        let calls = AtomicU32::new(0);

        let outcome = poll_until_ready(&policy(10), &sleeper, "health", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { ProbeOutcome::Ready }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Ready { attempts: 1 });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(sleeper.count(), 0);
    }

    #[tokio::test]
    async fn test_ready_on_attempt_k_issues_exactly_k_probes() {
        for k in 1..=6u32 {
            let sleeper = InstantSleeper::default();
            let calls = AtomicU32::new(0);

            let outcome = poll_until_ready(&policy(10), &sleeper, "health", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == k {
                        ProbeOutcome::Ready
                    } else {
                        ProbeOutcome::TransportError("connection refused".to_string())
                    }
                }
            })
            .await;

            assert_eq!(outcome, PollOutcome::Ready { attempts: k });
            assert_eq!(calls.load(Ordering::SeqCst), k);
            assert_eq!(sleeper.count(), (k - 1) as usize);
        }
    }

    #[tokio::test]
    async fn test_never_exceeds_max_attempts() {
        for max_attempts in [0u32, 1, 2, 10] {
            let sleeper = InstantSleeper::default();
            let calls = AtomicU32::new(0);

            let outcome = poll_until_ready(&policy(max_attempts), &sleeper, "health", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { ProbeOutcome::NotReadyYet("status 503".to_string()) }
            })
            .await;

            assert!(!outcome.is_ready());
            assert_eq!(outcome.attempts(), max_attempts);
            assert_eq!(calls.load(Ordering::SeqCst), max_attempts);
            assert_eq!(sleeper.count(), max_attempts.saturating_sub(1) as usize);
        }
    }

    #[tokio::test]
    async fn test_zero_attempts_has_no_last_outcome() {
        let sleeper = InstantSleeper::default();
        let outcome = poll_until_ready(&policy(0), &sleeper, "health", || async {
            ProbeOutcome::Ready
        })
        .await;

        assert_eq!(
            outcome,
            PollOutcome::Exhausted {
                attempts: 0,
                last: None
            }
        );
    }

    #[tokio::test]
    async fn test_not_ready_and_transport_error_both_retry() {
        let sleeper = InstantSleeper::default();
        let calls = AtomicU32::new(0);

        let outcome = poll_until_ready(&policy(3), &sleeper, "warm-up", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match n {
                    0 => ProbeOutcome::NotReadyYet("status 404".to_string()),
                    1 => ProbeOutcome::TransportError("timed out".to_string()),
                    _ => ProbeOutcome::Ready,
                }
            }
        })
        .await;

        assert_eq!(outcome, PollOutcome::Ready { attempts: 3 });
        assert_eq!(
            *sleeper.pauses.lock().unwrap(),
            vec![Duration::from_secs(1), Duration::from_secs(1)]
        );
    }

    #[tokio::test]
    async fn test_exhausted_keeps_last_outcome() {
        let sleeper = InstantSleeper::default();
        let calls = AtomicU32::new(0);

        let outcome = poll_until_ready(&policy(2), &sleeper, "warm-up", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    ProbeOutcome::TransportError("refused".to_string())
                } else {
                    ProbeOutcome::NotReadyYet("status 500".to_string())
                }
            }
        })
        .await;

        assert_eq!(
            outcome,
            PollOutcome::Exhausted {
                attempts: 2,
                last: Some(ProbeOutcome::NotReadyYet("status 500".to_string())),
            }
        );
    }

    #[tokio::test]
    async fn test_exhaustion_is_not_logged_above_debug() {
        let logs = LogCapture::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber(tracing::Level::INFO));

        let sleeper = InstantSleeper::default();
        let outcome = poll_until_ready(&policy(3), &sleeper, "health", || async {
            ProbeOutcome::TransportError("refused".to_string())
        })
        .await;

        assert!(!outcome.is_ready());
        assert_eq!(logs.contents(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_advances_clock() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(3)).await;
        assert!(start.elapsed() >= Duration::from_secs(3));
    }
}
