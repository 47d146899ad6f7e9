//! Per-URL attempt loop: normalize, probe, capture, retry with linear backoff
//!
//! A URL always ends in exactly one `UrlResult`. Failures are encoded in the
//! result fields and never returned as errors.

use crate::browser::Capturer;
use crate::model::{CaptureOutcome, ProbeOutcome, UrlResult, UrlTask};
use crate::normalize::{is_redirect, normalize};
use crate::probe::Prober;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Upper bound for the HTTP probe within one attempt
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Backoff clock, swapped out in tests
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per URL, at least 1
    pub max_retries: u32,
    /// Deadline for one probe + capture cycle
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_retries: max_retries.max(1),
            attempt_timeout,
        }
    }

    /// Delay after failed attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_secs(u64::from(attempt))
    }

    fn probe_timeout(&self) -> Duration {
        self.attempt_timeout.min(PROBE_TIMEOUT)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(180))
    }
}

/// Where a URL's attempt loop currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    Attempting(u32),
    Waiting { next: u32, delay: Duration },
    Done(UrlResult),
}

impl AttemptState {
    /// Transition after attempt `attempt` produced `result`
    pub fn after_attempt(attempt: u32, result: UrlResult, policy: &RetryPolicy) -> Self {
        if result.is_complete() || attempt >= policy.max_retries {
            AttemptState::Done(result)
        } else {
            AttemptState::Waiting {
                next: attempt + 1,
                delay: policy.backoff(attempt),
            }
        }
    }
}

pub struct RetryController {
    prober: Arc<dyn Prober>,
    capturer: Arc<dyn Capturer>,
    sleeper: Arc<dyn Sleeper>,
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(
        prober: Arc<dyn Prober>,
        capturer: Arc<dyn Capturer>,
        sleeper: Arc<dyn Sleeper>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            prober,
            capturer,
            sleeper,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Drive `task` to its terminal result
    pub async fn run(&self, task: &UrlTask) -> UrlResult {
        let mut state = AttemptState::Attempting(1);

        loop {
            state = match state {
                AttemptState::Attempting(attempt) => {
                    debug!(url = %task.original_url, attempt, "Starting attempt");
                    let result = self.attempt(task).await;
                    AttemptState::after_attempt(attempt, result, &self.policy)
                }
                AttemptState::Waiting { next, delay } => {
                    info!(
                        url = %task.original_url,
                        attempt = next,
                        max = self.policy.max_retries,
                        ?delay,
                        "Retrying"
                    );
                    self.sleeper.sleep(delay).await;
                    AttemptState::Attempting(next)
                }
                AttemptState::Done(result) => {
                    if !result.is_complete() {
                        warn!(
                            url = %task.original_url,
                            status = result.status_code,
                            "Giving up after {} attempts",
                            self.policy.max_retries
                        );
                    }
                    return result;
                }
            };
        }
    }

    /// One full normalize, probe, capture cycle
    async fn attempt(&self, task: &UrlTask) -> UrlResult {
        let started = Instant::now();
        let candidate = normalize(
            &task.original_url,
            self.prober.as_ref(),
            self.policy.attempt_timeout,
        )
        .await;

        let remaining = self.policy.attempt_timeout.saturating_sub(started.elapsed());
        let probe = self
            .prober
            .probe(&candidate, self.policy.probe_timeout().min(remaining))
            .await;
        if !probe.is_reachable() {
            return UrlResult::unreachable(task, &candidate);
        }

        let remaining = self.policy.attempt_timeout.saturating_sub(started.elapsed());
        let capture = self.capturer.capture(&probe.resolved_url, remaining).await;

        build_result(task, &candidate, probe, capture)
    }
}

/// Merge probe and capture outcomes into the reported record
///
/// The browser's own final URL wins over the probe's, since client-side
/// navigation may have moved the page again after the HTTP redirects.
fn build_result(
    task: &UrlTask,
    candidate: &str,
    probe: ProbeOutcome,
    capture: CaptureOutcome,
) -> UrlResult {
    let final_url = capture
        .final_url
        .filter(|u| !u.is_empty() && u != "about:blank")
        .unwrap_or(probe.resolved_url);
    let was_redirected = is_redirect(candidate, &final_url);

    UrlResult {
        index: task.index,
        original_url: task.original_url.clone(),
        final_url,
        title: capture.title,
        status_code: probe.status_code,
        screenshot: capture.screenshot,
        was_redirected,
    }
}
