//! Bounded fan-out of URL tasks
//!
//! Every task is spawned up front; a semaphore admits at most `concurrency`
//! of them into their attempt loop at once. Results are collected over a
//! channel in completion order.

use crate::model::{UrlResult, UrlTask};
use crate::retry::RetryController;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error};

/// Run every task to completion and return one result per task
///
/// Output order follows completion, not input.
pub async fn run_all(
    tasks: Vec<UrlTask>,
    concurrency: usize,
    controller: Arc<RetryController>,
) -> Vec<UrlResult> {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let (tx, mut rx) = mpsc::channel(tasks.len().max(1));

    let handles: Vec<_> = tasks
        .into_iter()
        .map(|task| {
            let semaphore = Arc::clone(&semaphore);
            let controller = Arc::clone(&controller);
            let tx = tx.clone();
            let handle = {
                let task = task.clone();
                tokio::spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return;
                    };
                    eprintln!("  -> {}", truncate(&task.original_url, 60));
                    let result = controller.run(&task).await;
                    if tx.send(result).await.is_err() {
                        debug!(url = %task.original_url, "Result channel closed");
                    }
                })
            };
            (task, handle)
        })
        .collect();

    // Channel closes once every producer has finished
    drop(tx);

    let mut results = Vec::with_capacity(handles.len());
    while let Some(result) = rx.recv().await {
        results.push(result);
    }

    let reported: HashSet<usize> = results.iter().map(|r| r.index).collect();
    for (task, handle) in handles {
        if let Err(e) = handle.await {
            error!(url = %task.original_url, error = %e, "URL task aborted");
        }
        if !reported.contains(&task.index) {
            results.push(UrlResult::unreachable(&task, &task.original_url));
        }
    }

    results
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::Capturer;
    use crate::model::{CaptureOutcome, ProbeOutcome};
    use crate::probe::Prober;
    use crate::retry::{RetryPolicy, TokioSleeper};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Tracks how many probes are in flight at once
    #[derive(Default)]
    struct GaugeProber {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Prober for GaugeProber {
        async fn probe(&self, url: &str, _timeout: Duration) -> ProbeOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if url.contains("dead") {
                ProbeOutcome::unreachable(url)
            } else {
                ProbeOutcome {
                    resolved_url: url.to_string(),
                    status_code: 200,
                    was_redirected: false,
                }
            }
        }

        async fn check(&self, _url: &str, _timeout: Duration) -> bool {
            true
        }
    }

    struct PngCapturer;

    #[async_trait]
    impl Capturer for PngCapturer {
        async fn capture(&self, url: &str, _deadline: Duration) -> CaptureOutcome {
            CaptureOutcome {
                title: format!("Title of {url}"),
                screenshot: vec![1, 2, 3],
                final_url: Some(url.to_string()),
            }
        }
    }

    fn setup() -> (Arc<GaugeProber>, Arc<RetryController>) {
        let prober = Arc::new(GaugeProber::default());
        let controller = Arc::new(RetryController::new(
            prober.clone(),
            Arc::new(PngCapturer),
            Arc::new(TokioSleeper),
            RetryPolicy::new(1, Duration::from_secs(5)),
        ));
        (prober, controller)
    }

    fn tasks(n: usize) -> Vec<UrlTask> {
        (0..n)
            .map(|i| UrlTask::new(i, format!("https://site{i}.example")))
            .collect()
    }

    #[tokio::test]
    async fn test_concurrency_bound() {
        for limit in [1, 3] {
            let (prober, controller) = setup();
            let results = run_all(tasks(10), limit, controller).await;

            assert_eq!(results.len(), 10);
            assert_eq!(prober.peak.load(Ordering::SeqCst), limit);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_bound_multi_thread() {
        let (prober, controller) = setup();
        let results = run_all(tasks(16), 4, controller).await;

        assert_eq!(results.len(), 16);
        assert!(prober.peak.load(Ordering::SeqCst) <= 4);
    }

    #[tokio::test]
    async fn test_one_result_per_task() {
        let (_, controller) = setup();
        let mut input = tasks(5);
        input.push(UrlTask::new(5, "https://dead.example"));
        let results = run_all(input, 2, controller).await;

        let mut indices: Vec<usize> = results.iter().map(|r| r.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);

        let dead = results.iter().find(|r| r.index == 5).unwrap();
        assert_eq!(dead.status_code, -1);
        assert!(dead.title.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let (_, controller) = setup();
        assert!(run_all(Vec::new(), 4, controller).await.is_empty());
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_progresses() {
        let (_, controller) = setup();
        assert_eq!(run_all(tasks(3), 0, controller).await.len(), 3);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a very long string", 10), "this is...");
    }
}
