//! Headless Chrome capture via chromiumoxide
//!
//! Every capture launches its own browser with a throwaway profile, so no
//! cookies or slow tabs leak from one URL into another. The session is
//! closed on every exit path before `capture` returns.

use crate::model::CaptureOutcome;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const VIEWPORT_WIDTH: u32 = 1280;
pub const VIEWPORT_HEIGHT: u32 = 1024;

/// Ceiling for the document to report `readyState == "complete"`
const LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(250);
const LAYOUT_POLLS: u32 = 10;
const LAYOUT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Stubs JS dialogs so they can never block the capture
const SUPPRESS_DIALOGS_JS: &str = r#"
    window.alert = function () {};
    window.confirm = function () { return true; };
    window.prompt = function () { return null; };
    window.print = function () {};
"#;

const DISMISS_POPUP_JS: &str = r#"
    (function () {
        var buttons = document.querySelectorAll('button, [role="button"]');
        for (var i = 0; i < buttons.length; i++) {
            var label = (buttons[i].getAttribute('aria-label') || '').toLowerCase();
            var text = (buttons[i].textContent || '').toLowerCase();
            if (text.includes('close') || label.includes('close')) {
                buttons[i].click();
                return true;
            }
        }
        return false;
    })()
"#;

const PAGE_HEIGHT_JS: &str = "document.body ? document.body.scrollHeight : 0";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Failed to create browser profile: {0}")]
    Profile(#[from] std::io::Error),

    #[error("Browser config error: {0}")]
    Config(String),

    #[error("Failed to launch Chrome. Is Chrome/Chromium installed? {0}")]
    Launch(String),

    #[error("{label}: {message}")]
    Cdp { label: &'static str, message: String },
}

impl From<chromiumoxide::error::CdpError> for CaptureError {
    fn from(e: chromiumoxide::error::CdpError) -> Self {
        let message = e.to_string();
        CaptureError::Cdp {
            label: classify_error(&message),
            message,
        }
    }
}

/// Rendering backend: one isolated session per call
#[async_trait]
pub trait Capturer: Send + Sync {
    /// Collect title, screenshot and final URL for `url` within `deadline`
    ///
    /// Never fails outright; whatever was obtained before an error or the
    /// deadline is returned.
    async fn capture(&self, url: &str, deadline: Duration) -> CaptureOutcome;
}

/// `Capturer` that drives a locally launched Chrome
#[derive(Debug, Clone, Default)]
pub struct ChromeCapturer {
    /// Explicit Chrome binary; auto-detected when `None`
    pub executable: Option<std::path::PathBuf>,
}

impl ChromeCapturer {
    pub fn new() -> Self {
        Self::default()
    }

    fn browser_config(&self, profile: &TempDir) -> Result<BrowserConfig, CaptureError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(profile.path())
            .window_size(VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
            .viewport(Viewport {
                width: VIEWPORT_WIDTH,
                height: VIEWPORT_HEIGHT,
                ..Default::default()
            })
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--ignore-certificate-errors")
            .arg("--no-first-run")
            .arg("--headless=new");

        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(CaptureError::Config)
    }
}

#[async_trait]
impl Capturer for ChromeCapturer {
    async fn capture(&self, url: &str, deadline: Duration) -> CaptureOutcome {
        let started = Instant::now();
        let mut outcome = CaptureOutcome::default();

        let session = match tokio::time::timeout(deadline, Session::launch(self)).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                warn!(url, error = %e, "Browser session unavailable");
                return outcome;
            }
            Err(_) => {
                warn!(url, "Browser launch timed out");
                return outcome;
            }
        };

        let remaining = deadline.saturating_sub(started.elapsed());
        match tokio::time::timeout(remaining, session.run(url, &mut outcome)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(url, error = %e, "Failed to capture screenshot or title"),
            Err(_) => warn!(url, ?deadline, "Capture deadline elapsed"),
        }

        session.close().await;

        if outcome.has_screenshot() {
            info!(url, bytes = outcome.screenshot.len(), "Screenshot captured");
        } else {
            warn!(url, "Screenshot buffer is empty");
        }
        outcome
    }
}

/// One browser process plus its event-loop task
struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
    // Removed from disk when the session is dropped
    _profile: TempDir,
}

impl Session {
    async fn launch(capturer: &ChromeCapturer) -> Result<Self, CaptureError> {
        let profile = tempfile::Builder::new().prefix("checkurl-").tempdir()?;
        let config = capturer.browser_config(&profile)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CaptureError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        Ok(Self {
            browser,
            handler,
            _profile: profile,
        })
    }

    /// Fill `outcome` step by step so a timeout keeps what was gathered
    async fn run(&self, url: &str, outcome: &mut CaptureOutcome) -> Result<(), CaptureError> {
        let page = self.browser.new_page("about:blank").await?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(SUPPRESS_DIALOGS_JS))
            .await?;

        page.goto(url).await?;
        wait_load_complete(&page, LOAD_TIMEOUT).await;
        poll_layout_stable(&page, LAYOUT_POLLS, LAYOUT_POLL_INTERVAL).await;

        if let Ok(result) = page.evaluate(DISMISS_POPUP_JS).await {
            if result.into_value::<bool>().unwrap_or(false) {
                debug!(url, "Dismissed popup");
            }
        }

        outcome.screenshot = page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
            )
            .await?;
        outcome.title = page.get_title().await?.unwrap_or_default();
        outcome.final_url = page.url().await?;
        Ok(())
    }

    /// Close gracefully, falling back to killing the process
    async fn close(mut self) {
        let closed = matches!(
            tokio::time::timeout(CLOSE_TIMEOUT, self.browser.close()).await,
            Ok(Ok(_))
        );
        if !closed {
            debug!("Browser did not close cleanly, killing it");
            if let Some(Err(e)) = self.browser.kill().await {
                warn!(error = %e, "Failed to kill browser process");
            }
        }
        if tokio::time::timeout(CLOSE_TIMEOUT, self.browser.wait())
            .await
            .is_err()
        {
            warn!("Browser process did not exit");
        }
        self.handler.abort();
    }
}

/// Poll `document.readyState` until complete or `timeout` elapses
async fn wait_load_complete(page: &Page, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;

    while Instant::now() < deadline {
        let state = page
            .evaluate("document.readyState")
            .await
            .ok()
            .and_then(|r| r.into_value::<String>().ok());
        if state.as_deref() == Some("complete") {
            return true;
        }
        tokio::time::sleep(LOAD_POLL_INTERVAL).await;
    }

    debug!("Page load timed out, capturing anyway");
    false
}

/// Best-effort wait for the page height to settle
async fn poll_layout_stable(page: &Page, max_polls: u32, interval: Duration) -> bool {
    let mut last: Option<f64> = None;

    for _ in 0..max_polls {
        let height = page
            .evaluate(PAGE_HEIGHT_JS)
            .await
            .ok()
            .and_then(|r| r.into_value::<f64>().ok());

        if let (Some(prev), Some(now)) = (last, height) {
            if prev == now {
                return true;
            }
        }
        last = height;
        tokio::time::sleep(interval).await;
    }

    false
}

/// Map Chrome network errors to a short label for logs
fn classify_error(error: &str) -> &'static str {
    if error.contains("ERR_NAME_NOT_RESOLVED") {
        "DNS_FAILED"
    } else if error.contains("ERR_CONNECTION_REFUSED") {
        "CONNECTION_REFUSED"
    } else if error.contains("ERR_CONNECTION_TIMED_OUT") || error.contains("ERR_TIMED_OUT") {
        "TIMEOUT"
    } else if error.contains("ERR_CERT") || error.contains("SSL") {
        "SSL_ERROR"
    } else {
        "NETWORK_ERROR"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_error() {
        assert_eq!(classify_error("net::ERR_NAME_NOT_RESOLVED"), "DNS_FAILED");
        assert_eq!(classify_error("ERR_CONNECTION_REFUSED"), "CONNECTION_REFUSED");
        assert_eq!(classify_error("net::ERR_TIMED_OUT"), "TIMEOUT");
        assert_eq!(classify_error("net::ERR_CERT_AUTHORITY_INVALID"), "SSL_ERROR");
        assert_eq!(classify_error("random error"), "NETWORK_ERROR");
    }

    #[test]
    fn test_browser_config_builds() {
        let profile = tempfile::tempdir().unwrap();
        let capturer = ChromeCapturer {
            executable: Some("/usr/bin/true".into()),
        };
        assert!(capturer.browser_config(&profile).is_ok());
    }

    #[tokio::test]
    async fn test_missing_browser_yields_empty_outcome() {
        let capturer = ChromeCapturer {
            executable: Some("/nonexistent/chrome".into()),
        };
        let outcome = capturer
            .capture("https://example.com/", Duration::from_secs(5))
            .await;
        assert_eq!(outcome, CaptureOutcome::default());
    }
}
