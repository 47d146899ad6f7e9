//! Reachability probe over plain HTTP
//!
//! Certificate verification is disabled: self-signed and misconfigured
//! sites must still report a status code.

use crate::model::ProbeOutcome;
use crate::normalize::is_redirect;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Single-request reachability checks
#[async_trait]
pub trait Prober: Send + Sync {
    /// GET `url`, following redirects, bounded by `timeout`
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome;

    /// Lightweight check used for protocol selection: any status below 400
    async fn check(&self, url: &str, timeout: Duration) -> bool;
}

/// `Prober` backed by a shared reqwest client
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(true)
            .redirect(Policy::default())
            .build()?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<reqwest::Response, reqwest::Error> {
        self.client.get(url).timeout(timeout).send().await
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, url: &str, timeout: Duration) -> ProbeOutcome {
        match self.get(url, timeout).await {
            Ok(response) => {
                let status_code = i32::from(response.status().as_u16());
                let resolved_url = response.url().to_string();
                let was_redirected = is_redirect(url, &resolved_url);
                debug!(url, status_code, resolved = %resolved_url, "Probe answered");
                ProbeOutcome {
                    resolved_url,
                    status_code,
                    was_redirected,
                }
            }
            Err(e) => {
                warn!(url, error = %e, kind = failure_kind(&e), "HTTP request failed");
                ProbeOutcome::unreachable(url)
            }
        }
    }

    async fn check(&self, url: &str, timeout: Duration) -> bool {
        match self.get(url, timeout).await {
            Ok(response) => response.status().as_u16() < 400,
            Err(_) => false,
        }
    }
}

fn failure_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "TIMEOUT"
    } else if e.is_connect() {
        "CONNECT"
    } else if e.is_redirect() {
        "REDIRECT"
    } else if e.is_builder() {
        "INVALID_URL"
    } else {
        "NETWORK_ERROR"
    }
}
