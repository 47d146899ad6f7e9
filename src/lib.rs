//! checkurl: batch URL reachability with headless Chrome screenshots
//!
//! Pipeline per URL: normalize -> probe -> capture, retried with linear
//! backoff, fanned out under a fixed concurrency bound.

pub mod browser;
pub mod check_urls;
pub mod cleanup;
pub mod input;
pub mod model;
pub mod normalize;
pub mod probe;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod summary;

pub use browser::{CaptureError, Capturer, ChromeCapturer};
pub use check_urls::{check_urls, check_with, CheckConfig, CheckReport};
pub use input::{decode_lines, read_url_file, DecodeError, TextEncoding};
pub use model::{CaptureOutcome, ProbeOutcome, UrlResult, UrlTask, NO_RESPONSE};
pub use probe::{HttpProber, Prober};
pub use retry::{AttemptState, RetryController, RetryPolicy, Sleeper, TokioSleeper};
pub use scheduler::run_all;
pub use summary::Summary;
