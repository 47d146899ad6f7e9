//! URL normalization: protocol selection and canonical trailing slash

use crate::probe::Prober;
use std::time::{Duration, Instant};
use tracing::debug;

/// Deadline for each protocol check when the input has no scheme
pub const PROTOCOL_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

const SCHEMES: [&str; 2] = ["https://", "http://"];

/// Resolve a raw input line to a probe candidate
///
/// Inputs without a scheme try `https://` then `http://`; if neither answers,
/// the bare input is returned and the probe will record it as unreachable.
/// Both checks together never run longer than `budget`.
pub async fn normalize(raw: &str, prober: &dyn Prober, budget: Duration) -> String {
    let trimmed = raw.trim();

    if has_scheme(trimmed) {
        return with_trailing_slash(trimmed);
    }

    let started = Instant::now();
    for scheme in SCHEMES {
        let remaining = budget.saturating_sub(started.elapsed());
        if remaining.is_zero() {
            break;
        }
        let candidate = with_trailing_slash(&format!("{scheme}{trimmed}"));
        if prober.check(&candidate, PROTOCOL_CHECK_TIMEOUT.min(remaining)).await {
            debug!(url = %candidate, "Protocol check succeeded");
            return candidate;
        }
    }

    debug!(url = %trimmed, "No protocol answered, keeping input as-is");
    with_trailing_slash(trimmed)
}

pub fn has_scheme(url: &str) -> bool {
    scheme_len(url).is_some()
}

fn scheme_len(url: &str) -> Option<usize> {
    SCHEMES.iter().find_map(|scheme| {
        url.get(..scheme.len())
            .filter(|prefix| prefix.eq_ignore_ascii_case(scheme))
            .map(|_| scheme.len())
    })
}

/// Append `/` unless already present
///
/// URLs carrying a query or fragment are left alone; a slash there would
/// change the resource being requested.
pub fn with_trailing_slash(url: &str) -> String {
    if url.is_empty() || url.ends_with('/') || url.contains(['?', '#']) {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// Comparison key: no scheme, no trailing slash, lowercase
pub fn comparison_key(url: &str) -> String {
    let url = url.trim();
    let rest = match scheme_len(url) {
        Some(len) => &url[len..],
        None => url,
    };
    rest.trim_end_matches('/').to_lowercase()
}

/// True when `observed` names a different location than `requested`
pub fn is_redirect(requested: &str, observed: &str) -> bool {
    comparison_key(requested) != comparison_key(observed)
}
