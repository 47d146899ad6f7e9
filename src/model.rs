//! Pipeline data model: tasks, per-attempt outcomes, and terminal results

use serde::Serialize;

/// Status code recorded when no HTTP response was obtained
pub const NO_RESPONSE: i32 = -1;

/// One URL as read from the input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTask {
    /// Position in the input file (0-based)
    pub index: usize,
    /// URL exactly as the user supplied it
    pub original_url: String,
}

impl UrlTask {
    pub fn new(index: usize, original_url: impl Into<String>) -> Self {
        Self {
            index,
            original_url: original_url.into(),
        }
    }

    /// Build tasks from decoded input lines, preserving input order
    pub fn from_lines(lines: Vec<String>) -> Vec<Self> {
        lines
            .into_iter()
            .enumerate()
            .map(|(index, url)| Self::new(index, url))
            .collect()
    }
}

/// Result of one reachability probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub resolved_url: String,
    pub status_code: i32,
    pub was_redirected: bool,
}

impl ProbeOutcome {
    /// Transport-level failure: no response, URL left as requested
    pub fn unreachable(url: &str) -> Self {
        Self {
            resolved_url: url.to_string(),
            status_code: NO_RESPONSE,
            was_redirected: false,
        }
    }

    pub fn is_reachable(&self) -> bool {
        self.status_code != NO_RESPONSE
    }
}

/// Whatever a rendering session managed to collect before it ended
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub title: String,
    /// PNG bytes; empty when the capture failed
    pub screenshot: Vec<u8>,
    /// Browser's current URL after load, if it could be read
    pub final_url: Option<String>,
}

impl CaptureOutcome {
    pub fn has_screenshot(&self) -> bool {
        !self.screenshot.is_empty()
    }
}

/// Terminal record for one URL task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UrlResult {
    #[serde(skip)]
    pub index: usize,
    pub original_url: String,
    pub final_url: String,
    pub title: String,
    pub status_code: i32,
    #[serde(skip)]
    pub screenshot: Vec<u8>,
    pub was_redirected: bool,
}

impl UrlResult {
    /// Record for a URL that never produced an HTTP response
    pub fn unreachable(task: &UrlTask, attempted_url: &str) -> Self {
        Self {
            index: task.index,
            original_url: task.original_url.clone(),
            final_url: attempted_url.to_string(),
            title: String::new(),
            status_code: NO_RESPONSE,
            screenshot: Vec::new(),
            was_redirected: false,
        }
    }

    pub fn is_accessible(&self) -> bool {
        self.status_code != NO_RESPONSE
    }

    pub fn has_screenshot(&self) -> bool {
        !self.screenshot.is_empty()
    }

    /// An attempt is complete only with a response and a screenshot
    pub fn is_complete(&self) -> bool {
        self.is_accessible() && self.has_screenshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines_keeps_order() {
        let tasks = UrlTask::from_lines(vec!["a.com".into(), "b.com".into()]);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0], UrlTask::new(0, "a.com"));
        assert_eq!(tasks[1].index, 1);
    }

    #[test]
    fn test_unreachable_result_is_empty() {
        let task = UrlTask::new(3, "dead.example");
        let result = UrlResult::unreachable(&task, "dead.example/");
        assert_eq!(result.status_code, NO_RESPONSE);
        assert!(result.title.is_empty());
        assert!(!result.has_screenshot());
        assert!(!result.is_accessible());
        assert!(!result.is_complete());
        assert_eq!(result.index, 3);
    }

    #[test]
    fn test_serialize_skips_screenshot() {
        let task = UrlTask::new(0, "x.com");
        let result = UrlResult::unreachable(&task, "x.com/");
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"status_code\":-1"));
        assert!(!json.contains("screenshot"));
        assert!(!json.contains("index"));
    }
}
