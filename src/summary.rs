//! Aggregate counts over a finished batch

use crate::model::UrlResult;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub accessible: usize,
    pub inaccessible: usize,
    /// Accessible URLs that ended somewhere other than requested
    pub redirected: usize,
}

impl Summary {
    pub fn from_results(results: &[UrlResult]) -> Self {
        let mut summary = Summary {
            total: results.len(),
            ..Default::default()
        };

        for result in results {
            if result.is_accessible() {
                summary.accessible += 1;
                if result.was_redirected {
                    summary.redirected += 1;
                }
            }
        }

        summary.inaccessible = summary.total - summary.accessible;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UrlTask;

    fn result(status_code: i32, was_redirected: bool) -> UrlResult {
        let mut r = UrlResult::unreachable(&UrlTask::new(0, "x.com"), "x.com/");
        r.status_code = status_code;
        r.was_redirected = was_redirected;
        r
    }

    #[test]
    fn test_counts() {
        let results = vec![
            result(200, false),
            result(200, true),
            result(404, true),
            result(-1, false),
            // Redirect flag on an unreachable record is not counted
            result(-1, true),
        ];
        let summary = Summary::from_results(&results);
        assert_eq!(
            summary,
            Summary {
                total: 5,
                accessible: 3,
                inaccessible: 2,
                redirected: 2,
            }
        );
    }

    #[test]
    fn test_invariants_and_idempotence() {
        let results: Vec<UrlResult> = (0..20)
            .map(|i| result(if i % 3 == 0 { -1 } else { 200 }, i % 2 == 0))
            .collect();

        let first = Summary::from_results(&results);
        let second = Summary::from_results(&results);
        assert_eq!(first, second);
        assert_eq!(first.accessible + first.inaccessible, first.total);
        assert!(first.redirected <= first.accessible);
    }

    #[test]
    fn test_empty() {
        assert_eq!(Summary::from_results(&[]), Summary::default());
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&Summary::from_results(&[result(200, false)])).unwrap();
        assert_eq!(
            json,
            r#"{"total":1,"accessible":1,"inaccessible":0,"redirected":0}"#
        );
    }
}
