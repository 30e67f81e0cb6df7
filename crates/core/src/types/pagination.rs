//! Page/limit handling shared by listing endpoints.

use serde::{Deserialize, Serialize};

/// A validated page request.
///
/// Query strings arrive as free text, so construction is lenient: missing,
/// non-numeric or zero values fall back to the defaults, and everything is
/// clamped into range rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Builds a request from raw query-string values.
    #[must_use]
    pub fn from_query(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: u32,
        max_limit: u32,
    ) -> Self {
        Self::new(parse_number(page), parse_number(limit), default_limit, max_limit)
    }

    /// Builds a request from already-parsed numbers.
    #[must_use]
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: u32, max_limit: u32) -> Self {
        let page = page
            .filter(|&p| p != 0)
            .map_or(1, |p| u32::try_from(p.clamp(1, i64::from(u32::MAX))).unwrap_or(1));
        let limit = limit.filter(|&l| l != 0).map_or(default_limit, |l| {
            u32::try_from(l.clamp(1, i64::from(max_limit))).unwrap_or(default_limit)
        });
        Self {
            page,
            limit: limit.clamp(1, max_limit.max(1)),
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Row offset for `OFFSET`.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

fn parse_number(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    let end = raw
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
        .map_or(raw.len(), |(i, _)| i);
    raw.get(..end)?.parse().ok()
}

/// Pagination block returned alongside a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    #[must_use]
    pub fn new(request: PageRequest, total: i64) -> Self {
        let limit = i64::from(request.limit.max(1));
        let total = total.max(0);
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest::from_query(None, None, 20, 50);
        assert_eq!((req.page(), req.limit(), req.offset()), (1, 20, 0));
    }

    #[test]
    fn test_page_below_one_becomes_one() {
        assert_eq!(PageRequest::new(Some(-3), None, 20, 50).page(), 1);
        assert_eq!(PageRequest::new(Some(0), None, 20, 50).page(), 1);
    }

    #[test]
    fn test_limit_clamped() {
        assert_eq!(PageRequest::new(None, Some(500), 20, 50).limit(), 50);
        assert_eq!(PageRequest::new(None, Some(-5), 20, 50).limit(), 1);
        assert_eq!(PageRequest::new(None, Some(0), 20, 50).limit(), 20);
    }

    #[test]
    fn test_lenient_query_parsing() {
        let req = PageRequest::from_query(Some("3"), Some("abc"), 20, 50);
        assert_eq!((req.page(), req.limit()), (3, 20));
        let req = PageRequest::from_query(Some("2x"), Some(" 10 "), 20, 50);
        assert_eq!((req.page(), req.limit(), req.offset()), (2, 10, 10));
    }

    #[test]
    fn test_pages_rounds_up() {
        let req = PageRequest::new(Some(1), Some(20), 20, 50);
        assert_eq!(Pagination::new(req, 0).pages, 0);
        assert_eq!(Pagination::new(req, 20).pages, 1);
        assert_eq!(Pagination::new(req, 21).pages, 2);
    }
}
