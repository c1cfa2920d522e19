//! Page metadata assembly.
//!
//! Pure arithmetic over a total count plus the caller's original request
//! parameters. Never executes queries and never re-validates the filter
//! values it echoes into link URLs; validation happened upstream.

use serde::Serialize;

/// The request parameters echoed into adjacent-page links. Filter values
/// are kept as the caller sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkParams {
    pub city: Option<String>,
    pub state: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PageMetadata {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
    pub next_url: Option<String>,
    pub prev_url: Option<String>,
}

pub fn build_metadata(
    total: i64,
    page: i64,
    limit: i64,
    base_path: &str,
    params: &LinkParams,
) -> PageMetadata {
    let total_pages = if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    };
    let has_next = page < total_pages;
    let has_prev = page > 1;

    PageMetadata {
        total,
        page,
        limit,
        total_pages,
        has_next,
        has_prev,
        next_url: has_next.then(|| page_url(base_path, page + 1, limit, params)),
        prev_url: has_prev.then(|| page_url(base_path, page - 1, limit, params)),
    }
}

fn page_url(base_path: &str, page: i64, limit: i64, params: &LinkParams) -> String {
    let mut url = format!("{base_path}?page={page}&limit={limit}");
    let pairs = [
        ("city", &params.city),
        ("state", &params.state),
        ("start_date", &params.start_date),
        ("end_date", &params.end_date),
    ];
    for (key, value) in pairs {
        if let Some(value) = value {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/api/diagnostics";

    #[test]
    fn total_pages_is_ceiling_division() {
        let meta = build_metadata(350, 1, 10, PATH, &LinkParams::default());
        assert_eq!(meta.total_pages, 35);

        let meta = build_metadata(351, 1, 10, PATH, &LinkParams::default());
        assert_eq!(meta.total_pages, 36);

        let meta = build_metadata(9, 1, 10, PATH, &LinkParams::default());
        assert_eq!(meta.total_pages, 1);
    }

    #[test]
    fn empty_result_has_zero_pages_and_no_links() {
        let meta = build_metadata(0, 1, 10, PATH, &LinkParams::default());
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
        assert_eq!(meta.next_url, None);
        assert_eq!(meta.prev_url, None);
    }

    #[test]
    fn first_page_has_next_but_no_prev() {
        let meta = build_metadata(350, 1, 10, PATH, &LinkParams::default());
        assert!(meta.has_next);
        assert!(!meta.has_prev);
        assert_eq!(
            meta.next_url.as_deref(),
            Some("/api/diagnostics?page=2&limit=10")
        );
        assert_eq!(meta.prev_url, None);
    }

    #[test]
    fn last_page_has_prev_but_no_next() {
        let meta = build_metadata(350, 35, 10, PATH, &LinkParams::default());
        assert!(!meta.has_next);
        assert!(meta.has_prev);
        assert_eq!(
            meta.prev_url.as_deref(),
            Some("/api/diagnostics?page=34&limit=10")
        );
    }

    #[test]
    fn middle_page_links_carry_filters_verbatim() {
        let params = LinkParams {
            city: Some("São Paulo".to_string()),
            state: Some("SP".to_string()),
            start_date: Some("2025-06-01".to_string()),
            end_date: None,
        };
        let meta = build_metadata(100, 2, 10, PATH, &params);
        assert_eq!(
            meta.next_url.as_deref(),
            Some(
                "/api/diagnostics?page=3&limit=10&city=S%C3%A3o%20Paulo&state=SP&start_date=2025-06-01"
            )
        );
        assert_eq!(
            meta.prev_url.as_deref(),
            Some(
                "/api/diagnostics?page=1&limit=10&city=S%C3%A3o%20Paulo&state=SP&start_date=2025-06-01"
            )
        );
    }

    #[test]
    fn single_page_has_no_links() {
        let meta = build_metadata(5, 1, 10, PATH, &LinkParams::default());
        assert_eq!(meta.total_pages, 1);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }
}
