/// Page-number pagination for post listings
use crate::db::Repository;
use crate::error::Result;
use crate::models::{PostFilter, PostView};
use serde::Deserialize;
use std::num::IntErrorKind;

/// Posts shown on one page of any listing
pub const POSTS_PER_PAGE: i64 = 10;

/// `?page=` query parameter, kept raw so garbage falls back to page 1
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// One page of a listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based
    pub number: i64,
    pub num_pages: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn previous_number(&self) -> Option<i64> {
        self.has_previous().then(|| self.number - 1)
    }

    pub fn next_number(&self) -> Option<i64> {
        self.has_next().then(|| self.number + 1)
    }
}

/// Number of pages for `total` items; an empty listing still has one page
pub fn num_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 {
        1
    } else {
        (total + per_page - 1) / per_page
    }
}

/// Resolve the requested page number
///
/// Missing or non-numeric input gives page 1; numbers below 1 or past the
/// end give the last page, including numbers too large for `i64`.
pub fn resolve_page(raw: Option<&str>, num_pages: i64) -> i64 {
    let Some(raw) = raw.map(str::trim) else {
        return 1;
    };
    match raw.parse::<i64>() {
        Ok(n) if n < 1 || n > num_pages => num_pages,
        Ok(n) => n,
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            num_pages
        }
        Err(_) => 1,
    }
}

/// Load the requested page of posts matching `filter`
pub async fn paginate_posts(
    repo: &dyn Repository,
    filter: PostFilter,
    raw_page: Option<&str>,
) -> Result<Page<PostView>> {
    let total = repo.count_posts(filter).await?;
    let num_pages = num_pages(total, POSTS_PER_PAGE);
    let number = resolve_page(raw_page, num_pages);

    let items = repo
        .list_posts(filter, POSTS_PER_PAGE, (number - 1) * POSTS_PER_PAGE)
        .await?;

    Ok(Page {
        items,
        number,
        num_pages,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_pages() {
        assert_eq!(num_pages(0, 10), 1);
        assert_eq!(num_pages(1, 10), 1);
        assert_eq!(num_pages(10, 10), 1);
        assert_eq!(num_pages(11, 10), 2);
        assert_eq!(num_pages(14, 10), 2);
    }

    #[test]
    fn test_resolve_page_fallbacks() {
        assert_eq!(resolve_page(None, 3), 1);
        assert_eq!(resolve_page(Some("abc"), 3), 1);
        assert_eq!(resolve_page(Some(""), 3), 1);
        assert_eq!(resolve_page(Some("2"), 3), 2);
        assert_eq!(resolve_page(Some("0"), 3), 3);
        assert_eq!(resolve_page(Some("-4"), 3), 3);
        assert_eq!(resolve_page(Some("99"), 3), 3);
    }

    #[test]
    fn test_resolve_page_out_of_range_numbers() {
        assert_eq!(resolve_page(Some("99999999999999999999"), 3), 3);
        assert_eq!(resolve_page(Some("-99999999999999999999"), 3), 3);
        assert_eq!(resolve_page(Some("+2"), 3), 2);
        assert_eq!(resolve_page(Some("1e3"), 3), 1);
    }

    #[test]
    fn test_page_neighbours() {
        let page = Page::<()> {
            items: Vec::new(),
            number: 2,
            num_pages: 3,
            total: 25,
        };
        assert_eq!(page.previous_number(), Some(1));
        assert_eq!(page.next_number(), Some(3));

        let only = Page::<()> {
            items: Vec::new(),
            number: 1,
            num_pages: 1,
            total: 0,
        };
        assert!(!only.has_previous());
        assert!(!only.has_next());
    }
}
