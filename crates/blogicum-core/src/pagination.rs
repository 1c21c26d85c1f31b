//! Page-number pagination for post listings.

use serde::{Deserialize, Serialize};

/// Posts shown per listing page.
pub const POSTS_PER_PAGE: u64 = 10;

/// The page a client asked for, before the listing size is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageRequest {
    requested: Option<i64>,
}

impl PageRequest {
    pub fn first() -> Self {
        Self::default()
    }

    pub fn number(number: i64) -> Self {
        Self {
            requested: Some(number),
        }
    }

    /// Parse the raw `page` query parameter. Missing or non-numeric values
    /// mean the first page.
    pub fn from_param(param: Option<&str>) -> Self {
        Self {
            requested: param.and_then(|raw| raw.trim().parse().ok()),
        }
    }

    /// The 1-based page to serve out of `total_pages`.
    ///
    /// Numbers outside `1..=total_pages` land on the last page.
    pub fn resolve(&self, total_pages: u64) -> u64 {
        let last = total_pages.max(1);
        match self.requested {
            None => 1,
            Some(n) if n >= 1 && (n as u64) <= last => n as u64,
            Some(_) => last,
        }
    }
}

/// Number of pages needed for `total_items`; an empty listing still has one page.
pub fn total_pages(total_items: u64, per_page: u64) -> u64 {
    total_items.div_ceil(per_page.max(1)).max(1)
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, number: u64, per_page: u64, total_items: u64) -> Self {
        Self {
            items,
            number,
            per_page,
            total_items,
            total_pages: total_pages(total_items, per_page),
        }
    }

    /// Cut the requested page out of an already ordered, complete listing.
    pub fn from_items(all: Vec<T>, request: PageRequest, per_page: u64) -> Self {
        let total_items = all.len() as u64;
        let number = request.resolve(total_pages(total_items, per_page));
        let start = ((number - 1) * per_page) as usize;
        let items = all
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();
        Self::new(items, number, per_page, total_items)
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            per_page: self.per_page,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_garbage_param_is_first_page() {
        assert_eq!(PageRequest::from_param(None).resolve(5), 1);
        assert_eq!(PageRequest::from_param(Some("abc")).resolve(5), 1);
        assert_eq!(PageRequest::from_param(Some("")).resolve(5), 1);
    }

    #[test]
    fn test_out_of_range_clamps_to_last_page() {
        assert_eq!(PageRequest::from_param(Some("99")).resolve(3), 3);
        assert_eq!(PageRequest::number(0).resolve(3), 3);
        assert_eq!(PageRequest::number(-2).resolve(3), 3);
        assert_eq!(PageRequest::number(2).resolve(3), 2);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(25, 10), 3);
    }

    #[test]
    fn test_from_items_beyond_last_returns_last_page() {
        let items: Vec<u32> = (1..=25).collect();
        let page = Page::from_items(items, PageRequest::number(7), POSTS_PER_PAGE);

        assert_eq!(page.number, 3);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn test_empty_listing_has_single_empty_page() {
        let page = Page::<u32>::from_items(Vec::new(), PageRequest::number(4), POSTS_PER_PAGE);

        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }
}
