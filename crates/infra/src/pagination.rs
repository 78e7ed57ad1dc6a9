//! Offset pagination for list endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Listing sort key; `createdAt` unless asked otherwise.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    #[default]
    CreatedAt,
    Name,
}

/// Records that can be ordered by [`SortBy`].
pub trait Sortable {
    fn sort_name(&self) -> &str;
    fn sort_created_at(&self) -> DateTime<Utc>;
}

/// A clamped page request (page ≥ 1, 1 ≤ limit ≤ 100).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
    pub order: SortOrder,
    pub sort_by: SortBy,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_SIZE,
            order: SortOrder::Desc,
            sort_by: SortBy::CreatedAt,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<u32>, limit: Option<u32>, order: Option<SortOrder>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            order: order.unwrap_or_default(),
            sort_by: SortBy::default(),
        }
    }

    pub fn sorted_by(mut self, sort_by: Option<SortBy>) -> Self {
        self.sort_by = sort_by.unwrap_or_default();
        self
    }

    /// Order `items` by the requested key and direction. Ties keep their input order.
    pub fn sort<T: Sortable>(&self, items: &mut [T]) {
        match (self.sort_by, self.order) {
            (SortBy::CreatedAt, SortOrder::Asc) => items.sort_by_key(|i| i.sort_created_at()),
            (SortBy::CreatedAt, SortOrder::Desc) => items.sort_by(|a, b| b.sort_created_at().cmp(&a.sort_created_at())),
            (SortBy::Name, SortOrder::Asc) => items.sort_by(|a, b| a.sort_name().cmp(b.sort_name())),
            (SortBy::Name, SortOrder::Desc) => items.sort_by(|a, b| b.sort_name().cmp(a.sort_name())),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: u32,
    pub limit: u32,
    pub item_count: u64,
    pub page_count: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl PageMeta {
    pub fn new(request: PageRequest, item_count: u64) -> Self {
        let page_count = item_count.div_ceil(request.limit as u64);
        Self {
            page: request.page,
            limit: request.limit,
            item_count,
            page_count,
            has_previous_page: request.page > 1,
            has_next_page: (request.page as u64) < page_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Slice an already-filtered, already-ordered result set.
    pub fn from_items(items: Vec<T>, request: PageRequest) -> Self {
        let meta = PageMeta::new(request, items.len() as u64);
        let data = items
            .into_iter()
            .skip(request.offset())
            .take(request.limit as usize)
            .collect();
        Self { data, meta }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_clamped() {
        let req = PageRequest::new(Some(0), Some(1_000), None);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, MAX_PAGE_SIZE);
        assert_eq!(PageRequest::new(None, Some(0), None).limit, 1);
    }

    #[test]
    fn slices_and_reports_meta() {
        let page = Page::from_items((1..=45).collect::<Vec<_>>(), PageRequest::new(Some(3), Some(20), None));
        assert_eq!(page.data, (41..=45).collect::<Vec<_>>());
        assert_eq!(page.meta.page_count, 3);
        assert!(page.meta.has_previous_page);
        assert!(!page.meta.has_next_page);
    }

    struct Named(&'static str, i64);

    impl Sortable for Named {
        fn sort_name(&self) -> &str {
            self.0
        }

        fn sort_created_at(&self) -> DateTime<Utc> {
            DateTime::from_timestamp(self.1, 0).unwrap()
        }
    }

    fn names(items: &[Named]) -> Vec<&'static str> {
        items.iter().map(|n| n.0).collect()
    }

    #[test]
    fn sorts_by_requested_key_and_order() {
        let mut items = vec![Named("beta", 1), Named("alpha", 3), Named("gamma", 2)];

        PageRequest::default().sort(&mut items);
        assert_eq!(names(&items), ["alpha", "gamma", "beta"]);

        PageRequest::new(None, None, Some(SortOrder::Asc))
            .sorted_by(Some(SortBy::Name))
            .sort(&mut items);
        assert_eq!(names(&items), ["alpha", "beta", "gamma"]);

        PageRequest::default().sorted_by(Some(SortBy::Name)).sort(&mut items);
        assert_eq!(names(&items), ["gamma", "beta", "alpha"]);
    }

    #[test]
    fn meta_serializes_camel_case() {
        let json = serde_json::to_value(PageMeta::new(PageRequest::default(), 21)).unwrap();
        assert_eq!(json["itemCount"], 21);
        assert_eq!(json["pageCount"], 2);
        assert_eq!(json["hasNextPage"], true);
    }
}
