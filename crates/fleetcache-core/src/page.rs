use serde::Serialize;

/// Page size used when a consumer has not chosen one
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// One page of filtered, sorted items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    #[serde(rename = "pageSize")]
    pub page_size: usize,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn empty(page: usize, page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: page.max(1),
            page_size,
            has_more: false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self::empty(1, DEFAULT_PAGE_SIZE)
    }
}

/// Number of pages needed to show `total` items
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}

/// Slice `items` into the 1-indexed page `[(page-1)*size, page*size)`.
///
/// Page 0 is treated as page 1. A zero page size yields no items.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let total = items.len();
    if page_size == 0 {
        return Page {
            items: Vec::new(),
            total,
            page,
            page_size,
            has_more: total > 0,
        };
    }

    let start = (page - 1).saturating_mul(page_size).min(total);
    let end = start.saturating_add(page_size).min(total);

    Page {
        items: items[start..end].to_vec(),
        total,
        page,
        page_size,
        has_more: end < total,
    }
}
