//! Page arithmetic for the results table.
//!
//! Pages are numbered from 1. Nothing here touches the crawl; it only
//! decides which slice of the result list is shown and which page links
//! are offered.

use std::ops::RangeInclusive;

pub const PAGE_SIZE: usize = 10;
pub const MAX_VISIBLE_PAGES: usize = 5;

/// One element of the pagination bar, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Previous { target: usize, enabled: bool },
    /// Jump to page 1 when the window does not include it
    First,
    Ellipsis,
    Page { number: usize, current: bool },
    /// Jump to the last page when the window does not include it
    Last(usize),
    Next { target: usize, enabled: bool },
}

pub fn total_pages(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE)
}

/// Keep `page` within `1..=total`, treating an empty list as one page
pub fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, total.max(1))
}

/// The rows shown on `page`
pub fn page_slice<T>(items: &[T], page: usize) -> &[T] {
    let page = clamp_page(page, total_pages(items.len()));
    let start = ((page - 1) * PAGE_SIZE).min(items.len());
    let end = (start + PAGE_SIZE).min(items.len());
    &items[start..end]
}

/// The numbered pages shown around `current`: up to two on either side,
/// shifted so the window stays full near the edges.
pub fn page_window(current: usize, total: usize) -> RangeInclusive<usize> {
    if total == 0 {
        return 1..=0;
    }
    let current = clamp_page(current, total);
    let span = MAX_VISIBLE_PAGES - 1;

    let mut start = current.saturating_sub(2).max(1);
    let end = (start + span).min(total);
    if end - start < span {
        start = end.saturating_sub(span).max(1);
    }
    start..=end
}

/// Build the pagination bar for `current` out of `total` pages. Empty when
/// there is nothing to page through.
pub fn pagination_items(current: usize, total: usize) -> Vec<PageItem> {
    if total == 0 {
        return Vec::new();
    }
    let current = clamp_page(current, total);
    let window = page_window(current, total);
    let (start, end) = (*window.start(), *window.end());

    let mut items = vec![PageItem::Previous {
        target: current.saturating_sub(1).max(1),
        enabled: current > 1,
    }];

    if start > 1 {
        items.push(PageItem::First);
        if start > 2 {
            items.push(PageItem::Ellipsis);
        }
    }

    items.extend(window.map(|number| PageItem::Page {
        number,
        current: number == current,
    }));

    if end < total {
        if end + 1 < total {
            items.push(PageItem::Ellipsis);
        }
        items.push(PageItem::Last(total));
    }

    items.push(PageItem::Next {
        target: (current + 1).min(total),
        enabled: current < total,
    });
    items
}
