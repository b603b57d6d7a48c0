//! This modules defines the common functionality for paging data.

use std::num::NonZeroUsize;

/// The config for pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    /// The page a list starts on.
    pub default_page: usize,
    /// The number of items shown per page until the user picks another size.
    pub default_page_size: NonZeroUsize,
    /// The maximum number of pages to show in the pagination indicator.
    pub max_pages: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: NonZeroUsize::new(10).unwrap_or(NonZeroUsize::MIN),
            max_pages: 5,
        }
    }
}

/// The number of pages needed to show `item_count` items, or 0 if there are none.
pub fn total_pages(item_count: usize, page_size: NonZeroUsize) -> usize {
    item_count.div_ceil(page_size.get())
}

/// The items on page `page` (1-based) when `items` is split into pages of `page_size`.
///
/// Pages past the end are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: NonZeroUsize) -> &[T] {
    let page_size = page_size.get();
    let start = page.saturating_sub(1).saturating_mul(page_size);

    if start >= items.len() {
        return &[];
    }

    let end = start.saturating_add(page_size).min(items.len());

    &items[start..end]
}

/// An entry in the row of page buttons under a list.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PaginationIndicator {
    /// A link to another page.
    Page(usize),
    /// The page being shown.
    CurrPage(usize),
    /// A gap in the page numbers.
    Ellipsis,
    /// A link to the next page.
    NextButton(usize),
    /// A link to the previous page.
    BackButton(usize),
}

/// Build the page buttons for page `curr_page` of `page_count`, showing at
/// most `max_pages` numbered pages around the current one.
pub fn create_pagination_indicators(
    curr_page: usize,
    page_count: usize,
    max_pages: usize,
) -> Vec<PaginationIndicator> {
    let map_page = |page| {
        if page == curr_page {
            PaginationIndicator::CurrPage(page)
        } else {
            PaginationIndicator::Page(page)
        }
    };

    let half = max_pages / 2;

    let mut indicators: Vec<PaginationIndicator> = if page_count <= max_pages {
        (1..=page_count).map(map_page).collect()
    } else if curr_page <= half {
        (1..=max_pages).map(map_page).collect()
    } else if curr_page > page_count - half {
        ((page_count - max_pages + 1)..=page_count)
            .map(map_page)
            .collect()
    } else {
        ((curr_page - half)..=(curr_page + half))
            .map(map_page)
            .collect()
    };

    if page_count > max_pages {
        if curr_page > half + 1 {
            indicators.insert(0, PaginationIndicator::Page(1));
            indicators.insert(1, PaginationIndicator::Ellipsis);
        }

        if curr_page < page_count - half {
            indicators.push(PaginationIndicator::Ellipsis);
            indicators.push(PaginationIndicator::Page(page_count));
        }
    }

    if curr_page > 1 {
        indicators.insert(0, PaginationIndicator::BackButton(curr_page - 1));
    }

    if curr_page < page_count {
        indicators.push(PaginationIndicator::NextButton(curr_page + 1));
    }

    indicators
}
