/// One page of a projected list, borrowed from the filtered slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub total_pages: usize,
}

/// `ceil(len / page_size)`, never less than 1: an empty list still has one
/// (empty) page.
pub fn total_pages(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Pages are 1-based. Callers clamp before slicing and reset to page 1
/// whenever the criteria or page size change.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Slices `[(page-1)*size, page*size)`; empty-safe at the end of the list.
/// Does not auto-correct an out-of-range page: an over-the-end page yields
/// an empty slice.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total = total_pages(items.len(), page_size);

    let start = page.saturating_sub(1).saturating_mul(page_size);
    let end = start.saturating_add(page_size).min(items.len());
    let slice = if start >= items.len() {
        &items[..0]
    } else {
        &items[start..end]
    };

    Page {
        items: slice,
        page,
        total_pages: total,
    }
}
