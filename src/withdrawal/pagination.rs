pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One-based page cursor over the filtered request list.
///
/// Changing filters leaves the cursor where it is, so a narrowed list can
/// leave the operator on a page past the end; such a page is simply empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub current_page: usize,
    pub items_per_page: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    pub fn new(current_page: usize, items_per_page: usize) -> Self {
        Self {
            current_page: current_page.max(1),
            items_per_page: items_per_page.max(1),
        }
    }

    pub fn start_index(&self) -> usize {
        self.current_page
            .saturating_sub(1)
            .saturating_mul(self.items_per_page)
    }

    /// Elements `[(p-1)*n, (p-1)*n + n)` of `items`, clipped to its length.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.start_index().min(items.len());
        let end = start.saturating_add(self.items_per_page).min(items.len());
        &items[start..end]
    }

    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.items_per_page)
    }
}
