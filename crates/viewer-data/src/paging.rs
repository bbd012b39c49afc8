//! 1-indexed pagination shared by the row engine and the call catalog.

use std::ops::Range;

use crate::error::{DataError, Result};

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Validate `page >= 1` and `1 <= page_size <= max_page_size`.
    pub fn new(page: u32, page_size: u32, max_page_size: u32) -> Result<Self> {
        if page < 1 {
            return Err(DataError::Validation(format!(
                "page must be >= 1, got {page}"
            )));
        }
        if page_size < 1 || page_size > max_page_size {
            return Err(DataError::Validation(format!(
                "page_size must be between 1 and {max_page_size}, got {page_size}"
            )));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Index range of this page within `total` items. Empty past the end.
    pub fn window(&self, total: usize) -> Range<usize> {
        let size = self.page_size as usize;
        let start = (self.page as usize).saturating_sub(1).saturating_mul(size).min(total);
        let end = start.saturating_add(size).min(total);
        start..end
    }

    /// Copy this page out of `items`.
    pub fn slice<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items[self.window(items.len())].to_vec()
    }
}
