//! Pagination request and result types shared by every list query.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolbindError};

/// A validated 1-indexed page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Validate `page >= 1` and `1 <= size <= max_size`.
    ///
    /// Takes signed inputs so that zero and negative sizes coming off the wire
    /// are rejected here instead of wrapping.
    pub fn new(page: i64, size: i64, max_size: u32) -> Result<Self> {
        if page < 1 {
            return Err(ToolbindError::invalid_input("page", "must be >= 1"));
        }
        if size < 1 {
            return Err(ToolbindError::invalid_input("size", "must be greater than 0"));
        }
        if size > i64::from(max_size) {
            return Err(ToolbindError::invalid_input(
                "size",
                format!("must be at most {}", max_size),
            ));
        }
        let page = u32::try_from(page).map_err(|_| ToolbindError::invalid_input("page", "out of range"))?;
        Ok(Self {
            page,
            size: size as u32,
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Row offset of the first item on this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }
}

/// One page of results plus the metadata needed to walk the rest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
}

impl<T> Page<T> {
    /// Assemble a page; `total_elements` is the count of the full filtered set.
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = u64::from(request.size());
        let total_pages = total_elements.div_ceil(size);
        let last = if total_pages > 0 {
            u64::from(request.page()) >= total_pages
        } else {
            true
        };

        Self {
            content,
            page: request.page(),
            size: request.size(),
            total_elements,
            total_pages,
            first: request.page() == 1,
            last,
        }
    }
}
