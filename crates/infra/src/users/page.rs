use serde::{Deserialize, Serialize};

use userguard_core::{DomainError, DomainResult};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Listing parameters (`?search=&page=&perPage=`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl UserQuery {
    /// Effective `(page, per_page)`, both at least 1.
    pub fn window(&self) -> DomainResult<(u32, u32)> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if page < 1 {
            return Err(DomainError::validation("page must not be less than 1"));
        }
        if per_page < 1 {
            return Err(DomainError::validation("perPage must not be less than 1"));
        }
        Ok((page, per_page))
    }

    /// Trimmed, lower-cased search term; blank terms match everything.
    pub fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: usize,
    pub current_page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl PageMeta {
    pub fn new(total: usize, current_page: u32, per_page: u32) -> Self {
        let total_pages = total.div_ceil(per_page as usize) as u32;
        Self {
            total,
            current_page,
            per_page,
            total_pages,
            has_next_page: current_page < total_pages,
            has_previous_page: current_page > 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Page<T> {
    /// Cut one page out of an already filtered and ordered list.
    pub fn slice(items: Vec<T>, page: u32, per_page: u32) -> Self {
        let meta = PageMeta::new(items.len(), page, per_page);
        let skip = (page as usize).saturating_sub(1).saturating_mul(per_page as usize);
        let data = items.into_iter().skip(skip).take(per_page as usize).collect();
        Self { data, meta }
    }
}
