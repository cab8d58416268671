use serde::{Deserialize, Serialize};

/// Page size used when the client sends none (or a non-positive one).
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// 1-based pagination parameters as sent by clients.
///
/// Raw values are kept signed so that `pageNumber=0` or `pageSize=-5`
/// deserialize and get normalized instead of failing the request.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    #[serde(default = "default_page_number")]
    pub page_number: i64,

    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page_number() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE as i64
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page_number: default_page_number(),
            page_size: default_page_size(),
        }
    }
}

impl PageParams {
    pub fn new(page_number: i64, page_size: i64) -> Self {
        Self { page_number, page_size }
    }

    /// Page number, at least 1.
    pub fn number(&self) -> u32 {
        self.page_number.clamp(1, u32::MAX as i64) as u32
    }

    /// Page size in `1..=MAX_PAGE_SIZE`; non-positive values fall back to
    /// [`DEFAULT_PAGE_SIZE`].
    pub fn size(&self) -> u32 {
        if self.page_size < 1 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size.min(MAX_PAGE_SIZE as i64) as u32
        }
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> u64 {
        (self.number() as u64 - 1) * self.size() as u64
    }
}

/// One page of a list result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T: Serialize> {
    pub data: Vec<T>,
    pub total_records: u64,
    pub page_number: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T: Serialize> PagedResult<T> {
    pub fn new(data: Vec<T>, total_records: u64, page: &PageParams) -> Self {
        let page_number = page.number();
        let page_size = page.size();
        let total_pages = total_records.div_ceil(page_size as u64);
        Self {
            data,
            total_records,
            page_number,
            page_size,
            total_pages,
            has_previous_page: page_number > 1,
            has_next_page: (page_number as u64) < total_pages,
        }
    }
}

/// Get the current time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}
