use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Lenient query parsing: leading digits are read the way a browser's
    /// `parseInt` would, and anything absent, non-numeric or zero falls back
    /// to the defaults instead of failing the request.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: page.and_then(leading_positive_int).unwrap_or(DEFAULT_PAGE),
            limit: limit.and_then(leading_positive_int).unwrap_or(DEFAULT_LIMIT),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

fn leading_positive_int(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim_start()
        .trim_start_matches('+')
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    match digits.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(u32::try_from(n).unwrap_or(u32::MAX)),
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(req: PageRequest, total: u64) -> Self {
        Self {
            page: req.page,
            limit: req.limit,
            total,
            pages: total.div_ceil(u64::from(req.limit.max(1))),
        }
    }
}
