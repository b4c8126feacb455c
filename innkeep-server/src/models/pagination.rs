//! Limit/offset pagination

use serde::Deserialize;

/// Upper bound for a single page
const MAX_LIMIT: u32 = 500;

/// Page size when the client sends none
const DEFAULT_LIMIT: u32 = 100;

/// Pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u32,
    pub offset: u32,
}

impl Pagination {
    /// Create pagination; limit is clamped to 1..=500.
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, MAX_LIMIT),
            offset,
        }
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        i64::from(self.offset)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/// Query parameters for pagination
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<PaginationParams> for Pagination {
    fn from(params: PaginationParams) -> Self {
        Self::new(
            params.limit.unwrap_or(DEFAULT_LIMIT),
            params.offset.unwrap_or(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = Pagination::from(PaginationParams::default());
        assert_eq!(p, Pagination { limit: 100, offset: 0 });
    }

    #[test]
    fn clamps_limit() {
        assert_eq!(Pagination::new(0, 0).limit, 1);
        assert_eq!(Pagination::new(10_000, 0).limit, 500);
    }

    #[test]
    fn keeps_offset() {
        let p = Pagination::from(PaginationParams {
            limit: Some(10),
            offset: Some(30),
        });
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 30);
    }
}
