//! Offset/limit windows for list endpoints

/// Maximum rows per list call
const MAX_LIMIT: u32 = 500;

/// Default rows per list call
const DEFAULT_LIMIT: u32 = 100;

/// Bounded offset/limit window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Listing {
    pub offset: u32,
    pub limit: u32,
}

impl Listing {
    /// Create a window, clamping limit to 1..=500.
    pub fn new(offset: u32, limit: u32) -> Self {
        Self {
            offset,
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Build from optional query parameters.
    pub fn from_params(offset: Option<u32>, limit: Option<u32>) -> Self {
        Self::new(offset.unwrap_or(0), limit.unwrap_or(DEFAULT_LIMIT))
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        i64::from(self.offset)
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }
}

impl Default for Listing {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}
