use serde::{Deserialize, Serialize};

use crate::services::catalog::Page;

pub(crate) const MAX_LIMIT: i64 = 500;

pub(crate) const fn default_limit() -> i64 {
    100
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageQuery {
    #[serde(default)]
    pub(crate) skip: i64,
    #[serde(default = "default_limit")]
    pub(crate) limit: i64,
}

impl PageQuery {
    /// Clamps the window to sane bounds.
    pub(crate) fn page(&self) -> Page {
        Page { skip: self.skip.max(0), limit: self.limit.clamp(1, MAX_LIMIT) }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct PaginatedResponse<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: i64,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}
