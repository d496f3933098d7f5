use serde::{Deserialize, Serialize};

use crate::config;

/// Page/limit query parameters shared by every list endpoint.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    /// Resolve against configured defaults. Page is 1-based; limit is
    /// clamped to the configured maximum.
    pub fn resolve(self) -> (u32, u32) {
        let cfg = &config::config().api;
        let page = self.page.unwrap_or(1).max(1);
        let limit = self
            .limit
            .unwrap_or(cfg.default_page_size)
            .clamp(1, cfg.max_page_size);
        (page, limit)
    }

    pub fn offset(self) -> i64 {
        let (page, limit) = self.resolve();
        i64::from(page - 1) * i64::from(limit)
    }

    pub fn limit(self) -> i64 {
        i64::from(self.resolve().1)
    }
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, params: PageParams, total: i64) -> Self {
        let (page, limit) = params.resolve();
        Self { items, page, limit, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let p = PageParams { page: None, limit: None };
        let (page, limit) = p.resolve();
        assert_eq!(page, 1);
        assert_eq!(limit, config::config().api.default_page_size);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn limit_is_clamped() {
        let p = PageParams { page: Some(3), limit: Some(10_000) };
        let (page, limit) = p.resolve();
        assert_eq!(page, 3);
        assert_eq!(limit, config::config().api.max_page_size);
        assert_eq!(p.offset(), i64::from(limit) * 2);
    }

    #[test]
    fn page_zero_is_page_one() {
        let p = PageParams { page: Some(0), limit: Some(5) };
        assert_eq!(p.resolve().0, 1);
        assert_eq!(p.offset(), 0);
    }
}
