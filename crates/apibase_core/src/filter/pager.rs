//! Page/limit pagination fragments.
//!
//! # Invariants
//! - `limit == 0` emits no pagination clause.
//! - `page == 0` emits no offset.

/// Zero-based page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pager {
    pub page: u32,
    pub limit: u32,
}

impl Pager {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.limit)
    }

    pub fn is_noop(&self) -> bool {
        self.limit == 0
    }

    /// Renders the pagination clause. Limit/offset are inlined, so the clause
    /// has no placeholders and no bound values.
    pub fn condition(&self) -> String {
        if self.is_noop() {
            return String::new();
        }
        if self.page == 0 {
            return format!("LIMIT {}", self.limit);
        }
        format!("LIMIT {} OFFSET {}", self.limit, self.offset())
    }
}

#[cfg(test)]
mod tests {
    use super::Pager;

    #[test]
    fn first_page_has_no_offset() {
        assert_eq!(Pager::new(0, 10).condition(), "LIMIT 10");
    }

    #[test]
    fn later_pages_offset_by_page_times_limit() {
        let pager = Pager::new(2, 10);
        assert_eq!(pager.condition(), "LIMIT 10 OFFSET 20");
        assert_eq!(pager.offset(), 20);
    }

    #[test]
    fn zero_limit_emits_nothing() {
        assert_eq!(Pager::new(3, 0).condition(), "");
        assert!(Pager::new(3, 0).is_noop());
    }
}
