//! Page and page-size normalization
//!
//! Clients use 1-indexed pages; the indexer uses 0-indexed pages. Anything a
//! client sends is clamped into a valid window rather than rejected.

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PagePolicy {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for PagePolicy {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// A normalized page request: `page_number >= 1`, `1 <= page_size <= max`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub page_number: u64,
    pub page_size: u32,
}

impl PagePolicy {
    /// Build a policy, keeping the default inside `1..=max`
    pub fn new(default_page_size: u32, max_page_size: u32) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            default_page_size: default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    pub fn window(&self, page: Option<&str>, page_size: Option<&str>) -> PageWindow {
        let page_number = match parse_int(page) {
            Some(n) if n >= 1 => n as u64,
            _ => 1,
        };

        let page_size = match parse_int(page_size) {
            Some(n) if n >= 1 => n.min(self.max_page_size as i64) as u32,
            _ => self.default_page_size,
        };

        PageWindow {
            page_number,
            page_size,
        }
    }
}

impl PageWindow {
    /// 0-indexed page number for the indexer
    pub fn indexer_page(&self) -> u64 {
        self.page_number.saturating_sub(1)
    }
}

/// Inclusive block-height range for a listing page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRange {
    pub start: u64,
    pub end: u64,
}

impl BlockRange {
    /// Heights for `window` counted down from `tip_height`
    ///
    /// The lower bound is floored at 1, so genesis never appears. Returns
    /// `None` once the page runs past the start of the chain.
    pub fn for_window(tip_height: u64, window: PageWindow) -> Option<Self> {
        let tip = tip_height as i128;
        let size = window.page_size as i128;
        let page = window.page_number as i128;

        let start = tip - size * page + 1;
        let end = start + size - 1;
        if end < 1 {
            return None;
        }

        Some(Self {
            start: start.max(1) as u64,
            end: end as u64,
        })
    }
}

fn parse_int(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> PagePolicy {
        PagePolicy::default()
    }

    #[test]
    fn test_absent_and_garbage_use_defaults() {
        let expected = PageWindow {
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
        };
        assert_eq!(policy().window(None, None), expected);
        assert_eq!(policy().window(Some("abc"), Some("lots")), expected);
        assert_eq!(policy().window(Some(""), Some("1.5")), expected);
    }

    #[test]
    fn test_non_positive_page_size_uses_default() {
        assert_eq!(policy().window(None, Some("0")).page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(policy().window(None, Some("-7")).page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_page_size_clamped_to_max() {
        assert_eq!(policy().window(None, Some("41")).page_size, MAX_PAGE_SIZE);
        assert_eq!(policy().window(None, Some("100000")).page_size, MAX_PAGE_SIZE);
        assert_eq!(policy().window(None, Some("40")).page_size, 40);
        assert_eq!(policy().window(None, Some("1")).page_size, 1);
    }

    #[test]
    fn test_indexer_page_never_negative() {
        for raw in ["0", "-1", "-9999", "1"] {
            assert_eq!(policy().window(Some(raw), None).indexer_page(), 0);
        }
        assert_eq!(policy().window(Some("3"), None).indexer_page(), 2);
    }

    #[test]
    fn test_custom_policy_keeps_default_within_max() {
        let p = PagePolicy::new(100, 25);
        assert_eq!(p.default_page_size, 25);
        assert_eq!(p.window(None, None).page_size, 25);

        let p = PagePolicy::new(5, 0);
        assert_eq!(p.max_page_size, 1);
    }

    #[test]
    fn test_block_range_first_page() {
        let window = PageWindow {
            page_number: 1,
            page_size: 10,
        };
        assert_eq!(
            BlockRange::for_window(1000, window),
            Some(BlockRange { start: 991, end: 1000 })
        );
    }

    #[test]
    fn test_block_range_floors_at_one() {
        let window = PageWindow {
            page_number: 1,
            page_size: 40,
        };
        assert_eq!(
            BlockRange::for_window(15, window),
            Some(BlockRange { start: 1, end: 15 })
        );
    }

    #[test]
    fn test_block_range_past_genesis_is_none() {
        let window = PageWindow {
            page_number: 5,
            page_size: 10,
        };
        assert_eq!(BlockRange::for_window(20, window), None);
        assert_eq!(
            BlockRange::for_window(
                0,
                PageWindow {
                    page_number: 1,
                    page_size: 10
                }
            ),
            None
        );
    }
}
