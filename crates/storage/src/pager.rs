/// Cross-resource pagination (C6). Pure offset arithmetic, split out from the
/// I/O step so it can be tested without a live database — grounded in
/// `original_source/karps/database/database.py`'s `run_paged_searches`, which
/// is itself decomposable into a pure offset step and an I/O step.
use crate::error::{KarpsError, Result};

/// What to fetch from one resource's data query, or `None` if this resource
/// contributes no rows to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceWindow {
    pub limit: i64,
    pub offset: i64,
}

/// Computes, for each resource in `per_resource_count` (already in
/// locale-aware `resource_id` order), the `(limit, offset)` window of rows it
/// contributes to the page `[from, from+size)`.
///
/// Only the first contributing resource gets a nonzero local offset; every
/// resource after it starts at 0, since the global `from` cursor has already
/// been consumed. Returns one entry per input resource, `None` where that
/// resource contributes nothing.
pub fn plan_pagination(per_resource_count: &[i64], from: i64, size: i64) -> Result<Vec<Option<ResourceWindow>>> {
    let mut cumulative: i64 = 0;
    let mut size_remaining = size;
    let mut from_cursor = from;
    let mut contributed = false;
    let mut windows = Vec::with_capacity(per_resource_count.len());

    for &count in per_resource_count {
        cumulative += count;
        let k = (cumulative - from_cursor).min(count).min(0.max(size_remaining));
        if k > 0 {
            let offset = if contributed { 0 } else { count - (cumulative - from_cursor) };
            windows.push(Some(ResourceWindow { limit: k, offset }));
            size_remaining -= k;
            from_cursor = 0;
            contributed = true;
        } else {
            windows.push(None);
        }
    }

    if !contributed && from > per_resource_count.iter().sum() {
        return Err(KarpsError::from_missing_from(from));
    }
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_s4_stitches_two_resources() {
        // S4: resources of size 7 and 5, from=5, size=10.
        // total - from = 12 - 5 = 7, so 7 rows are expected overall:
        // the last 2 of resource A (offset 5, limit 2), then all 5 of B.
        let windows = plan_pagination(&[7, 5], 5, 10).unwrap();
        assert_eq!(windows[0], Some(ResourceWindow { limit: 2, offset: 5 }));
        assert_eq!(windows[1], Some(ResourceWindow { limit: 5, offset: 0 }));
        let total: i64 = windows.iter().flatten().map(|w| w.limit).sum();
        assert_eq!(total, 7);
    }

    #[test]
    fn test_first_page_no_offset() {
        let windows = plan_pagination(&[7, 5], 0, 3).unwrap();
        assert_eq!(windows[0], Some(ResourceWindow { limit: 3, offset: 0 }));
        assert_eq!(windows[1], None);
    }

    #[test]
    fn test_size_stops_at_boundary() {
        let windows = plan_pagination(&[3, 3, 3], 2, 4).unwrap();
        // resource 0 contributes its last row, resource 1 contributes 3, done
        assert_eq!(windows[0], Some(ResourceWindow { limit: 1, offset: 2 }));
        assert_eq!(windows[1], Some(ResourceWindow { limit: 3, offset: 0 }));
        assert_eq!(windows[2], None);
    }

    #[test]
    fn test_from_past_end_is_user_error() {
        let err = plan_pagination(&[3, 3], 10, 5).unwrap_err();
        assert!(matches!(err, KarpsError::User(_)));
    }

    #[test]
    fn test_empty_resources() {
        let windows = plan_pagination(&[], 0, 10).unwrap();
        assert!(windows.is_empty());
    }
}
