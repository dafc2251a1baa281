//! Offset pagination metadata for list responses.

use serde::{Deserialize, Serialize};

/// Page size used when a caller asks for fewer than one item per page.
pub const DEFAULT_PER_PAGE: i64 = 10;

/// Page metadata computed from a total count and the requested window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub count: i64,
    pub next_page: Option<i64>,
    pub num_pages: i64,
    pub page: i64,
    pub per: i64,
    pub prev_page: Option<i64>,
}

impl Pagination {
    /// Compute metadata for `count` rows viewed `per` at a time, positioned at `page`.
    ///
    /// There is always at least one page, even when `count` is zero.
    pub fn new(count: i64, page: i64, per: i64) -> Self {
        let per = if per < 1 { DEFAULT_PER_PAGE } else { per };

        let num_pages = if count <= 0 {
            1
        } else {
            count / per + i64::from(count % per != 0)
        };

        let prev_page = (page > 1).then(|| page - 1);
        let next_page = (page < num_pages).then(|| page + 1);

        Self {
            count,
            next_page,
            num_pages,
            page,
            per,
            prev_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_result_still_has_one_page() {
        let pagination = Pagination::new(0, 1, 10);
        assert_eq!(pagination.num_pages, 1);
        assert_eq!(pagination.prev_page, None);
        assert_eq!(pagination.next_page, None);
    }

    #[test]
    fn first_page_links_forward_only() {
        let pagination = Pagination::new(25, 1, 10);
        assert_eq!(pagination.num_pages, 3);
        assert_eq!(pagination.next_page, Some(2));
        assert_eq!(pagination.prev_page, None);
    }

    #[test]
    fn last_page_links_backward_only() {
        let pagination = Pagination::new(25, 3, 10);
        assert_eq!(pagination.next_page, None);
        assert_eq!(pagination.prev_page, Some(2));
    }

    #[test]
    fn middle_page_links_both_ways() {
        let pagination = Pagination::new(25, 2, 10);
        assert_eq!(pagination.prev_page, Some(1));
        assert_eq!(pagination.next_page, Some(3));
    }

    #[test]
    fn exact_multiple_does_not_add_a_page() {
        let pagination = Pagination::new(20, 1, 10);
        assert_eq!(pagination.num_pages, 2);
    }

    #[test]
    fn non_positive_per_falls_back_to_default() {
        let zero = Pagination::new(25, 1, 0);
        assert_eq!(zero.per, DEFAULT_PER_PAGE);
        assert_eq!(zero.num_pages, 3);

        let negative = Pagination::new(25, 1, -4);
        assert_eq!(negative.per, DEFAULT_PER_PAGE);
    }

    #[test]
    fn page_beyond_range_only_links_backward() {
        let pagination = Pagination::new(5, 9, 10);
        assert_eq!(pagination.num_pages, 1);
        assert_eq!(pagination.next_page, None);
        assert_eq!(pagination.prev_page, Some(8));
    }

    #[test]
    fn num_pages_matches_ceiling_division() {
        for count in 0..200_i64 {
            for per in 1..25_i64 {
                let expected = std::cmp::max(1, (count + per - 1) / per);
                let pagination = Pagination::new(count, 1, per);
                assert_eq!(
                    pagination.num_pages, expected,
                    "count={count} per={per}"
                );
            }
        }
    }

    #[test]
    fn serializes_missing_links_as_null() {
        let json = serde_json::to_value(Pagination::new(0, 1, 20)).expect("serializes");
        assert!(json["next_page"].is_null());
        assert!(json["prev_page"].is_null());
        assert_eq!(json["num_pages"], 1);
        assert_eq!(json["per"], 20);
    }
}
