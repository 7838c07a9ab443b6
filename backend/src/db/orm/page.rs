//! Page window arithmetic and the paginated result type

use serde::Serialize;

use super::error::QueryError;

/// Offset/limit window derived from a 1-based page index and a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    page_index: i64,
    page_size: i64,
}

impl PageWindow {
    /// Parse the raw page index and page size text received from a request.
    ///
    /// The page size must be positive. The page index is not range-checked:
    /// an index of zero or below yields a non-positive offset.
    pub fn parse(page_index: &str, page_size: &str) -> Result<Self, QueryError> {
        let index = page_index.trim().parse::<i64>().map_err(|e| {
            QueryError::invalid_page("pageIndex", page_index, e.to_string())
        })?;
        let size = page_size
            .trim()
            .parse::<i64>()
            .map_err(|e| QueryError::invalid_page("pageSize", page_size, e.to_string()))?;

        if size <= 0 {
            return Err(QueryError::invalid_page(
                "pageSize",
                page_size,
                "page size must be greater than zero",
            ));
        }

        let window = Self {
            page_index: index,
            page_size: size,
        };
        // reject windows whose offset cannot be represented
        window.checked_offset().ok_or_else(|| {
            QueryError::invalid_page("pageIndex", page_index, "offset overflows")
        })?;
        Ok(window)
    }

    fn checked_offset(&self) -> Option<i64> {
        self.page_index
            .checked_sub(1)
            .and_then(|i| i.checked_mul(self.page_size))
    }

    /// `(page_index - 1) * page_size`
    pub fn offset(&self) -> i64 {
        self.checked_offset().unwrap_or(i64::MIN)
    }

    pub fn page_index(&self) -> i64 {
        self.page_index
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    /// Number of pages needed to hold `total_count` rows
    pub fn total_pages(&self, total_count: i64) -> i64 {
        let total = total_count.max(0);
        total / self.page_size + i64::from(total % self.page_size != 0)
    }
}

/// One page of entities plus totals for the whole filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Pagination<T> {
    pub total_count: i64,
    pub total_page: i64,
    pub data: Vec<T>,
}

impl<T> Pagination<T> {
    pub fn new(window: &PageWindow, total_count: i64, data: Vec<T>) -> Self {
        Self {
            total_count,
            total_page: window.total_pages(total_count),
            data,
        }
    }

    /// Transform every entity, keeping the totals.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Pagination<U>, E> {
        let data = self.data.into_iter().map(f).collect::<Result<Vec<_>, _>>()?;
        Ok(Pagination {
            total_count: self.total_count,
            total_page: self.total_page,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_offset_and_limit() {
        let window = PageWindow::parse("3", "20").unwrap();
        assert_eq!(window.offset(), 40);
        assert_eq!(window.limit(), 20);
    }

    #[test]
    fn test_total_pages_ceiling() {
        let window = PageWindow::parse("1", "20").unwrap();
        assert_eq!(window.total_pages(101), 6);
        assert_eq!(window.total_pages(100), 5);
        assert_eq!(window.total_pages(1), 1);
        assert_eq!(window.total_pages(0), 0);
    }

    #[test]
    fn test_total_pages_matches_float_ceiling() {
        for size in 1..=25_i64 {
            let window = PageWindow { page_index: 1, page_size: size };
            for total in 0..=300_i64 {
                let expected = (total as f64 / size as f64).ceil() as i64;
                assert_eq!(window.total_pages(total), expected, "total={total} size={size}");
            }
        }
    }

    #[test]
    fn test_total_pages_near_max() {
        let window = PageWindow { page_index: 1, page_size: 2 };
        assert_eq!(window.total_pages(i64::MAX), i64::MAX / 2 + 1);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert_matches!(
            PageWindow::parse("1", "0"),
            Err(QueryError::InvalidPageParam { param: "pageSize", .. })
        );
        assert_matches!(
            PageWindow::parse("1", "-5"),
            Err(QueryError::InvalidPageParam { param: "pageSize", .. })
        );
    }

    #[test]
    fn test_non_integer_rejected() {
        assert_matches!(
            PageWindow::parse("first", "10"),
            Err(QueryError::InvalidPageParam { param: "pageIndex", .. })
        );
        assert_matches!(
            PageWindow::parse("1", "10.5"),
            Err(QueryError::InvalidPageParam { param: "pageSize", .. })
        );
        assert_matches!(
            PageWindow::parse("", "10"),
            Err(QueryError::InvalidPageParam { param: "pageIndex", .. })
        );
    }

    #[test]
    fn test_page_index_is_not_clamped() {
        assert_eq!(PageWindow::parse("0", "10").unwrap().offset(), -10);
        assert_eq!(PageWindow::parse("-1", "10").unwrap().offset(), -20);
    }

    #[test]
    fn test_offset_overflow_rejected() {
        let huge = i64::MAX.to_string();
        assert_matches!(
            PageWindow::parse(&huge, "2"),
            Err(QueryError::InvalidPageParam { param: "pageIndex", .. })
        );
    }

    #[test]
    fn test_whitespace_tolerated() {
        let window = PageWindow::parse(" 2 ", "10\n").unwrap();
        assert_eq!(window.offset(), 10);
    }

    #[test]
    fn test_pagination_serializes_pascal_case() {
        let window = PageWindow::parse("1", "2").unwrap();
        let page = Pagination::new(&window, 3, vec!["a", "b"]);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["TotalCount"], 3);
        assert_eq!(json["TotalPage"], 2);
        assert_eq!(json["Data"][1], "b");
    }
}
