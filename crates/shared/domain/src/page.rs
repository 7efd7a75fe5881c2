//! Pagination types for list operations.

use serde::Serialize;
use serde_json::Value;

use crate::constants::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, FETCH_ALL};
use crate::error::{DomainError, DomainResult};

const NOT_INTEGER: &str = "The value of the page and per_page values must be integers";
const TOO_LARGE: &str = "The page and per_page values are out of range";

/// Page size: a positive limit, or every matching record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerPage {
    Limited(u64),
    All,
}

impl PerPage {
    /// Value echoed back to callers (`-1` for [`PerPage::All`])
    pub fn as_i64(&self) -> i64 {
        match self {
            // Limited values come from an i64, so this cannot truncate
            PerPage::Limited(n) => *n as i64,
            PerPage::All => FETCH_ALL,
        }
    }
}

/// Validated pagination request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed page number
    pub page: u64,
    pub per_page: PerPage,
}

impl PageRequest {
    /// Validate integer page parameters.
    ///
    /// `page` must be at least 1; `per_page` must be positive or `-1`.
    pub fn new(page: i64, per_page: i64) -> DomainResult<Self> {
        if page < 1 {
            return Err(DomainError::invalid_argument("The page value must be at least 1"));
        }

        let per_page = match per_page {
            FETCH_ALL => PerPage::All,
            n if n > 0 => PerPage::Limited(n as u64),
            _ => {
                return Err(DomainError::invalid_argument(
                    "The per_page value must be a positive integer or -1",
                ))
            }
        };

        let request = Self {
            page: page as u64,
            per_page,
        };

        // Reject pages whose offset cannot be represented
        if let PerPage::Limited(n) = per_page {
            request
                .page
                .saturating_sub(1)
                .checked_mul(n)
                .filter(|offset| *offset <= i64::MAX as u64)
                .ok_or_else(|| DomainError::invalid_argument("The page value is too large"))?;
        }

        Ok(request)
    }

    /// Validate untyped page parameters as received from a caller.
    ///
    /// Only JSON integers are accepted: numeric strings, floats, arrays,
    /// objects, booleans and null are rejected.
    pub fn from_values(page: &Value, per_page: &Value) -> DomainResult<Self> {
        Self::new(as_integer(page)?, as_integer(per_page)?)
    }

    /// Number of records to skip: `(page - 1) * per_page`
    pub fn offset(&self) -> u64 {
        match self.per_page {
            PerPage::Limited(n) => self.page.saturating_sub(1).saturating_mul(n),
            PerPage::All => 0,
        }
    }

    /// Maximum number of records to return, `None` when unbounded
    pub fn limit(&self) -> Option<u64> {
        match self.per_page {
            PerPage::Limited(n) => Some(n),
            PerPage::All => None,
        }
    }

    /// `ceil(total / per_page)`; a single page when fetching everything
    pub fn total_pages(&self, total: u64) -> u64 {
        match self.per_page {
            PerPage::Limited(n) => total.div_ceil(n),
            PerPage::All => u64::from(total > 0),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE_NUMBER as u64,
            per_page: PerPage::Limited(DEFAULT_PAGE_SIZE as u64),
        }
    }
}

fn as_integer(value: &Value) -> DomainResult<i64> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(n) => Ok(n),
            None if n.is_u64() => Err(DomainError::invalid_argument(TOO_LARGE)),
            None => Err(DomainError::invalid_argument(NOT_INTEGER)),
        },
        _ => Err(DomainError::invalid_argument(NOT_INTEGER)),
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResult<T> {
    pub page: u64,
    /// Requested page size, `-1` when pagination was disabled
    pub per_page: i64,
    pub total: u64,
    pub total_pages: u64,
    pub models: Vec<T>,
}

impl<T> PageResult<T> {
    /// Create a page result for the given request and total match count
    pub fn new(models: Vec<T>, request: &PageRequest, total: u64) -> Self {
        Self {
            page: request.page,
            per_page: request.per_page.as_i64(),
            total,
            total_pages: request.total_pages(total),
            models,
        }
    }

    /// Convert the models while keeping the page metadata
    pub fn map<U, F>(self, f: F) -> PageResult<U>
    where
        F: FnMut(T) -> U,
    {
        PageResult {
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
            models: self.models.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_offset_and_total_pages() {
        let cases = [
            // (page, per_page, total, offset, total_pages)
            (1, 20, 0, 0, 0),
            (1, 20, 20, 0, 1),
            (2, 20, 21, 20, 2),
            (3, 10, 95, 20, 10),
            (5, 7, 100, 28, 15),
        ];

        for (page, per_page, total, offset, total_pages) in cases {
            let request = PageRequest::new(page, per_page).unwrap();
            assert_eq!(request.offset(), offset, "offset for page {page}");
            assert_eq!(request.total_pages(total), total_pages, "pages for total {total}");
            assert_eq!(request.limit(), Some(per_page as u64));
        }
    }

    #[test]
    fn test_fetch_all() {
        let request = PageRequest::new(1, -1).unwrap();
        assert_eq!(request.per_page, PerPage::All);
        assert_eq!(request.limit(), None);
        assert_eq!(request.offset(), 0);
        assert_eq!(request.total_pages(0), 0);
        assert_eq!(request.total_pages(57), 1);
        assert_eq!(request.per_page.as_i64(), -1);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(PageRequest::new(0, 20).is_err());
        assert!(PageRequest::new(-3, 20).is_err());
        assert!(PageRequest::new(1, 0).is_err());
        assert!(PageRequest::new(1, -2).is_err());
        assert!(PageRequest::new(i64::MAX, 20).is_err());
    }

    #[test]
    fn test_from_values_rejects_non_integers() {
        let invalid = [
            (json!("1"), json!(20)),
            (json!(1), json!("20")),
            (json!([]), json!(20)),
            (json!(1), json!({})),
            (json!(1.5), json!(20)),
            (json!(1), json!(20.0)),
            (json!(null), json!(20)),
            (json!(true), json!(20)),
        ];

        for (page, per_page) in invalid {
            let result = PageRequest::from_values(&page, &per_page);
            assert!(
                matches!(result, Err(DomainError::InvalidArgument(_))),
                "{page} / {per_page} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_values_reports_oversized_integers_as_out_of_range() {
        let result = PageRequest::from_values(&json!(u64::MAX), &json!(20));
        assert!(matches!(
            result,
            Err(DomainError::InvalidArgument(ref message)) if message == TOO_LARGE
        ));
    }

    #[test]
    fn test_from_values_accepts_integers() {
        let request = PageRequest::from_values(&json!(2), &json!(15)).unwrap();
        assert_eq!(request.page, 2);
        assert_eq!(request.per_page, PerPage::Limited(15));
    }

    #[test]
    fn test_page_result_serializes_contract_fields() {
        let request = PageRequest::new(2, 10).unwrap();
        let page = PageResult::new(vec![1, 2, 3], &request, 13);

        assert_eq!(
            serde_json::to_value(&page).unwrap(),
            json!({"page": 2, "per_page": 10, "total": 13, "total_pages": 2, "models": [1, 2, 3]})
        );
        assert_eq!(page.map(|n| n * 2).models, vec![2, 4, 6]);
    }
}
