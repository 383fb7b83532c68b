//! List filters, pagination and result pages.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{CatalogError, CatalogResult};
use super::scope::ContentType;

/// Inclusive age range used by the overlap predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeRange {
    pub min: i64,
    pub max: i64,
}

impl AgeRange {
    pub fn new(min: i64, max: i64) -> CatalogResult<Self> {
        if min < 0 || max < 0 {
            return Err(CatalogError::validation("age must not be negative"));
        }
        if min > max {
            return Err(CatalogError::validation(format!(
                "age range {}-{} is inverted",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    /// A single age is the degenerate range `[age, age]`
    pub fn single(age: i64) -> CatalogResult<Self> {
        Self::new(age, age)
    }
}

impl FromStr for AgeRange {
    type Err = CatalogError;

    /// Accepts `"4"` or `"3-6"`
    fn from_str(s: &str) -> CatalogResult<Self> {
        let parse = |part: &str| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| CatalogError::validation(format!("invalid age: {}", s)))
        };

        match s.trim().split_once('-') {
            Some((min, max)) => Self::new(parse(min)?, parse(max)?),
            None => Self::single(parse(s)?),
        }
    }
}

/// Validated filter set for a list query.
///
/// Filters that do not apply to the listed kind are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub content_type: Option<ContentType>,
    pub age: Option<AgeRange>,
    pub category: Option<i64>,
    pub age_group: Option<i64>,
    pub search: Option<String>,
    pub active_only: bool,
}

impl ListFilter {
    pub fn with_type(mut self, content_type: ContentType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    pub fn with_age(mut self, age: AgeRange) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_category(mut self, category_id: i64) -> Self {
        self.category = Some(category_id);
        self
    }

    pub fn with_age_group(mut self, age_group_id: i64) -> Self {
        self.age_group = Some(age_group_id);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn active_only(mut self) -> Self {
        self.active_only = true;
        self
    }

    /// Lowercased search needle, or `None` when blank
    pub fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// Bounds applied to caller-supplied pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

/// Raw pagination as supplied by a caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Pagination after clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u64,
}

impl Pagination {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    /// Clamp `limit` to `[1, max_limit]` and `offset` to `>= 0`
    pub fn resolve(self, limits: QueryLimits) -> PageWindow {
        let max_limit = limits.max_limit.max(1);
        let limit = self
            .limit
            .unwrap_or(i64::from(limits.default_limit))
            .clamp(1, i64::from(max_limit));
        let offset = self.offset.unwrap_or(0).max(0);

        PageWindow {
            limit: limit as u32,
            offset: offset as u64,
        }
    }
}

/// One page of list results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,

    /// Count of all rows matching the filter, not just this page
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_range_parse() {
        assert_eq!("4".parse::<AgeRange>().unwrap(), AgeRange { min: 4, max: 4 });
        assert_eq!("3-6".parse::<AgeRange>().unwrap(), AgeRange { min: 3, max: 6 });
        assert_eq!(" 3 - 6 ".parse::<AgeRange>().unwrap(), AgeRange { min: 3, max: 6 });
        assert!("6-3".parse::<AgeRange>().is_err());
        assert!("four".parse::<AgeRange>().is_err());
        assert!("".parse::<AgeRange>().is_err());
    }

    #[test]
    fn test_search_needle_blank_is_none() {
        assert_eq!(ListFilter::default().with_search("   ").search_needle(), None);
        assert_eq!(
            ListFilter::default().with_search("  Lion ").search_needle(),
            Some("lion".to_string())
        );
    }

    #[test]
    fn test_pagination_clamping() {
        let limits = QueryLimits::default();

        let window = Pagination::default().resolve(limits);
        assert_eq!(window, PageWindow { limit: 20, offset: 0 });

        let window = Pagination::new(0, -5).resolve(limits);
        assert_eq!(window, PageWindow { limit: 1, offset: 0 });

        let window = Pagination::new(5_000, 40).resolve(limits);
        assert_eq!(window, PageWindow { limit: 100, offset: 40 });
    }
}
