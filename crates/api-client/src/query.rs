//! Query string builder for list endpoints

use chrono::NaiveDate;
use std::fmt;
use url::form_urlencoded;

/// Sort direction accepted by list endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Ascending
    #[default]
    Asc,
    /// Descending
    Desc,
}

impl SortDirection {
    fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Ordered set of query parameters
///
/// ```
/// use mes_api_client::QueryParams;
///
/// let query = QueryParams::new().page(2).page_size(50).param("status", "open now");
/// assert_eq!(query.to_query_string(), "page=2&pageSize=50&status=open+now");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create an empty parameter set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an arbitrary parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((key.into(), value.to_string()));
        self
    }

    /// Add a parameter only when `value` is present
    #[must_use]
    pub fn param_opt(self, key: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// 1-based page number
    #[must_use]
    pub fn page(self, page: u32) -> Self {
        self.param("page", page)
    }

    /// Items per page
    #[must_use]
    pub fn page_size(self, size: u32) -> Self {
        self.param("pageSize", size)
    }

    /// Sort by `field`
    #[must_use]
    pub fn sort(self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.param("sortBy", field.into())
            .param("sortDirection", direction.as_str())
    }

    /// Free-text search term
    #[must_use]
    pub fn search(self, term: impl Into<String>) -> Self {
        self.param("searchTerm", term.into())
    }

    /// Date parameter formatted as `YYYY-MM-DD`
    #[must_use]
    pub fn date(self, key: impl Into<String>, date: NaiveDate) -> Self {
        self.param(key, date.format("%Y-%m-%d"))
    }

    /// Inclusive date range as `fromDate` / `toDate`
    #[must_use]
    pub fn date_range(self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        let query = match from {
            Some(from) => self.date("fromDate", from),
            None => self,
        };
        match to {
            Some(to) => query.date("toDate", to),
            None => query,
        }
    }

    /// No parameters set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Percent-encoded query string, without the leading `?`
    #[must_use]
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.pairs)
            .finish()
    }

    /// Append the query to `path`
    #[must_use]
    pub fn apply_to(&self, path: &str) -> String {
        if self.is_empty() {
            return path.to_string();
        }
        let separator = if path.contains('?') { '&' } else { '?' };
        format!("{path}{separator}{}", self.to_query_string())
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}
