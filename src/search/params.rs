//! Search Parameters
//!
//! Structured search input plus the canonical cache key derived from it.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

/// Largest page size the upstream accepts
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Key used when no field is set
pub const ALL_KEY: &str = "all";

// == Search Params ==
/// Product search filters. Treated as an immutable value once built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_discount: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    // == Builders ==
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors = colors.into_iter().map(Into::into).collect();
        self
    }

    pub fn sizes<I, S>(mut self, sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sizes = sizes.into_iter().map(Into::into).collect();
        self
    }

    pub fn min_discount(mut self, percent: u32) -> Self {
        self.min_discount = Some(percent);
        self
    }

    pub fn sort_by(mut self, sort: impl Into<String>) -> Self {
        self.sort_by = Some(sort.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    // == Validate ==
    /// Rejects parameter combinations the upstream would refuse.
    pub fn validate(&self) -> Result<()> {
        for (name, price) in [("min_price", self.min_price), ("max_price", self.max_price)] {
            if let Some(price) = price {
                if !price.is_finite() || price < 0.0 {
                    return Err(SearchError::InvalidRequest(format!(
                        "{} must be a non-negative number",
                        name
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(SearchError::InvalidRequest(
                    "min_price cannot exceed max_price".to_string(),
                ));
            }
        }
        if matches!(self.min_discount, Some(d) if d > 100) {
            return Err(SearchError::InvalidRequest(
                "min_discount must be between 0 and 100".to_string(),
            ));
        }
        if self.page == Some(0) {
            return Err(SearchError::InvalidRequest(
                "page starts at 1".to_string(),
            ));
        }
        if matches!(self.limit, Some(l) if l == 0 || l > MAX_PAGE_LIMIT) {
            return Err(SearchError::InvalidRequest(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }
        Ok(())
    }

    // == Cache Key ==
    /// Canonical key for this search.
    ///
    /// Fields appear in a fixed order with a short prefix each. Values are
    /// escaped, so text can never spell out a separator or another field.
    /// Color and size lists are sorted and deduplicated, so their input order
    /// never matters.
    pub fn cache_key(&self) -> String {
        let parts: Vec<String> = self
            .normalized_fields()
            .into_iter()
            .map(|(_, prefix, values)| {
                let values: Vec<String> = values.iter().map(|v| escape_key_part(v)).collect();
                format!("{}:{}", prefix, values.join(","))
            })
            .collect();

        if parts.is_empty() {
            ALL_KEY.to_string()
        } else {
            parts.join("|")
        }
    }

    // == Query Pairs ==
    /// Upstream query string parameters, in wire names.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.normalized_fields()
            .into_iter()
            .map(|(wire, _, values)| (wire, values.join(",")))
            .collect()
    }

    /// Present fields as (wire name, key prefix, values), in key order.
    ///
    /// Text is trimmed and blank text counts as absent, so the key and the
    /// upstream request always describe the same search.
    fn normalized_fields(&self) -> Vec<(&'static str, &'static str, Vec<String>)> {
        let mut fields = Vec::new();
        let mut push = |wire: &'static str, prefix: &'static str, values: Vec<String>| {
            if !values.is_empty() {
                fields.push((wire, prefix, values));
            }
        };

        push("q", "q", text(&self.query));
        push("category", "cat", text(&self.category));
        push("min_price", "min", price(self.min_price));
        push("max_price", "max", price(self.max_price));
        push("colors", "col", list(&self.colors));
        push("sizes", "sz", list(&self.sizes));
        push("min_discount", "disc", number(self.min_discount));
        push("sort", "sort", text(&self.sort_by));
        push("page", "p", number(self.page));
        push("limit", "l", number(self.limit));

        fields
    }
}

fn text(value: &Option<String>) -> Vec<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .into_iter()
        .collect()
}

fn price(value: Option<f64>) -> Vec<String> {
    // Adding 0.0 turns -0.0 into 0.0
    value.map(|p| (p + 0.0).to_string()).into_iter().collect()
}

fn number(value: Option<u32>) -> Vec<String> {
    value.map(|n| n.to_string()).into_iter().collect()
}

/// Trimmed, sorted, deduplicated filter list without blank items.
fn list(values: &[String]) -> Vec<String> {
    let mut items: Vec<String> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    items.sort_unstable();
    items.dedup();
    items
}

/// Backslash-escapes the characters the key uses as delimiters.
fn escape_key_part(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '|' | ',') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
