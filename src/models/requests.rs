//! Request DTOs for the search gateway API
//!
//! Query strings use the same names as the upstream storefront API.

use serde::Deserialize;

use crate::search::SearchParams;

/// Query string of `GET /api/products/search`
///
/// `colors` and `sizes` are comma-separated lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub colors: Option<String>,
    #[serde(default)]
    pub sizes: Option<String>,
    #[serde(default)]
    pub min_discount: Option<u32>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl SearchQuery {
    /// Converts into search params. Blank text fields count as absent.
    pub fn into_params(self) -> SearchParams {
        SearchParams {
            query: non_blank(self.q),
            category: non_blank(self.category),
            min_price: self.min_price,
            max_price: self.max_price,
            colors: split_list(self.colors.as_deref()),
            sizes: split_list(self.sizes.as_deref()),
            min_discount: self.min_discount,
            sort_by: non_blank(self.sort),
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Query string of `GET /api/products/autocomplete`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutocompleteQuery {
    #[serde(default)]
    pub q: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
