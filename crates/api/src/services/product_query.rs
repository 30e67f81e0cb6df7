//! Translation of catalogue query-string filters into SQL.
//!
//! Only whitelisted column names are ever interpolated; every user-supplied
//! value travels as a bind parameter. Values compared against free-text
//! columns are HTML-escaped the same way they were on write.

use serde::Deserialize;

use fk_designers_core::PageRequest;

use crate::validation::escape_html;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 50;

const SORT_FIELDS: &[&str] = &["name", "price", "created_at", "updated_at"];

/// Raw `GET /api/products` query string.
///
/// Everything stays a string so a malformed value degrades to a default
/// instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub search: Option<String>,
    pub colors: Option<String>,
    pub fabric_patterns: Option<String>,
    pub featured: Option<String>,
    pub best_seller: Option<String>,
    pub new_arrival: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// A built query: `WHERE` clause, its bind values in order, and the
/// `ORDER BY` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub where_clause: String,
    pub params: Vec<String>,
    pub order_by: String,
}

impl ProductQuery {
    /// Placeholder number for the first parameter after the filters.
    #[must_use]
    pub fn next_placeholder(&self) -> usize {
        self.params.len() + 1
    }
}

impl ProductFilter {
    /// Requested page, with `page >= 1` and `limit` in `1..=50`.
    #[must_use]
    pub fn page(&self) -> PageRequest {
        PageRequest::from_query(
            self.page.as_deref(),
            self.limit.as_deref(),
            DEFAULT_PAGE_SIZE,
            MAX_PAGE_SIZE,
        )
    }

    /// Canonical text of the filters, used as the cache key.
    ///
    /// Equivalent query strings (same values, defaults spelled out or not)
    /// produce the same key.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let page = self.page();
        let query = self.build();
        format!(
            "products:{}|{}|{}|page={}|limit={}",
            query.where_clause,
            query.params.join("\u{1f}"),
            query.order_by,
            page.page(),
            page.limit()
        )
    }

    /// Build the `WHERE` and `ORDER BY` clauses.
    #[must_use]
    pub fn build(&self) -> ProductQuery {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(category) = non_default(self.category.as_deref()) {
            params.push(category.to_string());
            conditions.push(format!("category = ${}", params.len()));
        }

        if let Some(subcategory) = non_default(self.subcategory.as_deref()) {
            params.push(escape_html(subcategory));
            conditions.push(format!("subcategory = ${}", params.len()));
        }

        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(format!("%{}%", escape_html(search)));
            let n = params.len();
            conditions.push(format!(
                "(name ILIKE ${n} OR description ILIKE ${n} OR composition ILIKE ${n})"
            ));
        }

        let colors = split_list(self.colors.as_deref());
        if !colors.is_empty() {
            let group: Vec<String> = colors
                .into_iter()
                .map(|color| {
                    params.push(format!("%\"{color}\"%"));
                    format!("colors::text ILIKE ${}", params.len())
                })
                .collect();
            conditions.push(format!("({})", group.join(" OR ")));
        }

        let patterns = split_list(self.fabric_patterns.as_deref());
        if !patterns.is_empty() {
            let group: Vec<String> = patterns
                .into_iter()
                .map(|pattern| {
                    params.push(escape_html(pattern));
                    format!("fabric_pattern = ${}", params.len())
                })
                .collect();
            conditions.push(format!("({})", group.join(" OR ")));
        }

        for (flag, column) in [
            (&self.featured, "featured"),
            (&self.best_seller, "best_seller"),
            (&self.new_arrival, "new_arrival"),
        ] {
            if flag.as_deref() == Some("true") {
                conditions.push(format!("{column} = true"));
            }
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        ProductQuery {
            where_clause,
            params,
            order_by: self.order_by(),
        }
    }

    fn order_by(&self) -> String {
        let field = self
            .sort_by
            .as_deref()
            .filter(|f| SORT_FIELDS.contains(f))
            .unwrap_or("created_at");
        let direction = match self.sort_order.as_deref() {
            Some(order) if order.eq_ignore_ascii_case("asc") => "ASC",
            _ => "DESC",
        };
        format!("{field} {direction}")
    }
}

/// `None` for absent, empty, or `all`.
fn non_default(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty() && *v != "all")
}

fn split_list(value: Option<&str>) -> Vec<&str> {
    value
        .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> ProductFilter {
        ProductFilter::default()
    }

    #[test]
    fn test_no_filters() {
        let query = filter().build();
        assert_eq!(query.where_clause, "");
        assert!(query.params.is_empty());
        assert_eq!(query.order_by, "created_at DESC");
        assert_eq!(query.next_placeholder(), 1);
    }

    #[test]
    fn test_all_is_ignored() {
        let query = ProductFilter {
            category: Some("all".to_string()),
            subcategory: Some("all".to_string()),
            ..filter()
        }
        .build();
        assert_eq!(query.where_clause, "");
    }

    #[test]
    fn test_category_and_search() {
        let query = ProductFilter {
            category: Some("men".to_string()),
            search: Some("  linen ".to_string()),
            ..filter()
        }
        .build();
        assert_eq!(
            query.where_clause,
            "WHERE category = $1 AND (name ILIKE $2 OR description ILIKE $2 OR composition ILIKE $2)"
        );
        assert_eq!(query.params, vec!["men", "%linen%"]);
        assert_eq!(query.next_placeholder(), 3);
    }

    #[test]
    fn test_colors_and_patterns_are_or_groups() {
        let query = ProductFilter {
            colors: Some("Red, Navy,,".to_string()),
            fabric_patterns: Some("checks,stripes".to_string()),
            ..filter()
        }
        .build();
        assert_eq!(
            query.where_clause,
            "WHERE (colors::text ILIKE $1 OR colors::text ILIKE $2) \
             AND (fabric_pattern = $3 OR fabric_pattern = $4)"
        );
        assert_eq!(query.params, vec!["%\"Red\"%", "%\"Navy\"%", "checks", "stripes"]);
    }

    #[test]
    fn test_free_text_filters_match_escaped_storage() {
        let query = ProductFilter {
            subcategory: Some("Shirts/Kurtas".to_string()),
            search: Some("Tom & Jerry".to_string()),
            fabric_patterns: Some("Cotton/Linen,D'Souza".to_string()),
            ..filter()
        }
        .build();
        assert_eq!(
            query.params,
            vec![
                "Shirts&#x2F;Kurtas",
                "%Tom &amp; Jerry%",
                "Cotton&#x2F;Linen",
                "D&#x27;Souza",
            ]
        );
        assert_eq!(query.params[2], escape_html("Cotton/Linen"));
    }

    #[test]
    fn test_flags_only_apply_when_true() {
        let query = ProductFilter {
            featured: Some("true".to_string()),
            best_seller: Some("false".to_string()),
            new_arrival: Some("yes".to_string()),
            ..filter()
        }
        .build();
        assert_eq!(query.where_clause, "WHERE featured = true");
        assert!(query.params.is_empty());
    }

    #[test]
    fn test_sort_whitelist() {
        let query = ProductFilter {
            sort_by: Some("price".to_string()),
            sort_order: Some("asc".to_string()),
            ..filter()
        }
        .build();
        assert_eq!(query.order_by, "price ASC");

        let query = ProductFilter {
            sort_by: Some("price; DROP TABLE products".to_string()),
            sort_order: Some("sideways".to_string()),
            ..filter()
        }
        .build();
        assert_eq!(query.order_by, "created_at DESC");
    }

    #[test]
    fn test_page_is_clamped() {
        let page = ProductFilter {
            page: Some("0".to_string()),
            limit: Some("500".to_string()),
            ..filter()
        }
        .page();
        assert_eq!(page.page(), 1);
        assert_eq!(page.limit(), MAX_PAGE_SIZE);

        let page = filter().page();
        assert_eq!(page.limit(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_cache_key_is_canonical() {
        let a = ProductFilter {
            category: Some("men".to_string()),
            page: Some("1".to_string()),
            ..filter()
        };
        let b = ProductFilter {
            category: Some(" men ".to_string()),
            sort_by: Some("created_at".to_string()),
            ..filter()
        };
        assert_eq!(a.cache_key(), b.cache_key());
        assert!(a.cache_key().starts_with("products:"));

        let c = ProductFilter {
            category: Some("kids".to_string()),
            ..filter()
        };
        assert_ne!(a.cache_key(), c.cache_key());
    }
}
