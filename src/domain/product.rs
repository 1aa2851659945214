//! Product catalog model and query parameters

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub image: String,
    pub category: String,
    pub stock: i32,
    pub featured: bool,
    pub best_seller: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Catalog listing parameters. Unrecognized sort keys and `all`-valued
/// filters mean "no filter / default sort", never an error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub price_range: Option<String>,
    pub sort_by: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl CatalogQuery {
    /// Category filter, with `all` meaning no filter.
    pub fn category_filter(&self) -> Option<&str> {
        self.category.as_deref().filter(|c| *c != "all" && !c.is_empty())
    }

    /// `ILIKE` pattern over name/description.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_deref().filter(|s| !s.is_empty()).map(|s| format!("%{s}%"))
    }

    /// SQL predicate for the fixed price buckets. `under25` and `over100`
    /// are strict, the middle buckets inclusive on both bounds.
    pub fn price_predicate(&self) -> &'static str {
        match self.price_range.as_deref() {
            Some("under25") => " AND price < 25",
            Some("25to50") => " AND price >= 25 AND price <= 50",
            Some("50to100") => " AND price >= 50 AND price <= 100",
            Some("over100") => " AND price > 100",
            _ => "",
        }
    }

    /// ORDER BY clause for the requested sort key, defaulting to
    /// featured-first.
    pub fn order_clause(&self) -> &'static str {
        match self.sort_by.as_deref() {
            Some("priceAsc") => "price ASC",
            Some("priceDesc") => "price DESC",
            Some("newest") => "created_at DESC",
            Some("bestSelling") => "best_seller DESC",
            _ => "featured DESC",
        }
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        // Widened before multiplying; page is client-controlled and may sit
        // at the top of the u32 range.
        (i64::from(self.page()) - 1) * i64::from(self.limit())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogPage {
    pub products: Vec<Product>,
    pub total: i64,
    pub page: u32,
    pub pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(price_range: Option<&str>, sort_by: Option<&str>) -> CatalogQuery {
        CatalogQuery {
            price_range: price_range.map(String::from),
            sort_by: sort_by.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_price_buckets() {
        assert_eq!(query(Some("under25"), None).price_predicate(), " AND price < 25");
        assert_eq!(query(Some("25to50"), None).price_predicate(), " AND price >= 25 AND price <= 50");
        assert_eq!(query(Some("50to100"), None).price_predicate(), " AND price >= 50 AND price <= 100");
        assert_eq!(query(Some("over100"), None).price_predicate(), " AND price > 100");
    }

    #[test]
    fn test_unknown_bucket_means_no_filter() {
        assert_eq!(query(Some("all"), None).price_predicate(), "");
        assert_eq!(query(Some("cheap"), None).price_predicate(), "");
        assert_eq!(query(None, None).price_predicate(), "");
    }

    #[test]
    fn test_sort_keys() {
        assert_eq!(query(None, Some("priceAsc")).order_clause(), "price ASC");
        assert_eq!(query(None, Some("priceDesc")).order_clause(), "price DESC");
        assert_eq!(query(None, Some("newest")).order_clause(), "created_at DESC");
        assert_eq!(query(None, Some("bestSelling")).order_clause(), "best_seller DESC");
        assert_eq!(query(None, Some("whatever")).order_clause(), "featured DESC");
        assert_eq!(query(None, None).order_clause(), "featured DESC");
    }

    #[test]
    fn test_category_all_is_no_filter() {
        let mut q = CatalogQuery::default();
        q.category = Some("all".into());
        assert_eq!(q.category_filter(), None);
        q.category = Some("jewelry".into());
        assert_eq!(q.category_filter(), Some("jewelry"));
    }

    #[test]
    fn test_pagination_defaults() {
        let q = CatalogQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 10);
        assert_eq!(q.offset(), 0);

        let mut q = CatalogQuery::default();
        q.page = Some(0);
        assert_eq!(q.page(), 1);
        q.page = Some(3);
        q.limit = Some(20);
        assert_eq!(q.offset(), 40);
    }

    #[test]
    fn test_offset_at_max_page_does_not_overflow() {
        let mut q = CatalogQuery::default();
        q.page = Some(u32::MAX);
        q.limit = Some(100);
        assert_eq!(q.offset(), (i64::from(u32::MAX) - 1) * 100);
    }
}
