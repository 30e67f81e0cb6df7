//! Read-through cache for catalogue reads.
//!
//! Entries live for three minutes; at most 50 are kept, least recently used
//! first out. Any catalogue write clears everything.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use moka::policy::EvictionPolicy;

use crate::models::{Product, ProductPage};

const TTL: Duration = Duration::from_secs(3 * 60);
const MAX_ENTRIES: u64 = 50;

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Page(Arc<ProductPage>),
    Product(Arc<Product>),
}

/// Shared product cache. Cheap to clone.
#[derive(Clone)]
pub struct ProductCache {
    cache: Cache<String, CacheValue>,
}

impl Default for ProductCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(TTL)
    }

    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { cache }
    }

    /// Key for a single product.
    #[must_use]
    pub fn product_key(id: &str) -> String {
        format!("product:{id}")
    }

    pub async fn get_page(&self, key: &str) -> Option<Arc<ProductPage>> {
        match self.cache.get(key).await {
            Some(CacheValue::Page(page)) => Some(page),
            _ => None,
        }
    }

    pub async fn put_page(&self, key: String, page: Arc<ProductPage>) {
        self.cache.insert(key, CacheValue::Page(page)).await;
    }

    pub async fn get_product(&self, id: &str) -> Option<Arc<Product>> {
        match self.cache.get(&Self::product_key(id)).await {
            Some(CacheValue::Product(product)) => Some(product),
            _ => None,
        }
    }

    pub async fn put_product(&self, product: Arc<Product>) {
        self.cache
            .insert(Self::product_key(&product.id), CacheValue::Product(product))
            .await;
    }

    /// Drop every entry.
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        tracing::debug!("Product cache cleared");
    }

    /// Number of live entries, after pending maintenance.
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use fk_designers_core::{PageRequest, Pagination};
    use rust_decimal::Decimal;

    use super::*;

    fn product(id: &str) -> Arc<Product> {
        Arc::new(Product {
            id: id.to_string(),
            name: "Bandhgala".to_string(),
            price: Decimal::new(499_900, 2),
            price_min: None,
            price_max: None,
            category: "men".to_string(),
            subcategory: "jackets".to_string(),
            description: "Structured bandhgala jacket".to_string(),
            composition: "Wool blend".to_string(),
            fabric_pattern: None,
            images: vec!["https://cdn.example.com/b.jpg".to_string()],
            colors: vec!["Charcoal".to_string()],
            featured: false,
            best_seller: true,
            new_arrival: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            price_range: None,
        })
    }

    #[tokio::test]
    async fn test_product_round_trip_and_invalidate() {
        let cache = ProductCache::new();
        cache.put_product(product("FK001")).await;
        let page = ProductPage {
            products: vec![(*product("FK001")).clone()],
            pagination: Pagination::new(PageRequest::new(None, None, 20, 50), 1),
        };
        cache.put_page("products:|".to_string(), Arc::new(page)).await;

        assert_eq!(cache.get_product("FK001").await.unwrap().name, "Bandhgala");
        assert!(cache.get_product("FK002").await.is_none());
        assert_eq!(cache.get_page("products:|").await.unwrap().pagination.total, 1);
        // Kinds do not alias.
        assert!(cache.get_page("product:FK001").await.is_none());

        cache.invalidate_all().await;
        assert!(cache.get_product("FK001").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = ProductCache::with_ttl(Duration::from_millis(20));
        cache.put_product(product("FK001")).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.get_product("FK001").await.is_none());
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let cache = ProductCache::new();
        for n in 0..120 {
            cache.put_product(product(&format!("FK{n:03}"))).await;
        }
        assert!(cache.len().await <= MAX_ENTRIES);
    }
}
