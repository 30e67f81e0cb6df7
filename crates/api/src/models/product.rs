//! Catalogue models.
//!
//! `images` and `colors` are stored as JSON-encoded text. Rows written by
//! older tooling hold bare strings or `data:image` URIs instead, so decoding
//! is lenient and falls back to defaults rather than failing the request.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use fk_designers_core::{Category, Pagination, PriceRange, ProductCode};

/// Shown when a product has no usable image.
pub const FALLBACK_IMAGE: &str = "https://images.pexels.com/photos/1536619/pexels-photo-1536619.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=1";

/// Shown when a product has no usable colour.
pub const FALLBACK_COLOR: &str = "Black";

/// A `products` row as stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub composition: String,
    pub fabric_pattern: Option<String>,
    pub images: Option<String>,
    pub colors: Option<String>,
    pub featured: bool,
    pub best_seller: bool,
    pub new_arrival: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price_min: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price_max: Option<Decimal>,
    pub category: String,
    pub subcategory: String,
    pub description: String,
    pub composition: String,
    pub fabric_pattern: Option<String>,
    pub images: Vec<String>,
    pub colors: Vec<String>,
    pub featured: bool,
    pub best_seller: bool,
    pub new_arrival: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(rename = "priceRange", skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        let mut images = decode_list(row.images.as_deref());
        if images.is_empty() {
            images.push(FALLBACK_IMAGE.to_string());
        }
        let mut colors = decode_list(row.colors.as_deref());
        if colors.is_empty() {
            colors.push(FALLBACK_COLOR.to_string());
        }

        Self {
            price_range: PriceRange::from_bounds(row.price_min, row.price_max),
            id: row.id,
            name: row.name,
            price: row.price,
            price_min: row.price_min,
            price_max: row.price_max,
            category: row.category,
            subcategory: row.subcategory,
            description: row.description,
            composition: row.composition,
            fabric_pattern: row.fabric_pattern,
            images,
            colors,
            featured: row.featured,
            best_seller: row.best_seller,
            new_arrival: row.new_arrival,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// One page of `GET /api/products`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// Decode a stored list column.
///
/// JSON arrays yield their elements; a `data:image` URI or any other
/// non-JSON text becomes a one-element list; JSON that is not an array
/// yields nothing.
fn decode_list(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Vec::new();
    };
    if raw.starts_with("data:image") || !(raw.starts_with('[') || raw.starts_with('{')) {
        return vec![raw.to_string()];
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s),
                Value::String(_) | Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Ok(_) => Vec::new(),
        Err(err) => {
            tracing::warn!(error = %err, "Failed to decode stored list, using raw value");
            vec![raw.to_string()]
        }
    }
}

/// Validated values for an insert or a full overwrite.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub category: Category,
    pub subcategory: String,
    pub description: String,
    pub composition: String,
    pub fabric_pattern: Option<String>,
    pub images: Vec<String>,
    pub colors: Vec<String>,
    pub featured: bool,
    pub best_seller: bool,
    pub new_arrival: bool,
}

impl NewProduct {
    /// `images` encoded for storage.
    #[must_use]
    pub fn images_json(&self) -> String {
        encode_list(&self.images)
    }

    /// `colors` encoded for storage.
    #[must_use]
    pub fn colors_json(&self) -> String {
        encode_list(&self.colors)
    }
}

fn encode_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// The code a new product gets when the caller did not supply one.
#[must_use]
pub fn next_product_code(last: Option<&str>) -> ProductCode {
    ProductCode::next_after(last.map(ProductCode::new).as_ref())
}
