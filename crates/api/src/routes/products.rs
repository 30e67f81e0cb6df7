//! `/api/products`: catalogue reads (cached) and staff/admin writes.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Json as JsonResponse,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use fk_designers_core::{Category, Pagination, ProductCode};

use crate::db::{AuditRepository, ProductRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::{ClientIp, RequireAdmin, RequireStaff};
use crate::models::audit::action;
use crate::models::product::next_product_code;
use crate::models::{NewAuditLog, NewProduct, Product, ProductPage};
use crate::response::ApiResponse;
use crate::services::product_query::ProductFilter;
use crate::state::AppState;
use crate::validation::{Validator, escape_html, missing_after_validation};

/// Body of a catalogue read: the envelope plus cache and timing fields.
#[derive(Debug, Serialize)]
pub struct CatalogResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub cached: bool,
    #[serde(rename = "responseTime")]
    pub response_time: String,
}

impl<T: Serialize> CatalogResponse<T> {
    fn new(data: T, cached: bool, started: Instant) -> Self {
        Self {
            success: true,
            data,
            cached,
            response_time: format!("{}ms", started.elapsed().as_millis()),
        }
    }
}

impl<T: Serialize> IntoResponse for CatalogResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, JsonResponse(self)).into_response()
    }
}

/// Create/update body. Raw values so every field can be reported at once.
#[derive(Debug, Default, Deserialize)]
pub struct ProductRequest {
    pub id: Option<String>,
    pub name: Option<String>,
    pub price: Option<Value>,
    pub price_min: Option<Value>,
    pub price_max: Option<Value>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub description: Option<String>,
    pub composition: Option<String>,
    pub fabric_pattern: Option<String>,
    pub images: Option<Value>,
    pub colors: Option<Value>,
    pub featured: Option<Value>,
    pub best_seller: Option<Value>,
    pub new_arrival: Option<Value>,
}

impl ProductRequest {
    /// Validate and clean the body.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing every failing field.
    pub fn validate(&self) -> Result<NewProduct> {
        let mut v = Validator::new();
        let name = v.text("name", self.name.as_deref(), 2, 255);
        let price = v.price("price", self.price.as_ref());
        let price_min = v.optional_price("price_min", self.price_min.as_ref());
        let price_max = v.optional_price("price_max", self.price_max.as_ref());
        let category: Option<Category> = v.one_of(
            "category",
            self.category.as_deref(),
            &Category::ALL.map(Category::as_str),
        );
        let subcategory = v.text("subcategory", self.subcategory.as_deref(), 2, 50);
        let description = v.text("description", self.description.as_deref(), 10, 1000);
        let composition = v.text("composition", self.composition.as_deref(), 2, 255);
        let fabric_pattern = v.optional_text("fabric_pattern", self.fabric_pattern.as_deref(), 50);
        let images = v.string_list("images", self.images.as_ref());
        let colors = v.string_list("colors", self.colors.as_ref());
        let featured = v.optional_bool("featured", self.featured.as_ref());
        let best_seller = v.optional_bool("best_seller", self.best_seller.as_ref());
        let new_arrival = v.optional_bool("new_arrival", self.new_arrival.as_ref());
        v.finish()?;

        let (
            Some(name),
            Some(price),
            Some(category),
            Some(subcategory),
            Some(description),
            Some(composition),
            Some(images),
            Some(colors),
        ) = (
            name,
            price,
            category,
            subcategory,
            description,
            composition,
            images,
            colors,
        )
        else {
            return Err(missing_after_validation());
        };

        Ok(NewProduct {
            name: escape_html(&name),
            price,
            price_min,
            price_max,
            category,
            subcategory: escape_html(&subcategory),
            description: escape_html(&description),
            composition: escape_html(&composition),
            fabric_pattern: fabric_pattern.as_deref().map(escape_html),
            images,
            colors,
            featured,
            best_seller,
            new_arrival,
        })
    }
}

/// `GET /api/products`
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<CatalogResponse<Arc<ProductPage>>> {
    let started = Instant::now();
    let cache_key = filter.cache_key();

    if let Some(page) = state.product_cache().get_page(&cache_key).await {
        tracing::debug!(count = page.products.len(), "Product list served from cache");
        return Ok(CatalogResponse::new(page, true, started));
    }

    let query = filter.build();
    let request = filter.page();
    let (rows, total) = ProductRepository::new(state.db())
        .search(&query, request)
        .await
        .map_err(|err| match err {
            RepositoryError::Timeout(_) => AppError::Timeout(
                "Request timeout. Please try again with fewer filters.".to_string(),
            ),
            other => AppError::Database(other),
        })?;

    let page = Arc::new(ProductPage {
        products: rows.into_iter().map(Product::from).collect(),
        pagination: Pagination::new(request, total),
    });
    state
        .product_cache()
        .put_page(cache_key, Arc::clone(&page))
        .await;

    tracing::info!(
        count = page.products.len(),
        total,
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Products fetched"
    );
    Ok(CatalogResponse::new(page, false, started))
}

/// `GET /api/products/{id}`
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<CatalogResponse<Arc<Product>>> {
    let started = Instant::now();

    if let Some(product) = state.product_cache().get_product(&id).await {
        return Ok(CatalogResponse::new(product, true, started));
    }

    let product = ProductRepository::new(state.db())
        .get(&id)
        .await?
        .map(|row| Arc::new(Product::from(row)))
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    state.product_cache().put_product(Arc::clone(&product)).await;

    Ok(CatalogResponse::new(product, false, started))
}

#[derive(Debug, Serialize)]
pub struct CreatedProduct {
    pub id: ProductCode,
}

/// `POST /api/products`
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    ip: ClientIp,
    Json(body): Json<ProductRequest>,
) -> Result<ApiResponse<CreatedProduct>> {
    let product = body.validate()?;
    let repo = ProductRepository::new(state.db());

    let requested = body
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());
    let id = match requested {
        Some(id) => {
            if repo.exists(id).await? {
                return Err(AppError::Conflict("Product ID already exists".to_string()));
            }
            ProductCode::new(id)
        }
        None => {
            let last = repo.last_code().await?;
            next_product_code(last.as_ref().map(ProductCode::as_str))
        }
    };

    repo.insert(&id, &product).await?;
    state.product_cache().invalidate_all().await;

    AuditRepository::new(state.db())
        .record(NewAuditLog::new(
            user.user_id,
            action::CREATE_PRODUCT,
            ip.to_db(),
            json!({ "product_id": id, "name": product.name }),
        ))
        .await;

    tracing::info!(product_id = %id, user_id = %user.user_id, "Product created");
    Ok(ApiResponse::created(
        "Product created successfully",
        CreatedProduct { id },
    ))
}

/// `PUT /api/products/{id}`
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(user): RequireStaff,
    ip: ClientIp,
    Path(id): Path<String>,
    Json(body): Json<ProductRequest>,
) -> Result<ApiResponse<()>> {
    let product = body.validate()?;

    if !ProductRepository::new(state.db()).update(&id, &product).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    state.product_cache().invalidate_all().await;

    AuditRepository::new(state.db())
        .record(NewAuditLog::new(
            user.user_id,
            action::UPDATE_PRODUCT,
            ip.to_db(),
            json!({ "product_id": id, "name": product.name }),
        ))
        .await;

    tracing::info!(product_id = %id, user_id = %user.user_id, "Product updated");
    Ok(ApiResponse::message("Product updated successfully"))
}

/// `DELETE /api/products/{id}`
pub async fn destroy(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    ip: ClientIp,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>> {
    let name = ProductRepository::new(state.db())
        .delete(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;
    state.product_cache().invalidate_all().await;

    AuditRepository::new(state.db())
        .record(NewAuditLog::new(
            user.user_id,
            action::DELETE_PRODUCT,
            ip.to_db(),
            json!({ "product_id": id, "name": name }),
        ))
        .await;

    tracing::info!(product_id = %id, user_id = %user.user_id, "Product deleted");
    Ok(ApiResponse::message("Product deleted successfully"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid() -> ProductRequest {
        serde_json::from_value(json!({
            "name": "Chikankari <Kurta>",
            "price": 2499,
            "price_min": "1999.5",
            "category": "men",
            "subcategory": "kurta",
            "description": "Hand-embroidered cotton kurta",
            "composition": "100% cotton",
            "images": ["https://cdn.example.com/k.jpg"],
            "colors": ["White", "Sky"],
            "featured": "true"
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_product() {
        let product = valid().validate().unwrap();
        assert_eq!(product.name, "Chikankari &lt;Kurta&gt;");
        assert_eq!(product.price.to_string(), "2499");
        assert_eq!(product.price_min.unwrap().to_string(), "1999.5");
        assert_eq!(product.category, Category::Men);
        assert!(product.featured);
        assert!(!product.best_seller);
        assert_eq!(product.colors_json(), r#"["White","Sky"]"#);
    }

    #[test]
    fn test_every_bad_field_is_reported() {
        let body = ProductRequest {
            name: Some("X".to_string()),
            price: Some(json!(-5)),
            category: Some("women".to_string()),
            images: Some(json!([])),
            ..ProductRequest::default()
        };
        let AppError::Validation(errors) = body.validate().unwrap_err() else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        for field in [
            "name",
            "price",
            "category",
            "subcategory",
            "description",
            "composition",
            "images",
            "colors",
        ] {
            assert!(fields.contains(&field), "missing error for {field}");
        }
    }

    #[test]
    fn test_catalog_response_shape() {
        let json = serde_json::to_value(CatalogResponse::new(1, false, Instant::now())).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("cached").is_none());
        assert!(json["responseTime"].as_str().unwrap().ends_with("ms"));

        let json = serde_json::to_value(CatalogResponse::new(1, true, Instant::now())).unwrap();
        assert_eq!(json["cached"], true);
    }
}
