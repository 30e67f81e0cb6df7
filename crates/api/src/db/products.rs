//! Product repository.

use std::time::Duration;

use fk_designers_core::{PageRequest, ProductCode};
use tracing::instrument;

use super::{Database, RepositoryError, with_timeout};
use crate::models::{NewProduct, ProductRow};
use crate::services::product_query::ProductQuery;

const COUNT_TIMEOUT: Duration = Duration::from_secs(8);
const LIST_TIMEOUT: Duration = Duration::from_secs(10);
const GET_TIMEOUT: Duration = Duration::from_secs(5);

const PRODUCT_COLUMNS: &str = "id, name, price, price_min, price_max, category, subcategory, \
     description, composition, fabric_pattern, images, colors, \
     featured, best_seller, new_arrival, created_at, updated_at";

/// Repository for catalogue operations.
pub struct ProductRepository<'a> {
    db: &'a Database,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// One page of products matching `query`, plus the total match count.
    ///
    /// Both queries run concurrently under their own deadlines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Timeout` if either deadline passes.
    #[instrument(skip(self, query), fields(page = page.page(), limit = page.limit()))]
    pub async fn search(
        &self,
        query: &ProductQuery,
        page: PageRequest,
    ) -> Result<(Vec<ProductRow>, i64), RepositoryError> {
        let count_sql = format!("SELECT COUNT(*) FROM products {}", query.where_clause);
        let n = query.next_placeholder();
        let list_sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products {} ORDER BY {} LIMIT ${} OFFSET ${}",
            query.where_clause,
            query.order_by,
            n,
            n + 1
        );
        let limit = i64::from(page.limit());
        let offset = page.offset();

        let count = with_timeout(
            COUNT_TIMEOUT,
            "count_products",
            self.db.run("count_products", |pool| {
                let sql = count_sql.as_str();
                async move {
                    let mut q = sqlx::query_scalar::<_, i64>(sql);
                    for param in &query.params {
                        q = q.bind(param.as_str());
                    }
                    q.fetch_one(&pool).await
                }
            }),
        );
        let rows = with_timeout(
            LIST_TIMEOUT,
            "list_products",
            self.db.run("list_products", |pool| {
                let sql = list_sql.as_str();
                async move {
                    let mut q = sqlx::query_as::<_, ProductRow>(sql);
                    for param in &query.params {
                        q = q.bind(param.as_str());
                    }
                    q.bind(limit).bind(offset).fetch_all(&pool).await
                }
            }),
        );

        let (total, rows) = tokio::try_join!(count, rows)?;
        Ok((rows, total))
    }

    /// Fetch one product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Timeout` after five seconds.
    pub async fn get(&self, id: &str) -> Result<Option<ProductRow>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        with_timeout(
            GET_TIMEOUT,
            "get_product",
            self.db.run("get_product", |pool| {
                let sql = sql.as_str();
                async move {
                    sqlx::query_as::<_, ProductRow>(sql)
                        .bind(id)
                        .fetch_optional(&pool)
                        .await
                }
            }),
        )
        .await
    }

    /// Whether a product with this code exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: &str) -> Result<bool, RepositoryError> {
        self.db
            .run("product_exists", |pool| async move {
                sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&pool)
                    .await
            })
            .await
    }

    /// Code of the most recently created product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn last_code(&self) -> Result<Option<ProductCode>, RepositoryError> {
        let id = self
            .db
            .run("last_product_code", |pool| async move {
                sqlx::query_scalar::<_, String>(
                    "SELECT id FROM products ORDER BY created_at DESC LIMIT 1",
                )
                .fetch_optional(&pool)
                .await
            })
            .await?;
        Ok(id.map(ProductCode::new))
    }

    /// Insert a product under `id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    pub async fn insert(&self, id: &ProductCode, product: &NewProduct) -> Result<(), RepositoryError> {
        let images = product.images_json();
        let colors = product.colors_json();
        self.db
            .run("insert_product", |pool| {
                let (images, colors) = (images.as_str(), colors.as_str());
                async move {
                    sqlx::query(
                        r"
                        INSERT INTO products (
                            id, name, price, price_min, price_max, category, subcategory,
                            description, composition, fabric_pattern, images, colors,
                            featured, best_seller, new_arrival, created_at, updated_at
                        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, NOW(), NOW())
                        ",
                    )
                    .bind(id.as_str())
                    .bind(product.name.as_str())
                    .bind(product.price)
                    .bind(product.price_min)
                    .bind(product.price_max)
                    .bind(product.category.as_str())
                    .bind(product.subcategory.as_str())
                    .bind(product.description.as_str())
                    .bind(product.composition.as_str())
                    .bind(product.fabric_pattern.as_deref())
                    .bind(images)
                    .bind(colors)
                    .bind(product.featured)
                    .bind(product.best_seller)
                    .bind(product.new_arrival)
                    .execute(&pool)
                    .await
                }
            })
            .await?;
        Ok(())
    }

    /// Overwrite every field of an existing product. `false` if it does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(&self, id: &str, product: &NewProduct) -> Result<bool, RepositoryError> {
        let images = product.images_json();
        let colors = product.colors_json();
        let result = self
            .db
            .run("update_product", |pool| {
                let (images, colors) = (images.as_str(), colors.as_str());
                async move {
                    sqlx::query(
                        r"
                        UPDATE products SET
                            name = $2, price = $3, price_min = $4, price_max = $5,
                            category = $6, subcategory = $7, description = $8,
                            composition = $9, fabric_pattern = $10, images = $11, colors = $12,
                            featured = $13, best_seller = $14, new_arrival = $15,
                            updated_at = NOW()
                        WHERE id = $1
                        ",
                    )
                    .bind(id)
                    .bind(product.name.as_str())
                    .bind(product.price)
                    .bind(product.price_min)
                    .bind(product.price_max)
                    .bind(product.category.as_str())
                    .bind(product.subcategory.as_str())
                    .bind(product.description.as_str())
                    .bind(product.composition.as_str())
                    .bind(product.fabric_pattern.as_deref())
                    .bind(images)
                    .bind(colors)
                    .bind(product.featured)
                    .bind(product.best_seller)
                    .bind(product.new_arrival)
                    .execute(&pool)
                    .await
                }
            })
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a product, returning its name. `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: &str) -> Result<Option<String>, RepositoryError> {
        self.db
            .run("delete_product", |pool| async move {
                sqlx::query_scalar::<_, String>("DELETE FROM products WHERE id = $1 RETURNING name")
                    .bind(id)
                    .fetch_optional(&pool)
                    .await
            })
            .await
    }
}
