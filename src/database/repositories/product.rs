use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use super::with_timeout;
use crate::database::models::product::{ListProductsFilter, ProductEntity};
use crate::error::ServiceError;

const PRODUCT_COLUMNS: &str = "product_id, name, description, price, quantity, \
                               owner_id, owner_name, created_at, updated_at";

/// 商品存储库边界
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn insert(&self, product: &ProductEntity, timeout: Duration)
    -> Result<(), ServiceError>;

    async fn list(
        &self,
        filter: &ListProductsFilter,
        timeout: Duration,
    ) -> Result<(Vec<ProductEntity>, i64), ServiceError>;
}

/// Postgres 商品存储库
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn insert(
        &self,
        product: &ProductEntity,
        timeout: Duration,
    ) -> Result<(), ServiceError> {
        let sql = format!(
            "INSERT INTO products ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            PRODUCT_COLUMNS
        );

        with_timeout(
            timeout,
            sqlx::query(&sql)
                .bind(&product.product_id)
                .bind(&product.name)
                .bind(&product.description)
                .bind(&product.price)
                .bind(product.quantity)
                .bind(&product.owner_id)
                .bind(&product.owner_name)
                .bind(product.created_at)
                .bind(product.updated_at)
                .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn list(
        &self,
        filter: &ListProductsFilter,
        timeout: Duration,
    ) -> Result<(Vec<ProductEntity>, i64), ServiceError> {
        let limit = filter.limit.unwrap_or(0);

        let sql = format!(
            "SELECT {} FROM products ORDER BY created_at DESC LIMIT NULLIF($1, 0)",
            PRODUCT_COLUMNS
        );
        let products = with_timeout(
            timeout,
            sqlx::query_as::<_, ProductEntity>(&sql)
                .bind(limit)
                .fetch_all(&self.pool),
        )
        .await?;

        let count = with_timeout(
            timeout,
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products").fetch_one(&self.pool),
        )
        .await?;

        Ok((products, count))
    }
}
