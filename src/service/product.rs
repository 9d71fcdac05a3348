use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::cache::client::CacheStore;
use crate::cache::keys;
use crate::config::Config;
use crate::database::models::product::{ListProductsFilter, ProductEntity};
use crate::database::repositories::product::ProductStore;
use crate::error::ServiceError;
use crate::query::{self, ListPage};
use crate::session::manager::Session;

/// 创建商品的请求载荷，归属信息来自已认证会话而不是请求体
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: String,
    pub quantity: i32,
}

/// 商品服务
pub struct ProductService {
    store: Arc<dyn ProductStore>,
    cache: Arc<dyn CacheStore>,
    op_timeout: Duration,
    list_cache_ttl: Duration,
}

impl ProductService {
    pub fn new(store: Arc<dyn ProductStore>, cache: Arc<dyn CacheStore>, config: &Config) -> Self {
        Self {
            store,
            cache,
            op_timeout: config.op_timeout(),
            list_cache_ttl: config.list_cache_ttl(),
        }
    }

    pub async fn create_product(
        &self,
        owner: &Session,
        payload: NewProduct,
    ) -> Result<ProductEntity, ServiceError> {
        validate_product(&payload)?;

        let now = Utc::now();
        let product = ProductEntity {
            product_id: Uuid::new_v4().to_string(),
            name: payload.name,
            description: payload.description,
            price: payload.price,
            quantity: payload.quantity,
            owner_id: owner.user_id.clone(),
            owner_name: format!("{} {}", owner.first_name, owner.last_name),
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&product, self.op_timeout).await?;
        tracing::info!(product_id = %product.product_id, owner_id = %product.owner_id, "product created");
        Ok(product)
    }

    /// 商品列表，经过旁路缓存；所有过滤条件共享同一个缓存键
    pub async fn list_products(
        &self,
        filter: ListProductsFilter,
    ) -> Result<ListPage<ProductEntity>, ServiceError> {
        query::list_with_cache(
            self.cache.as_ref(),
            &keys::products_list_key(),
            self.list_cache_ttl,
            self.op_timeout,
            || async { self.store.list(&filter, self.op_timeout).await },
        )
        .await
    }
}

fn validate_product(payload: &NewProduct) -> Result<(), ServiceError> {
    let missing = |name: &str| ServiceError::Validation(format!("{} 不能为空", name));

    if payload.name.trim().is_empty() {
        return Err(missing("name"));
    }
    if payload.description.trim().is_empty() {
        return Err(missing("description"));
    }
    if payload.price.trim().is_empty() {
        return Err(missing("price"));
    }
    if payload.quantity < 1 {
        return Err(ServiceError::Validation("数量至少为 1".to_string()));
    }

    Ok(())
}
