use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// 商品实体
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductEntity {
    pub product_id: String,
    pub name: String,
    pub description: String,
    pub price: String,
    #[serde(rename = "qty")]
    pub quantity: i32,
    pub owner_id: String,
    pub owner_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 商品列表查询过滤条件
#[derive(Debug, Clone, Default)]
pub struct ListProductsFilter {
    pub limit: Option<i64>,
}
