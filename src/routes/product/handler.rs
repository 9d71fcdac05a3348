use axum::{
    Extension,
    extract::{Json, Query, State},
};

use crate::{
    AppState,
    database::models::product::{ListProductsFilter, ProductEntity},
    error::ServiceError,
    middleware::AuthSession,
    query::ListPage,
    result::ApiResult,
    service::product::NewProduct,
};

use super::model::{CreateProductRequest, ListProductsQuery};

#[axum::debug_handler]
pub async fn create_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<ApiResult<ProductEntity>>, ServiceError> {
    let product = state
        .products
        .create_product(
            &auth.session,
            NewProduct {
                name: req.name,
                description: req.description,
                price: req.price,
                quantity: req.quantity,
            },
        )
        .await?;

    Ok(Json(ApiResult::success(product)))
}

#[axum::debug_handler]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ApiResult<ListPage<ProductEntity>>>, ServiceError> {
    let page = state
        .products
        .list_products(ListProductsFilter { limit: query.limit })
        .await?;

    Ok(Json(ApiResult::success(page)))
}
