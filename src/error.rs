use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cache::client::CacheError;
use crate::result::ApiResult;

/// 服务统一错误类型
/// 客户端输入错误映射到 4xx，后端依赖不可用映射到 5xx
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("请求参数校验失败: {0}")]
    Validation(String),
    #[error("该邮箱或手机号已被注册")]
    DuplicateRecord,
    #[error("邮箱或密码错误，请重试")]
    AuthenticationFailed,
    #[error("无效的令牌")]
    TokenInvalid,
    #[error("会话已过期，请重新登录")]
    TokenExpired,
    #[error("会话不存在或已被销毁")]
    TokenSessionNotFound,
    #[error("无效的有效期单位，只支持 HOUR 或 MINUTE")]
    InvalidUnitOfValidity,
    #[error("新密码不能与旧密码相同")]
    PasswordIsSame,
    #[error("记录不存在")]
    NotFound,
    #[error("缓存服务不可用")]
    CacheUnavailable(#[source] CacheError),
    #[error("缓存数据序列化失败")]
    Serialization(#[from] serde_json::Error),
    #[error("数据库操作失败")]
    Store(#[from] sqlx::Error),
    #[error("数据库操作超时")]
    StoreTimeout,
    #[error("令牌签发失败")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error("密码处理失败")]
    Hash(#[from] bcrypt::BcryptError),
}

impl From<CacheError> for ServiceError {
    fn from(err: CacheError) -> Self {
        ServiceError::CacheUnavailable(err)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match self {
            ServiceError::Validation(_)
            | ServiceError::InvalidUnitOfValidity
            | ServiceError::PasswordIsSame => StatusCode::BAD_REQUEST,
            ServiceError::DuplicateRecord => StatusCode::CONFLICT,
            ServiceError::AuthenticationFailed
            | ServiceError::TokenInvalid
            | ServiceError::TokenExpired
            | ServiceError::TokenSessionNotFound => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::CacheUnavailable(_)
            | ServiceError::Serialization(_)
            | ServiceError::Store(_)
            | ServiceError::StoreTimeout
            | ServiceError::Signing(_)
            | ServiceError::Hash(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed with server error");
        }

        // 错误也走统一响应信封，和成功响应同一个结构
        let body = Json(ApiResult::<()>::error(
            status.as_u16() as i32,
            &self.to_string(),
        ));

        (status, body).into_response()
    }
}
