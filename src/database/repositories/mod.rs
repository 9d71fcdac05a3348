pub mod product;
pub mod user;

use std::future::Future;
use std::time::Duration;

use crate::error::ServiceError;

/// 数据库调用统一加截止时间，超时是唯一的取消机制
pub(crate) async fn with_timeout<T>(
    timeout: Duration,
    fut: impl Future<Output = Result<T, sqlx::Error>>,
) -> Result<T, ServiceError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ServiceError::Store(e)),
        Err(_) => Err(ServiceError::StoreTimeout),
    }
}
