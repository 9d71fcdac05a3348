use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};
use thiserror::Error;

/// 缓存读取结果
/// 未命中是一个正常取值，传输故障走错误通道，二者永远不会混淆
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Hit(Vec<u8>),
    Miss,
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis 命令执行失败: {0}")]
    Transport(#[from] redis::RedisError),
    #[error("缓存操作超时")]
    Timeout,
}

/// 键值缓存客户端边界
/// 每个调用都携带截止时间，TTL 粒度为秒
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str, timeout: Duration) -> Result<Lookup, CacheError>;

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<(), CacheError>;

    /// 返回 true 表示确实删除了一个键，false 表示键本就不存在
    async fn delete(&self, key: &str, timeout: Duration) -> Result<bool, CacheError>;
}

/// Redis 缓存实现
pub struct RedisCache {
    client: RedisClient,
}

impl RedisCache {
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str, timeout: Duration) -> Result<Lookup, CacheError> {
        let command = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            let value: Option<Vec<u8>> = conn.get(key).await?;
            Ok::<_, redis::RedisError>(value)
        };

        match tokio::time::timeout(timeout, command).await {
            Ok(Ok(Some(bytes))) => Ok(Lookup::Hit(bytes)),
            Ok(Ok(None)) => Ok(Lookup::Miss),
            Ok(Err(e)) => Err(CacheError::Transport(e)),
            Err(_) => Err(CacheError::Timeout),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<(), CacheError> {
        let command = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            let _: () = conn.set_ex(key, value, ttl.as_secs()).await?;
            Ok::<_, redis::RedisError>(())
        };

        match tokio::time::timeout(timeout, command).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(CacheError::Transport(e)),
            Err(_) => Err(CacheError::Timeout),
        }
    }

    async fn delete(&self, key: &str, timeout: Duration) -> Result<bool, CacheError> {
        let command = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            let removed: i64 = conn.del(key).await?;
            Ok::<_, redis::RedisError>(removed)
        };

        match tokio::time::timeout(timeout, command).await {
            Ok(Ok(removed)) => Ok(removed > 0),
            Ok(Err(e)) => Err(CacheError::Transport(e)),
            Err(_) => Err(CacheError::Timeout),
        }
    }
}
