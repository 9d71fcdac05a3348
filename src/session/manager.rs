use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::client::{CacheStore, Lookup};
use crate::cache::keys;
use crate::error::ServiceError;
use crate::session::token::{Claims, TokenCodec};

/// 会话有效期单位，只认 HOUR 和 MINUTE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitOfValidity {
    #[serde(rename = "HOUR")]
    Hour,
    #[serde(rename = "MINUTE")]
    Minute,
    /// 反序列化时兜住一切未识别的取值，创建会话前会被拒绝
    #[serde(other, rename = "UNKNOWN")]
    Unknown,
}

impl UnitOfValidity {
    pub fn is_recognized(&self) -> bool {
        !matches!(self, UnitOfValidity::Unknown)
    }
}

/// 创建会话的入参
#[derive(Debug, Clone)]
pub struct NewSession {
    pub user_id: String,
    pub role: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub validity: i64,
    pub unit_of_validity: UnitOfValidity,
}

/// 一次已认证登录的会话，只存在于缓存中
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub role: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub validity: i64,
    pub unit_of_validity: UnitOfValidity,
    pub time_created: DateTime<Utc>,
    pub last_usage: DateTime<Utc>,
}

impl Session {
    /// 读取时校验：now - last_usage 不超过按单位解释的有效期
    /// 不依赖缓存 TTL 做唯一判据，避免时钟偏移带来的误差
    pub fn is_alive(&self, now: DateTime<Utc>) -> bool {
        let allowed = match self.unit_of_validity {
            UnitOfValidity::Hour => chrono::Duration::hours(self.validity),
            UnitOfValidity::Minute => chrono::Duration::minutes(self.validity),
            UnitOfValidity::Unknown => return false,
        };
        now.signed_duration_since(self.last_usage) <= allowed
    }
}

/// 会话管理器
/// 会话状态机：不存在 -> 活跃（缓存内）-> 不存在（TTL 过期或显式销毁）
pub struct SessionManager {
    cache: Arc<dyn CacheStore>,
    codec: TokenCodec,
    op_timeout: Duration,
}

impl SessionManager {
    pub fn new(cache: Arc<dyn CacheStore>, codec: TokenCodec, op_timeout: Duration) -> Self {
        Self {
            cache,
            codec,
            op_timeout,
        }
    }

    /// 创建会话：签名声明得到令牌，以令牌为键写入缓存
    /// 稳态路径只有一次缓存写入，不落库，避免存活会话出现第二个事实来源
    pub async fn create_session(
        &self,
        ttl: Duration,
        payload: NewSession,
    ) -> Result<String, ServiceError> {
        if !payload.unit_of_validity.is_recognized() {
            return Err(ServiceError::InvalidUnitOfValidity);
        }

        let claims = Claims::new(
            &payload.user_id,
            &payload.role,
            &payload.email,
            &payload.first_name,
            &payload.last_name,
        );
        let token = self.codec.sign(&claims)?;

        let now = Utc::now();
        let session = Session {
            token: token.clone(),
            user_id: payload.user_id,
            role: payload.role,
            email: payload.email,
            first_name: payload.first_name,
            last_name: payload.last_name,
            validity: payload.validity,
            unit_of_validity: payload.unit_of_validity,
            time_created: now,
            last_usage: now,
        };

        let bytes = serde_json::to_vec(&session)?;
        self.cache
            .set(&keys::session_key(&token), bytes, ttl, self.op_timeout)
            .await?;

        tracing::info!(user_id = %session.user_id, "session created");
        Ok(token)
    }

    /// 按令牌取回会话并校验其仍然有效
    pub async fn get_session_by_token(&self, token: &str) -> Result<Session, ServiceError> {
        if token.trim().is_empty() {
            return Err(ServiceError::TokenInvalid);
        }

        self.codec.verify(token)?;

        let key = keys::session_key(token);
        let bytes = match self.cache.get(&key, self.op_timeout).await? {
            Lookup::Hit(bytes) => bytes,
            Lookup::Miss => return Err(ServiceError::TokenSessionNotFound),
        };

        let session: Session = serde_json::from_slice(&bytes)?;

        if !session.is_alive(Utc::now()) {
            // 过期条目顺手清掉，清理失败不影响返回结果
            if let Err(e) = self.cache.delete(&key, self.op_timeout).await {
                tracing::warn!(error = %e, "failed to reap expired session entry");
            }
            return Err(ServiceError::TokenExpired);
        }

        Ok(session)
    }

    /// 销毁会话；键不存在时缓存给出明确信号，映射为 TokenSessionNotFound
    pub async fn destroy_session(&self, token: &str) -> Result<(), ServiceError> {
        let removed = self
            .cache
            .delete(&keys::session_key(token), self.op_timeout)
            .await?;

        if !removed {
            return Err(ServiceError::TokenSessionNotFound);
        }

        tracing::info!("session destroyed");
        Ok(())
    }
}
