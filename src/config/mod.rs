use std::env;
use std::time::Duration;

use thiserror::Error;

/// 配置加载失败的原因，区分"缺失"和"已设置但为空"
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("缺少必需的环境变量: {0}")]
    Missing(#[from] env::VarError),
    #[error("JWT_SECRET 已设置但为空")]
    EmptyJwtSecret,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    /// 每次缓存/数据库调用的超时上限（秒）
    pub op_timeout_secs: u64,
    /// 登录会话有效期（小时）
    pub session_validity_hours: i64,
    /// 密码重置令牌有效期（分钟）
    pub reset_token_validity_mins: i64,
    /// 列表缓存过期时间（秒）
    pub list_cache_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        // 签名密钥在启动时校验一次，签名组件不在调用时重复检查
        let jwt_secret = require_jwt_secret(env::var("JWT_SECRET")?)?;

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")?,
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")?.parse().unwrap_or(3000),
            jwt_secret,
            op_timeout_secs: env::var("OP_TIMEOUT_SECS")
                .map(|v| v.parse().unwrap_or(5))
                .unwrap_or(5),
            session_validity_hours: env::var("SESSION_VALIDITY_HOURS")
                .map(|v| v.parse().unwrap_or(1))
                .unwrap_or(1),
            reset_token_validity_mins: env::var("RESET_TOKEN_VALIDITY_MINS")
                .map(|v| v.parse().unwrap_or(15))
                .unwrap_or(15),
            list_cache_ttl_secs: env::var("LIST_CACHE_TTL_SECS")
                .map(|v| v.parse().unwrap_or(30))
                .unwrap_or(30),
        })
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_secs(self.op_timeout_secs)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_validity_hours as u64 * 3600)
    }

    pub fn reset_token_ttl(&self) -> Duration {
        Duration::from_secs(self.reset_token_validity_mins as u64 * 60)
    }

    pub fn list_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.list_cache_ttl_secs)
    }
}

fn require_jwt_secret(raw: String) -> Result<String, ConfigError> {
    if raw.trim().is_empty() {
        return Err(ConfigError::EmptyJwtSecret);
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_jwt_secret_is_its_own_error() {
        assert!(matches!(
            require_jwt_secret("   ".to_string()),
            Err(ConfigError::EmptyJwtSecret)
        ));
    }

    #[test]
    fn nonempty_jwt_secret_passes_through() {
        assert_eq!(require_jwt_secret("s3cret".to_string()).unwrap(), "s3cret");
    }
}
