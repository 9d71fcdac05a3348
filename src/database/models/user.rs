use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// 用户账号状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    #[serde(rename = "ACTIVATED")]
    Activated,
    #[serde(rename = "DEACTIVATED")]
    Deactivated,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Activated => "ACTIVATED",
            UserStatus::Deactivated => "DEACTIVATED",
        }
    }
}

impl FromStr for UserStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVATED" => Ok(UserStatus::Activated),
            "DEACTIVATED" => Ok(UserStatus::Deactivated),
            _ => Err(()),
        }
    }
}

/// 用户实体
/// 密码摘要永远不会被序列化进响应或缓存快照
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserEntity {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing, default)]
    pub password: Option<String>,
    pub user_type: String,
    pub status: String,
    pub picture_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 用户列表查询过滤条件
#[derive(Debug, Clone, Default)]
pub struct ListUsersFilter {
    pub status: Option<UserStatus>,
    pub limit: Option<i64>,
}
