use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use super::with_timeout;
use crate::database::models::user::{ListUsersFilter, UserEntity};
use crate::error::ServiceError;

const USER_COLUMNS: &str = "user_id, first_name, last_name, email, phone, password, \
                            user_type, status, picture_url, created_at, updated_at";

/// 按字段查找的白名单，查询语句里的列名只能从这里来
#[derive(Debug, Clone, Copy)]
pub enum UserField {
    UserId,
    Email,
    Phone,
}

impl UserField {
    fn column(&self) -> &'static str {
        match self {
            UserField::UserId => "user_id",
            UserField::Email => "email",
            UserField::Phone => "phone",
        }
    }
}

/// 用户存储库边界
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_field(
        &self,
        field: UserField,
        value: &str,
        timeout: Duration,
    ) -> Result<Option<UserEntity>, ServiceError>;

    async fn list(
        &self,
        filter: &ListUsersFilter,
        timeout: Duration,
    ) -> Result<(Vec<UserEntity>, i64), ServiceError>;

    async fn insert(&self, user: &UserEntity, timeout: Duration) -> Result<(), ServiceError>;

    async fn update_password(
        &self,
        user_id: &str,
        digest: &str,
        timeout: Duration,
    ) -> Result<UserEntity, ServiceError>;

    async fn update_status(
        &self,
        user_id: &str,
        status: &str,
        timeout: Duration,
    ) -> Result<UserEntity, ServiceError>;
}

/// Postgres 用户存储库
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_field(
        &self,
        field: UserField,
        value: &str,
        timeout: Duration,
    ) -> Result<Option<UserEntity>, ServiceError> {
        let sql = format!(
            "SELECT {} FROM users WHERE {} = $1",
            USER_COLUMNS,
            field.column()
        );

        with_timeout(
            timeout,
            sqlx::query_as::<_, UserEntity>(&sql)
                .bind(value)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn list(
        &self,
        filter: &ListUsersFilter,
        timeout: Duration,
    ) -> Result<(Vec<UserEntity>, i64), ServiceError> {
        let status = filter.status.map(|s| s.as_str());
        let limit = filter.limit.unwrap_or(0);

        let sql = format!(
            "SELECT {} FROM users \
             WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC \
             LIMIT NULLIF($2, 0)",
            USER_COLUMNS
        );
        let users = with_timeout(
            timeout,
            sqlx::query_as::<_, UserEntity>(&sql)
                .bind(status)
                .bind(limit)
                .fetch_all(&self.pool),
        )
        .await?;

        let count = with_timeout(
            timeout,
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR status = $1)",
            )
            .bind(status)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok((users, count))
    }

    async fn insert(&self, user: &UserEntity, timeout: Duration) -> Result<(), ServiceError> {
        let sql = format!(
            "INSERT INTO users ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            USER_COLUMNS
        );

        with_timeout(
            timeout,
            sqlx::query(&sql)
                .bind(&user.user_id)
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(&user.email)
                .bind(&user.phone)
                .bind(&user.password)
                .bind(&user.user_type)
                .bind(&user.status)
                .bind(&user.picture_url)
                .bind(user.created_at)
                .bind(user.updated_at)
                .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn update_password(
        &self,
        user_id: &str,
        digest: &str,
        timeout: Duration,
    ) -> Result<UserEntity, ServiceError> {
        let sql = format!(
            "UPDATE users SET password = $2, updated_at = $3 WHERE user_id = $1 RETURNING {}",
            USER_COLUMNS
        );

        with_timeout(
            timeout,
            sqlx::query_as::<_, UserEntity>(&sql)
                .bind(user_id)
                .bind(digest)
                .bind(Utc::now())
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(ServiceError::NotFound)
    }

    async fn update_status(
        &self,
        user_id: &str,
        status: &str,
        timeout: Duration,
    ) -> Result<UserEntity, ServiceError> {
        let sql = format!(
            "UPDATE users SET status = $2, updated_at = $3 WHERE user_id = $1 RETURNING {}",
            USER_COLUMNS
        );

        with_timeout(
            timeout,
            sqlx::query_as::<_, UserEntity>(&sql)
                .bind(user_id)
                .bind(status)
                .bind(Utc::now())
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or(ServiceError::NotFound)
    }
}
