use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::cache::client::CacheStore;
use crate::cache::keys;
use crate::config::Config;
use crate::database::models::user::{ListUsersFilter, UserEntity, UserStatus};
use crate::database::repositories::user::{UserField, UserStore};
use crate::error::ServiceError;
use crate::query::{self, ListPage};
use crate::session::manager::{NewSession, SessionManager, UnitOfValidity};
use crate::utils;

const DEFAULT_USER_TYPE: &str = "USER";
const MIN_PASSWORD_LEN: usize = 8;

/// 注册请求载荷
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub user_type: Option<String>,
}

/// 用户服务，编排注册、登录、登出、密码重置和列表查询
pub struct UserService {
    store: Arc<dyn UserStore>,
    cache: Arc<dyn CacheStore>,
    sessions: Arc<SessionManager>,
    op_timeout: Duration,
    list_cache_ttl: Duration,
    session_ttl: Duration,
    session_validity_hours: i64,
    reset_token_ttl: Duration,
    reset_token_validity_mins: i64,
}

impl UserService {
    pub fn new(
        store: Arc<dyn UserStore>,
        cache: Arc<dyn CacheStore>,
        sessions: Arc<SessionManager>,
        config: &Config,
    ) -> Self {
        Self {
            store,
            cache,
            sessions,
            op_timeout: config.op_timeout(),
            list_cache_ttl: config.list_cache_ttl(),
            session_ttl: config.session_ttl(),
            session_validity_hours: config.session_validity_hours,
            reset_token_ttl: config.reset_token_ttl(),
            reset_token_validity_mins: config.reset_token_validity_mins,
        }
    }

    /// 注册新用户：校验、手机号规整、查重、散列密码后落库
    pub async fn register(&self, payload: RegisterUser) -> Result<UserEntity, ServiceError> {
        validate_register(&payload)?;
        let phone = utils::normalize_phone(&payload.phone)?;

        if self
            .store
            .find_by_field(UserField::Email, &payload.email, self.op_timeout)
            .await?
            .is_some()
        {
            return Err(ServiceError::DuplicateRecord);
        }
        if self
            .store
            .find_by_field(UserField::Phone, &phone, self.op_timeout)
            .await?
            .is_some()
        {
            return Err(ServiceError::DuplicateRecord);
        }

        let digest = utils::hash_password(&payload.password)?;
        let now = Utc::now();
        let user = UserEntity {
            user_id: Uuid::new_v4().to_string(),
            picture_url: utils::picture_url_from_name(&payload.first_name, &payload.last_name),
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            phone,
            password: Some(digest),
            user_type: payload
                .user_type
                .unwrap_or_else(|| DEFAULT_USER_TYPE.to_string()),
            status: UserStatus::Activated.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        self.store.insert(&user, self.op_timeout).await?;
        tracing::info!(user_id = %user.user_id, "user registered");
        Ok(user)
    }

    /// 登录成功后创建会话并把令牌交给调用方
    /// 查无此人和密码不对折叠成同一个错误，不泄露到底哪一半错了
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserEntity, String), ServiceError> {
        let user = match self
            .store
            .find_by_field(UserField::Email, email, self.op_timeout)
            .await?
        {
            Some(user) => user,
            None => {
                tracing::debug!("login rejected, email not registered");
                return Err(ServiceError::AuthenticationFailed);
            }
        };

        let verified = user
            .password
            .as_deref()
            .map(|digest| utils::verify_password(password, digest).unwrap_or(false))
            .unwrap_or(false);
        if !verified {
            tracing::debug!(user_id = %user.user_id, "login rejected, password mismatch");
            return Err(ServiceError::AuthenticationFailed);
        }

        let token = self
            .sessions
            .create_session(
                self.session_ttl,
                NewSession {
                    user_id: user.user_id.clone(),
                    role: user.user_type.clone(),
                    email: user.email.clone(),
                    first_name: user.first_name.clone(),
                    last_name: user.last_name.clone(),
                    validity: self.session_validity_hours,
                    unit_of_validity: UnitOfValidity::Hour,
                },
            )
            .await?;

        Ok((user, token))
    }

    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        self.sessions.destroy_session(token).await
    }

    /// 发起密码重置：为该用户创建一个短时效的重置会话
    /// 令牌如何送达用户（邮件等）不在本服务职责内
    pub async fn forgot_password(
        &self,
        email: &str,
    ) -> Result<(UserEntity, String), ServiceError> {
        let user = self
            .store
            .find_by_field(UserField::Email, email, self.op_timeout)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let reset_token = self
            .sessions
            .create_session(
                self.reset_token_ttl,
                NewSession {
                    user_id: user.user_id.clone(),
                    role: user.user_type.clone(),
                    email: user.email.clone(),
                    first_name: user.first_name.clone(),
                    last_name: user.last_name.clone(),
                    validity: self.reset_token_validity_mins,
                    unit_of_validity: UnitOfValidity::Minute,
                },
            )
            .await?;

        Ok((user, reset_token))
    }

    /// 凭重置令牌设置新密码，新密码必须不同于旧密码
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<UserEntity, ServiceError> {
        if password != confirm_password {
            return Err(ServiceError::Validation(
                "密码与确认密码不一致".to_string(),
            ));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(ServiceError::Validation(format!(
                "密码长度至少 {} 位",
                MIN_PASSWORD_LEN
            )));
        }

        let session = self.sessions.get_session_by_token(token).await?;

        let user = self
            .store
            .find_by_field(UserField::UserId, &session.user_id, self.op_timeout)
            .await?
            .ok_or(ServiceError::NotFound)?;

        let same = user
            .password
            .as_deref()
            .map(|digest| utils::verify_password(password, digest).unwrap_or(false))
            .unwrap_or(false);
        if same {
            return Err(ServiceError::PasswordIsSame);
        }

        let digest = utils::hash_password(password)?;
        let updated = self
            .store
            .update_password(&user.user_id, &digest, self.op_timeout)
            .await?;

        // 重置完成后顺手销毁重置令牌，失败不影响结果
        if let Err(e) = self.sessions.destroy_session(token).await {
            tracing::warn!(error = %e, "failed to destroy reset token after password reset");
        }

        tracing::info!(user_id = %updated.user_id, "password reset completed");
        Ok(updated)
    }

    /// 用户列表，经过旁路缓存；所有过滤条件共享同一个缓存键
    pub async fn list_users(
        &self,
        filter: ListUsersFilter,
    ) -> Result<ListPage<UserEntity>, ServiceError> {
        query::list_with_cache(
            self.cache.as_ref(),
            &keys::users_list_key(),
            self.list_cache_ttl,
            self.op_timeout,
            || async { self.store.list(&filter, self.op_timeout).await },
        )
        .await
    }

    pub async fn get_user(&self, user_id: &str) -> Result<UserEntity, ServiceError> {
        self.store
            .find_by_field(UserField::UserId, user_id, self.op_timeout)
            .await?
            .ok_or(ServiceError::NotFound)
    }

    pub async fn set_status(
        &self,
        user_id: &str,
        status: UserStatus,
    ) -> Result<UserEntity, ServiceError> {
        let updated = self
            .store
            .update_status(user_id, status.as_str(), self.op_timeout)
            .await?;
        tracing::info!(user_id = %updated.user_id, status = status.as_str(), "user status updated");
        Ok(updated)
    }
}

fn validate_register(payload: &RegisterUser) -> Result<(), ServiceError> {
    let missing = |name: &str| ServiceError::Validation(format!("{} 不能为空", name));

    if payload.first_name.trim().is_empty() {
        return Err(missing("first_name"));
    }
    if payload.last_name.trim().is_empty() {
        return Err(missing("last_name"));
    }
    if payload.email.trim().is_empty() {
        return Err(missing("email"));
    }
    if !payload.email.contains('@') {
        return Err(ServiceError::Validation("邮箱格式不正确".to_string()));
    }
    if payload.phone.trim().is_empty() {
        return Err(missing("phone"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ServiceError::Validation(format!(
            "密码长度至少 {} 位",
            MIN_PASSWORD_LEN
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::memory::MemoryCache;
    use crate::session::token::TokenCodec;

    /// 测试用内存用户存储
    #[derive(Default)]
    struct MemUserStore {
        users: Mutex<Vec<UserEntity>>,
    }

    #[async_trait]
    impl UserStore for MemUserStore {
        async fn find_by_field(
            &self,
            field: UserField,
            value: &str,
            _timeout: Duration,
        ) -> Result<Option<UserEntity>, ServiceError> {
            let users = self.users.lock().unwrap();
            Ok(users
                .iter()
                .find(|u| match field {
                    UserField::UserId => u.user_id == value,
                    UserField::Email => u.email == value,
                    UserField::Phone => u.phone == value,
                })
                .cloned())
        }

        async fn list(
            &self,
            filter: &ListUsersFilter,
            _timeout: Duration,
        ) -> Result<(Vec<UserEntity>, i64), ServiceError> {
            let users = self.users.lock().unwrap();
            let matching: Vec<UserEntity> = users
                .iter()
                .filter(|u| {
                    filter
                        .status
                        .map(|s| u.status == s.as_str())
                        .unwrap_or(true)
                })
                .cloned()
                .collect();
            let count = matching.len() as i64;
            Ok((matching, count))
        }

        async fn insert(&self, user: &UserEntity, _timeout: Duration) -> Result<(), ServiceError> {
            self.users.lock().unwrap().push(user.clone());
            Ok(())
        }

        async fn update_password(
            &self,
            user_id: &str,
            digest: &str,
            _timeout: Duration,
        ) -> Result<UserEntity, ServiceError> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .iter_mut()
                .find(|u| u.user_id == user_id)
                .ok_or(ServiceError::NotFound)?;
            user.password = Some(digest.to_string());
            user.updated_at = Utc::now();
            Ok(user.clone())
        }

        async fn update_status(
            &self,
            user_id: &str,
            status: &str,
            _timeout: Duration,
        ) -> Result<UserEntity, ServiceError> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .iter_mut()
                .find(|u| u.user_id == user_id)
                .ok_or(ServiceError::NotFound)?;
            user.status = status.to_string();
            user.updated_at = Utc::now();
            Ok(user.clone())
        }
    }

    fn test_config() -> Config {
        Config {
            database_url: String::new(),
            redis_url: String::new(),
            jwt_secret: "test-secret".to_string(),
            server_host: String::new(),
            server_port: 0,
            op_timeout_secs: 5,
            session_validity_hours: 1,
            reset_token_validity_mins: 15,
            list_cache_ttl_secs: 30,
        }
    }

    fn service() -> (UserService, Arc<SessionManager>) {
        let config = test_config();
        let cache: Arc<MemoryCache> = Arc::new(MemoryCache::new());
        let sessions = Arc::new(SessionManager::new(
            cache.clone(),
            TokenCodec::new(&config.jwt_secret),
            config.op_timeout(),
        ));
        let service = UserService::new(
            Arc::new(MemUserStore::default()),
            cache,
            sessions.clone(),
            &config,
        );
        (service, sessions)
    }

    fn register_payload() -> RegisterUser {
        RegisterUser {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "a@b.com".to_string(),
            phone: "+8613800138000".to_string(),
            password: "correct-horse".to_string(),
            user_type: None,
        }
    }

    #[tokio::test]
    async fn register_defaults_role_and_hashes_password() {
        let (service, _) = service();
        let user = service.register(register_payload()).await.unwrap();

        assert_eq!(user.user_type, "USER");
        assert_eq!(user.status, "ACTIVATED");
        // 存的是摘要而不是明文
        let digest = user.password.as_deref().unwrap();
        assert_ne!(digest, "correct-horse");
        assert!(utils::verify_password("correct-horse", digest).unwrap());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let (service, _) = service();
        service.register(register_payload()).await.unwrap();

        let mut again = register_payload();
        again.phone = "+8613900139000".to_string();
        assert!(matches!(
            service.register(again).await,
            Err(ServiceError::DuplicateRecord)
        ));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_phone() {
        let (service, _) = service();
        service.register(register_payload()).await.unwrap();

        let mut again = register_payload();
        again.email = "c@d.com".to_string();
        // 同一号码换个写法，规整后仍然撞重
        again.phone = "+86 138-0013-8000".to_string();
        assert!(matches!(
            service.register(again).await,
            Err(ServiceError::DuplicateRecord)
        ));
    }

    #[tokio::test]
    async fn register_rejects_short_password() {
        let (service, _) = service();
        let mut payload = register_payload();
        payload.password = "short".to_string();
        assert!(matches!(
            service.register(payload).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn login_returns_usable_session_token() {
        let (service, sessions) = service();
        service.register(register_payload()).await.unwrap();

        let (user, token) = service.login("a@b.com", "correct-horse").await.unwrap();
        assert_eq!(user.email, "a@b.com");
        assert_eq!(token.split('.').count(), 3);

        let session = sessions.get_session_by_token(&token).await.unwrap();
        assert_eq!(session.user_id, user.user_id);
        assert_eq!(session.role, "USER");
        assert_eq!(session.email, "a@b.com");
    }

    #[tokio::test]
    async fn login_failures_collapse_to_one_error() {
        let (service, _) = service();
        service.register(register_payload()).await.unwrap();

        assert!(matches!(
            service.login("nobody@b.com", "correct-horse").await,
            Err(ServiceError::AuthenticationFailed)
        ));
        assert!(matches!(
            service.login("a@b.com", "wrong-password").await,
            Err(ServiceError::AuthenticationFailed)
        ));
    }

    #[tokio::test]
    async fn logout_destroys_the_session() {
        let (service, sessions) = service();
        service.register(register_payload()).await.unwrap();
        let (_, token) = service.login("a@b.com", "correct-horse").await.unwrap();

        service.logout(&token).await.unwrap();
        assert!(matches!(
            sessions.get_session_by_token(&token).await,
            Err(ServiceError::TokenSessionNotFound)
        ));
    }

    #[tokio::test]
    async fn reset_password_rejects_same_password() {
        let (service, _) = service();
        service.register(register_payload()).await.unwrap();
        let (_, reset_token) = service.forgot_password("a@b.com").await.unwrap();

        assert!(matches!(
            service
                .reset_password(&reset_token, "correct-horse", "correct-horse")
                .await,
            Err(ServiceError::PasswordIsSame)
        ));
    }

    #[tokio::test]
    async fn reset_password_flow_updates_digest_and_burns_token() {
        let (service, sessions) = service();
        service.register(register_payload()).await.unwrap();
        let (_, reset_token) = service.forgot_password("a@b.com").await.unwrap();

        let updated = service
            .reset_password(&reset_token, "brand-new-pass", "brand-new-pass")
            .await
            .unwrap();
        assert!(utils::verify_password("brand-new-pass", updated.password.as_deref().unwrap()).unwrap());

        // 重置令牌用过即废
        assert!(matches!(
            sessions.get_session_by_token(&reset_token).await,
            Err(ServiceError::TokenSessionNotFound)
        ));

        // 旧密码失效，新密码可登录
        assert!(service.login("a@b.com", "correct-horse").await.is_err());
        assert!(service.login("a@b.com", "brand-new-pass").await.is_ok());
    }

    #[tokio::test]
    async fn reset_password_rejects_mismatched_confirmation() {
        let (service, _) = service();
        assert!(matches!(
            service.reset_password("token", "one-password", "another-pass").await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn status_flip_round_trips() {
        let (service, _) = service();
        let user = service.register(register_payload()).await.unwrap();

        let off = service
            .set_status(&user.user_id, UserStatus::Deactivated)
            .await
            .unwrap();
        assert_eq!(off.status, "DEACTIVATED");
        let fetched = service.get_user(&user.user_id).await.unwrap();
        assert_eq!(fetched.status, "DEACTIVATED");

        let on = service
            .set_status(&user.user_id, UserStatus::Activated)
            .await
            .unwrap();
        assert_eq!(on.status, "ACTIVATED");
    }

    #[tokio::test]
    async fn get_user_unknown_id_is_not_found() {
        let (service, _) = service();
        assert!(matches!(
            service.get_user("no-such-id").await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            service.set_status("no-such-id", UserStatus::Deactivated).await,
            Err(ServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn list_users_marks_provenance() {
        let (service, _) = service();
        service.register(register_payload()).await.unwrap();

        let first = service.list_users(ListUsersFilter::default()).await.unwrap();
        assert_eq!(first.source, crate::query::Source::Database);
        assert_eq!(first.count, 1);

        let second = service.list_users(ListUsersFilter::default()).await.unwrap();
        assert_eq!(second.source, crate::query::Source::CacheMemory);
        assert_eq!(second.count, 1);
        // 缓存快照里不带密码摘要
        assert!(second.data[0].password.is_none());
    }
}
