use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServiceError;

const TOKEN_ISSUER: &str = "marketplace-backend";
const TOKEN_SUBJECT: &str = "session";
const TOKEN_AUDIENCE: &str = "marketplace";

/// 会话令牌中签名保护的声明载荷
/// 固定结构，解码时缺少字段直接判为无效令牌
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub role: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    pub fn new(user_id: &str, role: &str, email: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            role: role.to_string(),
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            iss: TOKEN_ISSUER.to_string(),
            sub: TOKEN_SUBJECT.to_string(),
            aud: TOKEN_AUDIENCE.to_string(),
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

/// HS256 令牌编解码器
/// 密钥在构造时注入一次，进程生命周期内不再读取环境
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 过期判断只有一个事实来源：缓存 TTL 加上会话管理器的读取时校验，
        // 令牌本身不携带 exp
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims::<&str>(&[]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// 序列化声明并签名，返回 header.payload.signature 形式的令牌
    pub fn sign(&self, claims: &Claims) -> Result<String, ServiceError> {
        encode(&Header::default(), claims, &self.encoding).map_err(ServiceError::Signing)
    }

    /// 重新计算签名并校验，任何畸形或被篡改的输入都是无效令牌
    pub fn verify(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "token verification failed");
                ServiceError::TokenInvalid
            })
    }
}
