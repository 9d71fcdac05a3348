use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Bearer};

use crate::AppState;
use crate::error::ServiceError;
use crate::session::manager::Session;

/// 已认证请求的上下文，由认证中间件注入扩展
#[derive(Clone)]
pub struct AuthSession {
    pub token: String,
    pub session: Session,
}

/// 认证中间件：校验 Bearer 令牌对应的会话仍然有效
pub async fn auth_middleware(
    State(state): State<AppState>,
    TypedHeader(Authorization(bearer)): TypedHeader<Authorization<Bearer>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer.token();
    let session = state.sessions.get_session_by_token(token).await?;

    request.extensions_mut().insert(AuthSession {
        token: token.to_string(),
        session,
    });

    Ok(next.run(request).await)
}
