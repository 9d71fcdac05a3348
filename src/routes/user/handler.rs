use std::str::FromStr;

use axum::{
    Extension,
    extract::{Json, Path, Query, State},
};

use crate::{
    AppState,
    database::models::user::{ListUsersFilter, UserEntity, UserStatus},
    error::ServiceError,
    middleware::AuthSession,
    query::ListPage,
    result::ApiResult,
    service::user::RegisterUser,
};

use super::model::{
    ForgotPasswordRequest, ForgotPasswordResponse, ListUsersQuery, LoginRequest, LoginResponse,
    RegisterRequest, ResetPasswordRequest, UserResponse,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResult<UserResponse>>, ServiceError> {
    let user = state
        .users
        .register(RegisterUser {
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            password: req.password,
            user_type: req.user_type,
        })
        .await?;

    Ok(Json(ApiResult::success(user.into())))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResult<LoginResponse>>, ServiceError> {
    let (user, token) = state.users.login(&req.email, &req.password).await?;

    Ok(Json(ApiResult::success(LoginResponse {
        token,
        user: user.into(),
    })))
}

#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthSession>,
) -> Result<Json<ApiResult<()>>, ServiceError> {
    state.users.logout(&auth.token).await?;
    Ok(Json(ApiResult::success(())))
}

#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResult<ForgotPasswordResponse>>, ServiceError> {
    let (user, reset_token) = state.users.forgot_password(&req.email).await?;

    Ok(Json(ApiResult::success(ForgotPasswordResponse {
        reset_token,
        user: user.into(),
    })))
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResult<UserResponse>>, ServiceError> {
    let user = state
        .users
        .reset_password(&req.token, &req.password, &req.confirm_password)
        .await?;

    Ok(Json(ApiResult::success(user.into())))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResult<ListPage<UserEntity>>>, ServiceError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(
            UserStatus::from_str(raw)
                .map_err(|_| ServiceError::Validation(format!("无法识别的状态: {}", raw)))?,
        ),
        None => None,
    };

    let page = state
        .users
        .list_users(ListUsersFilter {
            status,
            limit: query.limit,
        })
        .await?;

    Ok(Json(ApiResult::success(page)))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResult<UserResponse>>, ServiceError> {
    let user = state.users.get_user(&user_id).await?;
    Ok(Json(ApiResult::success(user.into())))
}

#[axum::debug_handler]
pub async fn deactivate(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResult<UserResponse>>, ServiceError> {
    let user = state
        .users
        .set_status(&user_id, UserStatus::Deactivated)
        .await?;
    Ok(Json(ApiResult::success(user.into())))
}

#[axum::debug_handler]
pub async fn activate(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResult<UserResponse>>, ServiceError> {
    let user = state
        .users
        .set_status(&user_id, UserStatus::Activated)
        .await?;
    Ok(Json(ApiResult::success(user.into())))
}
