use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use marketplace_backend::{
    AppState,
    cache::{CacheStore, RedisCache},
    config::Config,
    database::{PgProductStore, PgUserStore},
    middleware::{auth_middleware, log_errors},
    routes,
    service::{ProductService, UserService},
    session::{SessionManager, TokenCodec},
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    // 设置 Redis 客户端
    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");
    let cache: Arc<dyn CacheStore> = Arc::new(RedisCache::new(redis_client));

    // 会话管理器，签名密钥只在这里注入一次
    let sessions = Arc::new(SessionManager::new(
        cache.clone(),
        TokenCodec::new(&config.jwt_secret),
        config.op_timeout(),
    ));

    // 业务服务
    let users = Arc::new(UserService::new(
        Arc::new(PgUserStore::new(pool.clone())),
        cache.clone(),
        sessions.clone(),
        &config,
    ));
    let products = Arc::new(ProductService::new(
        Arc::new(PgProductStore::new(pool)),
        cache,
        &config,
    ));

    // 设置应用状态
    let state = AppState {
        config: config.clone(),
        sessions,
        users,
        products,
    };

    // 将路由分为公开路由和受保护路由
    let public_routes = Router::new()
        .route("/users/register", post(routes::user::handler::register))
        .route("/users/login", post(routes::user::handler::login))
        .route(
            "/users/forgot-password",
            post(routes::user::handler::forgot_password),
        )
        .route(
            "/users/reset-password",
            post(routes::user::handler::reset_password),
        )
        .route("/users", get(routes::user::handler::list_users))
        .route("/users/{user_id}", get(routes::user::handler::get_user))
        .route("/products", get(routes::product::handler::list_products));

    let protected_routes = Router::new()
        .route("/users/logout", delete(routes::user::handler::logout))
        .route(
            "/users/{user_id}/deactivate",
            put(routes::user::handler::deactivate),
        )
        .route(
            "/users/{user_id}/activate",
            put(routes::user::handler::activate),
        )
        .route(
            "/products/create",
            post(routes::product::handler::create_product),
        )
        // 应用认证中间件
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(log_errors));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    // 添加应用状态
    let app = router.with_state(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app,
    )
    .await
    .expect("Failed to start server");
}
