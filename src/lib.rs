use std::sync::Arc;

use config::Config;
use service::{ProductService, UserService};
use session::SessionManager;

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod query;
pub mod result;
pub mod routes;
pub mod service;
pub mod session;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: Arc<SessionManager>,
    pub users: Arc<UserService>,
    pub products: Arc<ProductService>,
}
