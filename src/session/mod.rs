// 会话模块
// 令牌编解码与会话生命周期管理

pub mod manager;
pub mod token;

pub use manager::{NewSession, Session, SessionManager, UnitOfValidity};
pub use token::{Claims, TokenCodec};
