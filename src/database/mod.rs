// 数据模块
// 包含持久化实体定义和存储库边界

pub mod models;
pub mod repositories;

// 重新导出常用类型，方便其他模块使用
pub use models::product::ProductEntity;
pub use models::user::{UserEntity, UserStatus};
pub use repositories::product::{PgProductStore, ProductStore};
pub use repositories::user::{PgUserStore, UserField, UserStore};
