// 业务服务模块
// HTTP 层只与这里的服务交互

pub mod product;
pub mod user;

pub use product::{NewProduct, ProductService};
pub use user::{RegisterUser, UserService};
