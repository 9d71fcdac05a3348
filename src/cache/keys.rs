/// 会话缓存键前缀
const SESSION_PREFIX: &str = "session:";

/// 用户列表快照缓存键
const USERS_LIST_KEY: &str = "users:list";

/// 商品列表快照缓存键
const PRODUCTS_LIST_KEY: &str = "products:list";

/// 生成会话缓存键，会话以令牌本身为主键
pub fn session_key(token: &str) -> String {
    format!("{}{}", SESSION_PREFIX, token)
}

/// 所有用户列表查询共享同一个键
pub fn users_list_key() -> String {
    USERS_LIST_KEY.to_string()
}

/// 所有商品列表查询共享同一个键
pub fn products_list_key() -> String {
    PRODUCTS_LIST_KEY.to_string()
}
