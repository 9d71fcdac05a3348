// 缓存模块
// 包含缓存客户端边界和缓存键生成

pub mod client;
pub mod keys;

#[cfg(test)]
pub mod memory;

// 重新导出常用类型，方便其他模块使用
pub use client::{CacheError, CacheStore, Lookup, RedisCache};
