//! 测试用内存缓存实现

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::client::{CacheError, CacheStore, Lookup};

/// 内存缓存，忽略 TTL，过期通过显式删除来模拟
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
    pub set_calls: AtomicUsize,
    fail_sets: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让后续的 set 全部失败，用于验证缓存预热失败不影响读取
    pub fn fail_sets(&self, fail: bool) {
        self.fail_sets.store(fail, Ordering::SeqCst);
    }

    pub fn insert_raw(&self, key: &str, value: Vec<u8>) {
        self.entries.lock().unwrap().insert(key.to_string(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str, _timeout: Duration) -> Result<Lookup, CacheError> {
        match self.entries.lock().unwrap().get(key) {
            Some(bytes) => Ok(Lookup::Hit(bytes.clone())),
            None => Ok(Lookup::Miss),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        _ttl: Duration,
        _timeout: Duration,
    ) -> Result<(), CacheError> {
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(CacheError::Timeout);
        }
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str, _timeout: Duration) -> Result<bool, CacheError> {
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }
}

/// 始终返回传输错误的缓存，用于验证故障不会被当成未命中
pub struct BrokenCache;

#[async_trait]
impl CacheStore for BrokenCache {
    async fn get(&self, _key: &str, _timeout: Duration) -> Result<Lookup, CacheError> {
        Err(CacheError::Timeout)
    }

    async fn set(
        &self,
        _key: &str,
        _value: Vec<u8>,
        _ttl: Duration,
        _timeout: Duration,
    ) -> Result<(), CacheError> {
        Err(CacheError::Timeout)
    }

    async fn delete(&self, _key: &str, _timeout: Duration) -> Result<bool, CacheError> {
        Err(CacheError::Timeout)
    }
}
