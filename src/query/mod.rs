// 旁路缓存查询层
// 列表类读取先查缓存，未命中再回源并预热

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::cache::client::{CacheStore, Lookup};
use crate::error::ServiceError;

/// 响应数据来源标记，字面值是对外契约的一部分，不可改动
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "database")]
    Database,
    #[serde(rename = "cache_memory")]
    CacheMemory,
}

/// 一页列表结果及其来源
#[derive(Debug, Serialize, Deserialize)]
pub struct ListPage<T> {
    pub data: Vec<T>,
    pub count: i64,
    pub source: Source,
}

/// 旁路缓存读取
///
/// 未命中时调用 loader 回源，loader 的错误原样向上传；回源成功后预热缓存，
/// 预热失败只记日志，绝不让已经拿到的结果失败。缓存传输错误不会退化成回源，
/// 那样会掩盖缓存故障；命中但数据损坏同样直接暴露。
pub async fn list_with_cache<T, F, Fut>(
    cache: &dyn CacheStore,
    key: &str,
    ttl: Duration,
    timeout: Duration,
    loader: F,
) -> Result<ListPage<T>, ServiceError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(Vec<T>, i64), ServiceError>>,
{
    match cache.get(key, timeout).await? {
        Lookup::Hit(bytes) => {
            let mut page: ListPage<T> = serde_json::from_slice(&bytes)?;
            page.source = Source::CacheMemory;
            Ok(page)
        }
        Lookup::Miss => {
            let (data, count) = loader().await?;
            let page = ListPage {
                data,
                count,
                source: Source::Database,
            };

            match serde_json::to_vec(&page) {
                Ok(bytes) => {
                    if let Err(e) = cache.set(key, bytes, ttl, timeout).await {
                        tracing::warn!(cache_key = key, error = %e, "list cache warm-up failed");
                    }
                }
                Err(e) => {
                    tracing::warn!(cache_key = key, error = %e, "list snapshot serialization failed");
                }
            }

            Ok(page)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cache::memory::{BrokenCache, MemoryCache};

    const TTL: Duration = Duration::from_secs(30);
    const TIMEOUT: Duration = Duration::from_secs(5);

    fn loader(
        calls: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> std::future::Ready<Result<(Vec<String>, i64), ServiceError>> {
        let calls = calls.clone();
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok((vec!["a".to_string(), "b".to_string()], 2)))
        }
    }

    #[tokio::test]
    async fn miss_loads_from_store_and_warms_cache() {
        let cache = MemoryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let page = list_with_cache::<String, _, _>(&cache, "k", TTL, TIMEOUT, loader(&calls))
            .await
            .unwrap();

        assert_eq!(page.source, Source::Database);
        assert_eq!(page.count, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains("k"));
    }

    #[tokio::test]
    async fn hit_serves_cache_without_invoking_loader() {
        let cache = MemoryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = list_with_cache::<String, _, _>(&cache, "k", TTL, TIMEOUT, loader(&calls))
            .await
            .unwrap();
        let second = list_with_cache::<String, _, _>(&cache, "k", TTL, TIMEOUT, loader(&calls))
            .await
            .unwrap();

        assert_eq!(second.source, Source::CacheMemory);
        assert_eq!(second.data, first.data);
        assert_eq!(second.count, first.count);
        // 第二次命中缓存，loader 没有被再次调用
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expiry_reinvokes_loader() {
        let cache = MemoryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        list_with_cache::<String, _, _>(&cache, "k", TTL, TIMEOUT, loader(&calls))
            .await
            .unwrap();
        // 用显式删除模拟 TTL 到期
        cache.delete("k", TIMEOUT).await.unwrap();

        let page = list_with_cache::<String, _, _>(&cache, "k", TTL, TIMEOUT, loader(&calls))
            .await
            .unwrap();

        assert_eq!(page.source, Source::Database);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn transport_error_is_not_treated_as_miss() {
        let calls = Arc::new(AtomicUsize::new(0));

        let result =
            list_with_cache::<String, _, _>(&BrokenCache, "k", TTL, TIMEOUT, loader(&calls)).await;

        assert!(matches!(result, Err(ServiceError::CacheUnavailable(_))));
        // 缓存故障不回源，否则会掩盖缓存故障本身
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_surfaced() {
        let cache = MemoryCache::new();
        cache.insert_raw("k", b"{not json".to_vec());
        let calls = Arc::new(AtomicUsize::new(0));

        let result =
            list_with_cache::<String, _, _>(&cache, "k", TTL, TIMEOUT, loader(&calls)).await;

        assert!(matches!(result, Err(ServiceError::Serialization(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_warm_up_does_not_fail_the_read() {
        let cache = MemoryCache::new();
        cache.fail_sets(true);
        let calls = Arc::new(AtomicUsize::new(0));

        let page = list_with_cache::<String, _, _>(&cache, "k", TTL, TIMEOUT, loader(&calls))
            .await
            .unwrap();

        assert_eq!(page.source, Source::Database);
        assert_eq!(page.count, 2);
    }
}
