//! 带过期时间的内存缓存
//!
//! 每个条目保存绝对过期时间，读取时惰性淘汰，没有后台清理任务。
//! 整个表由一把互斥锁保护，可在多个 worker 间共享。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// 默认缓存时间：5 分钟
pub const DEFAULT_TTL_SECS: u64 = 300;

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct ExpiringCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
}

impl<V: Clone> ExpiringCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 读取未过期的值；已过期的条目会被删除
    pub fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            log::debug!("缓存 {} 已过期，移除", key);
            entries.remove(key);
        }
        None
    }

    /// 按默认 TTL 写入
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.ttl);
    }

    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.lock().insert(key.into(), CacheEntry { value, expires_at });
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// 当前条目数（含尚未被淘汰的过期条目）
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // 持锁期间不会 panic，被污染的锁里数据仍然完整
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<V: Clone> Default for ExpiringCache<V> {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_get_within_ttl() {
        let cache = ExpiringCache::new(Duration::from_secs(60));
        cache.set("AAPL", "apple".to_string());
        assert_eq!(cache.get("AAPL"), Some("apple".to_string()));
        assert_eq!(cache.get("MSFT"), None);
    }

    #[test]
    fn test_expired_entry_is_removed() {
        let cache = ExpiringCache::new(Duration::from_millis(20));
        cache.set("AAPL", 1);
        thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.get("AAPL"), None);
        assert!(cache.is_empty());

        cache.set("AAPL", 2);
        assert_eq!(cache.get("AAPL"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_set_with_ttl_overrides_default() {
        let cache = ExpiringCache::new(Duration::from_secs(60));
        cache.set_with_ttl("TSLA", 7, Duration::ZERO);
        assert_eq!(cache.get("TSLA"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_clear() {
        let cache = ExpiringCache::default();
        cache.set("A", 1);
        cache.set("B", 2);
        assert_eq!(cache.ttl(), Duration::from_secs(DEFAULT_TTL_SECS));

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("A"), None);
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = Arc::new(ExpiringCache::new(Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for _ in 0..100 {
                        cache.set("KEY", vec![i; 16]);
                        let v = cache.get("KEY").unwrap();
                        assert!(v.iter().all(|x| *x == v[0]));
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 1);
    }
}
