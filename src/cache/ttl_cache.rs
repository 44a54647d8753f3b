// ==========================================
// 销售库存分析系统 - TTL 缓存
// ==========================================
// 状态机（每个键）:
//   Absent --set--> Valid --ttl 到期--> Stale --set--> Valid
// 红线:
// - 互斥锁只包住 map 操作，重算/查询期间不持锁
// - set 整体替换条目，读方只会看到旧值或新值
// - Stale 条目不主动删除，只被覆盖
// - 每个条目记录最近一次读取时间，后台刷新据此跳过无人读取的参数化键
// ==========================================

use crate::cache::cache_key::CacheKey;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    last_read: Instant,
}

/// 单个缓存键的状态（用于状态查询接口）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntryStatus {
    pub key: String,
    pub valid: bool,
    pub age_secs: f64,
}

// ==========================================
// TtlCache
// ==========================================
pub struct TtlCache<V> {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // map 上的操作均为单次插入/读取，锁中毒时数据仍然完整，直接沿用
    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_fresh(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.created_at) < self.ttl
    }

    /// 读取有效值（过期或不存在返回 None，不触发重算）
    ///
    /// 过期条目同样记为一次读取
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock();
        let entry = entries.get_mut(key)?;
        entry.last_read = now;
        self.is_fresh(entry, now).then(|| entry.value.clone())
    }

    /// 读取最后一次写入的值（不论是否过期）
    pub fn get_stale(&self, key: &CacheKey) -> Option<V> {
        self.lock().get(key).map(|entry| entry.value.clone())
    }

    /// 写入并重置创建时间
    ///
    /// 覆盖已有条目时沿用其读取时间，后台刷新不算读取
    pub fn set(&self, key: CacheKey, value: V) {
        let now = Instant::now();
        let mut entries = self.lock();
        let last_read = entries.get(&key).map(|e| e.last_read).unwrap_or(now);
        entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                last_read,
            },
        );
    }

    pub fn is_valid(&self, key: &CacheKey) -> bool {
        let now = Instant::now();
        self.lock()
            .get(key)
            .map(|entry| self.is_fresh(entry, now))
            .unwrap_or(false)
    }

    /// 最近 window 内被读取过的键（含过期条目，按键排序）
    pub fn keys_read_within(&self, window: Duration) -> Vec<CacheKey> {
        let now = Instant::now();
        let mut keys: Vec<CacheKey> = self
            .lock()
            .iter()
            .filter(|(_, entry)| now.saturating_duration_since(entry.last_read) <= window)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 各键状态快照（按键排序）
    pub fn status(&self) -> Vec<CacheEntryStatus> {
        let now = Instant::now();
        let entries = self.lock();
        let mut status: Vec<(CacheKey, CacheEntryStatus)> = entries
            .iter()
            .map(|(key, entry)| {
                let age = now.saturating_duration_since(entry.created_at);
                (
                    key.clone(),
                    CacheEntryStatus {
                        key: key.encode(),
                        valid: age < self.ttl,
                        age_secs: age.as_secs_f64(),
                    },
                )
            })
            .collect();
        drop(entries);

        status.sort_by(|a, b| a.0.cmp(&b.0));
        status.into_iter().map(|(_, s)| s).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn test_round_trip_within_ttl() {
        let cache = TtlCache::new(TTL);
        cache.set(CacheKey::metrics(), 42_i64);

        assert_eq!(cache.get(&CacheKey::metrics()), Some(42));
        assert!(cache.is_valid(&CacheKey::metrics()));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get(&CacheKey::metrics()), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_stays_readable_as_stale() {
        let cache = TtlCache::new(TTL);
        cache.set(CacheKey::metrics(), "old".to_string());

        tokio::time::advance(TTL).await;

        assert!(!cache.is_valid(&CacheKey::metrics()));
        assert_eq!(cache.get(&CacheKey::metrics()), None);
        assert_eq!(cache.get_stale(&CacheKey::metrics()).as_deref(), Some("old"));
        assert_eq!(cache.len(), 1);

        cache.set(CacheKey::metrics(), "new".to_string());
        assert!(cache.is_valid(&CacheKey::metrics()));
        assert_eq!(cache.get(&CacheKey::metrics()).as_deref(), Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_resets_created_at() {
        let cache = TtlCache::new(TTL);
        cache.set(CacheKey::metrics(), 1);
        tokio::time::advance(Duration::from_secs(200)).await;
        cache.set(CacheKey::metrics(), 2);
        tokio::time::advance(Duration::from_secs(200)).await;

        assert_eq!(cache.get(&CacheKey::metrics()), Some(2));
        let status = cache.status();
        assert_eq!(status.len(), 1);
        assert!(status[0].valid);
        assert_eq!(status[0].age_secs, 200.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_read_within_tracks_reads_not_writes() {
        let cache = TtlCache::new(TTL);
        let hot = CacheKey::top_products(5, None);
        let cold = CacheKey::top_products(7, None);
        cache.set(hot.clone(), 1);
        cache.set(cold.clone(), 1);

        tokio::time::advance(Duration::from_secs(200)).await;
        cache.get(&hot);
        // 覆盖写入不刷新读取时间
        cache.set(cold.clone(), 2);

        tokio::time::advance(Duration::from_secs(200)).await;
        assert_eq!(cache.keys_read_within(TTL), vec![hot.clone()]);
        assert_eq!(cache.len(), 2);

        // 过期后的读取同样计入
        tokio::time::advance(TTL).await;
        assert!(cache.get(&cold).is_none());
        assert_eq!(cache.keys_read_within(TTL), vec![cold]);
    }

    #[test]
    fn test_absent_key() {
        let cache: TtlCache<i64> = TtlCache::new(TTL);
        assert!(cache.get(&CacheKey::metrics()).is_none());
        assert!(cache.get_stale(&CacheKey::metrics()).is_none());
        assert!(!cache.is_valid(&CacheKey::metrics()));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_readers_never_see_torn_values() {
        // 值由两半组成，写入方始终写入两半相等的值
        let cache: Arc<TtlCache<Arc<(u64, u64)>>> = Arc::new(TtlCache::new(TTL));
        cache.set(CacheKey::metrics(), Arc::new((0, 0)));

        let writer = {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for i in 1..=2_000u64 {
                    cache.set(CacheKey::metrics(), Arc::new((i, i)));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let value = cache.get_stale(&CacheKey::metrics()).unwrap();
                        assert_eq!(value.0, value.1);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(*cache.get(&CacheKey::metrics()).unwrap(), (2_000, 2_000));
    }
}
