// ==========================================
// 销售库存分析系统 - 驾驶舱 API
// ==========================================
// 职责: 对 HTTP 层暴露驾驶舱查询与刷新操作
// 读取路径（read-through）:
//   缓存有效 → 直接返回
//   缓存缺失/过期 → 同步重算并写回缓存
//   重算失败 → 返回旧值；连旧值也没有 → 返回归零默认值
// 并发: 同一个键同时只有一个请求在重算；其余请求有旧值就直接返回旧值，
//       没有旧值则等待重算结束后读取
// 红线: 数据源问题不会变成错误响应，只有参数错误才返回 Err
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::cache::cache_key::CacheKey;
use crate::cache::payload::DashboardPayload;
use crate::cache::ttl_cache::CacheEntryStatus;
use crate::domain::metrics::{
    CategorySummary, DashboardMetrics, ProductPerformance, WarehouseSummary,
};
use crate::domain::restock::{RestockAlert, RestockWorklist};
use crate::domain::types::DataSource;
use crate::services::refresh_service::{DashboardRefreshService, RefreshTrigger};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

// ==========================================
// 响应 DTO
// ==========================================

/// 手动刷新结果
#[derive(Debug, Clone, Serialize)]
pub struct RefreshCacheResponse {
    pub status: String,
    pub refresh_id: String,
    pub refreshed: usize,
    pub failed: usize,
    pub duration_ms: i64,
}

/// 缓存状态
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatusResponse {
    pub ttl_secs: u64,
    pub entries: Vec<CacheEntryStatus>,
}

// ==========================================
// DashboardApi
// ==========================================
pub struct DashboardApi {
    refresh_service: Arc<DashboardRefreshService>,
    // 每个键一把重算锁
    recompute_locks: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl DashboardApi {
    pub fn new(refresh_service: Arc<DashboardRefreshService>) -> Self {
        Self {
            refresh_service,
            recompute_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn refresh_service(&self) -> &Arc<DashboardRefreshService> {
        &self.refresh_service
    }

    fn recompute_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut locks = self
            .recompute_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(key.clone()).or_default().clone()
    }

    /// 带降级的缓存读取
    fn read_through(&self, key: &CacheKey) -> Option<Arc<DashboardPayload>> {
        let cache = self.refresh_service.cache();
        if let Some(payload) = cache.get(key) {
            return Some(payload);
        }

        let lock = self.recompute_lock(key);
        let _guard: MutexGuard<'_, ()> = match lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                if let Some(stale) = cache.get_stale(key) {
                    tracing::debug!(key = %key, "其他请求正在重算，返回旧值");
                    return Some(stale);
                }
                lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
            }
        };

        // 等锁期间可能已被其他请求写回
        if let Some(payload) = cache.get(key) {
            return Some(payload);
        }

        match self.refresh_service.refresh_key(key) {
            Ok(payload) => Some(payload),
            Err(e) => {
                let stale = cache.get_stale(key);
                tracing::warn!(
                    key = %key,
                    error = %e,
                    has_stale = stale.is_some(),
                    "缓存重算失败，使用旧值或默认值"
                );
                stale
            }
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 关键指标
    pub fn get_metrics(&self) -> ApiResult<DashboardMetrics> {
        Ok(self
            .read_through(&CacheKey::metrics())
            .and_then(|p| p.as_metrics().cloned())
            .unwrap_or_default())
    }

    /// 补货预警（前 limit 条，默认 15）
    ///
    /// # 参数
    /// - limit: None 使用配置的默认条数；0 视为无效输入
    pub fn get_restock_alerts(&self, limit: Option<usize>) -> ApiResult<Vec<RestockAlert>> {
        let limit = limit.unwrap_or(self.refresh_service.config().restock_top_n);
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须大于 0".to_string()));
        }
        Ok(self.get_restock_worklist()?.top(limit))
    }

    /// 完整补货清单（未截断）
    pub fn get_restock_worklist(&self) -> ApiResult<RestockWorklist> {
        Ok(self
            .read_through(&CacheKey::restock_worklist())
            .and_then(|p| p.as_restock_worklist().cloned())
            .unwrap_or_default())
    }

    /// 分类汇总
    pub fn get_category_summary(&self) -> ApiResult<CategorySummary> {
        Ok(self
            .read_through(&CacheKey::category_summary())
            .and_then(|p| p.as_category_summary().cloned())
            .unwrap_or_default())
    }

    /// 热销商品
    ///
    /// # 参数
    /// - limit: 1..=单数据源最大行数，None 使用默认值（100）
    /// - source: 可选数据源过滤（POS / ERP）
    pub fn get_top_products(
        &self,
        limit: Option<usize>,
        source: Option<&str>,
    ) -> ApiResult<Vec<ProductPerformance>> {
        let config = self.refresh_service.config();
        let limit = limit.unwrap_or(config.top_products_limit);
        if limit == 0 || limit > config.source_row_limit {
            return Err(ApiError::InvalidInput(format!(
                "limit 必须在 1..={} 之间",
                config.source_row_limit
            )));
        }

        let source = match source.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                DataSource::parse(raw)
                    .ok_or_else(|| ApiError::InvalidInput(format!("未知数据源: {}", raw)))?,
            ),
            None => None,
        };

        Ok(self
            .read_through(&CacheKey::top_products(limit, source))
            .and_then(|p| p.as_top_products().cloned())
            .unwrap_or_default())
    }

    /// 仓储汇总
    pub fn get_warehouse_summary(&self) -> ApiResult<WarehouseSummary> {
        Ok(self
            .read_through(&CacheKey::warehouse_summary())
            .and_then(|p| p.as_warehouse_summary().cloned())
            .unwrap_or_default())
    }

    // ==========================================
    // 操作接口
    // ==========================================

    /// 手动刷新（同步重算全部跟踪键）
    pub fn refresh_cache(&self) -> ApiResult<RefreshCacheResponse> {
        let report = self.refresh_service.refresh_all(RefreshTrigger::Manual);
        Ok(RefreshCacheResponse {
            status: report.status().as_str().to_string(),
            refresh_id: report.refresh_id,
            refreshed: report.refreshed.len(),
            failed: report.failed.len(),
            duration_ms: report.duration_ms,
        })
    }

    /// 缓存状态
    pub fn get_cache_status(&self) -> ApiResult<CacheStatusResponse> {
        let cache = self.refresh_service.cache();
        Ok(CacheStatusResponse {
            ttl_secs: cache.ttl().as_secs(),
            entries: cache.status(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ttl_cache::TtlCache;
    use crate::config::DashboardConfig;
    use crate::repository::error::RepositoryResult;
    use crate::repository::product_repo::ProductRepository;
    use crate::repository::source_adapter::{AggregateRow, Dataset, QueryParams, SourceAdapter};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::time::Duration;

    /// 每次查询固定耗时的空数据源
    struct SlowAdapter {
        delay: Duration,
        fetches: AtomicUsize,
    }

    impl SourceAdapter for SlowAdapter {
        fn source(&self) -> DataSource {
            DataSource::Pos
        }

        fn fetch_aggregate(
            &self,
            _dataset: Dataset,
            _params: &QueryParams,
        ) -> RepositoryResult<Vec<AggregateRow>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            Ok(Vec::new())
        }

        fn ping(&self) -> RepositoryResult<()> {
            Ok(())
        }
    }

    fn api_with(adapter: Arc<SlowAdapter>, ttl: Duration) -> DashboardApi {
        let repo = Arc::new(ProductRepository::new(vec![adapter as Arc<dyn SourceAdapter>]));
        let cache = Arc::new(TtlCache::new(ttl));
        let service = Arc::new(DashboardRefreshService::new(repo, cache, DashboardConfig::default()));
        DashboardApi::new(service)
    }

    #[test]
    fn test_concurrent_misses_share_one_recompute() {
        let adapter = Arc::new(SlowAdapter {
            delay: Duration::from_millis(100),
            fetches: AtomicUsize::new(0),
        });
        let api = Arc::new(api_with(adapter.clone(), Duration::from_secs(300)));
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let api = api.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    api.get_metrics().unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // 一次快照: 销售 + 库存
        assert_eq!(adapter.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stale_value_served_while_recompute_in_flight() {
        let adapter = Arc::new(SlowAdapter {
            delay: Duration::ZERO,
            fetches: AtomicUsize::new(0),
        });
        // 有效期为 0: 条目写入即过期
        let api = api_with(adapter.clone(), Duration::ZERO);
        let key = CacheKey::metrics();
        let old = DashboardMetrics {
            total_products: 7,
            ..DashboardMetrics::default()
        };
        api.refresh_service()
            .cache()
            .set(key.clone(), Arc::new(DashboardPayload::Metrics(old)));

        let lock = api.recompute_lock(&key);
        let _held = lock.lock().unwrap();

        assert_eq!(api.get_metrics().unwrap().total_products, 7);
        assert_eq!(adapter.fetches.load(Ordering::SeqCst), 0);
    }
}
