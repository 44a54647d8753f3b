// ==========================================
// 销售库存分析系统 - 驾驶舱刷新服务
// ==========================================
// 职责: 重算驾驶舱数据集并写回缓存
// 约束:
// - 每个刷新周期只加载一次商品快照，全部数据集由同一份快照计算
// - 各数据集独立计算，单个失败不影响其他数据集
// - 失败时不写缓存（旧值继续提供降级读取），只记录日志
// - 重算期间不持有缓存锁，只有最终 set 需要互斥
// - 参数化键只在最近一个有效期内被读取过时才随周期刷新
// ==========================================

use crate::cache::cache_key::{params, CacheKey, DashboardDataset};
use crate::cache::payload::{DashboardCache, DashboardPayload};
use crate::config::dashboard_config::DashboardConfig;
use crate::domain::product::ProductSnapshot;
use crate::domain::types::DataSource;
use crate::engine::metrics::MetricsEngine;
use crate::engine::restock::RestockEngine;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::product_repo::ProductRepository;
use chrono::{Local, NaiveDate, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// 刷新触发类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefreshTrigger {
    /// 启动预热
    Startup,
    /// 后台定时刷新
    Scheduled,
    /// 手动刷新
    Manual,
}

impl RefreshTrigger {
    pub fn as_str(&self) -> &str {
        match self {
            RefreshTrigger::Startup => "Startup",
            RefreshTrigger::Scheduled => "Scheduled",
            RefreshTrigger::Manual => "Manual",
        }
    }
}

/// 刷新结果状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStatus {
    Success,
    Partial,
    Failed,
}

impl RefreshStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshStatus::Success => "success",
            RefreshStatus::Partial => "partial",
            RefreshStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshFailure {
    pub key: String,
    pub error: String,
}

/// 单次全量刷新报告
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub refresh_id: String,
    pub trigger: RefreshTrigger,
    pub started_at: String,
    pub duration_ms: i64,
    pub refreshed: Vec<String>,
    pub failed: Vec<RefreshFailure>,
}

impl RefreshReport {
    fn begin(trigger: RefreshTrigger) -> Self {
        Self {
            refresh_id: Uuid::new_v4().to_string(),
            trigger,
            started_at: Utc::now().to_rfc3339(),
            duration_ms: 0,
            refreshed: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn status(&self) -> RefreshStatus {
        match (self.refreshed.is_empty(), self.failed.is_empty()) {
            (_, true) => RefreshStatus::Success,
            (false, false) => RefreshStatus::Partial,
            (true, false) => RefreshStatus::Failed,
        }
    }

    fn record(&mut self, key: &CacheKey, outcome: RepositoryResult<Arc<DashboardPayload>>) {
        match outcome {
            Ok(_) => self.refreshed.push(key.encode()),
            Err(e) => {
                tracing::warn!(
                    refresh_id = %self.refresh_id,
                    key = %key,
                    error = %e,
                    "数据集刷新失败，保留旧缓存"
                );
                self.failed.push(RefreshFailure {
                    key: key.encode(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// 快照加载失败: 本周期所有键均未更新
    fn record_snapshot_failure(&mut self, keys: &[CacheKey], error: &RepositoryError) {
        tracing::warn!(
            refresh_id = %self.refresh_id,
            keys = keys.len(),
            error = %error,
            "商品快照加载失败，全部数据集保留旧缓存"
        );
        let message = error.to_string();
        self.failed.extend(keys.iter().map(|key| RefreshFailure {
            key: key.encode(),
            error: message.clone(),
        }));
    }

    fn finish(mut self, start: Instant) -> Self {
        self.duration_ms = start.elapsed().as_millis() as i64;
        tracing::info!(
            refresh_id = %self.refresh_id,
            trigger = self.trigger.as_str(),
            status = self.status().as_str(),
            refreshed = self.refreshed.len(),
            failed = self.failed.len(),
            duration_ms = self.duration_ms,
            "驾驶舱缓存刷新完成"
        );
        self
    }
}

// ==========================================
// DashboardRefreshService
// ==========================================
#[derive(Clone)]
pub struct DashboardRefreshService {
    repo: Arc<ProductRepository>,
    cache: Arc<DashboardCache>,
    config: Arc<DashboardConfig>,
    restock_engine: Arc<RestockEngine>,
    metrics_engine: MetricsEngine,
}

impl DashboardRefreshService {
    pub fn new(
        repo: Arc<ProductRepository>,
        cache: Arc<DashboardCache>,
        config: DashboardConfig,
    ) -> Self {
        let metrics_engine = MetricsEngine::new(config.critical_stock_level);
        let restock_engine = Arc::new(RestockEngine::new(config.clone()));
        Self {
            repo,
            cache,
            config: Arc::new(config),
            restock_engine,
            metrics_engine,
        }
    }

    pub fn cache(&self) -> &Arc<DashboardCache> {
        &self.cache
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// 每次全量刷新必定覆盖的键
    pub fn default_keys(&self) -> Vec<CacheKey> {
        DashboardDataset::ALL
            .iter()
            .map(|dataset| match dataset {
                DashboardDataset::TopProducts => {
                    CacheKey::top_products(self.config.top_products_limit, None)
                }
                other => CacheKey::new(*other),
            })
            .collect()
    }

    /// 需要刷新的键: 默认键 + 最近一个有效期内被读取过的键
    pub fn tracked_keys(&self) -> Vec<CacheKey> {
        let keys: BTreeSet<CacheKey> = self
            .default_keys()
            .into_iter()
            .chain(self.cache.keys_read_within(self.config.cache_ttl()))
            .collect();
        keys.into_iter().collect()
    }

    // ==========================================
    // 单数据集重算
    // ==========================================

    /// 由快照计算数据集（纯计算）
    ///
    /// # 返回
    /// - Err(InvalidCacheKey): 键参数无法解析或超出范围
    pub fn compute_from_snapshot(
        &self,
        key: &CacheKey,
        snapshot: &ProductSnapshot,
        as_of: NaiveDate,
    ) -> RepositoryResult<DashboardPayload> {
        let payload = match key.dataset() {
            DashboardDataset::Metrics => {
                DashboardPayload::Metrics(self.metrics_engine.compute_metrics(snapshot))
            }
            DashboardDataset::CategorySummary => {
                DashboardPayload::CategorySummary(self.metrics_engine.category_summary(snapshot))
            }
            DashboardDataset::TopProducts => {
                let (limit, source) = self.top_products_params(key)?;
                let products = match source {
                    Some(source) => {
                        let filtered = ProductSnapshot {
                            records: snapshot.records.clone(),
                            sales: snapshot
                                .sales
                                .iter()
                                .filter(|s| s.source == source)
                                .cloned()
                                .collect(),
                        };
                        self.metrics_engine.top_products(&filtered, limit)
                    }
                    None => self.metrics_engine.top_products(snapshot, limit),
                };
                DashboardPayload::TopProducts(products)
            }
            DashboardDataset::RestockWorklist => DashboardPayload::RestockWorklist(
                self.restock_engine.build_worklist(snapshot, as_of),
            ),
            DashboardDataset::WarehouseSummary => {
                let worklist = self.restock_engine.build_worklist(snapshot, as_of);
                DashboardPayload::WarehouseSummary(
                    self.metrics_engine.warehouse_summary(snapshot, &worklist),
                )
            }
        };
        Ok(payload)
    }

    /// 解析热销商品键参数（limit 缺省取配置默认值）
    fn top_products_params(
        &self,
        key: &CacheKey,
    ) -> RepositoryResult<(usize, Option<DataSource>)> {
        let limit = match key.param(params::LIMIT) {
            None => self.config.top_products_limit,
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=self.config.source_row_limit).contains(n))
                .ok_or_else(|| RepositoryError::InvalidCacheKey(key.encode()))?,
        };
        let source = match key.param(params::SOURCE) {
            None => None,
            Some(raw) => Some(
                DataSource::parse(raw).ok_or_else(|| RepositoryError::InvalidCacheKey(key.encode()))?,
            ),
        };
        Ok((limit, source))
    }

    /// 由快照计算并写回缓存
    fn store_from_snapshot(
        &self,
        key: &CacheKey,
        snapshot: &ProductSnapshot,
        as_of: NaiveDate,
    ) -> RepositoryResult<Arc<DashboardPayload>> {
        let payload = Arc::new(self.compute_from_snapshot(key, snapshot, as_of)?);
        self.cache.set(key.clone(), payload.clone());
        Ok(payload)
    }

    /// 重算单个数据集并写回缓存（阻塞: 会访问外部数据源）
    ///
    /// # 返回
    /// - Ok(payload): 新值（已写入缓存）
    /// - Err: 重算失败，缓存保持不变
    pub fn refresh_key(&self, key: &CacheKey) -> RepositoryResult<Arc<DashboardPayload>> {
        let start = Instant::now();
        let snapshot = self.repo.load_snapshot()?;
        let payload = self.store_from_snapshot(key, &snapshot, Local::now().date_naive())?;

        tracing::debug!(
            key = %key,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "数据集已重算"
        );
        Ok(payload)
    }

    // ==========================================
    // 全量刷新
    // ==========================================

    /// 同步刷新全部跟踪键（一次快照，逐个计算）
    pub fn refresh_all(&self, trigger: RefreshTrigger) -> RefreshReport {
        let start = Instant::now();
        let mut report = RefreshReport::begin(trigger);
        let keys = self.tracked_keys();

        match self.repo.load_snapshot() {
            Ok(snapshot) => {
                let as_of = Local::now().date_naive();
                for key in &keys {
                    let outcome = self.store_from_snapshot(key, &snapshot, as_of);
                    report.record(key, outcome);
                }
            }
            Err(e) => report.record_snapshot_failure(&keys, &e),
        }

        report.finish(start)
    }

    /// 并发刷新全部跟踪键
    ///
    /// 快照加载与各数据集计算都放入 spawn_blocking
    pub async fn refresh_all_async(&self, trigger: RefreshTrigger) -> RefreshReport {
        let start = Instant::now();
        let mut report = RefreshReport::begin(trigger);
        let keys = self.tracked_keys();

        let repo = self.repo.clone();
        let loaded = tokio::task::spawn_blocking(move || repo.load_snapshot())
            .await
            .unwrap_or_else(|join_err| Err(join_failure(join_err)));
        let snapshot = match loaded {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                report.record_snapshot_failure(&keys, &e);
                return report.finish(start);
            }
        };

        let as_of = Local::now().date_naive();
        let handles = keys.iter().cloned().map(|key| {
            let service = self.clone();
            let snapshot = snapshot.clone();
            tokio::task::spawn_blocking(move || service.store_from_snapshot(&key, &snapshot, as_of))
        });
        let outcomes = join_all(handles).await;

        for (key, outcome) in keys.iter().zip(outcomes) {
            let outcome = outcome.unwrap_or_else(|join_err| Err(join_failure(join_err)));
            report.record(key, outcome);
        }

        report.finish(start)
    }
}

fn join_failure(err: tokio::task::JoinError) -> RepositoryError {
    RepositoryError::InternalError(format!("刷新任务异常退出: {}", err))
}
