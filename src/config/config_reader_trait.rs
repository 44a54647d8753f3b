// ==========================================
// 销售库存分析系统 - 驾驶舱配置读取 Trait
// ==========================================
// 职责: 定义驾驶舱所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::dashboard_config::DashboardConfig;
use crate::domain::types::RestockPolicy;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// DashboardConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait DashboardConfigReader: Send + Sync {
    // ===== 缓存配置 =====

    /// 缓存有效期（秒），默认 300
    async fn get_cache_ttl_secs(&self) -> RepositoryResult<u64>;

    // ===== 销售速率与缺货预测 =====

    /// 销售速率观察窗口（天），默认 90
    async fn get_observation_window_days(&self) -> RepositoryResult<i64>;

    /// 慢动销哨兵天数，默认 365
    async fn get_slow_mover_days(&self) -> RepositoryResult<f64>;

    // ===== 补货决策 =====

    /// 补货窗口（天），默认 30
    async fn get_restock_horizon_days(&self) -> RepositoryResult<f64>;

    /// 建议订货覆盖天数，默认 30
    async fn get_replenishment_window_days(&self) -> RepositoryResult<i64>;

    /// 建议订货量下限，默认 10
    async fn get_min_order_qty(&self) -> RepositoryResult<i64>;

    /// 补货预警展示条数，默认 15
    async fn get_restock_top_n(&self) -> RepositoryResult<usize>;

    /// 补货触发策略，默认 PURCHASE_RATE
    async fn get_restock_policy(&self) -> RepositoryResult<RestockPolicy>;

    /// 临界库存，默认 5
    async fn get_critical_stock_level(&self) -> RepositoryResult<i64>;

    // ===== 数据源查询 =====

    /// 外部查询超时（毫秒），默认 30000
    async fn get_query_timeout_ms(&self) -> RepositoryResult<u64>;

    /// 热销商品默认条数，默认 100
    async fn get_top_products_limit(&self) -> RepositoryResult<usize>;

    /// 热销商品 limit 参数上限，默认 1000
    async fn get_source_row_limit(&self) -> RepositoryResult<usize>;

    /// 组装完整配置并校验
    async fn load_dashboard_config(&self) -> RepositoryResult<DashboardConfig> {
        let config = DashboardConfig {
            cache_ttl_secs: self.get_cache_ttl_secs().await?,
            observation_window_days: self.get_observation_window_days().await?,
            restock_horizon_days: self.get_restock_horizon_days().await?,
            replenishment_window_days: self.get_replenishment_window_days().await?,
            min_order_qty: self.get_min_order_qty().await?,
            restock_top_n: self.get_restock_top_n().await?,
            slow_mover_days: self.get_slow_mover_days().await?,
            query_timeout_ms: self.get_query_timeout_ms().await?,
            top_products_limit: self.get_top_products_limit().await?,
            source_row_limit: self.get_source_row_limit().await?,
            critical_stock_level: self.get_critical_stock_level().await?,
            restock_policy: self.get_restock_policy().await?,
        };
        Ok(config.normalized())
    }
}
