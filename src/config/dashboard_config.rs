// ==========================================
// 销售库存分析系统 - 驾驶舱运行参数
// ==========================================
// 职责: 汇总缓存/补货/查询相关参数，并做一次性校验
// 说明: 所有参数均有默认值；非法值回退默认值并记录告警
// ==========================================

use crate::domain::types::RestockPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ==========================================
// 默认值常量
// ==========================================
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_OBSERVATION_WINDOW_DAYS: i64 = 90;
pub const DEFAULT_RESTOCK_HORIZON_DAYS: f64 = 30.0;
pub const DEFAULT_REPLENISHMENT_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_MIN_ORDER_QTY: i64 = 10;
pub const DEFAULT_RESTOCK_TOP_N: usize = 15;
pub const DEFAULT_SLOW_MOVER_DAYS: f64 = 365.0;
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_TOP_PRODUCTS_LIMIT: usize = 100;
pub const DEFAULT_SOURCE_ROW_LIMIT: usize = 1_000;
pub const DEFAULT_CRITICAL_STOCK_LEVEL: i64 = 5;

// ==========================================
// DashboardConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// 缓存有效期（秒），同时作为后台刷新周期
    pub cache_ttl_secs: u64,
    /// 销售速率观察窗口（天）
    pub observation_window_days: i64,
    /// 补货窗口: 缺货天数 <= 该值进入补货清单
    pub restock_horizon_days: f64,
    /// 建议订货量覆盖天数
    pub replenishment_window_days: i64,
    /// 建议订货量下限
    pub min_order_qty: i64,
    /// 补货预警默认展示条数
    pub restock_top_n: usize,
    /// 慢动销哨兵天数（必须大于补货窗口）
    pub slow_mover_days: f64,
    /// 外部查询超时（毫秒）
    pub query_timeout_ms: u64,
    /// 热销商品默认条数
    pub top_products_limit: usize,
    /// 热销商品 limit 参数上限
    pub source_row_limit: usize,
    /// 临界库存（库存 <= 该值计入 critical_stock_products）
    pub critical_stock_level: i64,
    /// 补货触发策略
    pub restock_policy: RestockPolicy,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            observation_window_days: DEFAULT_OBSERVATION_WINDOW_DAYS,
            restock_horizon_days: DEFAULT_RESTOCK_HORIZON_DAYS,
            replenishment_window_days: DEFAULT_REPLENISHMENT_WINDOW_DAYS,
            min_order_qty: DEFAULT_MIN_ORDER_QTY,
            restock_top_n: DEFAULT_RESTOCK_TOP_N,
            slow_mover_days: DEFAULT_SLOW_MOVER_DAYS,
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            top_products_limit: DEFAULT_TOP_PRODUCTS_LIMIT,
            source_row_limit: DEFAULT_SOURCE_ROW_LIMIT,
            critical_stock_level: DEFAULT_CRITICAL_STOCK_LEVEL,
            restock_policy: RestockPolicy::default(),
        }
    }
}

impl DashboardConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// 校验并修正参数
    ///
    /// # 规则
    /// - 各类窗口/条数/超时必须为正，否则回退默认值
    /// - 哨兵天数必须大于补货窗口，否则抬升为 max(默认哨兵, 补货窗口 + 1)
    /// - 热销商品默认条数不得超过 limit 上限，否则压到上限
    ///
    /// # 返回
    /// - 修正后的配置（幂等）
    pub fn normalized(mut self) -> Self {
        let defaults = DashboardConfig::default();

        if self.cache_ttl_secs == 0 {
            tracing::warn!(value = self.cache_ttl_secs, "cache_ttl_secs 非法，使用默认值");
            self.cache_ttl_secs = defaults.cache_ttl_secs;
        }
        if self.observation_window_days <= 0 {
            tracing::warn!(
                value = self.observation_window_days,
                "observation_window_days 非法，使用默认值"
            );
            self.observation_window_days = defaults.observation_window_days;
        }
        if !(self.restock_horizon_days.is_finite() && self.restock_horizon_days > 0.0) {
            tracing::warn!(
                value = self.restock_horizon_days,
                "restock_horizon_days 非法，使用默认值"
            );
            self.restock_horizon_days = defaults.restock_horizon_days;
        }
        if self.replenishment_window_days <= 0 {
            self.replenishment_window_days = defaults.replenishment_window_days;
        }
        if self.min_order_qty <= 0 {
            self.min_order_qty = defaults.min_order_qty;
        }
        if self.restock_top_n == 0 {
            self.restock_top_n = defaults.restock_top_n;
        }
        if self.query_timeout_ms == 0 {
            self.query_timeout_ms = defaults.query_timeout_ms;
        }
        if self.top_products_limit == 0 {
            self.top_products_limit = defaults.top_products_limit;
        }
        if self.source_row_limit == 0 {
            self.source_row_limit = defaults.source_row_limit;
        }
        if self.critical_stock_level < 0 {
            self.critical_stock_level = defaults.critical_stock_level;
        }
        if self.top_products_limit > self.source_row_limit {
            tracing::warn!(
                value = self.top_products_limit,
                max = self.source_row_limit,
                "top_products_limit 超过上限，已压到上限"
            );
            self.top_products_limit = self.source_row_limit;
        }

        // 哨兵值不能触发误报
        if !(self.slow_mover_days.is_finite() && self.slow_mover_days > self.restock_horizon_days) {
            let raised = defaults.slow_mover_days.max(self.restock_horizon_days + 1.0);
            tracing::warn!(
                value = self.slow_mover_days,
                horizon = self.restock_horizon_days,
                raised,
                "slow_mover_days 不大于补货窗口，已抬升"
            );
            self.slow_mover_days = raised;
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_already_normalized() {
        let config = DashboardConfig::default();
        assert_eq!(config.clone().normalized(), config);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = DashboardConfig {
            cache_ttl_secs: 0,
            observation_window_days: -5,
            restock_horizon_days: f64::NAN,
            min_order_qty: 0,
            restock_top_n: 0,
            ..DashboardConfig::default()
        }
        .normalized();

        assert_eq!(config.cache_ttl_secs, DEFAULT_CACHE_TTL_SECS);
        assert_eq!(config.observation_window_days, DEFAULT_OBSERVATION_WINDOW_DAYS);
        assert_eq!(config.restock_horizon_days, DEFAULT_RESTOCK_HORIZON_DAYS);
        assert_eq!(config.min_order_qty, DEFAULT_MIN_ORDER_QTY);
        assert_eq!(config.restock_top_n, DEFAULT_RESTOCK_TOP_N);
    }

    #[test]
    fn test_top_products_limit_is_clamped_to_row_limit() {
        let config = DashboardConfig {
            top_products_limit: 2_000,
            ..DashboardConfig::default()
        }
        .normalized();
        assert_eq!(config.top_products_limit, DEFAULT_SOURCE_ROW_LIMIT);

        let config = DashboardConfig {
            top_products_limit: 80,
            source_row_limit: 50,
            ..DashboardConfig::default()
        }
        .normalized();
        assert_eq!(config.top_products_limit, 50);
    }

    #[test]
    fn test_slow_mover_sentinel_is_raised_above_horizon() {
        let config = DashboardConfig {
            restock_horizon_days: 400.0,
            slow_mover_days: 365.0,
            ..DashboardConfig::default()
        }
        .normalized();

        assert!(config.slow_mover_days > config.restock_horizon_days);
        assert_eq!(config.slow_mover_days, 401.0);
    }
}
