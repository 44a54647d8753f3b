// ==========================================
// 销售库存分析系统 - 缓存键
// ==========================================
// 结构: 数据集 + 有序参数表
// 说明: 参数按名称排序编码，语义相同的请求命中同一个键
// ==========================================

use crate::domain::types::DataSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// DashboardDataset - 驾驶舱数据集
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardDataset {
    Metrics,
    TopProducts,
    CategorySummary,
    RestockWorklist,
    WarehouseSummary,
}

impl DashboardDataset {
    pub const ALL: [DashboardDataset; 5] = [
        DashboardDataset::Metrics,
        DashboardDataset::TopProducts,
        DashboardDataset::CategorySummary,
        DashboardDataset::RestockWorklist,
        DashboardDataset::WarehouseSummary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DashboardDataset::Metrics => "metrics",
            DashboardDataset::TopProducts => "top_products",
            DashboardDataset::CategorySummary => "category_summary",
            DashboardDataset::RestockWorklist => "restock_worklist",
            DashboardDataset::WarehouseSummary => "warehouse_summary",
        }
    }
}

impl fmt::Display for DashboardDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// CacheKey
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    dataset: DashboardDataset,
    params: BTreeMap<String, String>,
}

impl CacheKey {
    pub fn new(dataset: DashboardDataset) -> Self {
        Self {
            dataset,
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, name: &str, value: impl ToString) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    pub fn dataset(&self) -> DashboardDataset {
        self.dataset
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    // ===== 常用键 =====

    pub fn metrics() -> Self {
        Self::new(DashboardDataset::Metrics)
    }

    pub fn category_summary() -> Self {
        Self::new(DashboardDataset::CategorySummary)
    }

    pub fn restock_worklist() -> Self {
        Self::new(DashboardDataset::RestockWorklist)
    }

    pub fn warehouse_summary() -> Self {
        Self::new(DashboardDataset::WarehouseSummary)
    }

    /// 热销商品键（source 为空表示全部数据源）
    pub fn top_products(limit: usize, source: Option<DataSource>) -> Self {
        let key = Self::new(DashboardDataset::TopProducts).with_param(params::LIMIT, limit);
        match source {
            Some(source) => key.with_param(params::SOURCE, source),
            None => key,
        }
    }

    /// 稳定编码: dataset?k1=v1&k2=v2（参数按名称排序）
    pub fn encode(&self) -> String {
        if self.params.is_empty() {
            return self.dataset.as_str().to_string();
        }
        let query: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{}?{}", self.dataset, query.join("&"))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// 参数名常量
pub mod params {
    pub const LIMIT: &str = "limit";
    pub const SOURCE: &str = "source";
}
