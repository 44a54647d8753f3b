// ==========================================
// 销售库存分析系统 - 缓存载荷
// ==========================================
// 说明: 每个数据集一种载荷；以 Arc 共享，替换时整体换新
// ==========================================

use crate::cache::cache_key::DashboardDataset;
use crate::domain::metrics::{
    CategorySummary, DashboardMetrics, ProductPerformance, WarehouseSummary,
};
use crate::domain::restock::RestockWorklist;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "dataset", content = "data", rename_all = "snake_case")]
pub enum DashboardPayload {
    Metrics(DashboardMetrics),
    TopProducts(Vec<ProductPerformance>),
    CategorySummary(CategorySummary),
    RestockWorklist(RestockWorklist),
    WarehouseSummary(WarehouseSummary),
}

impl DashboardPayload {
    pub fn dataset(&self) -> DashboardDataset {
        match self {
            DashboardPayload::Metrics(_) => DashboardDataset::Metrics,
            DashboardPayload::TopProducts(_) => DashboardDataset::TopProducts,
            DashboardPayload::CategorySummary(_) => DashboardDataset::CategorySummary,
            DashboardPayload::RestockWorklist(_) => DashboardDataset::RestockWorklist,
            DashboardPayload::WarehouseSummary(_) => DashboardDataset::WarehouseSummary,
        }
    }

    pub fn as_metrics(&self) -> Option<&DashboardMetrics> {
        match self {
            DashboardPayload::Metrics(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_top_products(&self) -> Option<&Vec<ProductPerformance>> {
        match self {
            DashboardPayload::TopProducts(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_category_summary(&self) -> Option<&CategorySummary> {
        match self {
            DashboardPayload::CategorySummary(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_restock_worklist(&self) -> Option<&RestockWorklist> {
        match self {
            DashboardPayload::RestockWorklist(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_warehouse_summary(&self) -> Option<&WarehouseSummary> {
        match self {
            DashboardPayload::WarehouseSummary(w) => Some(w),
            _ => None,
        }
    }
}

/// 驾驶舱缓存: 值为共享载荷
pub type DashboardCache = crate::cache::ttl_cache::TtlCache<Arc<DashboardPayload>>;
