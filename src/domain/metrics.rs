// ==========================================
// 销售库存分析系统 - 驾驶舱指标模型
// ==========================================
// 职责: 关键指标、分类汇总、热销商品、仓储汇总
// 红线: 上游不可用时返回归零默认值，保证 JSON 结构完整
// ==========================================

use crate::domain::types::DataSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 无商品时 top_product 的占位值
pub const NO_PRODUCTS: &str = "No products";

/// 无分类时 top_category 的占位值
pub const NO_CATEGORY: &str = "No category";

// ==========================================
// DashboardMetrics - 关键指标
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub total_revenue: f64,
    pub total_units_sold: i64,
    pub total_products: i64,
    pub avg_profit_margin: f64,
    pub top_product: String,
    pub top_product_revenue: f64,
    pub negative_margin_products: i64,
    pub high_margin_products: i64,
    pub top_category: String,
    pub top_category_revenue: f64,
    pub total_stock_remaining: i64,
    pub products_by_source: BTreeMap<DataSource, i64>,
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self {
            total_revenue: 0.0,
            total_units_sold: 0,
            total_products: 0,
            avg_profit_margin: 0.0,
            top_product: NO_PRODUCTS.to_string(),
            top_product_revenue: 0.0,
            negative_margin_products: 0,
            high_margin_products: 0,
            top_category: NO_CATEGORY.to_string(),
            top_category_revenue: 0.0,
            total_stock_remaining: 0,
            products_by_source: BTreeMap::new(),
        }
    }
}

// ==========================================
// CategoryStats - 分类汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub total_revenue: f64,
    pub product_count: i64,
    pub avg_margin: f64,
    pub units_sold: i64,
    pub stock_sum: i64,
}

/// 分类 → 汇总（按分类名有序，便于稳定输出）
pub type CategorySummary = BTreeMap<String, CategoryStats>;

// ==========================================
// ProductPerformance - 热销商品行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub source: DataSource,
    pub units_sold: i64,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub margin_pct: f64,
    pub stock: i64,
}

// ==========================================
// WarehouseSummary - 仓储汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarehouseSummary {
    pub total_products: i64,
    pub total_current_stock: i64,
    pub products_needing_restock: i64,   // 缺货预测命中补货窗口
    pub critical_stock_products: i64,    // 库存 <= 临界值
    pub low_stock_items: i64,            // 库存 <= 再订货点
}
