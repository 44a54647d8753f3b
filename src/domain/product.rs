// ==========================================
// 销售库存分析系统 - 商品领域模型
// ==========================================
// 职责: 商品快照、销售汇总
// 说明: 每个刷新周期生成一份不可变快照，下一周期整体替换
// ==========================================

use crate::domain::types::DataSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 兜底分类（未知/缺失描述）
pub const FALLBACK_CATEGORY: &str = "Other";

// ==========================================
// ProductKey - 商品标识
// ==========================================
// 商品编号仅在同一数据源内唯一
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductKey {
    pub source: DataSource,
    pub product_id: String,
}

impl ProductKey {
    pub fn new(source: DataSource, product_id: impl Into<String>) -> Self {
        Self {
            source,
            product_id: product_id.into(),
        }
    }
}

// ==========================================
// ProductRecord - 商品库存快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,           // 商品编号
    pub name: String,                 // 商品名称
    pub category: String,             // 商品分类（缺失时为 Other）
    pub source: DataSource,           // 来源系统
    pub current_stock: Option<i64>,   // 当前库存（None = 数据源无库存读数）
    pub reorder_point: Option<i64>,   // 再订货点（None = 未维护）
}

impl ProductRecord {
    pub fn key(&self) -> ProductKey {
        ProductKey::new(self.source, self.product_id.clone())
    }

    /// 用于汇总统计的库存值（缺失按 0 计）
    pub fn stock_or_zero(&self) -> i64 {
        self.current_stock.unwrap_or(0)
    }

    /// 再订货点规则: 库存 <= 再订货点
    ///
    /// 任一数值缺失时不判定为需补货
    pub fn at_or_below_reorder_point(&self) -> bool {
        match (self.current_stock, self.reorder_point) {
            (Some(stock), Some(point)) => stock <= point,
            _ => false,
        }
    }
}

// ==========================================
// SalesAggregate - 销量汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesAggregate {
    pub product_id: String,
    pub source: DataSource,
    pub total_units_sold: i64,        // 观察窗口内累计销量（>= 0）
    pub observation_window_days: i64, // 观察窗口天数（> 0）
}

impl SalesAggregate {
    pub fn key(&self) -> ProductKey {
        ProductKey::new(self.source, self.product_id.clone())
    }
}

// ==========================================
// ProductSales - 商品销售业绩
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSales {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub source: DataSource,
    pub units_sold: i64,  // 销量
    pub revenue: f64,     // 销售额
    pub cost: f64,        // 成本
}

impl ProductSales {
    pub fn key(&self) -> ProductKey {
        ProductKey::new(self.source, self.product_id.clone())
    }

    pub fn profit(&self) -> f64 {
        self.revenue - self.cost
    }

    /// 毛利率（百分比，保留两位小数）
    ///
    /// 销售额为 0 时返回 0
    pub fn margin_pct(&self) -> f64 {
        if self.revenue > 0.0 {
            ((self.profit() / self.revenue) * 100.0 * 100.0).round() / 100.0
        } else {
            0.0
        }
    }
}

// ==========================================
// ProductSnapshot - 单次刷新的商品快照
// ==========================================
// 说明: 各数据集由同一份快照计算，保证同一周期内口径一致
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub records: Vec<ProductRecord>, // 库存快照（全部数据源）
    pub sales: Vec<ProductSales>,    // 销售业绩（全部数据源）
}

impl ProductSnapshot {
    /// 按商品标识索引销售业绩
    pub fn sales_by_key(&self) -> HashMap<ProductKey, &ProductSales> {
        self.sales.iter().map(|s| (s.key(), s)).collect()
    }
}
