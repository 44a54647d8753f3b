// ==========================================
// 销售库存分析系统 - 补货决策领域模型
// ==========================================
// 职责: 销售速率、缺货预测、补货预警
// 说明: 预警对象在每次刷新时临时生成，不落库
// ==========================================

use crate::domain::types::{DataSource, RestockTrigger, Urgency};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// PurchaseRate - 日均销售速率
// ==========================================
// 不变量: daily_rate >= 0，零销量时为 0.0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRate {
    pub product_id: String,
    pub daily_rate: f64,
}

// ==========================================
// StockoutProjection - 缺货预测
// ==========================================
// 不变量: days_until_stockout >= 0
// 速率为 0 时取慢动销哨兵值（无缺货风险）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockoutProjection {
    pub product_id: String,
    pub days_until_stockout: f64,
    pub is_slow_mover: bool,                         // 是否命中哨兵值
    pub projected_stockout_date: Option<NaiveDate>,  // 哨兵值时为 None
}

impl StockoutProjection {
    pub fn urgency(&self) -> Urgency {
        Urgency::from_days(self.days_until_stockout)
    }
}

// ==========================================
// RestockAlert - 补货预警
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestockAlert {
    pub product_id: String,
    pub product_name: String,
    pub category: String,
    pub source: DataSource,
    pub current_stock: i64,
    pub daily_rate: f64,
    pub days_until_stockout: f64,
    pub projected_stockout_date: Option<NaiveDate>,
    pub urgency: Urgency,
    pub recommended_order_qty: i64,
    pub trigger: RestockTrigger,
    pub revenue: Option<f64>,  // 用于同天数排序（销售额高者优先）
}

// ==========================================
// RestockWorklist - 补货工作清单
// ==========================================
// alerts 为完整筛选结果（已排序），展示时再按 top-N 截断
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestockWorklist {
    pub alerts: Vec<RestockAlert>,
    pub evaluated_products: usize,   // 参与评估的商品数
    pub excluded_products: usize,    // 因缺少库存/速率数据被排除的商品数
}

impl RestockWorklist {
    /// 取前 limit 条（不修改完整清单）
    pub fn top(&self, limit: usize) -> Vec<RestockAlert> {
        self.alerts.iter().take(limit).cloned().collect()
    }
}
