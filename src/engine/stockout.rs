// ==========================================
// 销售库存分析系统 - 缺货预测
// ==========================================
// 规则:
// - daily_rate > 0 → days = current_stock / daily_rate
// - daily_rate == 0 → 慢动销哨兵值（默认 365 天），不做除法
// 红线: days_until_stockout 恒 >= 0
// ==========================================

use crate::config::dashboard_config::DEFAULT_SLOW_MOVER_DAYS;
use crate::domain::restock::{PurchaseRate, StockoutProjection};
use chrono::{Days, NaiveDate};

// ==========================================
// StockoutProjector - 缺货预测器
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct StockoutProjector {
    slow_mover_days: f64,
}

impl Default for StockoutProjector {
    fn default() -> Self {
        Self::new(DEFAULT_SLOW_MOVER_DAYS)
    }
}

impl StockoutProjector {
    pub fn new(slow_mover_days: f64) -> Self {
        Self { slow_mover_days }
    }

    pub fn slow_mover_days(&self) -> f64 {
        self.slow_mover_days
    }

    /// 预测缺货天数
    ///
    /// # 参数
    /// - current_stock: 当前库存（负数按 0 处理）
    /// - rate: 日均销售速率
    /// - as_of: 预测基准日（用于推算缺货日期）
    pub fn project(
        &self,
        current_stock: i64,
        rate: &PurchaseRate,
        as_of: NaiveDate,
    ) -> StockoutProjection {
        let stock = current_stock.max(0) as f64;

        // 非有限或非正速率一律视为慢动销
        if !(rate.daily_rate.is_finite() && rate.daily_rate > 0.0) {
            return StockoutProjection {
                product_id: rate.product_id.clone(),
                days_until_stockout: self.slow_mover_days,
                is_slow_mover: true,
                projected_stockout_date: None,
            };
        }

        let days = stock / rate.daily_rate;
        StockoutProjection {
            product_id: rate.product_id.clone(),
            days_until_stockout: days,
            is_slow_mover: false,
            projected_stockout_date: as_of.checked_add_days(Days::new(days.floor() as u64)),
        }
    }
}
