// ==========================================
// 销售库存分析系统 - 销售速率估算
// ==========================================
// 公式: daily_rate = total_units_sold / observation_window_days
// 红线: 结果恒 >= 0，零销量返回 0.0，不产生除零
// ==========================================

use crate::config::dashboard_config::DEFAULT_OBSERVATION_WINDOW_DAYS;
use crate::domain::product::SalesAggregate;
use crate::domain::restock::PurchaseRate;

/// 观察窗口校验: 非正数回退默认值
pub fn effective_window_days(observation_window_days: i64) -> i64 {
    if observation_window_days > 0 {
        observation_window_days
    } else {
        DEFAULT_OBSERVATION_WINDOW_DAYS
    }
}

/// 由销量汇总估算日均销售速率（纯函数）
pub fn estimate_purchase_rate(aggregate: &SalesAggregate) -> PurchaseRate {
    let window = effective_window_days(aggregate.observation_window_days);
    let sold = aggregate.total_units_sold.max(0);

    PurchaseRate {
        product_id: aggregate.product_id.clone(),
        daily_rate: sold as f64 / window as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::DataSource;

    fn aggregate(sold: i64, window: i64) -> SalesAggregate {
        SalesAggregate {
            product_id: "P1".to_string(),
            source: DataSource::Pos,
            total_units_sold: sold,
            observation_window_days: window,
        }
    }

    #[test]
    fn test_rate_is_units_over_window() {
        assert_eq!(estimate_purchase_rate(&aggregate(900, 90)).daily_rate, 10.0);
        assert_eq!(estimate_purchase_rate(&aggregate(45, 30)).daily_rate, 1.5);
    }

    #[test]
    fn test_zero_sales_is_zero_rate() {
        let rate = estimate_purchase_rate(&aggregate(0, 90));
        assert_eq!(rate.daily_rate, 0.0);
        assert_eq!(rate.product_id, "P1");
    }

    #[test]
    fn test_invalid_window_clamps_to_default() {
        assert_eq!(estimate_purchase_rate(&aggregate(900, 0)).daily_rate, 10.0);
        assert_eq!(estimate_purchase_rate(&aggregate(900, -7)).daily_rate, 10.0);
        assert_eq!(effective_window_days(14), 14);
    }

    #[test]
    fn test_negative_sales_never_yield_negative_rate() {
        assert_eq!(estimate_purchase_rate(&aggregate(-20, 90)).daily_rate, 0.0);
    }
}
