// ==========================================
// 销售库存分析系统 - 补货决策引擎
// ==========================================
// 红线: 唯一主触发条件 = 缺货天数 <= 补货窗口
// ==========================================
// 流程:
// 1. 逐商品计算缺货预测
// 2. 筛选 days_until_stockout <= 补货窗口
//    （再订货点规则仅在策略允许且该商品无销售速率数据时启用）
// 3. 排序: 缺货天数升序 → 销售额降序 → (商品编号, 数据源)
// 4. 建议订货量 = max(下限, round(速率 × 覆盖天数))
// 5. 缺少库存读数的商品排除，不报错
// ==========================================

use crate::config::dashboard_config::DashboardConfig;
use crate::domain::product::{ProductRecord, ProductSales, ProductSnapshot, SalesAggregate};
use crate::domain::restock::{PurchaseRate, RestockAlert, RestockWorklist, StockoutProjection};
use crate::domain::types::{RestockTrigger, Urgency};
use crate::engine::purchase_rate::estimate_purchase_rate;
use crate::engine::stockout::StockoutProjector;
use chrono::NaiveDate;
use std::cmp::Ordering;
use tracing::instrument;

// ==========================================
// RestockEngine - 补货决策引擎
// ==========================================
pub struct RestockEngine {
    config: DashboardConfig,
    projector: StockoutProjector,
}

impl RestockEngine {
    pub fn new(config: DashboardConfig) -> Self {
        let projector = StockoutProjector::new(config.slow_mover_days);
        Self { config, projector }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// 建议订货量
    pub fn recommended_order_qty(&self, daily_rate: f64) -> i64 {
        let projected = (daily_rate.max(0.0) * self.config.replenishment_window_days as f64).round();
        self.config.min_order_qty.max(projected as i64)
    }

    /// 生成完整补货工作清单（已排序、未截断）
    #[instrument(skip(self, snapshot), fields(
        records = snapshot.records.len(),
        sales = snapshot.sales.len(),
        policy = %self.config.restock_policy
    ))]
    pub fn build_worklist(&self, snapshot: &ProductSnapshot, as_of: NaiveDate) -> RestockWorklist {
        let sales_by_key = snapshot.sales_by_key();
        let mut alerts = Vec::new();
        let mut excluded = 0usize;

        for record in &snapshot.records {
            let stock = match record.current_stock {
                Some(stock) => stock,
                None => {
                    excluded += 1;
                    continue;
                }
            };

            match sales_by_key.get(&record.key()) {
                Some(sales) => {
                    let aggregate = SalesAggregate {
                        product_id: sales.product_id.clone(),
                        source: sales.source,
                        total_units_sold: sales.units_sold,
                        observation_window_days: self.config.observation_window_days,
                    };
                    let rate = estimate_purchase_rate(&aggregate);
                    let projection = self.projector.project(stock, &rate, as_of);

                    if projection.days_until_stockout <= self.config.restock_horizon_days {
                        alerts.push(self.projection_alert(record, stock, sales, &rate, &projection));
                    }
                }
                None if self.config.restock_policy.allows_reorder_fallback() => {
                    if record.at_or_below_reorder_point() {
                        alerts.push(self.reorder_point_alert(record, stock));
                    }
                }
                None => excluded += 1,
            }
        }

        sort_alerts(&mut alerts);

        tracing::debug!(
            alerts = alerts.len(),
            excluded,
            critical = alerts.iter().filter(|a| a.urgency == Urgency::Critical).count(),
            "补货清单生成完成"
        );

        RestockWorklist {
            alerts,
            evaluated_products: snapshot.records.len(),
            excluded_products: excluded,
        }
    }

    /// 取前 top_n 条预警（展示用）
    pub fn top_alerts(&self, worklist: &RestockWorklist, limit: Option<usize>) -> Vec<RestockAlert> {
        worklist.top(limit.unwrap_or(self.config.restock_top_n))
    }

    fn projection_alert(
        &self,
        record: &ProductRecord,
        stock: i64,
        sales: &ProductSales,
        rate: &PurchaseRate,
        projection: &StockoutProjection,
    ) -> RestockAlert {
        RestockAlert {
            product_id: record.product_id.clone(),
            product_name: record.name.clone(),
            category: record.category.clone(),
            source: record.source,
            current_stock: stock,
            daily_rate: rate.daily_rate,
            days_until_stockout: projection.days_until_stockout,
            projected_stockout_date: projection.projected_stockout_date,
            urgency: projection.urgency(),
            recommended_order_qty: self.recommended_order_qty(rate.daily_rate),
            trigger: RestockTrigger::Projection,
            revenue: Some(sales.revenue),
        }
    }

    // 无速率数据: 天数取哨兵值，订货量取下限
    fn reorder_point_alert(&self, record: &ProductRecord, stock: i64) -> RestockAlert {
        let days = self.projector.slow_mover_days();
        RestockAlert {
            product_id: record.product_id.clone(),
            product_name: record.name.clone(),
            category: record.category.clone(),
            source: record.source,
            current_stock: stock,
            daily_rate: 0.0,
            days_until_stockout: days,
            projected_stockout_date: None,
            urgency: Urgency::from_days(days),
            recommended_order_qty: self.config.min_order_qty,
            trigger: RestockTrigger::ReorderPoint,
            revenue: None,
        }
    }
}

/// 预警排序（稳定且确定）
fn sort_alerts(alerts: &mut [RestockAlert]) {
    alerts.sort_by(|a, b| {
        a.days_until_stockout
            .total_cmp(&b.days_until_stockout)
            .then_with(|| compare_revenue_desc(a.revenue, b.revenue))
            .then_with(|| a.product_id.cmp(&b.product_id))
            .then_with(|| a.source.cmp(&b.source))
    });
}

// 有销售额的排在无销售额之前
fn compare_revenue_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
