// ==========================================
// 销售库存分析系统 - 驾驶舱指标引擎
// ==========================================
// 职责: 由商品快照计算关键指标、分类汇总、热销商品、仓储汇总
// 口径:
// - 销售类指标只统计销售额 > 0 的商品（有效销售商品）
// - 毛利率 = (销售额 - 成本) / 销售额 × 100，销售额为 0 时取 0
// - 负毛利: 毛利率 < 0；高毛利: 毛利率 > 50
// ==========================================

use crate::domain::metrics::{
    CategoryStats, CategorySummary, DashboardMetrics, ProductPerformance, WarehouseSummary,
    NO_CATEGORY, NO_PRODUCTS,
};
use crate::domain::product::{ProductKey, ProductSales, ProductSnapshot};
use crate::domain::restock::RestockWorklist;
use std::collections::{BTreeMap, HashMap};

/// 高毛利阈值（百分比）
pub const HIGH_MARGIN_THRESHOLD_PCT: f64 = 50.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 有效销售商品（销售额 > 0）
fn active_sales(snapshot: &ProductSnapshot) -> impl Iterator<Item = &ProductSales> {
    snapshot.sales.iter().filter(|s| s.revenue > 0.0)
}

fn stock_by_key(snapshot: &ProductSnapshot) -> HashMap<ProductKey, i64> {
    snapshot
        .records
        .iter()
        .map(|r| (r.key(), r.stock_or_zero()))
        .collect()
}

// ==========================================
// MetricsEngine - 指标引擎（无状态）
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct MetricsEngine {
    critical_stock_level: i64,
}

impl MetricsEngine {
    pub fn new(critical_stock_level: i64) -> Self {
        Self {
            critical_stock_level,
        }
    }

    /// 关键指标
    pub fn compute_metrics(&self, snapshot: &ProductSnapshot) -> DashboardMetrics {
        let active: Vec<&ProductSales> = active_sales(snapshot).collect();
        if active.is_empty() {
            return DashboardMetrics {
                total_stock_remaining: snapshot.records.iter().map(|r| r.stock_or_zero()).sum(),
                ..DashboardMetrics::default()
            };
        }

        let total_revenue: f64 = active.iter().map(|s| s.revenue).sum();
        let total_units_sold: i64 = active.iter().map(|s| s.units_sold).sum();
        let margins: Vec<f64> = active.iter().map(|s| s.margin_pct()).collect();
        let avg_profit_margin = round2(margins.iter().sum::<f64>() / margins.len() as f64);

        // 同销售额取先出现者（数据源已按销售额降序）
        let top = active
            .iter()
            .copied()
            .reduce(|best, s| if s.revenue > best.revenue { s } else { best });

        let category_revenue = self.category_revenue(&active);
        let top_category = category_revenue
            .iter()
            .fold(None::<(&String, f64)>, |best, (category, revenue)| match best {
                Some((_, best_revenue)) if best_revenue >= *revenue => best,
                _ => Some((category, *revenue)),
            });

        let mut products_by_source = BTreeMap::new();
        for s in &active {
            *products_by_source.entry(s.source).or_insert(0) += 1;
        }

        DashboardMetrics {
            total_revenue: round2(total_revenue),
            total_units_sold,
            total_products: active.len() as i64,
            avg_profit_margin,
            top_product: top.map(|s| s.name.clone()).unwrap_or_else(|| NO_PRODUCTS.to_string()),
            top_product_revenue: top.map(|s| round2(s.revenue)).unwrap_or(0.0),
            negative_margin_products: margins.iter().filter(|m| **m < 0.0).count() as i64,
            high_margin_products: margins
                .iter()
                .filter(|m| **m > HIGH_MARGIN_THRESHOLD_PCT)
                .count() as i64,
            top_category: top_category
                .map(|(c, _)| c.clone())
                .unwrap_or_else(|| NO_CATEGORY.to_string()),
            top_category_revenue: top_category.map(|(_, r)| round2(r)).unwrap_or(0.0),
            total_stock_remaining: snapshot.records.iter().map(|r| r.stock_or_zero()).sum(),
            products_by_source,
        }
    }

    fn category_revenue(&self, active: &[&ProductSales]) -> BTreeMap<String, f64> {
        let mut revenue = BTreeMap::new();
        for s in active {
            *revenue.entry(s.category.clone()).or_insert(0.0) += s.revenue;
        }
        revenue
    }

    /// 分类汇总
    pub fn category_summary(&self, snapshot: &ProductSnapshot) -> CategorySummary {
        let stock = stock_by_key(snapshot);
        let mut margin_sums: BTreeMap<String, f64> = BTreeMap::new();
        let mut summary = CategorySummary::new();

        for s in active_sales(snapshot) {
            let stats = summary.entry(s.category.clone()).or_insert_with(CategoryStats::default);
            stats.total_revenue += s.revenue;
            stats.product_count += 1;
            stats.units_sold += s.units_sold;
            stats.stock_sum += stock.get(&s.key()).copied().unwrap_or(0);
            *margin_sums.entry(s.category.clone()).or_insert(0.0) += s.margin_pct();
        }

        for (category, stats) in summary.iter_mut() {
            let margin_sum = margin_sums.get(category).copied().unwrap_or(0.0);
            stats.avg_margin = round2(margin_sum / stats.product_count.max(1) as f64);
            stats.total_revenue = round2(stats.total_revenue);
        }

        summary
    }

    /// 热销商品（销售额降序，销售额相同按商品编号）
    pub fn top_products(&self, snapshot: &ProductSnapshot, limit: usize) -> Vec<ProductPerformance> {
        let stock = stock_by_key(snapshot);
        let mut active: Vec<&ProductSales> = active_sales(snapshot).collect();
        active.sort_by(|a, b| {
            b.revenue
                .total_cmp(&a.revenue)
                .then_with(|| a.product_id.cmp(&b.product_id))
                .then_with(|| a.source.cmp(&b.source))
        });

        active
            .into_iter()
            .take(limit)
            .map(|s| ProductPerformance {
                product_id: s.product_id.clone(),
                name: s.name.clone(),
                category: s.category.clone(),
                source: s.source,
                units_sold: s.units_sold,
                revenue: round2(s.revenue),
                cost: round2(s.cost),
                profit: round2(s.profit()),
                margin_pct: s.margin_pct(),
                stock: stock.get(&s.key()).copied().unwrap_or(0),
            })
            .collect()
    }

    /// 仓储汇总（只统计有库存读数的商品）
    pub fn warehouse_summary(
        &self,
        snapshot: &ProductSnapshot,
        worklist: &RestockWorklist,
    ) -> WarehouseSummary {
        let stocked: Vec<_> = snapshot
            .records
            .iter()
            .filter(|r| r.current_stock.is_some())
            .collect();

        WarehouseSummary {
            total_products: stocked.len() as i64,
            total_current_stock: stocked.iter().map(|r| r.stock_or_zero()).sum(),
            products_needing_restock: worklist.alerts.len() as i64,
            critical_stock_products: stocked
                .iter()
                .filter(|r| r.stock_or_zero() <= self.critical_stock_level)
                .count() as i64,
            low_stock_items: stocked.iter().filter(|r| r.at_or_below_reorder_point()).count()
                as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::ProductRecord;
    use crate::domain::types::DataSource;

    fn sales(id: &str, category: &str, source: DataSource, revenue: f64, cost: f64) -> ProductSales {
        ProductSales {
            product_id: id.to_string(),
            name: format!("Item {}", id),
            category: category.to_string(),
            source,
            units_sold: 2,
            revenue,
            cost,
        }
    }

    fn record(id: &str, stock: Option<i64>, reorder_point: Option<i64>) -> ProductRecord {
        ProductRecord {
            product_id: id.to_string(),
            name: format!("Item {}", id),
            category: "Other".to_string(),
            source: DataSource::Pos,
            current_stock: stock,
            reorder_point,
        }
    }

    fn snapshot() -> ProductSnapshot {
        ProductSnapshot {
            records: vec![
                record("A", Some(3), Some(5)),
                record("B", Some(40), Some(5)),
                record("C", None, None),
            ],
            sales: vec![
                sales("A", "Lubricants", DataSource::Pos, 100.0, 20.0),
                sales("B", "Lubricants", DataSource::Pos, 50.0, 80.0),
                sales("E", "Vibrators", DataSource::Erp, 120.0, 60.0),
                sales("Z", "Other", DataSource::Erp, 0.0, 5.0),
            ],
        }
    }

    #[test]
    fn test_metrics_use_active_products_only() {
        let metrics = MetricsEngine::new(5).compute_metrics(&snapshot());

        assert_eq!(metrics.total_revenue, 270.0);
        assert_eq!(metrics.total_units_sold, 6);
        assert_eq!(metrics.total_products, 3);
        // (80 + -60 + 50) / 3
        assert_eq!(metrics.avg_profit_margin, 23.33);
        assert_eq!(metrics.top_product, "Item E");
        assert_eq!(metrics.top_product_revenue, 120.0);
        assert_eq!(metrics.negative_margin_products, 1);
        assert_eq!(metrics.high_margin_products, 1);
        assert_eq!(metrics.top_category, "Lubricants");
        assert_eq!(metrics.top_category_revenue, 150.0);
        assert_eq!(metrics.total_stock_remaining, 43);
        assert_eq!(metrics.products_by_source.get(&DataSource::Pos), Some(&2));
        assert_eq!(metrics.products_by_source.get(&DataSource::Erp), Some(&1));
    }

    #[test]
    fn test_empty_snapshot_yields_zeroed_metrics() {
        let metrics = MetricsEngine::new(5).compute_metrics(&ProductSnapshot::default());
        assert_eq!(metrics, DashboardMetrics::default());
        assert_eq!(metrics.top_product, NO_PRODUCTS);
    }

    #[test]
    fn test_category_summary() {
        let summary = MetricsEngine::new(5).category_summary(&snapshot());

        assert_eq!(summary.len(), 2);
        let lubricants = &summary["Lubricants"];
        assert_eq!(lubricants.product_count, 2);
        assert_eq!(lubricants.total_revenue, 150.0);
        assert_eq!(lubricants.avg_margin, 10.0);
        assert_eq!(lubricants.units_sold, 4);
        assert_eq!(lubricants.stock_sum, 43);
        assert_eq!(summary["Vibrators"].stock_sum, 0);
    }

    #[test]
    fn test_top_products_sorted_and_limited() {
        let top = MetricsEngine::new(5).top_products(&snapshot(), 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].product_id, "E");
        assert_eq!(top[1].product_id, "A");
        assert_eq!(top[1].stock, 3);
        assert_eq!(top[1].profit, 80.0);
    }

    #[test]
    fn test_warehouse_summary() {
        let summary =
            MetricsEngine::new(5).warehouse_summary(&snapshot(), &RestockWorklist::default());
        assert_eq!(summary.total_products, 2);
        assert_eq!(summary.total_current_stock, 43);
        assert_eq!(summary.critical_stock_products, 1);
        assert_eq!(summary.low_stock_items, 1);
        assert_eq!(summary.products_needing_restock, 0);
    }
}
