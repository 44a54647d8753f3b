// ==========================================
// 销售库存分析系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod metrics;
pub mod product;
pub mod restock;
pub mod types;

// 重导出核心类型
pub use metrics::{
    CategoryStats, CategorySummary, DashboardMetrics, ProductPerformance, WarehouseSummary,
};
pub use product::{
    ProductKey, ProductRecord, ProductSales, ProductSnapshot, SalesAggregate, FALLBACK_CATEGORY,
};
pub use restock::{PurchaseRate, RestockAlert, RestockWorklist, StockoutProjection};
pub use types::{DataSource, RestockPolicy, RestockTrigger, Urgency};
