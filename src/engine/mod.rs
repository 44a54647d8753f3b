// ==========================================
// 销售库存分析系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 均为纯计算, 不访问数据源
// ==========================================

pub mod categorizer;
pub mod metrics;
pub mod purchase_rate;
pub mod restock;
pub mod stockout;

// 重导出核心引擎
pub use categorizer::categorize;
pub use metrics::MetricsEngine;
pub use purchase_rate::{effective_window_days, estimate_purchase_rate};
pub use restock::RestockEngine;
pub use stockout::StockoutProjector;
