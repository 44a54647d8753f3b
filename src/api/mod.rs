// ==========================================
// 销售库存分析系统 - API 层
// ==========================================
// 职责: 提供驾驶舱业务 API 接口,供 HTTP 路由调用
// ==========================================

pub mod dashboard_api;
pub mod error;

// 重导出核心类型
pub use dashboard_api::{CacheStatusResponse, DashboardApi, RefreshCacheResponse};
pub use error::{ApiError, ApiResult};
