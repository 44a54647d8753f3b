// ==========================================
// 销售库存分析系统 - 应用层
// ==========================================
// 职责: 组装应用状态，对外提供 HTTP 接口
// ==========================================

pub mod http_routes;
pub mod state;

// 重导出
pub use http_routes::{create_router, SharedState};
pub use state::{get_bind_addr, get_default_data_dir, AppState, DataPaths};
