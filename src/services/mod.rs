// ==========================================
// 销售库存分析系统 - 服务层
// ==========================================
// 职责: 缓存刷新（手动/定时），编排仓储与引擎
// ==========================================

pub mod refresh_scheduler;
pub mod refresh_service;

pub use refresh_scheduler::{CacheRefresher, RefreshScheduler};
pub use refresh_service::{
    DashboardRefreshService, RefreshFailure, RefreshReport, RefreshStatus, RefreshTrigger,
};
