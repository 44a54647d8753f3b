// ==========================================
// 销售库存分析系统 - 核心库
// ==========================================
// 技术栈: axum + tokio + Rust + SQLite
// 系统定位: 只读分析服务（POS / ERP 双数据源）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 外部数据源访问
pub mod repository;

// 引擎层 - 指标与补货规则
pub mod engine;

// 缓存层 - 带有效期的结果缓存
pub mod cache;

// 服务层 - 缓存刷新与后台调度
pub mod services;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/超时中断）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装与 HTTP 路由
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DataSource, RestockPolicy, RestockTrigger, Urgency};

// 领域实体
pub use domain::{
    CategoryStats, CategorySummary, DashboardMetrics, ProductPerformance, ProductRecord,
    ProductSales, ProductSnapshot, RestockAlert, RestockWorklist, WarehouseSummary,
};

// 引擎
pub use engine::{MetricsEngine, RestockEngine, StockoutProjector};

// 缓存与服务
pub use cache::{CacheKey, DashboardCache, TtlCache};
pub use services::{DashboardRefreshService, RefreshReport, RefreshScheduler, RefreshTrigger};

// API
pub use api::{ApiError, DashboardApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "销售库存分析系统";
