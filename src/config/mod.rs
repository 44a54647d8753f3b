// ==========================================
// 销售库存分析系统 - 配置层
// ==========================================
// 职责: 驾驶舱运行参数、配置读取接口
// 存储: config_kv 表（可选，缺省全部使用默认值）
// ==========================================

pub mod config_manager;
pub mod config_reader_trait;
pub mod dashboard_config;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use config_reader_trait::DashboardConfigReader;
pub use dashboard_config::DashboardConfig;
