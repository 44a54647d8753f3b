// ==========================================
// 销售库存分析系统 - 缓存层
// ==========================================
// 职责: 带有效期的结果集缓存，过期值保留供降级读取
// ==========================================

pub mod cache_key;
pub mod payload;
pub mod ttl_cache;

pub use cache_key::{CacheKey, DashboardDataset};
pub use payload::{DashboardCache, DashboardPayload};
pub use ttl_cache::{CacheEntryStatus, TtlCache};
