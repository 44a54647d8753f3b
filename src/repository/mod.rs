// ==========================================
// 销售库存分析系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供外部数据源访问接口,屏蔽库结构差异
// 约束: 所有查询使用参数化,只读打开,带超时
// ==========================================

pub mod error;
pub mod product_repo;
pub mod source_adapter;
pub mod sqlite_source;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use product_repo::ProductRepository;
pub use source_adapter::{AggregateRow, CellValue, Dataset, QueryParams, SourceAdapter};
pub use sqlite_source::SqliteSourceAdapter;
