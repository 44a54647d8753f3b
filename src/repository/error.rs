// ==========================================
// 销售库存分析系统 - 数据访问层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 数据源不可达属于可恢复错误，由上层降级为空结果或旧缓存
// ==========================================

use std::time::Duration;
use thiserror::Error;

/// 数据访问层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据源错误 =====
    #[error("数据源不可用: source={source_name}, reason={reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("查询超时: source={source_name}, dataset={dataset}, timeout={timeout:?}")]
    QueryTimeout {
        source_name: String,
        dataset: String,
        timeout: Duration,
    },

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 配置错误 =====
    #[error("配置值错误 (key={key}): {message}")]
    ConfigValueError { key: String, message: String },

    // ===== 缓存错误 =====
    #[error("缓存键参数非法: {0}")]
    InvalidCacheKey(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg) => match code.code {
                rusqlite::ErrorCode::CannotOpen | rusqlite::ErrorCode::NotADatabase => {
                    RepositoryError::DatabaseConnectionError(
                        msg.unwrap_or_else(|| code.to_string()),
                    )
                }
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                    RepositoryError::LockError(msg.unwrap_or_else(|| code.to_string()))
                }
                _ => RepositoryError::DatabaseQueryError(msg.unwrap_or_else(|| code.to_string())),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
