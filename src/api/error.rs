// ==========================================
// 销售库存分析系统 - API层错误类型
// ==========================================
// 说明: 数据源问题在 API 层降级为旧值或默认值，不会走到这里；
//       这里只承载参数错误与后台任务异常
// ==========================================

use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 是否由调用方参数引起
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::InvalidInput(_))
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
