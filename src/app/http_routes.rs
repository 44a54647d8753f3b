// ==========================================
// 销售库存分析系统 - HTTP 路由
// ==========================================
// 职责: 把 DashboardApi 暴露为 JSON 接口
// 说明: DashboardApi 是同步接口（缓存未命中时会查询外部库），
//       处理器统一放入 spawn_blocking 执行
// ==========================================

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, ApiResult, DashboardApi};
use crate::app::state::AppState;

pub type SharedState = Arc<AppState>;

/// 创建驾驶舱路由
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/metrics", get(api_metrics))
        .route("/api/restock-alerts", get(api_restock_alerts))
        .route("/api/restock-worklist", get(api_restock_worklist))
        .route("/api/category-summary", get(api_category_summary))
        .route("/api/top-products", get(api_top_products))
        .route("/api/warehouse-summary", get(api_warehouse_summary))
        .route("/api/refresh-cache", post(api_refresh_cache))
        .route("/api/cache-status", get(api_cache_status))
        .route("/health", get(health))
        .with_state(state)
}

// ==========================================
// 错误响应
// ==========================================

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "请求处理失败");
        }
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// 在阻塞线程池执行 API 调用
async fn run_blocking<T, F>(state: &SharedState, f: F) -> Result<Json<T>, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&DashboardApi) -> ApiResult<T> + Send + 'static,
{
    let api = state.dashboard_api.clone();
    let result = tokio::task::spawn_blocking(move || f(&api))
        .await
        .map_err(|e| ApiError::InternalError(format!("任务执行失败: {}", e)))??;
    Ok(Json(result))
}

// ==========================================
// 处理器
// ==========================================

#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopProductsQuery {
    pub limit: Option<usize>,
    pub source: Option<String>,
}

async fn health() -> impl IntoResponse {
    "OK"
}

/// GET /api/metrics
async fn api_metrics(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, |api| api.get_metrics()).await
}

/// GET /api/restock-alerts?limit=15
async fn api_restock_alerts(
    State(state): State<SharedState>,
    Query(query): Query<LimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, move |api| api.get_restock_alerts(query.limit)).await
}

/// GET /api/restock-worklist
async fn api_restock_worklist(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, |api| api.get_restock_worklist()).await
}

/// GET /api/category-summary
async fn api_category_summary(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, |api| api.get_category_summary()).await
}

/// GET /api/top-products?limit=100&source=pos
async fn api_top_products(
    State(state): State<SharedState>,
    Query(query): Query<TopProductsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, move |api| {
        api.get_top_products(query.limit, query.source.as_deref())
    })
    .await
}

/// GET /api/warehouse-summary
async fn api_warehouse_summary(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, |api| api.get_warehouse_summary()).await
}

/// POST /api/refresh-cache
async fn api_refresh_cache(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, |api| api.refresh_cache()).await
}

/// GET /api/cache-status
///
/// 只读内存状态，不进阻塞线程池
async fn api_cache_status(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.dashboard_api.get_cache_status()?))
}
