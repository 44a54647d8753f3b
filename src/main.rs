// ==========================================
// 销售库存分析系统 - 服务主入口
// ==========================================
// 启动顺序:
// 1. 初始化日志 → 组装 AppState（无可用数据源则退出）
// 2. 启动后台刷新调度器（首个周期即预热缓存）
// 3. 启动 HTTP 服务，Ctrl+C 后先停服务再停调度器
// ==========================================

use std::sync::Arc;

use anyhow::Context;
use sales_stock_vista::app::{create_router, get_bind_addr, AppState, DataPaths};
use sales_stock_vista::logging;
use sales_stock_vista::services::RefreshScheduler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 只读分析服务", sales_stock_vista::APP_NAME);
    tracing::info!("系统版本: {}", sales_stock_vista::VERSION);
    tracing::info!("==================================================");

    let paths = DataPaths::from_env();
    tracing::info!(
        pos_db = %paths.pos_db.display(),
        erp_db = %paths.erp_db.display(),
        "使用数据源"
    );

    let state = AppState::new(paths).await.map_err(anyhow::Error::msg)?;
    let state = Arc::new(state);

    let scheduler = RefreshScheduler::spawn(
        state.refresh_service.clone(),
        state.config.cache_ttl(),
    );

    let addr = get_bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("无法监听地址 {}", addr))?;
    tracing::info!("驾驶舱接口已启动: http://{}", addr);

    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP 服务异常退出")?;

    scheduler.shutdown().await;
    tracing::info!("服务已停止");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "无法监听退出信号");
        // 监听失败时不退出，保持服务运行
        std::future::pending::<()>().await;
    }
    tracing::info!("收到退出信号，正在停止服务");
}
