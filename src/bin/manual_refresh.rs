// 开发工具: 对当前数据源执行一次全量缓存刷新，并以 JSON 输出刷新报告。
//
// 用法:
//   cargo run --bin manual_refresh -- [data_dir]
//
// 不启动 HTTP 服务；数据库路径解析规则与主程序一致。

use sales_stock_vista::app::{AppState, DataPaths};
use sales_stock_vista::logging;
use sales_stock_vista::services::{RefreshStatus, RefreshTrigger};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let paths = match std::env::args()
        .nth(1)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
    {
        Some(dir) => DataPaths::in_dir(&PathBuf::from(dir)),
        None => DataPaths::from_env(),
    };

    let state = AppState::new(paths).await.map_err(anyhow::Error::msg)?;
    let report = state
        .refresh_service
        .refresh_all_async(RefreshTrigger::Manual)
        .await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.status() == RefreshStatus::Failed {
        anyhow::bail!("刷新失败: {} 个数据集未更新", report.failed.len());
    }
    Ok(())
}
