// ==========================================
// 销售库存分析系统 - 后台刷新调度器
// ==========================================
// 职责: 按缓存有效期周期性全量刷新
// 约束:
// - 启动后立即执行一次（预热），之后每个周期执行一次
// - 单次刷新失败只记日志，循环不退出
// - 通过 watch 通道发送停止信号，shutdown 等待循环退出
// ==========================================

use crate::services::refresh_service::{DashboardRefreshService, RefreshReport, RefreshTrigger};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

// ==========================================
// CacheRefresher Trait
// ==========================================
// 实现者: DashboardRefreshService
#[async_trait]
pub trait CacheRefresher: Send + Sync + 'static {
    /// 执行一次全量刷新
    async fn refresh_cycle(&self) -> RefreshReport;
}

#[async_trait]
impl CacheRefresher for DashboardRefreshService {
    async fn refresh_cycle(&self) -> RefreshReport {
        self.refresh_all_async(RefreshTrigger::Scheduled).await
    }
}

// ==========================================
// RefreshScheduler
// ==========================================
pub struct RefreshScheduler {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    cycles: Arc<AtomicU64>,
}

impl RefreshScheduler {
    /// 启动后台刷新循环（需在 tokio 运行时内调用）
    pub fn spawn<R: CacheRefresher>(refresher: Arc<R>, period: Duration) -> Self {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let cycles = Arc::new(AtomicU64::new(0));
        let cycle_counter = cycles.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(period_secs = period.as_secs(), "后台刷新调度器已启动");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = refresher.refresh_cycle().await;
                        let n = cycle_counter.fetch_add(1, Ordering::SeqCst) + 1;
                        if !report.failed.is_empty() {
                            tracing::warn!(
                                cycle = n,
                                refresh_id = %report.refresh_id,
                                failed = report.failed.len(),
                                "定时刷新部分失败，已保留旧缓存"
                            );
                        }
                    }
                    changed = stop_rx.changed() => {
                        // 发送端被丢弃同样视为停止
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("后台刷新调度器已停止");
        });

        Self {
            stop_tx,
            handle,
            cycles,
        }
    }

    /// 已完成的刷新周期数
    pub fn completed_cycles(&self) -> u64 {
        self.cycles.load(Ordering::SeqCst)
    }

    /// 发送停止信号并等待循环退出
    ///
    /// 正在进行的刷新会先执行完毕
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "后台刷新调度器异常退出");
        }
    }
}
