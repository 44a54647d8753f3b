// ==========================================
// 销售库存分析系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 外部数据源一律只读打开
// - 统一查询超时: 超时后通过 InterruptHandle 中断语句，避免刷新循环被卡死
// ==========================================

use rusqlite::{Connection, OpenFlags};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开可写 SQLite 连接并应用统一配置（配置库使用）
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 以只读方式打开外部数据源
///
/// - 文件不存在时直接失败（不会创建空库）
/// - busy_timeout 不超过查询超时
pub fn open_readonly_connection(db_path: &str, timeout: Duration) -> rusqlite::Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(db_path, flags)?;
    let busy = timeout.min(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS));
    conn.busy_timeout(busy)?;
    Ok(conn)
}

/// 带超时的查询执行结果
#[derive(Debug)]
pub enum QueryOutcome<T> {
    Completed(T),
    TimedOut,
}

/// 在超时保护下执行查询
///
/// 看门狗线程在 `timeout` 到期且查询仍未结束时调用 `interrupt()`，
/// 被中断的语句返回 SQLITE_INTERRUPT，此处统一转换为 `QueryOutcome::TimedOut`。
pub fn run_with_timeout<T, F>(
    conn: &Connection,
    timeout: Duration,
    query: F,
) -> rusqlite::Result<QueryOutcome<T>>
where
    F: FnOnce(&Connection) -> rusqlite::Result<T>,
{
    let interrupt_handle = conn.get_interrupt_handle();
    let fired = Arc::new(AtomicBool::new(false));
    let (done_tx, done_rx) = mpsc::channel::<()>();

    let watchdog = {
        let fired = fired.clone();
        thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = done_rx.recv_timeout(timeout) {
                fired.store(true, Ordering::SeqCst);
                interrupt_handle.interrupt();
            }
        })
    };

    let result = query(conn);

    // 通知看门狗退出（查询已结束）
    let _ = done_tx.send(());
    let _ = watchdog.join();

    match result {
        Ok(value) => Ok(QueryOutcome::Completed(value)),
        Err(_) if fired.load(Ordering::SeqCst) => Ok(QueryOutcome::TimedOut),
        Err(e) => Err(e),
    }
}
