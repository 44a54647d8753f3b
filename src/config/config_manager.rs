// ==========================================
// 销售库存分析系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: 配置库 config_kv 表 (key-value + scope)
// 说明: 未配置配置库时全部使用默认值
// ==========================================

use crate::config::config_reader_trait::DashboardConfigReader;
use crate::config::dashboard_config::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_CRITICAL_STOCK_LEVEL, DEFAULT_MIN_ORDER_QTY,
    DEFAULT_OBSERVATION_WINDOW_DAYS, DEFAULT_QUERY_TIMEOUT_MS, DEFAULT_REPLENISHMENT_WINDOW_DAYS,
    DEFAULT_RESTOCK_HORIZON_DAYS, DEFAULT_RESTOCK_TOP_N, DEFAULT_SLOW_MOVER_DAYS,
    DEFAULT_SOURCE_ROW_LIMIT, DEFAULT_TOP_PRODUCTS_LIMIT,
};
use crate::db::open_sqlite_connection;
use crate::domain::types::RestockPolicy;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Option<Arc<Mutex<Connection>>>,
}

impl ConfigManager {
    /// 打开配置库（不存在时创建）并确保 config_kv 表存在
    ///
    /// # 参数
    /// - db_path: 配置库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
            ensure_config_table(&guard)?;
        }

        Ok(Self { conn: Some(conn) })
    }

    /// 无配置库：所有读取均返回默认值
    pub fn with_defaults() -> Self {
        Self { conn: None }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在或未配置配置库
    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = match &self.conn {
            Some(conn) => conn,
            None => return Ok(None),
        };
        let conn = conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.conn.as_ref().ok_or_else(|| RepositoryError::ConfigValueError {
            key: key.to_string(),
            message: "未配置配置库，无法写入".to_string(),
        })?;
        let conn = conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let mut snapshot = BTreeMap::new();
        let conn = match &self.conn {
            Some(conn) => conn,
            None => return Ok(snapshot),
        };
        let conn = conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 读取并解析配置，缺失或格式错误时返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + Display + Copy,
    {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }
}

/// 确保 config_kv 表存在
fn ensure_config_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )
}

// ==========================================
// DashboardConfigReader Trait 实现
// ==========================================
#[async_trait]
impl DashboardConfigReader for ConfigManager {
    async fn get_cache_ttl_secs(&self) -> RepositoryResult<u64> {
        self.get_parsed_or_default(config_keys::CACHE_TTL_SECS, DEFAULT_CACHE_TTL_SECS)
    }

    async fn get_observation_window_days(&self) -> RepositoryResult<i64> {
        self.get_parsed_or_default(
            config_keys::OBSERVATION_WINDOW_DAYS,
            DEFAULT_OBSERVATION_WINDOW_DAYS,
        )
    }

    async fn get_slow_mover_days(&self) -> RepositoryResult<f64> {
        self.get_parsed_or_default(config_keys::SLOW_MOVER_DAYS, DEFAULT_SLOW_MOVER_DAYS)
    }

    async fn get_restock_horizon_days(&self) -> RepositoryResult<f64> {
        self.get_parsed_or_default(config_keys::RESTOCK_HORIZON_DAYS, DEFAULT_RESTOCK_HORIZON_DAYS)
    }

    async fn get_replenishment_window_days(&self) -> RepositoryResult<i64> {
        self.get_parsed_or_default(
            config_keys::REPLENISHMENT_WINDOW_DAYS,
            DEFAULT_REPLENISHMENT_WINDOW_DAYS,
        )
    }

    async fn get_min_order_qty(&self) -> RepositoryResult<i64> {
        self.get_parsed_or_default(config_keys::MIN_ORDER_QTY, DEFAULT_MIN_ORDER_QTY)
    }

    async fn get_restock_top_n(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(config_keys::RESTOCK_TOP_N, DEFAULT_RESTOCK_TOP_N)
    }

    async fn get_restock_policy(&self) -> RepositoryResult<RestockPolicy> {
        let value = match self.get_config_value(config_keys::RESTOCK_POLICY)? {
            Some(v) => v,
            None => return Ok(RestockPolicy::default()),
        };

        Ok(RestockPolicy::parse(&value).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::RESTOCK_POLICY,
                raw_value = %value,
                "补货策略配置无法识别，使用 PURCHASE_RATE"
            );
            RestockPolicy::default()
        }))
    }

    async fn get_critical_stock_level(&self) -> RepositoryResult<i64> {
        self.get_parsed_or_default(config_keys::CRITICAL_STOCK_LEVEL, DEFAULT_CRITICAL_STOCK_LEVEL)
    }

    async fn get_query_timeout_ms(&self) -> RepositoryResult<u64> {
        self.get_parsed_or_default(config_keys::QUERY_TIMEOUT_MS, DEFAULT_QUERY_TIMEOUT_MS)
    }

    async fn get_top_products_limit(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(config_keys::TOP_PRODUCTS_LIMIT, DEFAULT_TOP_PRODUCTS_LIMIT)
    }

    async fn get_source_row_limit(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(config_keys::SOURCE_ROW_LIMIT, DEFAULT_SOURCE_ROW_LIMIT)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 缓存
    pub const CACHE_TTL_SECS: &str = "cache_ttl_secs";

    // 销售速率与缺货预测
    pub const OBSERVATION_WINDOW_DAYS: &str = "observation_window_days";
    pub const SLOW_MOVER_DAYS: &str = "slow_mover_days";

    // 补货
    pub const RESTOCK_HORIZON_DAYS: &str = "restock_horizon_days";
    pub const REPLENISHMENT_WINDOW_DAYS: &str = "replenishment_window_days";
    pub const MIN_ORDER_QTY: &str = "min_order_qty";
    pub const RESTOCK_TOP_N: &str = "restock_top_n";
    pub const RESTOCK_POLICY: &str = "restock_policy";
    pub const CRITICAL_STOCK_LEVEL: &str = "critical_stock_level";

    // 数据源查询
    pub const QUERY_TIMEOUT_MS: &str = "query_timeout_ms";
    pub const TOP_PRODUCTS_LIMIT: &str = "top_products_limit";
    pub const SOURCE_ROW_LIMIT: &str = "source_row_limit";
}
