// ==========================================
// 销售库存分析系统 - SQLite 数据源适配器
// ==========================================
// 职责: 针对 POS / ERP 两种库结构执行聚合 SQL
// 约束:
// - 每次查询单独打开只读连接，用完即关（不持有跨周期连接）
// - 打开失败 = 数据源不可达 → 空结果 + 告警
// - 查询超时 → QueryTimeout 错误，由刷新服务保留旧缓存
// - LIMIT ?1 传 -1 表示不限行数（刷新快照走全量）
// ==========================================

use crate::db::{open_readonly_connection, run_with_timeout, QueryOutcome};
use crate::domain::types::DataSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::source_adapter::{
    AggregateRow, CellValue, Dataset, QueryParams, SourceAdapter,
};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

// ==========================================
// 列名常量（两种数据源统一输出）
// ==========================================
pub mod columns {
    pub const PRODUCT_ID: &str = "product_id";
    pub const NAME: &str = "name";
    pub const UNITS_SOLD: &str = "units_sold";
    pub const REVENUE: &str = "revenue";
    pub const COST: &str = "cost";
    pub const CURRENT_STOCK: &str = "current_stock";
    pub const REORDER_POINT: &str = "reorder_point";
}

// ==========================================
// POS 库结构: item / order_line / item_shop
// ==========================================
const POS_PRODUCT_SALES_SQL: &str = r#"
SELECT
    i.item_id AS product_id,
    i.description AS name,
    COALESCE(SUM(ol.quantity), 0) AS units_sold,
    COALESCE(SUM(ol.total), 0) AS revenue,
    COALESCE(SUM(ol.quantity * COALESCE(i.default_cost, i.avg_cost, 0)), 0) AS cost
FROM item i
LEFT JOIN order_line ol ON ol.item_id = i.item_id
WHERE i.description IS NOT NULL
GROUP BY i.item_id, i.description
ORDER BY revenue DESC, i.item_id
LIMIT ?1
"#;

const POS_STOCK_LEVELS_SQL: &str = r#"
SELECT
    i.item_id AS product_id,
    i.description AS name,
    MAX(s.qoh) AS current_stock,
    MAX(s.reorder_point) AS reorder_point
FROM item i
LEFT JOIN item_shop s ON s.item_id = i.item_id
WHERE i.description IS NOT NULL
GROUP BY i.item_id, i.description
ORDER BY MAX(s.qoh) IS NULL, MAX(s.qoh), i.item_id
LIMIT ?1
"#;

// ==========================================
// ERP 库结构: inventory_item / sales_order_detail
// ==========================================
// 说明: ERP 商品编号带尾随空格，关联时需 TRIM
const ERP_PRODUCT_SALES_SQL: &str = r#"
SELECT
    TRIM(i.inventory_cd) AS product_id,
    i.descr AS name,
    COALESCE(SUM(d.order_qty), 0) AS units_sold,
    COALESCE(SUM(d.extended_price), 0) AS revenue,
    COALESCE(SUM(d.order_qty * COALESCE(d.unit_cost, i.std_cost, 0)), 0) AS cost
FROM inventory_item i
INNER JOIN sales_order_detail d ON TRIM(i.inventory_cd) = d.inventory_id
WHERE i.descr IS NOT NULL
GROUP BY TRIM(i.inventory_cd), i.descr
ORDER BY revenue DESC, product_id
LIMIT ?1
"#;

// ERP 无库存读数，库存列恒为 NULL
const ERP_STOCK_LEVELS_SQL: &str = r#"
SELECT
    TRIM(i.inventory_cd) AS product_id,
    i.descr AS name,
    NULL AS current_stock,
    NULL AS reorder_point
FROM inventory_item i
WHERE i.descr IS NOT NULL
ORDER BY product_id
LIMIT ?1
"#;

// ==========================================
// 演示/测试库结构
// ==========================================
// 与上面的聚合 SQL 对应的最小表结构，供演示数据生成与集成测试建库
pub mod schema {
    pub const POS_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS item (
    item_id TEXT PRIMARY KEY,
    description TEXT,
    default_cost REAL,
    avg_cost REAL
);
CREATE TABLE IF NOT EXISTS order_line (
    order_line_id INTEGER PRIMARY KEY,
    item_id TEXT,
    quantity INTEGER,
    price REAL,
    total REAL
);
CREATE TABLE IF NOT EXISTS item_shop (
    item_id TEXT,
    qoh INTEGER,
    reorder_point INTEGER
);
"#;

    pub const ERP_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS inventory_item (
    inventory_cd TEXT PRIMARY KEY,
    descr TEXT,
    std_cost REAL
);
CREATE TABLE IF NOT EXISTS sales_order_detail (
    line_nbr INTEGER PRIMARY KEY,
    inventory_id TEXT,
    order_qty INTEGER,
    unit_price REAL,
    unit_cost REAL,
    discount_amount REAL,
    extended_price REAL
);
"#;
}

/// SQLite 中负数 LIMIT 表示不限行数
const UNBOUNDED_LIMIT: i64 = -1;

// ==========================================
// SqliteSourceAdapter
// ==========================================
pub struct SqliteSourceAdapter {
    source: DataSource,
    db_path: PathBuf,
    query_timeout: Duration,
}

impl SqliteSourceAdapter {
    pub fn new(source: DataSource, db_path: impl Into<PathBuf>, query_timeout: Duration) -> Self {
        Self {
            source,
            db_path: db_path.into(),
            query_timeout,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn sql_for(&self, dataset: Dataset) -> &'static str {
        match (self.source, dataset) {
            (DataSource::Pos, Dataset::ProductSales) => POS_PRODUCT_SALES_SQL,
            (DataSource::Pos, Dataset::StockLevels) => POS_STOCK_LEVELS_SQL,
            (DataSource::Erp, Dataset::ProductSales) => ERP_PRODUCT_SALES_SQL,
            (DataSource::Erp, Dataset::StockLevels) => ERP_STOCK_LEVELS_SQL,
        }
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let path = self.db_path.to_string_lossy();
        open_readonly_connection(&path, self.query_timeout)
    }
}

/// 执行查询并把每行转换为 AggregateRow
fn query_rows(conn: &Connection, sql: &str, limit: i64) -> rusqlite::Result<Vec<AggregateRow>> {
    let mut stmt = conn.prepare(sql)?;
    let column_names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query(params![limit])?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let mut aggregate = AggregateRow::new();
        for (idx, name) in column_names.iter().enumerate() {
            aggregate.insert(name, CellValue::from(row.get_ref(idx)?));
        }
        result.push(aggregate);
    }
    Ok(result)
}

impl SourceAdapter for SqliteSourceAdapter {
    fn source(&self) -> DataSource {
        self.source
    }

    fn fetch_aggregate(
        &self,
        dataset: Dataset,
        params: &QueryParams,
    ) -> RepositoryResult<Vec<AggregateRow>> {
        let start = Instant::now();

        let conn = match self.open() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(
                    source = %self.source,
                    dataset = %dataset,
                    path = %self.db_path.display(),
                    error = %e,
                    "数据源不可达，返回空结果"
                );
                return Ok(Vec::new());
            }
        };

        let limit = params
            .limit
            .map(|n| i64::try_from(n).unwrap_or(i64::MAX))
            .unwrap_or(UNBOUNDED_LIMIT);
        let sql = self.sql_for(dataset);

        match run_with_timeout(&conn, self.query_timeout, |c| query_rows(c, sql, limit))? {
            QueryOutcome::Completed(rows) => {
                if params.limit.is_some_and(|n| rows.len() >= n) {
                    tracing::warn!(
                        source = %self.source,
                        dataset = %dataset,
                        limit = rows.len(),
                        "查询结果达到行数上限，已截断"
                    );
                }
                tracing::debug!(
                    source = %self.source,
                    dataset = %dataset,
                    rows = rows.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "聚合查询完成"
                );
                Ok(rows)
            }
            QueryOutcome::TimedOut => {
                tracing::warn!(
                    source = %self.source,
                    dataset = %dataset,
                    timeout_ms = self.query_timeout.as_millis() as u64,
                    "聚合查询超时，已中断"
                );
                Err(RepositoryError::QueryTimeout {
                    source_name: self.source.to_string(),
                    dataset: dataset.to_string(),
                    timeout: self.query_timeout,
                })
            }
        }
    }

    fn ping(&self) -> RepositoryResult<()> {
        let conn = self.open().map_err(|e| RepositoryError::SourceUnavailable {
            source_name: self.source.to_string(),
            reason: e.to_string(),
        })?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn pos_db() -> NamedTempFile {
        let file = NamedTempFile::new().unwrap();
        let conn = Connection::open(file.path()).unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE item (item_id TEXT PRIMARY KEY, description TEXT,
                               default_cost REAL, avg_cost REAL);
            CREATE TABLE order_line (order_line_id INTEGER PRIMARY KEY, item_id TEXT,
                                     quantity INTEGER, price REAL, total REAL);
            CREATE TABLE item_shop (item_id TEXT, qoh INTEGER, reorder_point INTEGER);

            INSERT INTO item VALUES ('A1', 'Silk Wand', 4.0, NULL);
            INSERT INTO item VALUES ('A2', 'Cotton Dress', NULL, 12.0);
            INSERT INTO item VALUES ('A3', NULL, 1.0, 1.0);
            INSERT INTO item VALUES ('Z9', 'Wand Charger', 2.0, NULL);
            INSERT INTO order_line VALUES (1, 'A1', 3, 10.0, 30.0);
            INSERT INTO order_line VALUES (2, 'A1', 2, 10.0, 20.0);
            INSERT INTO order_line VALUES (3, 'Z9', 1, 5.0, 5.0);
            INSERT INTO item_shop VALUES ('A1', 7, 2);
            INSERT INTO item_shop VALUES ('Z9', 0, 1);
            "#,
        )
        .unwrap();
        file
    }

    #[test]
    fn test_pos_product_sales_aggregates_order_lines() {
        let db = pos_db();
        let adapter = SqliteSourceAdapter::new(DataSource::Pos, db.path(), Duration::from_secs(5));

        let rows = adapter
            .fetch_aggregate(Dataset::ProductSales, &QueryParams::all())
            .unwrap();

        // 描述为空的商品被过滤，无销量商品保留
        assert_eq!(rows.len(), 3);
        let first = &rows[0];
        assert_eq!(first.get_text_or_empty(columns::PRODUCT_ID), "A1");
        assert_eq!(first.get_i64_or(columns::UNITS_SOLD, 0), 5);
        assert_eq!(first.get_f64_or(columns::REVENUE, 0.0), 50.0);
        assert_eq!(first.get_f64_or(columns::COST, 0.0), 20.0);
        assert_eq!(rows[2].get_text_or_empty(columns::PRODUCT_ID), "A2");
        assert_eq!(rows[2].get_i64_or(columns::UNITS_SOLD, -1), 0);
    }

    #[test]
    fn test_pos_stock_levels_keeps_missing_stock_as_null() {
        let db = pos_db();
        let adapter = SqliteSourceAdapter::new(DataSource::Pos, db.path(), Duration::from_secs(5));

        let rows = adapter
            .fetch_aggregate(Dataset::StockLevels, &QueryParams::all())
            .unwrap();

        // 库存升序，缺失读数排在最后
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get_text_or_empty(columns::PRODUCT_ID), "Z9");
        assert_eq!(rows[0].get_i64(columns::CURRENT_STOCK), Some(0));
        assert_eq!(rows[1].get_i64(columns::CURRENT_STOCK), Some(7));
        assert_eq!(rows[1].get_i64(columns::REORDER_POINT), Some(2));
        assert_eq!(rows[2].get_i64(columns::CURRENT_STOCK), None);
    }

    #[test]
    fn test_limit_is_applied() {
        let db = pos_db();
        let adapter = SqliteSourceAdapter::new(DataSource::Pos, db.path(), Duration::from_secs(5));
        let rows = adapter
            .fetch_aggregate(Dataset::ProductSales, &QueryParams::with_limit(1))
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_bounded_stock_query_keeps_lowest_stock() {
        let db = pos_db();
        let adapter = SqliteSourceAdapter::new(DataSource::Pos, db.path(), Duration::from_secs(5));
        let rows = adapter
            .fetch_aggregate(Dataset::StockLevels, &QueryParams::with_limit(1))
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_text_or_empty(columns::PRODUCT_ID), "Z9");
    }

    #[test]
    fn test_unreachable_source_returns_empty_rows() {
        let dir = tempfile::tempdir().unwrap();
        let adapter = SqliteSourceAdapter::new(
            DataSource::Erp,
            dir.path().join("offline.db"),
            Duration::from_secs(1),
        );

        let rows = adapter
            .fetch_aggregate(Dataset::ProductSales, &QueryParams::all())
            .unwrap();
        assert!(rows.is_empty());
        assert!(matches!(
            adapter.ping(),
            Err(RepositoryError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_missing_table_is_a_query_error() {
        let file = NamedTempFile::new().unwrap();
        Connection::open(file.path())
            .unwrap()
            .execute_batch("CREATE TABLE unrelated (x INTEGER);")
            .unwrap();
        let adapter =
            SqliteSourceAdapter::new(DataSource::Pos, file.path(), Duration::from_secs(1));

        let result = adapter.fetch_aggregate(Dataset::StockLevels, &QueryParams::all());
        assert!(matches!(result, Err(RepositoryError::DatabaseQueryError(_))));
        assert!(adapter.ping().is_ok());
    }
}
