// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 在临时目录中生成 POS / ERP 数据库并组装 AppState
// ==========================================

#![allow(dead_code)]

use rusqlite::{params, Connection};
use sales_stock_vista::app::{AppState, DataPaths};
use sales_stock_vista::config::DashboardConfig;
use sales_stock_vista::logging;
use sales_stock_vista::repository::sqlite_source::schema::{ERP_SCHEMA_SQL, POS_SCHEMA_SQL};
use std::error::Error;
use std::path::Path;
use tempfile::TempDir;

/// POS 测试商品
#[derive(Debug, Clone)]
pub struct PosItem {
    pub item_id: String,
    pub description: String,
    pub cost: f64,
    pub price: f64,
    pub qoh: Option<i64>,
    pub reorder_point: Option<i64>,
    pub units_sold: i64,
}

impl PosItem {
    pub fn new(
        item_id: &str,
        description: &str,
        price: f64,
        qoh: Option<i64>,
        units_sold: i64,
    ) -> Self {
        Self {
            item_id: item_id.to_string(),
            description: description.to_string(),
            cost: price / 2.0,
            price,
            qoh,
            reorder_point: None,
            units_sold,
        }
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }

    pub fn reorder_point(mut self, point: i64) -> Self {
        self.reorder_point = Some(point);
        self
    }
}

/// ERP 测试商品（编号写入时补尾随空格）
#[derive(Debug, Clone)]
pub struct ErpItem {
    pub inventory_cd: String,
    pub descr: String,
    pub std_cost: f64,
    pub unit_price: f64,
    pub order_qty: i64,
}

impl ErpItem {
    pub fn new(
        inventory_cd: &str,
        descr: &str,
        std_cost: f64,
        unit_price: f64,
        order_qty: i64,
    ) -> Self {
        Self {
            inventory_cd: inventory_cd.to_string(),
            descr: descr.to_string(),
            std_cost,
            unit_price,
            order_qty,
        }
    }
}

/// 临时数据源目录（需要保持存活）
pub struct TestSources {
    pub dir: TempDir,
    pub paths: DataPaths,
}

impl TestSources {
    pub fn new() -> Result<Self, Box<dyn Error>> {
        logging::init_test();
        let dir = TempDir::new()?;
        let paths = DataPaths::in_dir(dir.path());
        Ok(Self { dir, paths })
    }

    /// 重建 POS 库
    pub fn write_pos(&self, items: &[PosItem]) -> Result<(), Box<dyn Error>> {
        let conn = recreate(&self.paths.pos_db)?;
        conn.execute_batch(POS_SCHEMA_SQL)?;

        for (idx, item) in items.iter().enumerate() {
            conn.execute(
                "INSERT INTO item (item_id, description, default_cost, avg_cost) VALUES (?1, ?2, ?3, NULL)",
                params![item.item_id, item.description, item.cost],
            )?;
            conn.execute(
                "INSERT INTO item_shop (item_id, qoh, reorder_point) VALUES (?1, ?2, ?3)",
                params![item.item_id, item.qoh, item.reorder_point],
            )?;
            if item.units_sold > 0 {
                conn.execute(
                    "INSERT INTO order_line (order_line_id, item_id, quantity, price, total)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        idx as i64 + 1,
                        item.item_id,
                        item.units_sold,
                        item.price,
                        item.price * item.units_sold as f64
                    ],
                )?;
            }
        }
        Ok(())
    }

    /// 重建 ERP 库
    pub fn write_erp(&self, items: &[ErpItem]) -> Result<(), Box<dyn Error>> {
        let conn = recreate(&self.paths.erp_db)?;
        conn.execute_batch(ERP_SCHEMA_SQL)?;

        for (idx, item) in items.iter().enumerate() {
            conn.execute(
                "INSERT INTO inventory_item (inventory_cd, descr, std_cost) VALUES (?1, ?2, ?3)",
                params![format!("{}   ", item.inventory_cd), item.descr, item.std_cost],
            )?;
            if item.order_qty > 0 {
                conn.execute(
                    "INSERT INTO sales_order_detail
                     (line_nbr, inventory_id, order_qty, unit_price, unit_cost, discount_amount, extended_price)
                     VALUES (?1, ?2, ?3, ?4, NULL, 0, ?5)",
                    params![
                        idx as i64 + 1,
                        item.inventory_cd,
                        item.order_qty,
                        item.unit_price,
                        item.unit_price * item.order_qty as f64
                    ],
                )?;
            }
        }
        Ok(())
    }

    /// 破坏 POS 库结构: 库仍可连接，但聚合查询失败
    pub fn break_pos(&self) -> Result<(), Box<dyn Error>> {
        let conn = Connection::open(&self.paths.pos_db)?;
        conn.execute_batch("DROP TABLE IF EXISTS order_line; DROP TABLE IF EXISTS item_shop;")?;
        Ok(())
    }

    /// 创建一个可连接但没有业务表的 POS 库
    pub fn write_empty_pos(&self) -> Result<(), Box<dyn Error>> {
        let conn = recreate(&self.paths.pos_db)?;
        conn.execute_batch("CREATE TABLE placeholder (x INTEGER);")?;
        Ok(())
    }

    pub fn state(&self, config: DashboardConfig) -> Result<AppState, Box<dyn Error>> {
        Ok(AppState::with_config(self.paths.clone(), config)?)
    }
}

fn recreate(path: &Path) -> Result<Connection, Box<dyn Error>> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(Connection::open(path)?)
}

/// 测试用配置（缩短查询超时）
pub fn test_config() -> DashboardConfig {
    DashboardConfig {
        query_timeout_ms: 5_000,
        ..DashboardConfig::default()
    }
}

/// 标准场景 POS 商品
///
/// - P-1 即将缺货（库存 4，90 天售出 90 件）
/// - P-2 库存充足（库存 300，90 天售出 270 件，负毛利）
/// - P-3 零销量
pub fn standard_pos_items() -> Vec<PosItem> {
    vec![
        PosItem::new("P-1", "Pocket Bullet", 20.0, Some(4), 90)
            .cost(8.0)
            .reorder_point(5),
        PosItem::new("P-2", "Rhino Supplement", 5.0, Some(300), 270).cost(6.0),
        PosItem::new("P-3", "Gift Card", 25.0, Some(50), 0),
    ]
}

/// 标准场景 ERP 商品（无库存读数）
pub fn standard_erp_items() -> Vec<ErpItem> {
    vec![ErpItem::new("W-1", "Lubricant Gallon", 30.0, 70.0, 10)]
}

/// 按标准场景建库
pub fn standard_sources() -> Result<TestSources, Box<dyn Error>> {
    let sources = TestSources::new()?;
    sources.write_pos(&standard_pos_items())?;
    sources.write_erp(&standard_erp_items())?;
    Ok(sources)
}
