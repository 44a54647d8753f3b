// 开发工具: 生成一套演示用 POS / ERP 数据库。
//
// 用法:
//   cargo run --bin seed_demo_sources -- [data_dir]
//
// 已存在的库会先备份为 <name>.db.bak.<时间戳> 再重建。

use chrono::Local;
use rusqlite::{params, Connection};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use sales_stock_vista::app::{get_default_data_dir, DataPaths};
use sales_stock_vista::db::open_sqlite_connection;
use sales_stock_vista::repository::sqlite_source::schema::{ERP_SCHEMA_SQL, POS_SCHEMA_SQL};

/// 演示商品: (编号, 描述, 成本, 售价, 库存, 再订货点, 90 天销量)
///
/// 库存与销量组合覆盖: 即将缺货 / 库存充足 / 零库存 / 缺少库存读数 / 零销量
const POS_ITEMS: &[(&str, &str, f64, f64, Option<i64>, Option<i64>, i64)] = &[
    ("P-1001", "Pocket Bullet Pink", 6.0, 19.99, Some(4), Some(5), 90),
    ("P-1002", "Rabbit Deluxe", 22.0, 59.99, Some(40), Some(6), 45),
    ("P-1003", "Water Based Lube 4oz", 2.5, 9.99, Some(12), Some(10), 180),
    ("P-1004", "Massage Oil Vanilla", 3.0, 12.99, Some(0), Some(8), 30),
    ("P-1005", "Lace Lingerie Set", 11.0, 34.99, Some(25), Some(4), 18),
    ("P-1006", "Rhino 69 Supplement", 1.0, 4.99, Some(300), Some(50), 270),
    ("P-1007", "Leather Harness", 18.0, 44.99, Some(9), Some(2), 3),
    ("P-1008", "Toy Cleaner Spray", 1.5, 7.99, None, None, 60),
    ("P-1009", "Gift Card", 0.0, 25.00, Some(100), None, 0),
    ("P-1010", "Silk Wand Massager", 35.0, 29.99, Some(6), Some(3), 12),
];

/// 批发商品: (编号, 描述, 标准成本, 单价, 销量)
///
/// ERP 编号带尾随空格，与订单明细中的编号需 TRIM 后才能关联
const ERP_ITEMS: &[(&str, &str, f64, f64, i64)] = &[
    ("W-2001    ", "Bullet Vibrator Wholesale Pack", 40.0, 95.0, 24),
    ("W-2002    ", "Lubricant Gallon", 30.0, 70.0, 40),
    ("W-2003    ", "Stocking Bundle", 12.0, 28.0, 15),
    ("W-2004    ", "Battery Pack AAA", 4.0, 9.0, 0),
];

fn main() -> Result<(), Box<dyn Error>> {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(get_default_data_dir);
    fs::create_dir_all(&dir)?;
    let paths = DataPaths::in_dir(&dir);

    backup_and_reset_db(&paths.pos_db)?;
    backup_and_reset_db(&paths.erp_db)?;

    let pos = open_sqlite_connection(&paths.pos_db.to_string_lossy())?;
    pos.execute_batch(POS_SCHEMA_SQL)?;
    seed_pos(&pos)?;

    let erp = open_sqlite_connection(&paths.erp_db.to_string_lossy())?;
    erp.execute_batch(ERP_SCHEMA_SQL)?;
    seed_erp(&erp)?;

    println!("POS: {} ({} items)", paths.pos_db.display(), POS_ITEMS.len());
    println!("ERP: {} ({} items)", paths.erp_db.display(), ERP_ITEMS.len());
    Ok(())
}

fn backup_and_reset_db(path: &Path) -> Result<(), Box<dyn Error>> {
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = PathBuf::from(format!("{}.bak.{}", path.display(), ts));
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", path.display(), backup_path.display());
    Ok(())
}

fn seed_pos(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let tx = conn.unchecked_transaction()?;
    let mut line_id: i64 = 0;

    for (item_id, description, cost, price, qoh, reorder_point, units) in POS_ITEMS {
        tx.execute(
            "INSERT INTO item (item_id, description, default_cost, avg_cost) VALUES (?1, ?2, ?3, ?3)",
            params![item_id, description, cost],
        )?;
        tx.execute(
            "INSERT INTO item_shop (item_id, qoh, reorder_point) VALUES (?1, ?2, ?3)",
            params![item_id, qoh, reorder_point],
        )?;

        // 销量拆成每单 1~3 件
        let mut remaining = *units;
        while remaining > 0 {
            line_id += 1;
            let quantity = remaining.min(1 + line_id % 3);
            tx.execute(
                "INSERT INTO order_line (order_line_id, item_id, quantity, price, total)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![line_id, item_id, quantity, price, price * quantity as f64],
            )?;
            remaining -= quantity;
        }
    }

    tx.commit()?;
    Ok(())
}

fn seed_erp(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let tx = conn.unchecked_transaction()?;
    let mut line_nbr: i64 = 0;

    for (inventory_cd, descr, std_cost, unit_price, qty) in ERP_ITEMS {
        tx.execute(
            "INSERT INTO inventory_item (inventory_cd, descr, std_cost) VALUES (?1, ?2, ?3)",
            params![inventory_cd, descr, std_cost],
        )?;
        if *qty == 0 {
            continue;
        }

        // 拆成两张订单明细，第二张带少量折扣
        let first = qty / 2;
        for (order_qty, discount) in [(first, 0.0), (qty - first, 5.0)] {
            if order_qty == 0 {
                continue;
            }
            line_nbr += 1;
            let extended = unit_price * order_qty as f64 - discount;
            tx.execute(
                "INSERT INTO sales_order_detail
                 (line_nbr, inventory_id, order_qty, unit_price, unit_cost, discount_amount, extended_price)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    line_nbr,
                    inventory_cd.trim(),
                    order_qty,
                    unit_price,
                    std_cost,
                    discount,
                    extended
                ],
            )?;
        }
    }

    tx.commit()?;
    Ok(())
}
