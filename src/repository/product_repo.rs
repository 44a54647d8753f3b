// ==========================================
// 销售库存分析系统 - 商品仓储
// ==========================================
// 职责: 调用各数据源适配器，把原始行映射为领域对象
// 红线: 缺失值在此处一次性替换为默认值，下游不再判空
//       （库存例外: 保持 Option，缺失库存的商品由补货引擎排除）
// ==========================================

use crate::domain::product::{ProductRecord, ProductSales, ProductSnapshot};
use crate::domain::types::DataSource;
use crate::engine::categorizer::categorize;
use crate::repository::error::RepositoryResult;
use crate::repository::source_adapter::{AggregateRow, Dataset, QueryParams, SourceAdapter};
use crate::repository::sqlite_source::columns;
use std::sync::Arc;

pub struct ProductRepository {
    adapters: Vec<Arc<dyn SourceAdapter>>,
}

impl ProductRepository {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn sources(&self) -> Vec<DataSource> {
        self.adapters.iter().map(|a| a.source()).collect()
    }

    /// 检查各数据源连通性
    ///
    /// # 返回
    /// - 可达的数据源列表（可能为空）
    pub fn reachable_sources(&self) -> Vec<DataSource> {
        self.adapters
            .iter()
            .filter_map(|adapter| match adapter.ping() {
                Ok(()) => Some(adapter.source()),
                Err(e) => {
                    tracing::warn!(source = %adapter.source(), error = %e, "数据源连通性检查失败");
                    None
                }
            })
            .collect()
    }

    /// 读取全部数据源的销售业绩
    pub fn load_product_sales(&self, params: &QueryParams) -> RepositoryResult<Vec<ProductSales>> {
        let mut sales = Vec::new();
        for adapter in &self.adapters {
            let rows = adapter.fetch_aggregate(Dataset::ProductSales, params)?;
            sales.extend(rows.iter().filter_map(|row| map_product_sales(adapter.source(), row)));
        }
        Ok(sales)
    }

    /// 读取全部数据源的库存快照
    pub fn load_stock_levels(&self, params: &QueryParams) -> RepositoryResult<Vec<ProductRecord>> {
        let mut records = Vec::new();
        for adapter in &self.adapters {
            let rows = adapter.fetch_aggregate(Dataset::StockLevels, params)?;
            records.extend(rows.iter().filter_map(|row| map_product_record(adapter.source(), row)));
        }
        Ok(records)
    }

    /// 读取单次刷新使用的完整快照（全量，不截断）
    ///
    /// 任一数据源超时或查询失败时整体返回错误（调用方保留旧缓存）
    pub fn load_snapshot(&self) -> RepositoryResult<ProductSnapshot> {
        let params = QueryParams::all();
        let sales = self.load_product_sales(&params)?;
        let records = self.load_stock_levels(&params)?;
        tracing::debug!(
            records = records.len(),
            sales = sales.len(),
            "商品快照已加载"
        );
        Ok(ProductSnapshot { records, sales })
    }
}

/// 原始行 → ProductSales（缺少商品编号的行丢弃）
fn map_product_sales(source: DataSource, row: &AggregateRow) -> Option<ProductSales> {
    let product_id = row.get_text(columns::PRODUCT_ID)?;
    let name = row.get_text_or_empty(columns::NAME);

    Some(ProductSales {
        category: categorize(&name).to_string(),
        product_id,
        name,
        source,
        units_sold: row.get_i64_or(columns::UNITS_SOLD, 0).max(0),
        revenue: row.get_f64_or(columns::REVENUE, 0.0),
        cost: row.get_f64_or(columns::COST, 0.0),
    })
}

/// 原始行 → ProductRecord（负库存视为缺失读数）
fn map_product_record(source: DataSource, row: &AggregateRow) -> Option<ProductRecord> {
    let product_id = row.get_text(columns::PRODUCT_ID)?;
    let name = row.get_text_or_empty(columns::NAME);

    Some(ProductRecord {
        category: categorize(&name).to_string(),
        product_id,
        name,
        source,
        current_stock: row.get_i64(columns::CURRENT_STOCK).filter(|s| *s >= 0),
        reorder_point: row.get_i64(columns::REORDER_POINT).filter(|p| *p >= 0),
    })
}
