// ==========================================
// 销售库存分析系统 - 数据源适配器接口
// ==========================================
// 职责: 对外部数据源执行只读聚合查询，返回原始行
// 红线: 单次尝试、不重试；查询必须有超时上限
// 说明: 缺失/空值在 AggregateRow 访问器处统一替换为默认值（只在这一处）
// ==========================================

use crate::domain::types::DataSource;
use crate::repository::error::RepositoryResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ==========================================
// Dataset - 聚合查询的数据集
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// 商品销售汇总（销量、销售额、成本）
    ProductSales,
    /// 商品库存水位（库存、再订货点）
    StockLevels,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::ProductSales => "product_sales",
            Dataset::StockLevels => "stock_levels",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// QueryParams - 查询参数
// ==========================================
// 刷新快照必须覆盖全部商品，只有展示型查询才设置行数上限
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryParams {
    /// 最大返回行数（None = 不限）
    pub limit: Option<usize>,
}

impl QueryParams {
    /// 全量查询
    pub fn all() -> Self {
        Self { limit: None }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self { limit: Some(limit) }
    }
}

// ==========================================
// CellValue / AggregateRow - 原始行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<rusqlite::types::ValueRef<'_>> for CellValue {
    fn from(value: rusqlite::types::ValueRef<'_>) -> Self {
        use rusqlite::types::ValueRef;
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(i) => CellValue::Integer(i),
            ValueRef::Real(f) => CellValue::Real(f),
            ValueRef::Text(t) => CellValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(_) => CellValue::Null,
        }
    }
}

/// 一行聚合结果（列名 → 值）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateRow {
    cells: HashMap<String, CellValue>,
}

impl AggregateRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: CellValue) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: CellValue) {
        self.cells.insert(column.to_string(), value);
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// 可选整数（NULL/缺列/无法转换 → None）
    ///
    /// 浮点值向零截断，文本尝试解析
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.cells.get(column)? {
            CellValue::Integer(i) => Some(*i),
            CellValue::Real(f) if f.is_finite() => Some(f.trunc() as i64),
            CellValue::Text(s) => s.trim().parse::<i64>().ok().or_else(|| {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            }),
            _ => None,
        }
    }

    /// 可选浮点（NaN/无穷视为缺失）
    pub fn get_f64(&self, column: &str) -> Option<f64> {
        let value = match self.cells.get(column)? {
            CellValue::Integer(i) => *i as f64,
            CellValue::Real(f) => *f,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Null => return None,
        };
        value.is_finite().then_some(value)
    }

    /// 可选文本（空白串视为缺失）
    pub fn get_text(&self, column: &str) -> Option<String> {
        let text = match self.cells.get(column)? {
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Real(f) => f.to_string(),
            CellValue::Null => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn get_i64_or(&self, column: &str, default: i64) -> i64 {
        self.get_i64(column).unwrap_or(default)
    }

    pub fn get_f64_or(&self, column: &str, default: f64) -> f64 {
        self.get_f64(column).unwrap_or(default)
    }

    pub fn get_text_or_empty(&self, column: &str) -> String {
        self.get_text(column).unwrap_or_default()
    }
}

// ==========================================
// SourceAdapter Trait
// ==========================================
// 实现者: SqliteSourceAdapter（生产）、测试中的内存桩
pub trait SourceAdapter: Send + Sync {
    /// 适配器对应的数据源
    fn source(&self) -> DataSource;

    /// 执行聚合查询
    ///
    /// # 返回
    /// - Ok(rows): 查询成功；数据源不可达时为空集合（非致命）
    /// - Err(QueryTimeout): 超时，调用方保留旧缓存
    /// - Err(DatabaseQueryError): 查询失败
    fn fetch_aggregate(
        &self,
        dataset: Dataset,
        params: &QueryParams,
    ) -> RepositoryResult<Vec<AggregateRow>>;

    /// 连通性检查（启动时使用）
    fn ping(&self) -> RepositoryResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_accessors_substitute_defaults() {
        let row = AggregateRow::new()
            .with("stock", CellValue::Null)
            .with("sold", CellValue::Real(12.9))
            .with("revenue", CellValue::Text(" 45.5 ".to_string()))
            .with("name", CellValue::Text("   ".to_string()))
            .with("cost", CellValue::Real(f64::NAN));

        assert_eq!(row.get_i64("stock"), None);
        assert_eq!(row.get_i64_or("stock", 0), 0);
        assert_eq!(row.get_i64_or("sold", 0), 12);
        assert_eq!(row.get_f64_or("revenue", 0.0), 45.5);
        assert_eq!(row.get_text_or_empty("name"), "");
        assert_eq!(row.get_f64_or("cost", 0.0), 0.0);
        assert_eq!(row.get_i64_or("missing_column", -1), -1);
    }

    #[test]
    fn test_integer_text_is_parsed() {
        let row = AggregateRow::new()
            .with("qoh", CellValue::Text("17".to_string()))
            .with("reorder_point", CellValue::Text("3.0".to_string()));
        assert_eq!(row.get_i64("qoh"), Some(17));
        assert_eq!(row.get_i64("reorder_point"), Some(3));
        assert_eq!(row.get_text("qoh").as_deref(), Some("17"));
    }
}
