// ==========================================
// 销售库存分析系统 - 领域类型定义
// ==========================================
// 职责: 数据源、紧急等级、补货触发方式等枚举
// 红线: 紧急等级是"等级制",由缺货天数单向映射
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 数据源 (Data Source)
// ==========================================
// Pos: 门店收银系统（含库存数量、再订货点）
// Erp: ERP 销售订单系统（无库存数量）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataSource {
    Pos,
    Erp,
}

impl DataSource {
    pub const ALL: [DataSource; 2] = [DataSource::Pos, DataSource::Erp];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Pos => "POS",
            DataSource::Erp => "ERP",
        }
    }

    /// 宽松解析（大小写不敏感），无法识别时返回 None
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "POS" | "A" => Some(DataSource::Pos),
            "ERP" | "B" => Some(DataSource::Erp),
            _ => None,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 补货紧急等级 (Restock Urgency)
// ==========================================
// 边界（下侧闭区间）:
//   days <= 7        → Critical
//   7 < days <= 14   → High
//   14 < days <= 30  → Medium
//   days > 30        → Low
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Low,
}

impl Urgency {
    pub const CRITICAL_MAX_DAYS: f64 = 7.0;
    pub const HIGH_MAX_DAYS: f64 = 14.0;
    pub const MEDIUM_MAX_DAYS: f64 = 30.0;

    /// 按缺货天数判定紧急等级（纯映射）
    pub fn from_days(days_until_stockout: f64) -> Self {
        if days_until_stockout <= Self::CRITICAL_MAX_DAYS {
            Urgency::Critical
        } else if days_until_stockout <= Self::HIGH_MAX_DAYS {
            Urgency::High
        } else if days_until_stockout <= Self::MEDIUM_MAX_DAYS {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Urgency::Critical => write!(f, "Critical"),
            Urgency::High => write!(f, "High"),
            Urgency::Medium => write!(f, "Medium"),
            Urgency::Low => write!(f, "Low"),
        }
    }
}

// ==========================================
// 补货触发方式 (Restock Trigger)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestockTrigger {
    Projection,   // 按销售速率预测缺货天数
    ReorderPoint, // 回退规则: 库存 <= 再订货点
}

impl fmt::Display for RestockTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestockTrigger::Projection => write!(f, "PROJECTION"),
            RestockTrigger::ReorderPoint => write!(f, "REORDER_POINT"),
        }
    }
}

// ==========================================
// 补货策略 (Restock Policy)
// ==========================================
// 默认只使用速率预测；回退策略仅在单品缺少销售速率数据时启用再订货点规则
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RestockPolicy {
    #[default]
    PurchaseRate,
    PurchaseRateWithReorderFallback,
}

impl RestockPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PURCHASE_RATE" => Some(RestockPolicy::PurchaseRate),
            "PURCHASE_RATE_WITH_REORDER_FALLBACK" | "REORDER_FALLBACK" => {
                Some(RestockPolicy::PurchaseRateWithReorderFallback)
            }
            _ => None,
        }
    }

    pub fn allows_reorder_fallback(&self) -> bool {
        matches!(self, RestockPolicy::PurchaseRateWithReorderFallback)
    }
}

impl fmt::Display for RestockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestockPolicy::PurchaseRate => write!(f, "PURCHASE_RATE"),
            RestockPolicy::PurchaseRateWithReorderFallback => {
                write!(f, "PURCHASE_RATE_WITH_REORDER_FALLBACK")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urgency_boundaries_are_inclusive() {
        assert_eq!(Urgency::from_days(0.0), Urgency::Critical);
        assert_eq!(Urgency::from_days(7.0), Urgency::Critical);
        assert_eq!(Urgency::from_days(7.0001), Urgency::High);
        assert_eq!(Urgency::from_days(14.0), Urgency::High);
        assert_eq!(Urgency::from_days(14.0001), Urgency::Medium);
        assert_eq!(Urgency::from_days(30.0), Urgency::Medium);
        assert_eq!(Urgency::from_days(30.0001), Urgency::Low);
        assert_eq!(Urgency::from_days(365.0), Urgency::Low);
    }

    #[test]
    fn test_data_source_parse() {
        assert_eq!(DataSource::parse("pos"), Some(DataSource::Pos));
        assert_eq!(DataSource::parse(" ERP "), Some(DataSource::Erp));
        assert_eq!(DataSource::parse("b"), Some(DataSource::Erp));
        assert_eq!(DataSource::parse("warehouse"), None);
    }

    #[test]
    fn test_restock_policy_parse() {
        assert_eq!(
            RestockPolicy::parse("reorder_fallback"),
            Some(RestockPolicy::PurchaseRateWithReorderFallback)
        );
        assert_eq!(RestockPolicy::parse("PURCHASE_RATE"), Some(RestockPolicy::PurchaseRate));
        assert!(RestockPolicy::parse("static").is_none());
        assert!(!RestockPolicy::default().allows_reorder_fallback());
    }
}
