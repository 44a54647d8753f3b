// ==========================================
// 销售库存分析系统 - 商品分类器
// ==========================================
// 规则: 按商品描述关键字匹配，按规则顺序取第一个命中
// 兜底: 描述为空或无命中 → Other
// ==========================================

use crate::domain::product::FALLBACK_CATEGORY;

/// 分类规则（顺序即优先级）
const CATEGORY_RULES: &[(&str, &[&str])] = &[
    ("Vibrators", &["vibrator", "rabbit", "bullet", "wand"]),
    ("Supplements", &["supplement", "rhino", "mood", "male", "female"]),
    ("Lubricants", &["lube", "lubricant", "gel", "oil"]),
    (
        "Clothing & Accessories",
        &["dress", "lingerie", "bra", "panty", "stocking", "heels", "shoes"],
    ),
    ("Adult Toys", &["dildo", "plug", "ring", "harness", "restraint"]),
    ("Accessories", &["cleaner", "clean", "charger", "battery"]),
];

/// 按描述判定分类
pub fn categorize(description: &str) -> &'static str {
    let lower = description.to_lowercase();
    if lower.trim().is_empty() {
        return FALLBACK_CATEGORY;
    }

    CATEGORY_RULES
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(FALLBACK_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_matching() {
        assert_eq!(categorize("Pocket Bullet Pink"), "Vibrators");
        assert_eq!(categorize("RHINO 69 Supplement"), "Supplements");
        assert_eq!(categorize("Water based LUBE 4oz"), "Lubricants");
        assert_eq!(categorize("Lace Lingerie Set"), "Clothing & Accessories");
        assert_eq!(categorize("Leather Harness"), "Adult Toys");
        assert_eq!(categorize("Toy Cleaner Spray"), "Accessories");
    }

    #[test]
    fn test_rule_order_wins() {
        // "wand" 与 "charger" 同时命中，取排在前面的规则
        assert_eq!(categorize("Wand USB Charger"), "Vibrators");
    }

    #[test]
    fn test_unknown_and_blank_fall_back() {
        assert_eq!(categorize("Gift Card"), FALLBACK_CATEGORY);
        assert_eq!(categorize(""), FALLBACK_CATEGORY);
        assert_eq!(categorize("   "), FALLBACK_CATEGORY);
    }
}
