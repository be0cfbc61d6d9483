use crate::schema::AccountType;
use serde::{Deserialize, Serialize};

/// Thresholds applied by the validator. Constructed once per run and passed
/// in explicitly; components never read ambient configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRules {
    /// Maximum acceptable |total debits - total credits| before the data
    /// set is considered not balanced.
    pub tolerance: f64,
    /// Amounts above this ceiling produce a warning, not an error.
    pub max_amount: f64,
    /// Account names shorter than this count as missing.
    pub min_account_name_length: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            tolerance: 0.01,
            max_amount: 999_999_999.99,
            min_account_name_length: 2,
        }
    }
}

/// One classification category: the type it maps to, the category key
/// recorded on the record, and the name keywords that select it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub account_type: AccountType,
    pub key: String,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    fn new(account_type: AccountType, key: &str, keywords: &[&str]) -> Self {
        Self {
            account_type,
            key: key.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Ordered keyword-category table driving account classification.
///
/// Order is significant: an account name matching keywords from two
/// categories resolves to the earlier one. "Loan Receivable" hits both
/// "receivable" (assets) and "loan" (liabilities) and classifies as an
/// Asset because assets is listed first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRules {
    pub categories: Vec<CategoryRule>,
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self {
            categories: vec![
                CategoryRule::new(
                    AccountType::Asset,
                    "assets",
                    &[
                        "cash",
                        "bank",
                        "receivable",
                        "inventory",
                        "equipment",
                        "building",
                        "assets",
                    ],
                ),
                CategoryRule::new(
                    AccountType::Liability,
                    "liabilities",
                    &["payable", "debt", "loan", "liability", "accrued"],
                ),
                CategoryRule::new(
                    AccountType::Equity,
                    "equity",
                    &["equity", "capital", "retained", "earnings", "stock"],
                ),
                CategoryRule::new(
                    AccountType::Revenue,
                    "revenue",
                    &["revenue", "income", "sales", "turnover"],
                ),
                CategoryRule::new(
                    AccountType::Expense,
                    "expenses",
                    &["expense", "cost", "salary", "rent", "utilities"],
                ),
            ],
        }
    }
}

/// Presentation metadata carried into template variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub company_name: String,
}

impl Default for ReportMeta {
    fn default() -> Self {
        Self {
            company_name: "Your Company Name".to_string(),
        }
    }
}

/// Full configuration consumed by the pipeline. One instance per run
/// setup; components receive their slice at construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub validation: ValidationRules,
    pub categories: CategoryRules,
    pub report: ReportMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let rules = ValidationRules::default();
        assert_eq!(rules.tolerance, 0.01);
        assert_eq!(rules.max_amount, 999_999_999.99);
        assert_eq!(rules.min_account_name_length, 2);
    }

    #[test]
    fn test_category_order_is_fixed() {
        let rules = CategoryRules::default();
        let keys: Vec<&str> = rules.categories.iter().map(|c| c.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["assets", "liabilities", "equity", "revenue", "expenses"]
        );
    }
}
