use crate::schema::FinancialRecord;
use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Statement templates the pipeline can feed a renderer.
///
/// `CashFlow` is never auto-selected; it is reachable only through an
/// explicit template override on the processing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    BalanceSheet,
    IncomeStatement,
    TrialBalance,
    CashFlow,
}

impl TemplateKind {
    pub fn template_id(&self) -> &'static str {
        match self {
            Self::BalanceSheet => "balance_sheet",
            Self::IncomeStatement => "income_statement",
            Self::TrialBalance => "trial_balance",
            Self::CashFlow => "cash_flow",
        }
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.template_id())
    }
}

/// Minimum share of balance-sheet-typed records before the balance sheet
/// template is chosen.
pub const BALANCE_SHEET_THRESHOLD: f64 = 0.6;
/// Minimum share of income-statement-typed records before the income
/// statement template is chosen.
pub const INCOME_STATEMENT_THRESHOLD: f64 = 0.5;

/// Chooses a statement template from the dominant account-type mix.
/// Mixed, unclear or empty sets fall back to the trial balance.
pub fn select_template(records: &[FinancialRecord]) -> TemplateKind {
    if records.is_empty() {
        return TemplateKind::TrialBalance;
    }

    let bs_count = records
        .iter()
        .filter(|r| r.account_type.is_balance_sheet())
        .count();
    let is_count = records
        .iter()
        .filter(|r| r.account_type.is_income_statement())
        .count();
    let total = records.len();

    debug!(
        "Template detection - BS indicators: {}, IS indicators: {}",
        bs_count, is_count
    );

    if bs_count > is_count && bs_count as f64 >= total as f64 * BALANCE_SHEET_THRESHOLD {
        TemplateKind::BalanceSheet
    } else if is_count > bs_count && is_count as f64 >= total as f64 * INCOME_STATEMENT_THRESHOLD {
        TemplateKind::IncomeStatement
    } else {
        TemplateKind::TrialBalance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AccountType;

    fn typed(account_type: AccountType) -> FinancialRecord {
        let mut r = FinancialRecord::new("x");
        r.account_type = account_type;
        r
    }

    fn mix(bs: usize, is: usize, unknown: usize) -> Vec<FinancialRecord> {
        let mut records = Vec::new();
        for _ in 0..bs {
            records.push(typed(AccountType::Asset));
        }
        for _ in 0..is {
            records.push(typed(AccountType::Expense));
        }
        for _ in 0..unknown {
            records.push(typed(AccountType::Unknown));
        }
        records
    }

    #[test]
    fn test_empty_set_defaults_to_trial_balance() {
        assert_eq!(select_template(&[]), TemplateKind::TrialBalance);
    }

    #[test]
    fn test_dominant_balance_sheet_mix() {
        // 6 of 10 records are balance-sheet-typed: exactly the threshold.
        assert_eq!(select_template(&mix(6, 4, 0)), TemplateKind::BalanceSheet);
    }

    #[test]
    fn test_below_threshold_falls_to_trial_balance() {
        // bs_count > is_count but under the 60% share.
        assert_eq!(select_template(&mix(2, 1, 2)), TemplateKind::TrialBalance);
        // 5 of 10 is short of 60% and the income side is short of 50%.
        assert_eq!(select_template(&mix(5, 4, 1)), TemplateKind::TrialBalance);
    }

    #[test]
    fn test_dominant_income_statement_mix() {
        assert_eq!(select_template(&mix(2, 3, 0)), TemplateKind::IncomeStatement);
        // Exactly half income-statement records meets the 0.5 threshold.
        assert_eq!(select_template(&mix(2, 5, 3)), TemplateKind::IncomeStatement);
    }

    #[test]
    fn test_tie_falls_to_trial_balance() {
        assert_eq!(select_template(&mix(3, 3, 0)), TemplateKind::TrialBalance);
    }

    #[test]
    fn test_template_ids() {
        assert_eq!(TemplateKind::BalanceSheet.template_id(), "balance_sheet");
        assert_eq!(TemplateKind::IncomeStatement.to_string(), "income_statement");
    }
}
