use crate::config::ValidationRules;
use crate::schema::FinancialRecord;
use log::info;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Aggregate verdict over a record set. Imbalance is the only error
/// condition; everything else surfaces as warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    #[schemars(description = "True iff balance_difference <= tolerance")]
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub total_debits: f64,
    pub total_credits: f64,
    #[schemars(description = "Absolute difference between total debits and total credits")]
    pub balance_difference: f64,
    pub records_processed: usize,
    pub empty_accounts: usize,
    pub zero_amounts: usize,
}

/// Summary statistics over a normalized record set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordStats {
    pub total_records: usize,
    pub account_types: BTreeMap<String, usize>,
    pub categories: BTreeMap<String, usize>,
    pub total_debits: f64,
    pub total_credits: f64,
    pub largest_debit: f64,
    pub largest_credit: f64,
    pub accounts_with_description: usize,
}

/// Checks double-entry balance and data quality over a normalized record
/// set in a single pass.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    rules: ValidationRules,
}

impl Validator {
    pub fn new(rules: ValidationRules) -> Self {
        Self { rules }
    }

    pub fn validate(&self, records: &[FinancialRecord]) -> ValidationResult {
        info!("Validating {} financial records", records.len());

        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut total_debits = 0.0;
        let mut total_credits = 0.0;
        let mut empty_accounts = 0;
        let mut zero_amounts = 0;

        for record in records {
            total_debits += record.debit;
            total_credits += record.credit;

            if record.account_name.chars().count() < self.rules.min_account_name_length {
                empty_accounts += 1;
            }

            if record.debit == 0.0 && record.credit == 0.0 && record.balance == 0.0 {
                zero_amounts += 1;
            }

            if record.debit > self.rules.max_amount || record.credit > self.rules.max_amount {
                warnings.push(format!(
                    "Large amount detected in account '{}': ${:.2}",
                    record.account_name,
                    record.debit.max(record.credit)
                ));
            }
        }

        let balance_difference = (total_debits - total_credits).abs();

        if balance_difference > self.rules.tolerance {
            errors.push(format!(
                "Trial balance does not balance: Debits (${:.2}) != Credits (${:.2}), Difference: ${:.2}",
                total_debits, total_credits, balance_difference
            ));
        }

        if empty_accounts > 0 {
            warnings.push(format!(
                "{} records have missing or invalid account names",
                empty_accounts
            ));
        }

        if zero_amounts > 0 {
            warnings.push(format!("{} records have zero amounts", zero_amounts));
        }

        let named: Vec<&str> = records
            .iter()
            .filter(|r| !r.account_name.is_empty())
            .map(|r| r.account_name.as_str())
            .collect();
        let unique: HashSet<&str> = named.iter().copied().collect();
        let duplicates = named.len() - unique.len();
        if duplicates > 0 {
            warnings.push(format!("{} duplicate account names detected", duplicates));
        }

        let is_valid = errors.is_empty();

        info!(
            "Validation complete: {} - {} errors, {} warnings",
            if is_valid { "PASSED" } else { "FAILED" },
            errors.len(),
            warnings.len()
        );

        ValidationResult {
            is_valid,
            errors,
            warnings,
            total_debits,
            total_credits,
            balance_difference,
            records_processed: records.len(),
            empty_accounts,
            zero_amounts,
        }
    }

    /// Descriptive statistics for audit details and run summaries.
    pub fn summarize(&self, records: &[FinancialRecord]) -> RecordStats {
        let mut stats = RecordStats {
            total_records: records.len(),
            ..RecordStats::default()
        };

        for record in records {
            stats.total_debits += record.debit;
            stats.total_credits += record.credit;
            stats.largest_debit = stats.largest_debit.max(record.debit);
            stats.largest_credit = stats.largest_credit.max(record.credit);

            *stats
                .account_types
                .entry(record.account_type.as_str().to_string())
                .or_insert(0) += 1;
            *stats.categories.entry(record.category.clone()).or_insert(0) += 1;

            if !record.description.is_empty() {
                stats.accounts_with_description += 1;
            }
        }

        stats
    }
}
