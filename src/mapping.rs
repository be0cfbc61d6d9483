use crate::config::ReportMeta;
use crate::error::Result;
use crate::schema::{AccountType, FinancialRecord};
use crate::templates::TemplateKind;
use chrono::Local;
use log::info;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Tolerance applied to the rendered balance check flag.
const BALANCE_CHECK_TOLERANCE: f64 = 0.01;

/// Flattened per-record line for tabular templates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountLine {
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub debit: f64,
    pub credit: f64,
    pub balance: f64,
}

/// Named accumulation buckets keyed off account-name keywords. Every field
/// defaults to zero; buckets with no contributing records stay zero and the
/// derived totals still compute.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatementBuckets {
    pub cash: f64,
    pub accounts_receivable: f64,
    pub inventory: f64,
    pub prepaid_expenses: f64,
    pub ppe: f64,
    pub investments: f64,
    pub intangible_assets: f64,
    pub accounts_payable: f64,
    pub accrued_expenses: f64,
    pub short_term_debt: f64,
    pub long_term_debt: f64,
    pub deferred_tax: f64,
    pub share_capital: f64,
    pub retained_earnings: f64,
    pub sales_revenue: f64,
    pub service_revenue: f64,
    pub other_income: f64,
    pub cogs: f64,
    pub salaries: f64,
    pub rent: f64,
    pub utilities: f64,
    pub insurance: f64,
    pub depreciation: f64,
    pub marketing: f64,
    pub professional_fees: f64,
    pub office_expenses: f64,
    pub other_expenses: f64,
    pub interest_income: f64,
    pub interest_expense: f64,
}

impl StatementBuckets {
    /// Routes one record into at most one bucket. Evaluation order is the
    /// priority order; a cash account never also counts as a receivable.
    fn accumulate(&mut self, record: &FinancialRecord) {
        let name = record.account_name.to_lowercase();
        let debit_side = debit_or_balance(record);
        let credit_side = credit_or_abs_balance(record);

        if name.contains("cash") || name.contains("bank") {
            self.cash += debit_side;
        } else if name.contains("receivable") {
            self.accounts_receivable += debit_side;
        } else if name.contains("inventory") {
            self.inventory += debit_side;
        } else if name.contains("payable") {
            self.accounts_payable += credit_side;
        } else if name.contains("revenue") || name.contains("sales") {
            if name.contains("service") {
                self.service_revenue += credit_side;
            } else {
                self.sales_revenue += credit_side;
            }
        } else if name.contains("expense") || name.contains("cost") {
            if name.contains("salary") || name.contains("wage") {
                self.salaries += debit_side;
            } else if name.contains("rent") {
                self.rent += debit_side;
            } else if name.contains("utility") || name.contains("utilities") {
                self.utilities += debit_side;
            } else if name.contains("cogs") || name.contains("cost of goods") {
                self.cogs += debit_side;
            } else {
                self.other_expenses += debit_side;
            }
        }
    }
}

/// Debit magnitude when present, otherwise the signed balance.
fn debit_or_balance(record: &FinancialRecord) -> f64 {
    if record.debit != 0.0 {
        record.debit
    } else {
        record.balance
    }
}

/// Credit magnitude when present, otherwise the absolute balance.
fn credit_or_abs_balance(record: &FinancialRecord) -> f64 {
    if record.credit != 0.0 {
        record.credit
    } else {
        record.balance.abs()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BalanceSheetTotals {
    pub total_current_assets: f64,
    pub total_non_current_assets: f64,
    pub total_assets: f64,
    pub total_current_liabilities: f64,
    pub total_non_current_liabilities: f64,
    pub total_equity: f64,
    pub total_liab_equity: f64,
}

impl BalanceSheetTotals {
    fn from_buckets(b: &StatementBuckets) -> Self {
        let total_current_assets =
            b.cash + b.accounts_receivable + b.inventory + b.prepaid_expenses;
        let total_non_current_assets = b.ppe + b.investments + b.intangible_assets;
        let total_current_liabilities =
            b.accounts_payable + b.accrued_expenses + b.short_term_debt;
        let total_non_current_liabilities = b.long_term_debt + b.deferred_tax;
        let total_equity = b.share_capital + b.retained_earnings;

        Self {
            total_current_assets,
            total_non_current_assets,
            total_assets: total_current_assets + total_non_current_assets,
            total_current_liabilities,
            total_non_current_liabilities,
            total_equity,
            total_liab_equity: total_current_liabilities
                + total_non_current_liabilities
                + total_equity,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IncomeStatementTotals {
    pub total_revenue: f64,
    pub gross_profit: f64,
    pub total_operating_expenses: f64,
    pub operating_income: f64,
    pub net_other_income: f64,
    pub net_income: f64,
    pub gross_margin: f64,
    pub operating_margin: f64,
    pub net_margin: f64,
}

impl IncomeStatementTotals {
    fn from_buckets(b: &StatementBuckets) -> Self {
        let total_revenue = b.sales_revenue + b.service_revenue + b.other_income;
        let gross_profit = total_revenue - b.cogs;
        let total_operating_expenses = b.salaries
            + b.rent
            + b.utilities
            + b.insurance
            + b.depreciation
            + b.marketing
            + b.professional_fees
            + b.office_expenses
            + b.other_expenses;
        let operating_income = gross_profit - total_operating_expenses;
        let net_other_income = b.interest_income - b.interest_expense;
        let net_income = operating_income + net_other_income;

        let margin = |value: f64| {
            if total_revenue > 0.0 {
                value / total_revenue * 100.0
            } else {
                0.0
            }
        };

        Self {
            total_revenue,
            gross_profit,
            total_operating_expenses,
            operating_income,
            net_other_income,
            net_income,
            gross_margin: margin(gross_profit),
            operating_margin: margin(operating_income),
            net_margin: margin(net_income),
        }
    }
}

/// Complete variable set handed to a rendering collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateData {
    pub company_name: String,
    pub date: String,
    pub generation_date: String,
    pub total_accounts: usize,
    pub accounts: Vec<AccountLine>,
    pub total_debits: f64,
    pub total_credits: f64,
    pub balance_difference: f64,
    pub balance_check: bool,
    pub account_type_summary: BTreeMap<String, usize>,
    #[serde(flatten)]
    pub buckets: StatementBuckets,
    #[serde(flatten)]
    pub balance_sheet: Option<BalanceSheetTotals>,
    #[serde(flatten)]
    pub income_statement: Option<IncomeStatementTotals>,
}

/// Wire payload for the rendering collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct RenderPayload {
    pub template: TemplateKind,
    pub variables: Map<String, Value>,
}

/// Aggregates records into template variables and statement-specific
/// derived totals.
#[derive(Debug, Clone, Default)]
pub struct TemplateDataMapper {
    meta: ReportMeta,
}

impl TemplateDataMapper {
    pub fn new(meta: ReportMeta) -> Self {
        Self { meta }
    }

    pub fn build(&self, records: &[FinancialRecord], template: TemplateKind) -> TemplateData {
        info!("Mapping data to template: {}", template);

        let mut accounts = Vec::with_capacity(records.len());
        let mut account_type_summary: BTreeMap<String, usize> = BTreeMap::new();
        let mut buckets = StatementBuckets::default();
        let mut total_debits = 0.0;
        let mut total_credits = 0.0;

        for record in records {
            total_debits += record.debit;
            total_credits += record.credit;

            *account_type_summary
                .entry(record.account_type.as_str().to_string())
                .or_insert(0) += 1;

            accounts.push(AccountLine {
                name: record.account_name.clone(),
                account_type: record.account_type,
                debit: record.debit,
                credit: record.credit,
                balance: record.balance,
            });

            buckets.accumulate(record);
        }

        let balance_difference = (total_debits - total_credits).abs();
        let now = Local::now();

        TemplateData {
            company_name: self.meta.company_name.clone(),
            date: now.format("%B %d, %Y").to_string(),
            generation_date: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            total_accounts: records.len(),
            accounts,
            total_debits,
            total_credits,
            balance_difference,
            balance_check: balance_difference <= BALANCE_CHECK_TOLERANCE,
            account_type_summary,
            balance_sheet: (template == TemplateKind::BalanceSheet)
                .then(|| BalanceSheetTotals::from_buckets(&buckets)),
            income_statement: (template == TemplateKind::IncomeStatement)
                .then(|| IncomeStatementTotals::from_buckets(&buckets)),
            buckets,
        }
    }

    /// Serializes the typed data into the `{template, variables}` contract
    /// consumed by the rendering collaborator.
    pub fn render_payload(
        &self,
        records: &[FinancialRecord],
        template: TemplateKind,
    ) -> Result<RenderPayload> {
        let data = self.build(records, template);
        let variables = match serde_json::to_value(&data)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Ok(RenderPayload {
            template,
            variables,
        })
    }
}
