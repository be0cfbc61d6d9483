use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum AccountType {
    #[schemars(description = "Resources owned by the company: cash, accounts receivable, inventory, equipment (Balance Sheet, debit balance)")]
    Asset,

    #[schemars(description = "Obligations owed to creditors: accounts payable, loans, accrued expenses (Balance Sheet, credit balance)")]
    Liability,

    #[schemars(description = "Owner's residual interest: share capital, retained earnings (Balance Sheet, credit balance)")]
    Equity,

    #[schemars(description = "Income from sales of goods or services (Income Statement, credit balance)")]
    Revenue,

    #[schemars(description = "Costs incurred to generate revenue: salaries, rent, cost of goods sold (Income Statement, debit balance)")]
    Expense,

    #[schemars(description = "Account name did not match any classification keyword")]
    Unknown,
}

impl AccountType {
    pub fn is_balance_sheet(&self) -> bool {
        matches!(self, Self::Asset | Self::Liability | Self::Equity)
    }

    pub fn is_income_statement(&self) -> bool {
        matches!(self, Self::Revenue | Self::Expense)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "Asset",
            Self::Liability => "Liability",
            Self::Equity => "Equity",
            Self::Revenue => "Revenue",
            Self::Expense => "Expense",
            Self::Unknown => "Unknown",
        }
    }
}

/// One normalized ledger line. Debit and credit are non-negative magnitudes;
/// `balance` keeps the source sign (positive = debit-normal).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FinancialRecord {
    #[schemars(description = "Account name as it appeared in the source, trimmed. May be empty; the validator flags it.")]
    pub account_name: String,

    #[schemars(description = "Debit magnitude, always >= 0")]
    pub debit: f64,

    #[schemars(description = "Credit magnitude, always >= 0")]
    pub credit: f64,

    #[schemars(description = "Signed balance when the source supplied one")]
    pub balance: f64,

    pub account_type: AccountType,

    #[schemars(description = "Classification category key (e.g. 'assets'), or 'other'")]
    pub category: String,

    pub description: String,

    #[schemars(description = "Set only when the source supplied a single ambiguous amount column")]
    pub original_amount: Option<f64>,
}

impl FinancialRecord {
    pub fn new(account_name: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            debit: 0.0,
            credit: 0.0,
            balance: 0.0,
            account_type: AccountType::Unknown,
            category: "other".to_string(),
            description: String::new(),
            original_amount: None,
        }
    }
}

/// A single table cell as delivered by an extraction collaborator.
/// Spreadsheet readers yield numbers, CSV/PDF readers yield text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Text form used for account names and type markers.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Cell::Number(n) => Some(n.to_string()),
            Cell::Empty => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

/// Raw tabular dataset from an extraction collaborator. Column identity is
/// unreliable; the column mapper resolves headers to canonical slots.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// Result contract of the ingestion collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub table: Option<RawTable>,
    pub metadata: BTreeMap<String, String>,
    pub errors: Vec<String>,
}

impl ExtractionResult {
    pub fn ok(table: RawTable) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("rows".to_string(), table.rows.len().to_string());
        metadata.insert("columns".to_string(), table.headers.len().to_string());
        Self {
            success: true,
            table: Some(table),
            metadata,
            errors: Vec::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            table: None,
            metadata: BTreeMap::new(),
            errors: vec![error.into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_text_extraction() {
        assert_eq!(Cell::from("  Cash  ").as_text(), Some("Cash".to_string()));
        assert_eq!(Cell::from("   ").as_text(), None);
        assert_eq!(Cell::Empty.as_text(), None);
        assert_eq!(Cell::from(12.5).as_text(), Some("12.5".to_string()));
    }

    #[test]
    fn test_cell_untagged_deserialization() {
        let cell: Cell = serde_json::from_str("1234.5").unwrap();
        assert_eq!(cell, Cell::Number(1234.5));

        let cell: Cell = serde_json::from_str("\"Cash at Bank\"").unwrap();
        assert_eq!(cell, Cell::Text("Cash at Bank".to_string()));
    }

    #[test]
    fn test_record_serialization_round_trip() {
        let mut record = FinancialRecord::new("Cash");
        record.debit = 1000.0;
        record.account_type = AccountType::Asset;
        record.category = "assets".to_string();

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"Asset\""));

        let back: FinancialRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_account_type_statement_side() {
        assert!(AccountType::Asset.is_balance_sheet());
        assert!(AccountType::Equity.is_balance_sheet());
        assert!(AccountType::Revenue.is_income_statement());
        assert!(!AccountType::Unknown.is_balance_sheet());
        assert!(!AccountType::Unknown.is_income_statement());
    }
}
