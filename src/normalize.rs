use crate::amount::parse_amount;
use crate::classify::AccountClassifier;
use crate::columns::{CanonicalColumn, ColumnMap};
use crate::schema::{Cell, FinancialRecord, RawTable};
use log::info;

/// Transforms a raw tabular dataset into canonical financial records.
///
/// Pure and order-preserving: one record per input row, no hidden state.
/// A row never fails on its own; unparseable amounts degrade to 0.0 and
/// the row is still emitted. An empty table yields an empty list, which
/// downstream stages treat as a non-fatal "no records" condition.
#[derive(Debug, Clone, Default)]
pub struct RecordNormalizer {
    classifier: AccountClassifier,
}

impl RecordNormalizer {
    pub fn new(classifier: AccountClassifier) -> Self {
        Self { classifier }
    }

    pub fn normalize(&self, table: &RawTable) -> Vec<FinancialRecord> {
        info!("Normalizing financial data");

        let columns = ColumnMap::map_headers(&table.headers);
        let records: Vec<FinancialRecord> = table
            .rows
            .iter()
            .map(|row| self.normalize_row(row, &columns))
            .collect();

        info!("Normalized {} financial records", records.len());
        records
    }

    fn normalize_row(&self, row: &[Cell], columns: &ColumnMap) -> FinancialRecord {
        let cell_at = |idx: Option<usize>| idx.and_then(|i| row.get(i));

        let account_name = cell_at(columns.account_name_index())
            .and_then(Cell::as_text)
            .unwrap_or_default();

        let mut record = FinancialRecord::new(account_name);

        if let Some(cell) = cell_at(columns.index_of(CanonicalColumn::Description)) {
            if let Some(text) = cell.as_text() {
                record.description = text;
            }
        }

        record.debit = parse_amount(cell_at(columns.index_of(CanonicalColumn::Debit)));
        record.credit = parse_amount(cell_at(columns.index_of(CanonicalColumn::Credit)));
        record.balance = parse_amount(cell_at(columns.index_of(CanonicalColumn::Balance)));

        // A single amount column carries ambiguous debit/credit semantics;
        // a type column settles it, otherwise the sign convention does.
        if record.debit == 0.0 && record.credit == 0.0 {
            if let Some(amount_idx) = columns.index_of(CanonicalColumn::Amount) {
                let amount = parse_amount(row.get(amount_idx));
                record.original_amount = Some(amount);

                let type_marker = cell_at(columns.index_of(CanonicalColumn::Type))
                    .and_then(Cell::as_text);

                match type_marker {
                    Some(marker) => {
                        let marker = marker.to_lowercase();
                        if marker.contains("credit") || marker.contains("cr") {
                            record.credit = amount.abs();
                        } else {
                            record.debit = amount.abs();
                        }
                    }
                    None => {
                        if amount >= 0.0 {
                            record.debit = amount;
                        } else {
                            record.credit = amount.abs();
                        }
                    }
                }
            }
        }

        // Balance-only rows: the sign decides which side the value lands on.
        if record.debit == 0.0 && record.credit == 0.0 && record.balance != 0.0 {
            if record.balance >= 0.0 {
                record.debit = record.balance;
            } else {
                record.credit = record.balance.abs();
            }
        }

        let (account_type, category) = self.classifier.classify(&record.account_name);
        record.account_type = account_type;
        record.category = category;

        record
    }
}
