use anyhow::Result;
use financial_statement_builder::*;

fn table_from_csv(data: &str) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new().from_reader(data.as_bytes());
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();

    let mut table = RawTable::new(headers);
    for record in reader.records() {
        let record = record?;
        table.push_row(
            record
                .iter()
                .map(|field| {
                    let trimmed = field.trim();
                    if trimmed.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(trimmed.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(table)
}

#[test]
fn test_balanced_trial_balance_from_csv() -> Result<()> {
    let csv_data = "\
Account Name,Debit,Credit
Cash at Bank,\"$25,000.00\",
Accounts Receivable,\"$8,500.00\",
Inventory,\"$12,000.00\",
Equipment,\"$30,000.00\",
Accounts Payable,,\"$7,500.00\"
Bank Loan,,\"$20,000.00\"
Share Capital,,\"$40,000.00\"
Retained Earnings,,\"$8,000.00\"
";

    let table = table_from_csv(csv_data)?;
    let artifacts = build_statement(&table)?;

    assert_eq!(artifacts.records.len(), 8);
    assert!(artifacts.validation.is_valid);
    assert_eq!(artifacts.validation.total_debits, 75_500.0);
    assert_eq!(artifacts.validation.total_credits, 75_500.0);
    assert_eq!(artifacts.validation.balance_difference, 0.0);

    // Every account classifies to the balance sheet side, so the balance
    // sheet template is selected and its derived totals are present.
    assert_eq!(artifacts.template, TemplateKind::BalanceSheet);
    assert_eq!(artifacts.payload.variables["cash"], 25_000.0);
    assert_eq!(artifacts.payload.variables["accounts_receivable"], 8_500.0);
    assert_eq!(artifacts.payload.variables["inventory"], 12_000.0);
    assert_eq!(artifacts.payload.variables["accounts_payable"], 7_500.0);
    assert_eq!(artifacts.payload.variables["total_current_assets"], 45_500.0);
    assert_eq!(
        artifacts.payload.variables["total_current_liabilities"],
        7_500.0
    );
    Ok(())
}

#[test]
fn test_income_statement_from_csv_with_type_column() -> Result<()> {
    let csv_data = "\
Account,Amount,Type
Sales Revenue,\"85,000.00\",Credit
Service Revenue,\"15,000.00\",Credit
Cost of Goods Sold,\"40,000.00\",Debit
Salaries Expense,\"25,000.00\",Debit
Rent Expense,\"12,000.00\",Debit
Utilities Expense,\"3,000.00\",Debit
";

    let table = table_from_csv(csv_data)?;
    let artifacts = build_statement(&table)?;

    // Revenue and expense accounts dominate: income statement template.
    assert_eq!(artifacts.template, TemplateKind::IncomeStatement);

    // A profit-making period never balances as a trial balance; the
    // builder reports the verdict without blocking.
    assert!(!artifacts.validation.is_valid);
    assert_eq!(artifacts.validation.total_credits, 100_000.0);
    assert_eq!(artifacts.validation.total_debits, 80_000.0);

    assert_eq!(artifacts.payload.variables["sales_revenue"], 85_000.0);
    assert_eq!(artifacts.payload.variables["service_revenue"], 15_000.0);
    assert_eq!(artifacts.payload.variables["cogs"], 40_000.0);
    assert_eq!(artifacts.payload.variables["rent"], 12_000.0);
    assert_eq!(artifacts.payload.variables["utilities"], 3_000.0);
    // "Salaries" misses the singular salary/wage keywords and lands in the
    // catch-all expense bucket.
    assert_eq!(artifacts.payload.variables["salaries"], 0.0);
    assert_eq!(artifacts.payload.variables["other_expenses"], 25_000.0);

    assert_eq!(artifacts.payload.variables["total_revenue"], 100_000.0);
    assert_eq!(artifacts.payload.variables["gross_profit"], 60_000.0);
    assert_eq!(
        artifacts.payload.variables["total_operating_expenses"],
        40_000.0
    );
    assert_eq!(artifacts.payload.variables["operating_income"], 20_000.0);
    assert_eq!(artifacts.payload.variables["net_income"], 20_000.0);
    assert_eq!(artifacts.payload.variables["gross_margin"], 60.0);
    assert_eq!(artifacts.payload.variables["net_margin"], 20.0);
    Ok(())
}

#[test]
fn test_single_amount_column_without_type() -> Result<()> {
    let csv_data = "\
Account,Amount
Sales Revenue,500
Rent Expense,-200
";

    let table = table_from_csv(csv_data)?;
    let artifacts = build_statement(&table)?;

    assert_eq!(artifacts.records[0].debit, 500.0);
    assert_eq!(artifacts.records[0].original_amount, Some(500.0));
    assert_eq!(artifacts.records[1].credit, 200.0);
    assert_eq!(artifacts.records[1].original_amount, Some(-200.0));
    Ok(())
}

#[test]
fn test_parenthesized_negatives_and_contra_accounts() -> Result<()> {
    let csv_data = "\
Account,Balance
Equipment,\"50,000.00\"
Accumulated Depreciation - Equipment,\"(12,000.00)\"
";

    let table = table_from_csv(csv_data)?;
    let artifacts = StatementBuilder::default().build(&table, Some(TemplateKind::TrialBalance))?;

    // The contra asset's negative balance lands on the credit side.
    assert_eq!(artifacts.records[0].debit, 50_000.0);
    assert_eq!(artifacts.records[1].credit, 12_000.0);
    assert_eq!(artifacts.records[1].balance, -12_000.0);
    Ok(())
}

struct CsvExtractor {
    data: String,
}

impl DataExtractor for CsvExtractor {
    fn extract(&self, _source: &str) -> ExtractionResult {
        match table_from_csv(&self.data) {
            Ok(table) => ExtractionResult::ok(table),
            Err(e) => ExtractionResult::failed(format!("CSV extraction failed: {}", e)),
        }
    }
}

struct MarkdownRenderer;

impl StatementRenderer for MarkdownRenderer {
    fn render(&self, payload: &RenderPayload) -> financial_statement_builder::Result<String> {
        let mut content = format!("# {}\n\n", payload.template);
        content.push_str(&format!(
            "Total Debits: {}\nTotal Credits: {}\n",
            payload.variables["total_debits"], payload.variables["total_credits"]
        ));
        Ok(content)
    }
}

struct CollectingEmitter;

impl OutputEmitter for CollectingEmitter {
    fn emit(
        &self,
        base_name: &str,
        formats: &[String],
        content: &str,
        _payload: &RenderPayload,
    ) -> financial_statement_builder::Result<Vec<String>> {
        assert!(!content.is_empty());
        Ok(formats
            .iter()
            .map(|format| format!("output/{}.{}", base_name, format))
            .collect())
    }
}

#[test]
fn test_pipeline_end_to_end_over_csv() {
    let csv_data = "\
Account,Debit,Credit
Cash,\"1,000.00\",
Common Stock,,\"1,000.00\"
"
    .to_string();

    let mut pipeline = FinancialPipeline::new(PipelineConfig::default())
        .with_extractor(CsvExtractor { data: csv_data })
        .with_renderer(MarkdownRenderer)
        .with_output(CollectingEmitter)
        .with_audit(MemoryAuditSink::new());

    let request = ProcessRequest::new("opening_entries.csv").with_user("analyst");
    let outcome = pipeline.process(&request);

    assert!(outcome.success, "errors: {:?}", outcome.errors);
    assert_eq!(outcome.template_used, Some(TemplateKind::BalanceSheet));
    assert_eq!(outcome.output_files.len(), 2);
    assert!(outcome.output_files[0].starts_with("output/opening_entries_"));

    let summary = outcome.summary.expect("summary on success");
    assert_eq!(summary.records_processed, 2);
    assert_eq!(summary.total_debits, 1000.0);
    assert_eq!(summary.total_credits, 1000.0);
    assert_eq!(summary.validation_status, "passed");
}

#[test]
fn test_pipeline_rejects_unbalanced_csv() {
    let csv_data = "\
Account,Debit,Credit
Cash,\"5,000.00\",
Common Stock,,\"1,000.00\"
"
    .to_string();

    let mut pipeline = FinancialPipeline::new(PipelineConfig::default())
        .with_extractor(CsvExtractor { data: csv_data })
        .with_renderer(MarkdownRenderer)
        .with_output(CollectingEmitter);

    let outcome = pipeline.process(&ProcessRequest::new("broken.csv"));

    assert!(!outcome.success);
    assert!(outcome.errors[0].contains("does not balance"));
    assert!(outcome.output_files.is_empty());
}

#[test]
fn test_custom_tolerance_configuration() -> Result<()> {
    let csv_data = "\
Account,Debit,Credit
Cash,100.50,
Common Stock,,100.00
";

    let table = table_from_csv(csv_data)?;

    // Default tolerance rejects a 50 cent difference.
    let strict = StatementBuilder::default().build(&table, None)?;
    assert!(!strict.validation.is_valid);

    // A looser tolerance accepts it.
    let config = PipelineConfig {
        validation: ValidationRules {
            tolerance: 1.0,
            ..ValidationRules::default()
        },
        ..PipelineConfig::default()
    };
    let loose = StatementBuilder::new(config).build(&table, None)?;
    assert!(loose.validation.is_valid);
    Ok(())
}
