//! # Financial Statement Builder
//!
//! A library for normalizing ledger-style tabular data (spreadsheet, CSV or
//! PDF extractions) into balanced financial records and rendering-ready
//! statement payloads.
//!
//! ## Core Concepts
//!
//! - **Raw Table**: rows and headers as an extraction collaborator produced
//!   them, with unreliable column identity
//! - **Financial Record**: one canonical ledger line with non-negative
//!   debit/credit magnitudes and a classified account type
//! - **Validation**: aggregate debit/credit totals checked against a
//!   balance tolerance, with data-quality warnings
//! - **Template Selection**: the dominant account-type mix picks a balance
//!   sheet, income statement or trial balance
//! - **Pipeline**: a fail-fast run over security, ingestion, validation,
//!   template mapping and output stages with step-level audit events
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_statement_builder::*;
//!
//! let mut table = RawTable::new(vec![
//!     "Account".to_string(),
//!     "Debit".to_string(),
//!     "Credit".to_string(),
//! ]);
//! table.push_row(vec!["Cash".into(), "$1,000.00".into(), Cell::Empty]);
//! table.push_row(vec!["Common Stock".into(), Cell::Empty, 1000.0.into()]);
//!
//! let artifacts = build_statement(&table)?;
//! assert!(artifacts.validation.is_valid);
//! assert_eq!(artifacts.template, TemplateKind::BalanceSheet);
//! ```

pub mod amount;
pub mod audit;
pub mod classify;
pub mod columns;
pub mod config;
pub mod error;
pub mod mapping;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod templates;
pub mod validate;

pub use amount::{parse_amount, parse_amount_text};
pub use audit::{AuditRecord, AuditSink, MemoryAuditSink, SessionStatus, StepEvent, StepStatus};
pub use classify::AccountClassifier;
pub use columns::{CanonicalColumn, ColumnMap};
pub use config::{CategoryRule, CategoryRules, PipelineConfig, ReportMeta, ValidationRules};
pub use error::{Result, StatementError};
pub use mapping::{
    AccountLine, BalanceSheetTotals, IncomeStatementTotals, RenderPayload, StatementBuckets,
    TemplateData, TemplateDataMapper,
};
pub use normalize::RecordNormalizer;
pub use pipeline::{
    DataExtractor, FinancialPipeline, OutputEmitter, PipelineStage, ProcessRequest,
    ProcessingOutcome, RunSummary, ScanReport, SecurityScanner, StatementRenderer,
};
pub use schema::{AccountType, Cell, ExtractionResult, FinancialRecord, RawTable};
pub use templates::{select_template, TemplateKind};
pub use validate::{RecordStats, ValidationResult, Validator};

use log::info;

/// In-memory result of the core path over one table: the normalized
/// records, their validation verdict, the selected template and the
/// variables payload a renderer would receive.
#[derive(Debug, Clone)]
pub struct StatementArtifacts {
    pub records: Vec<FinancialRecord>,
    pub validation: ValidationResult,
    pub template: TemplateKind,
    pub payload: RenderPayload,
}

/// Runs normalization, validation, template selection and data mapping
/// without any collaborators. Unlike the pipeline, an out-of-tolerance
/// record set is returned with `validation.is_valid == false` rather than
/// aborted; callers inspect the verdict.
pub struct StatementBuilder {
    normalizer: RecordNormalizer,
    validator: Validator,
    mapper: TemplateDataMapper,
}

impl StatementBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            normalizer: RecordNormalizer::new(AccountClassifier::new(config.categories)),
            validator: Validator::new(config.validation),
            mapper: TemplateDataMapper::new(config.report),
        }
    }

    pub fn build(
        &self,
        table: &RawTable,
        template_override: Option<TemplateKind>,
    ) -> Result<StatementArtifacts> {
        if table.is_empty() {
            return Err(StatementError::EmptyDataset);
        }

        let records = self.normalizer.normalize(table);
        if records.is_empty() {
            return Err(StatementError::NoRecords);
        }

        let validation = self.validator.validate(&records);
        let template = template_override.unwrap_or_else(|| select_template(&records));
        info!("Statement build selected template: {}", template);
        let payload = self.mapper.render_payload(&records, template)?;

        Ok(StatementArtifacts {
            records,
            validation,
            template,
            payload,
        })
    }
}

impl Default for StatementBuilder {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

/// Convenience entry point with default configuration and automatic
/// template selection.
pub fn build_statement(table: &RawTable) -> Result<StatementArtifacts> {
    StatementBuilder::default().build(table, None)
}
