use crate::audit::{AuditSink, SessionStatus, StepEvent};
use crate::classify::AccountClassifier;
use crate::config::PipelineConfig;
use crate::error::{Result, StatementError};
use crate::mapping::{RenderPayload, TemplateDataMapper};
use crate::normalize::RecordNormalizer;
use crate::schema::ExtractionResult;
use crate::templates::{select_template, TemplateKind};
use crate::validate::{ValidationResult, Validator};
use chrono::Local;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Instant;

/// Stages of a processing run, in execution order. Each stage either
/// produces input for the next or fails the run; nothing is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    SecurityScan,
    DataIngestion,
    Validation,
    TemplateProcessing,
    OutputGeneration,
}

impl PipelineStage {
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::SecurityScan => "security_scan",
            Self::DataIngestion => "data_ingestion",
            Self::Validation => "validation",
            Self::TemplateProcessing => "template_processing",
            Self::OutputGeneration => "output_generation",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.step_name())
    }
}

/// Verdict of the security collaborator over one source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub safe: bool,
    pub file_hash: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ScanReport {
    pub fn passed(file_hash: impl Into<String>) -> Self {
        Self {
            safe: true,
            file_hash: file_hash.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            safe: false,
            file_hash: String::new(),
            errors: vec![error.into()],
            warnings: Vec::new(),
        }
    }
}

/// File security collaborator (size/extension checks, hashing, scanning).
pub trait SecurityScanner {
    fn scan(&self, source: &str) -> ScanReport;
}

/// Format-specific extraction collaborator (spreadsheet, CSV, PDF readers).
pub trait DataExtractor {
    fn extract(&self, source: &str) -> ExtractionResult;
}

/// Turns a render payload into statement content.
pub trait StatementRenderer {
    fn render(&self, payload: &RenderPayload) -> Result<String>;
}

/// Writes rendered content out in the requested formats and returns the
/// created file identifiers.
pub trait OutputEmitter {
    fn emit(
        &self,
        base_name: &str,
        formats: &[String],
        content: &str,
        payload: &RenderPayload,
    ) -> Result<Vec<String>>;
}

/// One processing request. The source reference and output formats are
/// opaque to the core and passed through to collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub source: String,
    pub user_id: String,
    pub output_formats: Vec<String>,
    pub template_override: Option<TemplateKind>,
    pub file_hash: String,
}

impl ProcessRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            user_id: "system".to_string(),
            output_formats: vec!["md".to_string(), "html".to_string()],
            template_override: None,
            file_hash: String::new(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn with_formats(mut self, formats: Vec<String>) -> Self {
        self.output_formats = formats;
        self
    }

    pub fn with_template(mut self, template: TemplateKind) -> Self {
        self.template_override = Some(template);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub source: String,
    pub template_used: String,
    pub records_processed: usize,
    pub output_formats: Vec<String>,
    pub processing_time_seconds: f64,
    pub validation_status: String,
    pub total_debits: f64,
    pub total_credits: f64,
}

/// Final state of one processing run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessingOutcome {
    pub success: bool,
    pub session_id: String,
    pub template_used: Option<TemplateKind>,
    pub output_files: Vec<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub processing_time_seconds: f64,
    pub summary: Option<RunSummary>,
}

/// Sequences one run: security -> ingestion -> validation -> template
/// mapping/rendering -> output. Fail-fast: the first failing stage aborts
/// the rest and marks the run failed. Collaborators are optional at the
/// type level; a missing required collaborator fails the run with an
/// explicit error naming the stage. Audit failures are logged, never fatal.
pub struct FinancialPipeline {
    normalizer: RecordNormalizer,
    validator: Validator,
    mapper: TemplateDataMapper,
    security: Option<Box<dyn SecurityScanner>>,
    extractor: Option<Box<dyn DataExtractor>>,
    renderer: Option<Box<dyn StatementRenderer>>,
    output: Option<Box<dyn OutputEmitter>>,
    audit: Option<Box<dyn AuditSink>>,
}

impl FinancialPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            normalizer: RecordNormalizer::new(AccountClassifier::new(config.categories)),
            validator: Validator::new(config.validation),
            mapper: TemplateDataMapper::new(config.report),
            security: None,
            extractor: None,
            renderer: None,
            output: None,
            audit: None,
        }
    }

    pub fn with_security(mut self, scanner: impl SecurityScanner + 'static) -> Self {
        self.security = Some(Box::new(scanner));
        self
    }

    pub fn with_extractor(mut self, extractor: impl DataExtractor + 'static) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    pub fn with_renderer(mut self, renderer: impl StatementRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn with_output(mut self, output: impl OutputEmitter + 'static) -> Self {
        self.output = Some(Box::new(output));
        self
    }

    pub fn with_audit(mut self, audit: impl AuditSink + 'static) -> Self {
        self.audit = Some(Box::new(audit));
        self
    }

    pub fn process(&mut self, request: &ProcessRequest) -> ProcessingOutcome {
        let run_started = Instant::now();
        let mut outcome = ProcessingOutcome::default();

        let session_id = self.audit_start(request);
        outcome.session_id = session_id.clone();
        info!(
            "Starting workflow for source: {} (Session: {})",
            request.source, session_id
        );

        // Security scan. The scanner is the one optional gate: when absent
        // the stage is skipped with a warning instead of failing the run.
        let step_started = Instant::now();
        self.audit_step(
            &session_id,
            StepEvent::started(
                PipelineStage::SecurityScan.step_name(),
                json!({ "source": request.source }),
            ),
        );
        let scan = self.security.as_ref().map(|s| s.scan(&request.source));
        match scan {
            Some(report) => {
                outcome.warnings.extend(report.warnings.iter().cloned());
                if !report.safe {
                    return self.fail_run(
                        outcome,
                        &session_id,
                        PipelineStage::SecurityScan,
                        report.errors,
                        step_started,
                        run_started,
                    );
                }
                let details = serde_json::to_value(&report).unwrap_or(Value::Null);
                self.audit_step(
                    &session_id,
                    StepEvent::completed(
                        PipelineStage::SecurityScan.step_name(),
                        elapsed_ms(step_started),
                        details,
                    ),
                );
            }
            None => {
                warn!("Security scanner not available - skipping security scan");
                self.audit_step(
                    &session_id,
                    StepEvent::completed(
                        PipelineStage::SecurityScan.step_name(),
                        elapsed_ms(step_started),
                        json!({ "skipped": true }),
                    ),
                );
            }
        }

        // Data ingestion.
        let step_started = Instant::now();
        self.audit_step(
            &session_id,
            StepEvent::started(PipelineStage::DataIngestion.step_name(), Value::Null),
        );
        let mut extraction = match self.extractor.as_ref() {
            Some(extractor) => extractor.extract(&request.source),
            None => {
                let err = StatementError::CollaboratorUnavailable {
                    stage: PipelineStage::DataIngestion.to_string(),
                };
                return self.fail_run(
                    outcome,
                    &session_id,
                    PipelineStage::DataIngestion,
                    vec![err.to_string()],
                    step_started,
                    run_started,
                );
            }
        };
        let table = match extraction.table.take() {
            Some(table) if extraction.success => table,
            _ => {
                let mut errors = std::mem::take(&mut extraction.errors);
                if errors.is_empty() {
                    errors.push(
                        StatementError::ExtractionFailed("no table produced".to_string())
                            .to_string(),
                    );
                }
                return self.fail_run(
                    outcome,
                    &session_id,
                    PipelineStage::DataIngestion,
                    errors,
                    step_started,
                    run_started,
                );
            }
        };
        self.audit_step(
            &session_id,
            StepEvent::completed(
                PipelineStage::DataIngestion.step_name(),
                elapsed_ms(step_started),
                json!(extraction.metadata),
            ),
        );

        // Validation and normalization.
        let step_started = Instant::now();
        self.audit_step(
            &session_id,
            StepEvent::started(PipelineStage::Validation.step_name(), Value::Null),
        );
        if table.is_empty() {
            return self.fail_run(
                outcome,
                &session_id,
                PipelineStage::Validation,
                vec![StatementError::EmptyDataset.to_string()],
                step_started,
                run_started,
            );
        }
        let records = self.normalizer.normalize(&table);
        if records.is_empty() {
            return self.fail_run(
                outcome,
                &session_id,
                PipelineStage::Validation,
                vec![StatementError::NoRecords.to_string()],
                step_started,
                run_started,
            );
        }
        let validation = self.validator.validate(&records);
        outcome.warnings.extend(validation.warnings.iter().cloned());
        self.audit_validation(&session_id, &validation);
        if !validation.is_valid {
            // Out-of-tolerance books block statement generation.
            return self.fail_run(
                outcome,
                &session_id,
                PipelineStage::Validation,
                validation.errors.clone(),
                step_started,
                run_started,
            );
        }
        self.audit_step(
            &session_id,
            StepEvent::completed(
                PipelineStage::Validation.step_name(),
                elapsed_ms(step_started),
                json!({
                    "is_valid": validation.is_valid,
                    "total_records": validation.records_processed,
                    "total_debits": validation.total_debits,
                    "total_credits": validation.total_credits,
                    "balance_difference": validation.balance_difference,
                }),
            ),
        );

        // Template selection, data mapping and rendering.
        let step_started = Instant::now();
        self.audit_step(
            &session_id,
            StepEvent::started(PipelineStage::TemplateProcessing.step_name(), Value::Null),
        );
        let template = request
            .template_override
            .unwrap_or_else(|| select_template(&records));
        outcome.template_used = Some(template);
        self.audit_template(&session_id, template);

        let payload = match self.mapper.render_payload(&records, template) {
            Ok(payload) => payload,
            Err(e) => {
                return self.fail_run(
                    outcome,
                    &session_id,
                    PipelineStage::TemplateProcessing,
                    vec![e.to_string()],
                    step_started,
                    run_started,
                );
            }
        };
        let rendered = match self.renderer.as_ref() {
            Some(renderer) => renderer.render(&payload),
            None => Err(StatementError::CollaboratorUnavailable {
                stage: PipelineStage::TemplateProcessing.to_string(),
            }),
        };
        let content = match rendered {
            Ok(content) => content,
            Err(e) => {
                return self.fail_run(
                    outcome,
                    &session_id,
                    PipelineStage::TemplateProcessing,
                    vec![e.to_string()],
                    step_started,
                    run_started,
                );
            }
        };
        self.audit_step(
            &session_id,
            StepEvent::completed(
                PipelineStage::TemplateProcessing.step_name(),
                elapsed_ms(step_started),
                json!({ "template_used": template.template_id() }),
            ),
        );

        // Output emission.
        let step_started = Instant::now();
        self.audit_step(
            &session_id,
            StepEvent::started(PipelineStage::OutputGeneration.step_name(), Value::Null),
        );
        let base_name = output_base_name(&request.source);
        let emitted = match self.output.as_ref() {
            Some(output) => output.emit(&base_name, &request.output_formats, &content, &payload),
            None => Err(StatementError::CollaboratorUnavailable {
                stage: PipelineStage::OutputGeneration.to_string(),
            }),
        };
        let files = match emitted {
            Ok(files) => files,
            Err(e) => {
                return self.fail_run(
                    outcome,
                    &session_id,
                    PipelineStage::OutputGeneration,
                    vec![e.to_string()],
                    step_started,
                    run_started,
                );
            }
        };
        outcome.output_files = files;
        for file in outcome.output_files.clone() {
            self.audit_output_file(&session_id, &file);
        }
        self.audit_step(
            &session_id,
            StepEvent::completed(
                PipelineStage::OutputGeneration.step_name(),
                elapsed_ms(step_started),
                json!({
                    "formats_generated": request.output_formats,
                    "files_created": outcome.output_files.len(),
                }),
            ),
        );

        outcome.success = true;
        outcome.processing_time_seconds = run_started.elapsed().as_secs_f64();
        outcome.summary = Some(RunSummary {
            source: request.source.clone(),
            template_used: template.template_id().to_string(),
            records_processed: records.len(),
            output_formats: request.output_formats.clone(),
            processing_time_seconds: outcome.processing_time_seconds,
            validation_status: if validation.warnings.is_empty() {
                "passed".to_string()
            } else {
                "warnings".to_string()
            },
            total_debits: validation.total_debits,
            total_credits: validation.total_credits,
        });
        self.audit_end(&session_id, SessionStatus::Completed);
        info!("Workflow completed successfully for session {}", session_id);

        outcome
    }

    /// Processes several sources as independent runs. A failed run never
    /// affects the outcomes already produced.
    pub fn process_batch(&mut self, requests: &[ProcessRequest]) -> Vec<ProcessingOutcome> {
        info!("Starting batch processing of {} files", requests.len());

        let mut outcomes = Vec::with_capacity(requests.len());
        for (i, request) in requests.iter().enumerate() {
            info!(
                "Processing file {}/{}: {}",
                i + 1,
                requests.len(),
                request.source
            );
            let outcome = self.process(request);
            if !outcome.success {
                warn!("File processing failed: {}", request.source);
            }
            outcomes.push(outcome);
        }

        let successful = outcomes.iter().filter(|o| o.success).count();
        info!(
            "Batch processing completed: {}/{} successful",
            successful,
            requests.len()
        );
        outcomes
    }

    fn fail_run(
        &mut self,
        mut outcome: ProcessingOutcome,
        session_id: &str,
        stage: PipelineStage,
        errors: Vec<String>,
        step_started: Instant,
        run_started: Instant,
    ) -> ProcessingOutcome {
        error!("{} stage failed: {:?}", stage, errors);
        self.audit_step(
            session_id,
            StepEvent::failed(stage.step_name(), elapsed_ms(step_started), errors.clone()),
        );
        self.audit_end(session_id, SessionStatus::Failed);
        outcome.errors.extend(errors);
        outcome.processing_time_seconds = run_started.elapsed().as_secs_f64();
        outcome
    }

    fn audit_start(&mut self, request: &ProcessRequest) -> String {
        if let Some(sink) = self.audit.as_mut() {
            match sink.start_session(&request.user_id, &request.source, &request.file_hash) {
                Ok(id) => return id,
                Err(e) => warn!("Audit session could not be started: {}", e),
            }
        }
        format!("session-{}", Local::now().timestamp())
    }

    fn audit_step(&mut self, session_id: &str, event: StepEvent) {
        if let Some(sink) = self.audit.as_mut() {
            if let Err(e) = sink.record_step(session_id, event) {
                warn!("Audit logging failed: {}", e);
            }
        }
    }

    fn audit_template(&mut self, session_id: &str, template: TemplateKind) {
        if let Some(sink) = self.audit.as_mut() {
            if let Err(e) = sink.set_template_used(session_id, template.template_id()) {
                warn!("Audit logging failed: {}", e);
            }
        }
    }

    fn audit_validation(&mut self, session_id: &str, results: &ValidationResult) {
        if let Some(sink) = self.audit.as_mut() {
            if let Err(e) = sink.add_validation_results(session_id, results) {
                warn!("Audit logging failed: {}", e);
            }
        }
    }

    fn audit_output_file(&mut self, session_id: &str, path: &str) {
        if let Some(sink) = self.audit.as_mut() {
            if let Err(e) = sink.add_output_file(session_id, path) {
                warn!("Audit logging failed: {}", e);
            }
        }
    }

    fn audit_end(&mut self, session_id: &str, status: SessionStatus) {
        if let Some(sink) = self.audit.as_mut() {
            if let Err(e) = sink.end_session(session_id, status) {
                warn!("Audit logging failed: {}", e);
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Output base name: source stem plus a run timestamp.
fn output_base_name(source: &str) -> String {
    let stem = source
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(source);
    let stem = stem.rsplit_once('.').map(|(s, _)| s).unwrap_or(stem);
    format!("{}_{}", stem, Local::now().format("%Y%m%d_%H%M%S"))
}
