//! Stage handler: classify → resolve → transform → emit.

use std::sync::Arc;

use imgchain_core::DEFAULT_JPEG_QUALITY;
use serde_json::Value;

use crate::config::PipelineConfig;
use crate::emit::{emit_inline, emit_to_storage, StageResult};
use crate::error::HandlerError;
use crate::invocation::{classify, requested_operation, DirectRequest, Invocation};
use crate::metrics::{log_summary, Inspector, MetricsRecord};
use crate::resolve::{resolve, Provenance};
use crate::stage::Stage;
use crate::storage::{ObjectStore, StorageLocation};

/// Result of a stage invocation that did not raise.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    Success(MetricsRecord),
    /// A direct call failed; `success`, `error` and `error_type` are set.
    RecoverableFailure(MetricsRecord),
}

impl StageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Success(_))
    }

    pub fn record(&self) -> &MetricsRecord {
        match self {
            StageOutcome::Success(record) | StageOutcome::RecoverableFailure(record) => record,
        }
    }

    pub fn into_record(self) -> MetricsRecord {
        match self {
            StageOutcome::Success(record) | StageOutcome::RecoverableFailure(record) => record,
        }
    }
}

/// Runs one pipeline stage for either invocation mode.
///
/// Holds only immutable configuration and a shared store handle, so one
/// handler can serve concurrent invocations.
#[derive(Clone)]
pub struct StageHandler {
    stage: Stage,
    store: Arc<dyn ObjectStore>,
    jpeg_quality: u8,
}

impl StageHandler {
    pub fn new(stage: Stage, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            stage,
            store,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn from_config(stage: Stage, store: Arc<dyn ObjectStore>, config: &PipelineConfig) -> Self {
        Self::new(stage, store).with_jpeg_quality(config.jpeg_quality)
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Handle a raw invocation and return its metrics record.
    ///
    /// Storage-triggered failures and unsupported payloads are returned as
    /// `Err`. Direct-call failures come back as `Ok` with `success: false`.
    pub fn handle(&self, event: &Value) -> Result<MetricsRecord, HandlerError> {
        self.run(event).map(StageOutcome::into_record)
    }

    /// Like [`StageHandler::handle`], keeping the success/failure distinction.
    pub fn run(&self, event: &Value) -> Result<StageOutcome, HandlerError> {
        let inspector = Inspector::start();

        let invocation = match classify(event) {
            Ok(invocation) => invocation,
            Err(err) if err.is_recoverable() => {
                let operation = requested_operation(event).unwrap_or(self.stage.operation());
                return Ok(self.direct_failure(inspector, operation, err));
            }
            Err(err) => {
                log::error!("{}: rejected invocation: {}", self.stage, err);
                return Err(err);
            }
        };

        match &invocation {
            Invocation::EventTriggered(location) => self
                .run_event(&invocation, location, inspector)
                .map(StageOutcome::Success),
            Invocation::Direct(request) => Ok(self.run_direct(&invocation, request, inspector)),
        }
    }

    fn run_event(
        &self,
        invocation: &Invocation,
        location: &StorageLocation,
        mut inspector: Inspector,
    ) -> Result<MetricsRecord, HandlerError> {
        if !location.key.starts_with(self.stage.source_prefix()) {
            log::warn!(
                "{}: triggered by {} outside {}",
                self.stage,
                location,
                self.stage.source_prefix()
            );
        }

        inspector.add_attribute("image_id", location.filename());
        inspector.add_attribute("pipeline_stage", self.stage.operation());
        inspector.add_attribute("bucket", location.bucket.as_str());
        inspector.add_attribute("input_key", location.key.as_str());

        let target = self.stage.next_location(location);
        let written = self
            .process(invocation, self.stage.operation(), &mut inspector)
            .and_then(|result| {
                emit_to_storage(&result, self.store.as_ref(), &target)?;
                Ok(result)
            });
        let result = match written {
            Ok(result) => result,
            Err(err) => {
                log::error!(
                    "{}: failed for {} (target {}): {} [{}]",
                    self.stage,
                    location,
                    target,
                    err,
                    err.kind()
                );
                return Err(err);
            }
        };

        inspector.add_attribute("new_file", target.key.as_str());
        inspector.add_attribute("output_size", result.size());
        inspector.add_attribute("message", self.stage.success_message());
        inspector.add_attribute("success", true);

        let record = inspector.finish();
        log::info!("{}: {}", self.stage, log_summary(&record));
        Ok(record)
    }

    fn run_direct(
        &self,
        invocation: &Invocation,
        request: &DirectRequest,
        mut inspector: Inspector,
    ) -> StageOutcome {
        let operation = request
            .operation
            .as_deref()
            .unwrap_or(self.stage.operation());

        match self.process(invocation, operation, &mut inspector) {
            Ok(result) => {
                emit_inline(&result, &mut inspector);
                let record = inspector.finish();
                log::info!("{}: {}", self.stage, log_summary(&record));
                StageOutcome::Success(record)
            }
            Err(err) => self.direct_failure(inspector, operation, err),
        }
    }

    /// Provenance goes on the record before the fetch, so failures still
    /// report where the input came from.
    fn process(
        &self,
        invocation: &Invocation,
        operation: &str,
        inspector: &mut Inspector,
    ) -> Result<StageResult, HandlerError> {
        Provenance::of(invocation).record(inspector);
        let resolved = resolve(invocation, self.store.as_ref())?;
        log::debug!(
            "{}: input {}x{} {} ({} bytes)",
            self.stage,
            resolved.image.width,
            resolved.image.height,
            resolved.image.format.as_str(),
            resolved.input_size
        );
        let output = self.stage.apply(&resolved.image)?;
        StageResult::encode(&output, operation, resolved.provenance, self.jpeg_quality)
    }

    fn direct_failure(
        &self,
        mut inspector: Inspector,
        operation: &str,
        err: HandlerError,
    ) -> StageOutcome {
        log::warn!("{}: direct invocation failed: {} [{}]", self.stage, err, err.kind());
        inspector.add_attribute("operation", operation);
        inspector.add_attribute("success", false);
        inspector.add_attribute("error", err.to_string());
        inspector.add_attribute("error_type", err.kind());
        StageOutcome::RecoverableFailure(inspector.finish())
    }
}
