use crate::error::WorkflowError;
use crate::models::analysis::AnalysisResult;
use crate::services::analyzer::AnalyzerApi;
use crate::services::staging::{InputMode, StagedFile, StagedInput};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestPhase {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Default)]
struct AnalysisState {
    phase: RequestPhase,
    result: Option<Arc<AnalysisResult>>,
    error: Option<String>,
}

/// What actually goes over the wire for one submission.
enum Submission {
    File(StagedFile),
    RawText(String),
}

impl Submission {
    fn from_staged(input: &StagedInput) -> Result<Self, WorkflowError> {
        match input.mode {
            InputMode::Upload => input
                .file
                .clone()
                .map(Submission::File)
                .ok_or_else(|| WorkflowError::Validation("Please select a CSV file first".into())),
            InputMode::Raw => {
                if input.raw_text.trim().is_empty() {
                    Err(WorkflowError::Validation(
                        "Please enter some log data first".into(),
                    ))
                } else {
                    Ok(Submission::RawText(input.raw_text.clone()))
                }
            }
        }
    }

    fn failure_message(&self, err: &WorkflowError) -> String {
        match self {
            Submission::File(_) => format!("Error analyzing file: {}", err),
            Submission::RawText(_) => format!("Error analyzing logs: {}", err),
        }
    }
}

/// Tracks the single analysis request and the result it produced.
///
/// Idle -> Submitting -> Succeeded | Failed. The current result survives a
/// failed submission; only a successful one or an explicit reset replaces it.
#[derive(Default)]
pub struct AnalysisRequestLifecycle {
    state: Mutex<AnalysisState>,
}

impl AnalysisRequestLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> RequestPhase {
        self.state.lock().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == RequestPhase::Submitting
    }

    pub fn current_result(&self) -> Option<Arc<AnalysisResult>> {
        self.state.lock().result.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }

    pub fn set_error(&self, message: impl Into<String>) {
        self.state.lock().error = Some(message.into());
    }

    pub fn clear_error(&self) {
        self.state.lock().error = None;
    }

    /// Drops the current result and error. An in-flight request keeps
    /// running and will still publish its outcome.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.result = None;
        state.error = None;
        if state.phase != RequestPhase::Submitting {
            state.phase = RequestPhase::Idle;
        }
    }

    pub async fn submit(
        &self,
        api: &dyn AnalyzerApi,
        input: &StagedInput,
    ) -> Result<Arc<AnalysisResult>, WorkflowError> {
        let submission = {
            let mut state = self.state.lock();
            if state.phase == RequestPhase::Submitting {
                return Err(WorkflowError::Busy(
                    "An analysis is already in progress".into(),
                ));
            }
            match Submission::from_staged(input) {
                Ok(submission) => {
                    state.phase = RequestPhase::Submitting;
                    state.error = None;
                    submission
                }
                Err(e) => {
                    state.error = Some(e.to_string());
                    return Err(e);
                }
            }
        };

        let outcome = match &submission {
            Submission::File(file) => {
                info!("Submitting {} ({} bytes) for analysis", file.name, file.size());
                api.submit_file(file).await
            }
            Submission::RawText(text) => {
                info!("Submitting {} bytes of raw logs for analysis", text.len());
                api.submit_raw_text(text).await
            }
        };

        let mut state = self.state.lock();
        match outcome {
            Ok(result) => {
                info!(
                    "Analysis {} completed: overall {}, {} high / {} medium / {} low",
                    result.analysis_id,
                    result.overall_risk_score,
                    result.high_risk_logs.len(),
                    result.medium_risk_logs.len(),
                    result.low_risk_logs.len()
                );
                let result = Arc::new(result);
                state.result = Some(Arc::clone(&result));
                state.phase = RequestPhase::Succeeded;
                state.error = None;
                Ok(result)
            }
            Err(e) => {
                warn!("Analysis request failed: {}", e);
                state.phase = RequestPhase::Failed;
                state.error = Some(submission.failure_message(&e));
                Err(e)
            }
        }
    }
}
