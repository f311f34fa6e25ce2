use crate::error::WorkflowError;
use crate::models::analysis::{ExportFormat, RiskBucket, SampleFileDescriptor};
use crate::models::config::AppConfig;
use crate::models::health::ProbeReport;
use crate::models::view::ActiveView;
use crate::services::aggregator::{DetailToggles, EntryKey, ResultAggregator, ResultView};
use crate::services::analyzer::AnalyzerApi;
use crate::services::export::{ExportController, ExportInFlight, ExportOutcome};
use crate::services::health::{HealthDashboard, HealthPoller, PollerTask};
use crate::services::lifecycle::{AnalysisRequestLifecycle, RequestPhase};
use crate::services::samples::SampleCatalogLoader;
use crate::services::staging::{InputMode, InputStagingStore, StagedFile};
use parking_lot::Mutex;
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct StagedFileInfo {
    pub name: String,
    pub size_bytes: usize,
}

/// Everything the analysis view renders, read in one pass.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisView {
    pub mode: InputMode,
    pub staged_file: Option<StagedFileInfo>,
    pub raw_text: String,
    pub phase: RequestPhase,
    pub loading: bool,
    pub can_submit: bool,
    pub error: Option<String>,
    pub samples: Vec<SampleFileDescriptor>,
    pub result: Option<ResultView>,
    pub exports: ExportInFlight,
}

impl AnalysisView {
    pub fn upload_mode(&self) -> bool {
        self.mode == InputMode::Upload
    }
}

/// Composes staging, sample catalog, analysis lifecycle, result rendering,
/// exports and health polling behind the console's two views.
///
/// Remote operations run on their own tasks: a caller that stops waiting does
/// not abandon a transition half-way, and no operation waits on another.
pub struct WorkflowController {
    api: Arc<dyn AnalyzerApi>,
    poll_interval: Duration,
    view: Mutex<ActiveView>,
    staging: Mutex<InputStagingStore>,
    details: Mutex<DetailToggles>,
    samples: SampleCatalogLoader,
    lifecycle: AnalysisRequestLifecycle,
    exports: ExportController,
    health: Arc<HealthPoller>,
    poller: Mutex<Option<PollerTask>>,
}

impl WorkflowController {
    pub fn new(api: Arc<dyn AnalyzerApi>, config: &AppConfig) -> Self {
        Self {
            api,
            poll_interval: config.health.poll_interval(),
            view: Mutex::new(ActiveView::default()),
            staging: Mutex::new(InputStagingStore::new()),
            details: Mutex::new(DetailToggles::new()),
            samples: SampleCatalogLoader::new(),
            lifecycle: AnalysisRequestLifecycle::new(),
            exports: ExportController::new(&config.exports.output_dir),
            health: Arc::new(HealthPoller::new()),
            poller: Mutex::new(None),
        }
    }

    /// Starts health polling and the initial sample catalog load, both in the
    /// background. A catalog failure only means no samples are offered.
    pub fn start(self: &Arc<Self>) {
        {
            let mut poller = self.poller.lock();
            if poller.is_none() {
                *poller = Some(self.health.spawn(Arc::clone(&self.api), self.poll_interval));
            }
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _ = this.samples.load(this.api.as_ref()).await;
        });
        info!("Workflow started");
    }

    pub async fn shutdown(&self) {
        let task = self.poller.lock().take();
        if let Some(task) = task {
            task.stop().await;
        }
    }

    async fn detached<T, F>(future: F) -> Result<T, WorkflowError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, WorkflowError>> + Send + 'static,
    {
        tokio::spawn(future).await.map_err(|e| {
            warn!("Workflow task did not complete: {}", e);
            WorkflowError::Transport(format!("operation aborted: {}", e))
        })?
    }

    pub fn active_view(&self) -> ActiveView {
        *self.view.lock()
    }

    pub fn select_view(&self, view: ActiveView) {
        *self.view.lock() = view;
    }

    pub fn select_mode(&self, mode: InputMode) {
        self.staging.lock().select_mode(mode);
    }

    pub fn stage_file(&self, file: StagedFile) {
        info!("Staged file {} ({} bytes)", file.name, file.size());
        self.staging.lock().stage_file(file);
        self.lifecycle.clear_error();
    }

    pub fn stage_raw_text(&self, text: impl Into<String>) {
        self.staging.lock().stage_raw_text(text);
    }

    pub fn load_sample(&self) {
        self.staging.lock().load_sample();
    }

    /// Surfaces a console-side failure (e.g. an unreadable upload) in the
    /// analysis view's error slot.
    pub fn report_error(&self, message: impl Into<String>) {
        self.lifecycle.set_error(message);
    }

    pub async fn load_named_sample(
        self: &Arc<Self>,
        filename: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        let this = Arc::clone(self);
        let filename = filename.into();
        Self::detached(async move {
            match this
                .samples
                .fetch_sample_file(this.api.as_ref(), &filename)
                .await
            {
                Ok(file) => {
                    this.stage_file(file);
                    Ok(())
                }
                Err(e) => {
                    warn!("Failed to load sample {}: {}", filename, e);
                    this.lifecycle
                        .set_error(format!("Error loading sample file: {}", e));
                    Err(e)
                }
            }
        })
        .await
    }

    pub async fn reload_samples(self: &Arc<Self>) -> Result<usize, WorkflowError> {
        let this = Arc::clone(self);
        Self::detached(async move { this.samples.load(this.api.as_ref()).await }).await
    }

    pub async fn submit_analysis(self: &Arc<Self>) -> Result<(), WorkflowError> {
        let this = Arc::clone(self);
        Self::detached(async move {
            let input = this.staging.lock().snapshot();
            this.lifecycle.submit(this.api.as_ref(), &input).await?;
            this.details.lock().clear();
            Ok(())
        })
        .await
    }

    /// Flips one entry's detail section. `None` when the entry does not exist
    /// in the current result.
    pub fn toggle_detail(&self, bucket: RiskBucket, index: usize) -> Option<bool> {
        let result = self.lifecycle.current_result()?;
        if index >= result.bucket(bucket).len() {
            return None;
        }
        Some(self.details.lock().toggle(EntryKey::new(bucket, index)))
    }

    pub async fn export(
        self: &Arc<Self>,
        format: ExportFormat,
    ) -> Result<ExportOutcome, WorkflowError> {
        let this = Arc::clone(self);
        Self::detached(async move {
            let result = this.lifecycle.current_result();
            match this
                .exports
                .export(this.api.as_ref(), result.as_deref(), format)
                .await
            {
                Ok(outcome) => Ok(outcome),
                Err(e) => {
                    this.lifecycle.set_error(e.to_string());
                    Err(e)
                }
            }
        })
        .await
    }

    pub fn report_dir(&self) -> &Path {
        self.exports.output_dir()
    }

    /// Drops the result, the error, every staged input and all detail state
    /// in one step.
    pub fn reset_analysis(&self) {
        let mut staging = self.staging.lock();
        let mut details = self.details.lock();
        staging.reset();
        details.clear();
        self.lifecycle.reset();
        info!("Analysis workflow reset");
    }

    pub async fn refresh_health(self: &Arc<Self>) -> Result<(), WorkflowError> {
        let this = Arc::clone(self);
        Self::detached(async move { this.health.refresh(this.api.as_ref()).await }).await
    }

    pub async fn probe_analyzer(self: &Arc<Self>) -> Result<ProbeReport, WorkflowError> {
        let this = Arc::clone(self);
        Self::detached(async move { Ok(this.health.probe(this.api.as_ref()).await) }).await
    }

    pub fn analysis_view(&self) -> AnalysisView {
        let (mode, staged_file, raw_text) = {
            let staging = self.staging.lock();
            (
                staging.mode(),
                staging.file().map(|f| StagedFileInfo {
                    name: f.name.clone(),
                    size_bytes: f.size(),
                }),
                staging.raw_text().to_string(),
            )
        };
        let phase = self.lifecycle.phase();
        let loading = self.lifecycle.is_loading();
        let has_input = match mode {
            InputMode::Upload => staged_file.is_some(),
            InputMode::Raw => !raw_text.trim().is_empty(),
        };
        let result = self.lifecycle.current_result().map(|result| {
            let details = self.details.lock();
            ResultAggregator::summarize(&result, &details)
        });

        AnalysisView {
            mode,
            staged_file,
            raw_text,
            phase,
            loading,
            can_submit: has_input && !loading,
            error: self.lifecycle.error(),
            samples: self.samples.catalog().as_ref().clone(),
            result,
            exports: self.exports.in_flight(),
        }
    }

    pub fn health_view(&self) -> HealthDashboard {
        self.health.dashboard()
    }
}
