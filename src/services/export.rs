use crate::error::WorkflowError;
use crate::models::analysis::{AnalysisResult, ExportFormat};
use crate::services::analyzer::AnalyzerApi;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    Saved(PathBuf),
    /// No current analysis, or this format is already being exported.
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportInFlight {
    pub tabular: bool,
    pub document: bool,
}

/// Report file name for an analysis: `security_analysis_<first 8 chars of id>.<ext>`.
pub fn report_file_name(analysis_id: &str, format: ExportFormat) -> String {
    let prefix: String = analysis_id.chars().take(8).collect();
    format!("security_analysis_{}.{}", prefix, format.extension())
}

/// Drives report downloads. Each format has its own in-flight flag and the
/// two never wait on each other.
pub struct ExportController {
    output_dir: PathBuf,
    in_flight: Mutex<HashSet<ExportFormat>>,
}

/// Clears the format's flag however the export ends.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<ExportFormat>>,
    format: ExportFormat,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.format);
    }
}

impl ExportController {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn is_in_flight(&self, format: ExportFormat) -> bool {
        self.in_flight.lock().contains(&format)
    }

    pub fn in_flight(&self) -> ExportInFlight {
        let in_flight = self.in_flight.lock();
        ExportInFlight {
            tabular: in_flight.contains(&ExportFormat::Tabular),
            document: in_flight.contains(&ExportFormat::Document),
        }
    }

    fn begin(&self, format: ExportFormat) -> Option<InFlightGuard<'_>> {
        if !self.in_flight.lock().insert(format) {
            return None;
        }
        Some(InFlightGuard {
            in_flight: &self.in_flight,
            format,
        })
    }

    pub async fn export(
        &self,
        api: &dyn AnalyzerApi,
        result: Option<&AnalysisResult>,
        format: ExportFormat,
    ) -> Result<ExportOutcome, WorkflowError> {
        let analysis_id = match result {
            Some(result) if !result.analysis_id.is_empty() => result.analysis_id.as_str(),
            _ => {
                debug!("{} export requested without a current analysis", format);
                return Ok(ExportOutcome::Skipped);
            }
        };

        let Some(_guard) = self.begin(format) else {
            debug!("{} export already in progress", format);
            return Ok(ExportOutcome::Skipped);
        };

        let content = api
            .export_analysis(analysis_id, format)
            .await
            .map_err(|e| WorkflowError::export(format, e))?;

        let path = self
            .save(&report_file_name(analysis_id, format), &content)
            .await
            .map_err(|e| WorkflowError::export(format, e))?;

        info!("Saved {} report to {}", format, path.display());
        Ok(ExportOutcome::Saved(path))
    }

    /// Writes to a `.part` file then renames it into place; the partial file
    /// is removed on failure.
    async fn save(&self, file_name: &str, content: &[u8]) -> Result<PathBuf, WorkflowError> {
        fs::create_dir_all(&self.output_dir).await?;

        let target = self.output_dir.join(file_name);
        let temp = self.output_dir.join(format!("{}.part", file_name));

        let written = async {
            fs::write(&temp, content).await?;
            fs::rename(&temp, &target).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp).await {
                warn!("Failed to remove partial report {}: {}", temp.display(), cleanup);
            }
            return Err(e.into());
        }

        Ok(target)
    }
}
