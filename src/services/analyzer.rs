use crate::error::WorkflowError;
use crate::models::analysis::{AnalysisResult, ExportFormat, SampleFileDescriptor};
use crate::models::config::BackendConfig;
use crate::models::health::{HealthSnapshot, ProbeReport};
use crate::services::staging::StagedFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

/// The remote analysis service, seen from the console.
///
/// Any non-2xx answer is a failure and its body is not read.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyzerApi: Send + Sync {
    async fn submit_file(&self, file: &StagedFile) -> Result<AnalysisResult, WorkflowError>;

    async fn submit_raw_text(&self, raw_logs: &str) -> Result<AnalysisResult, WorkflowError>;

    async fn fetch_health(&self) -> Result<HealthSnapshot, WorkflowError>;

    async fn fetch_sample_catalog(&self) -> Result<Vec<SampleFileDescriptor>, WorkflowError>;

    /// Literal CSV content of one catalogued sample.
    async fn fetch_sample(&self, filename: &str) -> Result<String, WorkflowError>;

    async fn export_analysis(
        &self,
        analysis_id: &str,
        format: ExportFormat,
    ) -> Result<Vec<u8>, WorkflowError>;

    async fn probe_analyzer(&self) -> Result<ProbeReport, WorkflowError>;
}

pub struct HttpAnalyzerClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpAnalyzerClient {
    pub fn new(config: &BackendConfig) -> Result<Self, WorkflowError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout())
            .build()?;

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            WorkflowError::Transport(format!("invalid base URL {}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(WorkflowError::Transport(format!(
                "invalid base URL {}: cannot carry a path",
                config.base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// Appends each segment to the base URL, percent-encoding it as a whole.
    fn url(&self, segments: &[&str]) -> Result<Url, WorkflowError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                WorkflowError::Transport(format!("invalid base URL {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn checked(response: Response) -> Result<Response, WorkflowError> {
        let status = response.status();
        if !status.is_success() {
            debug!("Analysis service answered {} for {}", status, response.url());
            return Err(WorkflowError::http_status(status.as_u16()));
        }
        Ok(response)
    }

    async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T, WorkflowError> {
        let response = Self::checked(response)?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl AnalyzerApi for HttpAnalyzerClient {
    async fn submit_file(&self, file: &StagedFile) -> Result<AnalysisResult, WorkflowError> {
        let part = Part::bytes(file.content.clone())
            .file_name(file.name.clone())
            .mime_str(&file.content_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url(&["api", "upload-csv"])?)
            .multipart(form)
            .send()
            .await?;
        Self::json_body(response).await
    }

    async fn submit_raw_text(&self, raw_logs: &str) -> Result<AnalysisResult, WorkflowError> {
        let form = Form::new().text("raw_logs", raw_logs.to_string());

        let response = self
            .client
            .post(self.url(&["api", "analyze-raw-logs"])?)
            .multipart(form)
            .send()
            .await?;
        Self::json_body(response).await
    }

    async fn fetch_health(&self) -> Result<HealthSnapshot, WorkflowError> {
        let response = self.client.get(self.url(&["api", "health"])?).send().await?;
        Self::json_body(response).await
    }

    async fn fetch_sample_catalog(&self) -> Result<Vec<SampleFileDescriptor>, WorkflowError> {
        let response = self.client.get(self.url(&["api", "sample-files"])?).send().await?;
        Self::json_body(response).await
    }

    async fn fetch_sample(&self, filename: &str) -> Result<String, WorkflowError> {
        let response = self
            .client
            .get(self.url(&["api", "sample-files", filename])?)
            .send()
            .await?;
        let response = Self::checked(response)?;
        Ok(response.text().await?)
    }

    async fn export_analysis(
        &self,
        analysis_id: &str,
        format: ExportFormat,
    ) -> Result<Vec<u8>, WorkflowError> {
        let url = self.url(&["api", "export", analysis_id, format.path_segment()])?;
        let response = self.client.post(url).send().await?;
        let response = Self::checked(response)?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn probe_analyzer(&self) -> Result<ProbeReport, WorkflowError> {
        let response = self.client.post(self.url(&["api", "test-gemini"])?).send().await?;
        Self::json_body(response).await
    }
}
