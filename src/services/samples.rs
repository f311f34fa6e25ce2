use crate::error::WorkflowError;
use crate::models::analysis::SampleFileDescriptor;
use crate::services::analyzer::AnalyzerApi;
use crate::services::staging::StagedFile;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// Catalog of pre-built sample inputs offered by the analysis service.
///
/// The list is only ever swapped as a whole; readers keep the `Arc` they got.
#[derive(Default)]
pub struct SampleCatalogLoader {
    catalog: RwLock<Arc<Vec<SampleFileDescriptor>>>,
}

impl SampleCatalogLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(&self) -> Arc<Vec<SampleFileDescriptor>> {
        Arc::clone(&self.catalog.read())
    }

    /// Fetches the catalog once. A failure is logged and leaves whatever was
    /// there before (nothing, at startup).
    pub async fn load(&self, api: &dyn AnalyzerApi) -> Result<usize, WorkflowError> {
        match api.fetch_sample_catalog().await {
            Ok(samples) => {
                let count = samples.len();
                *self.catalog.write() = Arc::new(samples);
                info!("Sample catalog loaded with {} entries", count);
                Ok(count)
            }
            Err(e) => {
                warn!("Failed to load sample catalog: {}", e);
                Err(e)
            }
        }
    }

    /// Fetches one sample's content and wraps it as a CSV file named after it.
    pub async fn fetch_sample_file(
        &self,
        api: &dyn AnalyzerApi,
        filename: &str,
    ) -> Result<StagedFile, WorkflowError> {
        let content = api.fetch_sample(filename).await?;
        Ok(StagedFile::csv(filename, &content))
    }
}
