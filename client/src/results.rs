use serde::de::DeserializeOwned;

use finlab_types::{TestResultListItem, TestResultSummary};

use crate::{ApiError, Backend};

#[derive(Debug, Clone)]
pub struct ResultsService {
    backend: Backend,
}

impl ResultsService {
    #[must_use]
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// `GET /results`
    pub async fn list(&self) -> Result<Vec<TestResultListItem>, ApiError> {
        let results: Vec<TestResultListItem> = self.get_json(&["results"]).await?;
        tracing::debug!(count = results.len(), "Loaded test results");
        Ok(results)
    }

    /// `GET /results/{testId}`
    pub async fn summary(&self, test_id: &str) -> Result<TestResultSummary, ApiError> {
        self.get_json(&["results", test_id]).await
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let url = self.backend.endpoint(segments);
        let request = self.backend.http().get(url);
        let response = self.backend.pipeline().send(request).await?;
        let bytes = response.bytes().await.map_err(ApiError::Transport)?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
