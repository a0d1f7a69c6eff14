//! HTTP implementation of the generation backend.

use async_trait::async_trait;

use super::{GenerationBackend, StatusReport, SubmitResponse};
use crate::compile::GenerationRequest;
use crate::errors::BackendError;
use crate::launch::ExecutionHandle;

/// A generation backend speaking JSON over HTTP.
///
/// `POST {base_url}/executions` submits a request; the response body is a
/// [`SubmitResponse`]. `GET {base_url}/executions/{id}` returns a
/// [`StatusReport`].
#[derive(Debug, Clone)]
pub struct HttpGenerationBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGenerationBackend {
    /// Creates a backend against the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Uses a preconfigured client (timeouts, proxies, headers).
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn executions_url(&self) -> String {
        format!("{}/executions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl GenerationBackend for HttpGenerationBackend {
    async fn submit(&self, request: &GenerationRequest) -> Result<SubmitResponse, BackendError> {
        let response = self
            .client
            .post(self.executions_url())
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<SubmitResponse>().await?)
    }

    async fn query_status(&self, handle: &ExecutionHandle) -> Result<StatusReport, BackendError> {
        let url = format!("{}/{}", self.executions_url(), handle.as_str());
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.json::<StatusReport>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executions_url_trims_trailing_slash() {
        let backend = HttpGenerationBackend::new("https://api.example.com/v1/");
        assert_eq!(
            backend.executions_url(),
            "https://api.example.com/v1/executions"
        );
    }
}
