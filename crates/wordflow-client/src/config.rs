use std::time::Duration;

use crate::errors::ClientError;

/// Configuration for the platform client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// API credential used for bearer auth on every request.
    pub api_key: String,
    /// Base URL for the platform API.
    ///
    /// Useful for proxies or local test servers.
    pub base_url: String,
    /// Default HTTP timeout for non-streaming requests.
    pub timeout: Duration,
}

impl ClientConfig {
    /// Creates a config with sensible defaults and a provided credential.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.wordflow.app".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Builds a config from `WORDFLOW_API_KEY`.
    pub fn from_env() -> Result<Self, ClientError> {
        let api_key = std::env::var("WORDFLOW_API_KEY").unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(ClientError::Config(
                "missing WORDFLOW_API_KEY for platform client".into(),
            ));
        }
        Ok(Self::new(api_key))
    }

    /// Overrides the API base URL (for proxies or test servers).
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the default HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub(crate) fn apps_url(&self) -> String {
        format!("{}/v1alpha/apps/", self.base())
    }

    pub(crate) fn versions_url(&self, org_slug: &str, app_slug: &str) -> String {
        format!("{}/v1alpha/apps/{org_slug}/{app_slug}/versions", self.base())
    }

    pub(crate) fn runs_url(&self, org_slug: &str, app_slug: &str, version: &str) -> String {
        format!(
            "{}/v1alpha/apps/{org_slug}/{app_slug}/{version}/runs",
            self.base()
        )
    }

    pub(crate) fn run_url(&self, run_id: &str) -> String {
        format!("{}/v1alpha/runs/{run_id}", self.base())
    }

    pub(crate) fn stream_url(&self, run_id: &str) -> String {
        format!("{}/stream/{run_id}", self.base())
    }

    pub(crate) fn ask_url(&self, run_id: &str, ask_id: &str) -> String {
        format!("{}/runs/{run_id}/asks/{ask_id}", self.base())
    }
}
