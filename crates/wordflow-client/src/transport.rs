use std::pin::Pin;

use crate::errors::ClientError;
use crate::types::{App, RunSnapshot, Version};

/// Byte stream of a run's chunked HTTP response body.
pub type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<bytes::Bytes, ClientError>> + Send + 'static>>;

/// Run-scoped network operations the stream task depends on.
///
/// [`WordflowClient`](crate::WordflowClient) is the production
/// implementation; tests substitute scripted fakes.
#[async_trait::async_trait]
pub trait RunTransport: Send + Sync {
    /// Opens the chunked stream for a run, authenticated with the credential.
    async fn open_stream(&self, run_id: &str) -> Result<ByteStream, ClientError>;

    /// Submits the user's reply to a pending ask.
    async fn answer_ask(
        &self,
        run_id: &str,
        ask_id: &str,
        value: &str,
    ) -> Result<bool, ClientError>;

    /// Fetches the run's current status snapshot (polling fallback).
    async fn poll_run(&self, run_id: &str) -> Result<RunSnapshot, ClientError>;
}

/// Catalog operations the refresh cycle depends on.
///
/// Split from [`RunTransport`] so state-layer code that never touches a run
/// can be tested with a scripted catalog.
#[async_trait::async_trait]
pub trait CatalogTransport: Send + Sync {
    /// Lists the apps visible to the configured credential.
    async fn fetch_apps(&self) -> Result<Vec<App>, ClientError>;

    /// Lists all versions of one app.
    async fn fetch_versions(
        &self,
        org_slug: &str,
        app_slug: &str,
    ) -> Result<Vec<Version>, ClientError>;
}
