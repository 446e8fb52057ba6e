//! Client for a versioned generative-AI app platform.
//!
//! Discovers apps and their versioned input schemas, launches runs from form
//! values, and observes results either through the incrementally decoded
//! `data: <json>` run stream or through the simpler polling fallback.
//!
//! # Streaming a run
//!
//! ```no_run
//! use wordflow_client::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ClientError> {
//! let client = WordflowClient::from_env()?;
//!
//! let apps = client.fetch_apps().await?;
//! let app = &apps[0];
//! let mut versions = client.fetch_versions(&app.org_slug, &app.app_slug).await?;
//! sort_versions_desc(&mut versions);
//!
//! let mut run = client
//!     .run(&app.org_slug, &app.app_slug, versions[0].clone())
//!     .text("topic", "rust")
//!     .start_stream()
//!     .await?;
//!
//! while let Some(event) = run.next_event().await {
//!     match event {
//!         RunEvent::OutputsUpdated { outputs, .. } => {
//!             if let Some(last) = outputs.last() {
//!                 println!("[{}] {}", last.path, last.content);
//!             }
//!         }
//!         RunEvent::AwaitingInput { ask, .. } => {
//!             println!("run asks: {}", ask.content.value);
//!             run.answer("yes").await?;
//!         }
//!         RunEvent::Completed { .. } | RunEvent::Error { .. } => break,
//!         RunEvent::Started { .. } => {}
//!     }
//! }
//! let record = run.finish().await?;
//! println!("finished at {}", record.run_time);
//! # Ok(())
//! # }
//! ```

/// Ordered output accumulator owned by each run task.
mod accumulator;
/// Platform REST client and transport implementation.
pub mod api;
/// Client configuration and endpoint construction.
pub mod config;
/// Incremental `data: <json>` frame decoding.
mod decoder;
/// Public error types used by the client API.
pub mod errors;
/// Form-value validation and run payload construction.
pub mod launcher;
/// Observability/logging initialization.
pub mod observability;
/// Polling fallback for transports without chunked responses.
pub mod poll;
/// Common imports for typical usage.
pub mod prelude;
/// Run builder, streaming handle, and cancellation handle.
pub mod run;
/// Normalized public run events.
pub mod stream;
/// Transport seam between the run task and the network.
pub mod transport;
/// Platform data model and version ordering.
pub mod types;

pub use api::WordflowClient;
pub use config::ClientConfig;
pub use errors::{ClientError, RunFailure};
pub use launcher::FormValue;
pub use observability::init_observability;
pub use poll::{POLL_INTERVAL, poll_until_terminal};
pub use run::{AbortHandle, RunBuilder, RunStream};
pub use stream::RunEvent;
pub use transport::{ByteStream, CatalogTransport, RunTransport};
pub use types::{
    App, AppWithVersions, Ask, AskContent, Fragment, InputType, Role, RunInput, RunSnapshot,
    RunStatus, RunWithInputs, Version, VersionInput, VersionWithRuns, compare_versions,
    sort_versions_desc,
};
