use std::time::Duration;

use tracing::debug;

use crate::errors::ClientError;
use crate::transport::RunTransport;
use crate::types::{RunSnapshot, RunStatus};

/// Fixed re-fetch delay while a run reports RUNNING.
pub const POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Polls a run until it leaves RUNNING and returns the first terminal
/// snapshot.
///
/// Simpler alternative transport to the stream: fixed interval, no backoff,
/// no attempt cap; each snapshot fully replaces the previous one. Any fetch
/// error ends the loop.
pub async fn poll_until_terminal(
    transport: &dyn RunTransport,
    run_id: &str,
) -> Result<RunSnapshot, ClientError> {
    loop {
        let snapshot = transport.poll_run(run_id).await?;
        if snapshot.status != RunStatus::Running {
            return Ok(snapshot);
        }
        debug!(run_id, "run still in progress, polling again");
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
