use crate::errors::RunFailure;
use crate::types::{Ask, Fragment, RunWithInputs};

/// Normalized events exposed by [`RunStream`](crate::RunStream).
///
/// `OutputsUpdated` carries the full accumulator snapshot after each applied
/// frame so intermediate state is observable immediately, not just at stream
/// end. Snapshots arrive in strict frame-arrival order.
#[derive(Clone, Debug, PartialEq)]
pub enum RunEvent {
    /// First event for every run.
    Started { run_id: String },
    /// The output accumulator changed; `outputs` is a detached snapshot.
    OutputsUpdated {
        run_id: String,
        outputs: Vec<Fragment>,
    },
    /// The run paused for user input.
    AwaitingInput { run_id: String, ask: Ask },
    /// Terminal success event with the finalized run record.
    Completed {
        run_id: String,
        run: RunWithInputs,
    },
    /// Terminal failure event.
    Error { run_id: String, error: RunFailure },
}
