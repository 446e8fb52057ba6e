use std::collections::HashMap;
use std::sync::Arc;

use futures::StreamExt as _;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use crate::accumulator::OutputAccumulator;
use crate::api::WordflowClient;
use crate::decoder::{Frame, FrameDecoder};
use crate::errors::{ClientError, RunFailure, run_failure_from_client_error};
use crate::launcher::{FormValue, build_run_payload, serialize_run_inputs};
use crate::stream::RunEvent;
use crate::transport::RunTransport;
use crate::types::{Ask, RunInput, RunStatus, RunWithInputs, Version};

const DEFAULT_EVENT_BUFFER: usize = 128;
const REPLY_BUFFER: usize = 8;

/// Handle used to request cancellation of a running stream.
#[derive(Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Requests cancellation.
    ///
    /// Cancellation is best-effort and becomes visible as a terminal
    /// `RunEvent::Error` with `RunFailure::Cancelled`.
    pub fn abort(&self) {
        let _ = self.tx.send(true);
    }
}

/// Builder for configuring and launching a single run of an app version.
///
/// Validates form values against the version's declared inputs, builds the
/// platform's run payload, obtains a run id, and hands off to the stream
/// decoder task.
pub struct RunBuilder {
    client: WordflowClient,
    org_slug: String,
    app_slug: String,
    version: Version,
    values: HashMap<String, FormValue>,
    event_buffer: usize,
}

impl RunBuilder {
    pub(crate) fn new(
        client: WordflowClient,
        org_slug: String,
        app_slug: String,
        version: Version,
    ) -> Self {
        Self {
            client,
            org_slug,
            app_slug,
            version,
            values: HashMap::new(),
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }

    /// Supplies the value for one declared input.
    pub fn value(mut self, name: impl Into<String>, value: FormValue) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Supplies a plain text value.
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.value(name, FormValue::Text(value.into()))
    }

    /// Supplies a file descriptor value for an image/audio/file input.
    pub fn file(
        self,
        name: impl Into<String>,
        url: impl Into<String>,
        file_name: impl Into<String>,
    ) -> Self {
        self.value(name, FormValue::file(url, file_name))
    }

    /// Replaces all values with the provided map.
    pub fn values(mut self, values: HashMap<String, FormValue>) -> Self {
        self.values = values;
        self
    }

    /// Sets the bounded event buffer size between the run task and the
    /// subscriber.
    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    /// Validates the form values, starts the run, and returns the streaming
    /// handle.
    ///
    /// Fails fast with `ClientError::Validation` before any network call when
    /// a declared input is missing or mismatched; start failures surface as
    /// `Network`/`ResponseShape` and are not retried.
    pub async fn start_stream(self) -> Result<RunStream, ClientError> {
        if self.event_buffer == 0 {
            return Err(ClientError::Validation(
                "event_buffer must be greater than 0".into(),
            ));
        }
        let payload = build_run_payload(&self.version, &self.values)?;
        let history = serialize_run_inputs(&self.version, &self.values)?;
        let run_id = self
            .client
            .start_run(&self.org_slug, &self.app_slug, &self.version.version, payload)
            .await?;
        Ok(spawn_run(
            Arc::new(self.client),
            run_id,
            history,
            self.event_buffer,
        ))
    }

    /// Runs to completion and returns the finalized run record.
    pub async fn collect(self) -> Result<RunWithInputs, ClientError> {
        let stream = self.start_stream().await?;
        stream.finish().await
    }
}

/// Spawns the decoder task for an already-started run.
///
/// Each call owns a fresh decoder and accumulator, so a stale task from an
/// abandoned stream can never corrupt a newer run's state.
pub(crate) fn spawn_run(
    transport: Arc<dyn RunTransport>,
    run_id: String,
    history: Vec<RunInput>,
    event_buffer: usize,
) -> RunStream {
    let (tx, rx) = mpsc::channel(event_buffer);
    let (final_tx, final_rx) = oneshot::channel();
    let (abort_tx, abort_rx) = watch::channel(false);
    let (reply_tx, reply_rx) = mpsc::channel(REPLY_BUFFER);

    tokio::spawn(run_task(
        transport,
        run_id.clone(),
        history,
        tx,
        final_tx,
        abort_rx,
        reply_rx,
    ));

    RunStream {
        run_id,
        rx,
        final_rx,
        abort_handle: AbortHandle { tx: abort_tx },
        reply_tx,
        saw_terminal: false,
    }
}

/// Streaming handle returned by [`RunBuilder::start_stream`].
///
/// Use `next_event()` to consume events as they arrive, `answer()` to reply
/// to a pending ask, and `finish()` to obtain the finalized run record after
/// the terminal event.
pub struct RunStream {
    run_id: String,
    rx: mpsc::Receiver<RunEvent>,
    final_rx: oneshot::Receiver<Result<RunWithInputs, ClientError>>,
    abort_handle: AbortHandle,
    reply_tx: mpsc::Sender<String>,
    saw_terminal: bool,
}

impl RunStream {
    /// Returns the platform's run identifier for this stream.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Returns a handle that can cancel the run.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    /// Waits for and returns the next event.
    ///
    /// Returns `None` after the stream channel is closed.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        let event = self.rx.recv().await;
        if let Some(RunEvent::Completed { .. } | RunEvent::Error { .. }) = &event {
            self.saw_terminal = true;
        }
        event
    }

    /// Submits the user's reply to the pending ask.
    ///
    /// The reply is recorded in the transcript before the network call is
    /// made; the platform resumes execution on its own, signalled by further
    /// content frames.
    pub async fn answer(&self, value: impl Into<String>) -> Result<(), ClientError> {
        self.reply_tx
            .send(value.into())
            .await
            .map_err(|_| ClientError::protocol_msg("run task already ended"))
    }

    /// Drains the stream (if needed) and returns the terminal run result.
    ///
    /// Safe to call after consuming events manually with `next_event()`.
    pub async fn finish(mut self) -> Result<RunWithInputs, ClientError> {
        while !self.saw_terminal {
            match self.rx.recv().await {
                Some(RunEvent::Completed { .. } | RunEvent::Error { .. }) => {
                    self.saw_terminal = true;
                }
                Some(_) => {}
                None => break,
            }
        }

        match self.final_rx.await {
            Ok(result) => result,
            Err(_) => Err(ClientError::protocol_msg(format!(
                "run task ended without final result (run_id={})",
                self.run_id
            ))),
        }
    }
}

async fn run_task(
    transport: Arc<dyn RunTransport>,
    run_id: String,
    history: Vec<RunInput>,
    tx: mpsc::Sender<RunEvent>,
    final_tx: oneshot::Sender<Result<RunWithInputs, ClientError>>,
    mut abort_rx: watch::Receiver<bool>,
    mut reply_rx: mpsc::Receiver<String>,
) {
    if !send_event(
        &tx,
        RunEvent::Started {
            run_id: run_id.clone(),
        },
    )
    .await
    {
        let _ = final_tx.send(Err(ClientError::protocol_msg(
            "run event receiver dropped before start",
        )));
        return;
    }

    let mut stream = match transport.open_stream(&run_id).await {
        Ok(stream) => stream,
        Err(err) => {
            let failure = run_failure_from_client_error(&err);
            let _ = send_event(
                &tx,
                RunEvent::Error {
                    run_id,
                    error: failure.clone(),
                },
            )
            .await;
            let _ = final_tx.send(Err(ClientError::run_failed(failure)));
            return;
        }
    };

    let mut decoder = FrameDecoder::default();
    let mut outputs = OutputAccumulator::new();
    let mut pending_ask: Option<Ask> = None;
    let mut abort_closed = false;
    let mut replies_closed = false;

    loop {
        tokio::select! {
            changed = abort_rx.changed(), if !abort_closed => {
                match changed {
                    Ok(()) if *abort_rx.borrow() => {
                        let failure = RunFailure::Cancelled;
                        let _ = send_event(&tx, RunEvent::Error { run_id, error: failure.clone() }).await;
                        let _ = final_tx.send(Err(ClientError::run_failed(failure)));
                        return;
                    }
                    Ok(()) => {}
                    Err(_) => abort_closed = true,
                }
            }
            reply = reply_rx.recv(), if !replies_closed => {
                match reply {
                    Some(value) => {
                        let Some(ask) = pending_ask.take() else {
                            debug!(run_id = %run_id, "ignoring reply with no pending ask");
                            continue;
                        };
                        outputs.push_user_reply(&value);
                        if !send_event(&tx, RunEvent::OutputsUpdated { run_id: run_id.clone(), outputs: outputs.snapshot() }).await {
                            let _ = final_tx.send(Err(ClientError::protocol_msg("run event receiver dropped during reply")));
                            return;
                        }
                        if let Err(err) = transport.answer_ask(&run_id, &ask.ask_id, &value).await {
                            let failure = run_failure_from_client_error(&err);
                            let _ = send_event(&tx, RunEvent::Error { run_id, error: failure.clone() }).await;
                            let _ = final_tx.send(Err(ClientError::run_failed(failure)));
                            return;
                        }
                    }
                    None => replies_closed = true,
                }
            }
            next = stream.next() => {
                match next {
                    Some(Ok(chunk)) => {
                        for frame in decoder.push_chunk(&chunk) {
                            let ask = apply_frame(&mut outputs, frame);
                            if !send_event(&tx, RunEvent::OutputsUpdated { run_id: run_id.clone(), outputs: outputs.snapshot() }).await {
                                let _ = final_tx.send(Err(ClientError::protocol_msg("run event receiver dropped during output")));
                                return;
                            }
                            if let Some(ask) = ask {
                                debug!(run_id = %run_id, ask_id = %ask.ask_id, "run awaiting user input");
                                pending_ask = Some(ask.clone());
                                if !send_event(&tx, RunEvent::AwaitingInput { run_id: run_id.clone(), ask }).await {
                                    let _ = final_tx.send(Err(ClientError::protocol_msg("run event receiver dropped during ask")));
                                    return;
                                }
                            }
                        }
                    }
                    Some(Err(err)) => {
                        let failure = run_failure_from_client_error(&err);
                        let _ = send_event(&tx, RunEvent::Error { run_id, error: failure.clone() }).await;
                        let _ = final_tx.send(Err(ClientError::run_failed(failure)));
                        return;
                    }
                    None => {
                        // The decoder has already seen every chunk at this
                        // point; an empty accumulator means the run truly
                        // produced nothing.
                        if outputs.is_empty() {
                            let failure = RunFailure::EmptyRun;
                            let _ = send_event(&tx, RunEvent::Error { run_id, error: failure.clone() }).await;
                            let _ = final_tx.send(Err(ClientError::run_failed(failure)));
                            return;
                        }
                        let run = RunWithInputs {
                            status: RunStatus::Complete,
                            outputs: outputs.into_fragments(),
                            errors: None,
                            run_time: chrono::Utc::now().to_rfc3339(),
                            inputs: history,
                        };
                        let sent = send_event(&tx, RunEvent::Completed { run_id, run: run.clone() }).await;
                        let _ = final_tx.send(if sent {
                            Ok(run)
                        } else {
                            Err(ClientError::protocol_msg("run event receiver dropped before completion"))
                        });
                        return;
                    }
                }
            }
        }
    }
}

/// Applies one frame to the accumulator, returning the ask when the frame
/// pauses the run.
fn apply_frame(outputs: &mut OutputAccumulator, frame: Frame) -> Option<Ask> {
    match frame {
        Frame::Content { path, content } => {
            outputs.push_content(&path, &content);
            None
        }
        Frame::Ask(ask) => {
            outputs.push_ask(&ask);
            Some(ask)
        }
    }
}

async fn send_event(tx: &mpsc::Sender<RunEvent>, event: RunEvent) -> bool {
    tx.send(event).await.is_ok()
}
