/// Terminal run failure carried by [`RunEvent::Error`](crate::RunEvent::Error).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum RunFailure {
    /// Opening or reading the stream failed, or a reply call failed mid-run.
    #[error("network failure: {message}")]
    Network { message: String },
    /// The client detected a protocol or invariant error.
    #[error("protocol failure: {message}")]
    Protocol { message: String },
    /// The stream closed without producing a single output fragment.
    #[error("stream closed without any output")]
    EmptyRun,
    /// The run was cancelled by the caller.
    #[error("run cancelled")]
    Cancelled,
}

/// Top-level error type for the public client API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Invalid client configuration (missing credential, bad base URL).
    #[error("config error: {0}")]
    Config(String),
    /// Declared inputs and supplied form values do not line up. Raised before
    /// any network call is made.
    #[error("validation error: {0}")]
    Validation(String),
    /// Request failed to send or the platform answered non-2xx.
    #[error("network error: {message}")]
    Network {
        message: String,
        status_code: Option<u16>,
    },
    /// A response parsed as JSON but did not match the expected schema.
    #[error("response shape error: {0}")]
    ResponseShape(String),
    /// Terminal failure returned from a started run.
    #[error(transparent)]
    RunFailed(RunFailure),
    /// Internal protocol misuse or invariant violation.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl ClientError {
    /// Creates a network error without an HTTP status (transport-level).
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            status_code: None,
        }
    }

    /// Creates a network error carrying the HTTP status the platform returned.
    pub fn http_status(message: impl Into<String>, status: u16) -> Self {
        Self::Network {
            message: message.into(),
            status_code: Some(status),
        }
    }

    pub(crate) fn run_failed(failure: RunFailure) -> Self {
        Self::RunFailed(failure)
    }

    pub(crate) fn protocol_msg(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

impl From<RunFailure> for ClientError {
    fn from(value: RunFailure) -> Self {
        ClientError::RunFailed(value)
    }
}

pub(crate) fn run_failure_from_client_error(err: &ClientError) -> RunFailure {
    match err {
        ClientError::Network { message, .. } => RunFailure::Network {
            message: message.clone(),
        },
        ClientError::RunFailed(failure) => failure.clone(),
        other => RunFailure::Protocol {
            message: other.to_string(),
        },
    }
}
