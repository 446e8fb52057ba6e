use wordflow_client::ClientError;

/// Errors raised by storage and state mutation.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Underlying key-value storage failed.
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
    /// A persisted value could not be parsed or serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// A mutation referenced an app slug not present in the store.
    #[error("unknown app: {0}")]
    UnknownApp(String),
    /// A mutation referenced a version not present on the app.
    #[error("unknown version {version} for app {app_slug}")]
    UnknownVersion { app_slug: String, version: String },
    /// A platform call made during refresh failed fatally.
    #[error(transparent)]
    Client(#[from] ClientError),
}
