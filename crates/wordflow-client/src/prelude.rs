//! Common imports for typical client usage.
//!
//! This module intentionally exports the most frequently used types so
//! examples and application code need fewer import lines.
pub use crate::{
    AbortHandle, App, AppWithVersions, Ask, ClientConfig, ClientError, FormValue, Fragment,
    RunBuilder, RunEvent, RunFailure, RunStatus, RunStream, RunWithInputs, Version,
    VersionWithRuns, WordflowClient, sort_versions_desc,
};
