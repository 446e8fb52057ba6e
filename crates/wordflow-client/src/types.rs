use std::cmp::Ordering;

use chrono::{DateTime, FixedOffset};

/// A deployed app on the platform, identified by `(org_slug, app_slug)`.
///
/// Apps are refreshed wholesale from the platform; nothing in this struct is
/// mutated locally.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct App {
    pub org_slug: String,
    pub app_slug: String,
    pub visibility: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    /// Creation timestamp as reported by the platform (RFC 3339).
    pub created: String,
    pub last_updated: String,
}

impl App {
    /// Parses `last_updated` for recency ordering; `None` when the platform
    /// sends a timestamp chrono cannot parse.
    pub fn last_updated_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.last_updated).ok()
    }
}

/// Declared type of one form field in a version's input schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputType {
    Text,
    Longtext,
    Image,
    Audio,
    File,
}

impl InputType {
    /// Whether values of this type are file descriptors rather than plain text.
    pub fn is_file_like(self) -> bool {
        matches!(self, Self::Image | Self::Audio | Self::File)
    }

    /// Wire name used in the platform's tagged-union input shape.
    pub fn wire_kind(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Longtext => "longtext",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::File => "file",
        }
    }
}

/// One declared form field of a [`Version`]. `name` is unique within the
/// version and is the join key for run payloads and historical inputs.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VersionInput {
    pub name: String,
    #[serde(rename = "type")]
    pub input_type: InputType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One immutable revision of an app.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub title: String,
    pub description: String,
    /// Dotted numeric string, e.g. "1.0" or "2.3".
    pub version: String,
    pub inputs: Vec<VersionInput>,
    pub created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<serde_json::Value>,
}

/// Run lifecycle status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Complete,
    Error,
    AwaitingInput,
}

/// Author of an output fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One contiguous piece of run output bound to a single logical output path.
///
/// The ordered fragment list is the canonical run-output model; consecutive
/// same-path chunks coalesce into one fragment whose content grows
/// monotonically.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Fragment {
    pub path: String,
    pub content: String,
    pub role: Role,
}

/// Text payload of an [`Ask`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AskContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub value: String,
}

/// An in-run pause requesting free-text user input. `ask_id` is the
/// correlation token for the reply.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ask {
    #[serde(default)]
    pub path: String,
    pub content: AskContent,
    pub ask_id: String,
}

/// One error reported by the platform for a failed run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunErrorMessage {
    pub message: String,
}

/// One `{name, value}` pair supplied to a run, serialized for exact replay.
///
/// File-typed values keep a JSON-encoded `{url, fileName, type}` string in
/// `value`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunInput {
    pub name: String,
    pub value: String,
}

/// A finished run plus the literal inputs that produced it.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunWithInputs {
    pub status: RunStatus,
    pub outputs: Vec<Fragment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<RunErrorMessage>>,
    pub run_time: String,
    pub inputs: Vec<RunInput>,
}

/// Point-in-time run state returned by the polling endpoint.
///
/// Polling reports outputs as a flat path -> text map; the streaming path
/// uses the richer [`Fragment`] list instead.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<RunErrorMessage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
}

/// A [`Version`] plus its locally accumulated run history (append-only).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VersionWithRuns {
    #[serde(flatten)]
    pub version: Version,
    pub runs: Vec<RunWithInputs>,
}

/// An [`App`] plus its full version list and the currently selected version.
/// This is the unit of persisted client state.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppWithVersions {
    #[serde(flatten)]
    pub app: App,
    pub versions: Vec<VersionWithRuns>,
    pub selected_version: String,
}

/// Compares dotted numeric version strings component-wise.
///
/// "2.10" orders above "2.9" (numeric, not lexicographic). A non-numeric or
/// missing component compares as 0; ties fall through to the next pair.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let parse = |s: &str| -> Vec<u64> { s.split('.').map(|p| p.parse().unwrap_or(0)).collect() };
    let av = parse(a);
    let bv = parse(b);
    let len = av.len().max(bv.len());
    for i in 0..len {
        let x = av.get(i).copied().unwrap_or(0);
        let y = bv.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Sorts versions newest-first by the numeric-component rule.
pub fn sort_versions_desc(versions: &mut [Version]) {
    versions.sort_by(|a, b| compare_versions(&b.version, &a.version));
}
