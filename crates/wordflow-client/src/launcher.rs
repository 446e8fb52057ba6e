use std::collections::HashMap;

use crate::errors::ClientError;
use crate::types::{RunInput, Version};

/// One user-supplied form value for a declared version input.
#[derive(Clone, Debug, PartialEq)]
pub enum FormValue {
    /// Plain text for `text`/`longtext` inputs.
    Text(String),
    /// Uploaded-file descriptor for `image`/`audio`/`file` inputs.
    File { url: String, file_name: String },
}

impl FormValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn file(url: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self::File {
            url: url.into(),
            file_name: file_name.into(),
        }
    }
}

/// Builds the platform's run-input payload from the declared inputs and the
/// supplied form values.
///
/// Every declared input must be present: a missing or type-mismatched value
/// is a validation error raised before any network call. File-kind values are
/// repacked into the platform's tagged-union wire shape
/// `{"type": kind, "<kind>_url": url, "file_name": name}`.
pub(crate) fn build_run_payload(
    version: &Version,
    values: &HashMap<String, FormValue>,
) -> Result<serde_json::Value, ClientError> {
    let mut inputs = serde_json::Map::new();
    for declared in &version.inputs {
        let value = values.get(&declared.name).ok_or_else(|| {
            ClientError::Validation(format!("missing value for input '{}'", declared.name))
        })?;
        let kind = declared.input_type.wire_kind();
        let wire = match (declared.input_type.is_file_like(), value) {
            (true, FormValue::File { url, file_name }) => {
                let mut tagged = serde_json::Map::new();
                tagged.insert("type".into(), kind.into());
                tagged.insert(format!("{kind}_url"), url.as_str().into());
                tagged.insert("file_name".into(), file_name.as_str().into());
                serde_json::Value::Object(tagged)
            }
            (false, FormValue::Text(text)) => serde_json::Value::String(text.clone()),
            (true, FormValue::Text(_)) => {
                return Err(ClientError::Validation(format!(
                    "input '{}' expects a {kind} descriptor, got plain text",
                    declared.name
                )));
            }
            (false, FormValue::File { .. }) => {
                return Err(ClientError::Validation(format!(
                    "input '{}' expects text, got a file descriptor",
                    declared.name
                )));
            }
        };
        inputs.insert(declared.name.clone(), wire);
    }
    Ok(serde_json::Value::Object(inputs))
}

/// Serializes the supplied values for run history, in declared-input order.
///
/// File-kind values become a JSON-encoded `{url, fileName, type}` string so a
/// historical run can be replayed exactly.
pub(crate) fn serialize_run_inputs(
    version: &Version,
    values: &HashMap<String, FormValue>,
) -> Result<Vec<RunInput>, ClientError> {
    let mut inputs = Vec::with_capacity(version.inputs.len());
    for declared in &version.inputs {
        let value = values.get(&declared.name).ok_or_else(|| {
            ClientError::Validation(format!("missing value for input '{}'", declared.name))
        })?;
        let stored = match value {
            FormValue::Text(text) => text.clone(),
            FormValue::File { url, file_name } => serde_json::json!({
                "url": url,
                "fileName": file_name,
                "type": declared.input_type.wire_kind(),
            })
            .to_string(),
        };
        inputs.push(RunInput {
            name: declared.name.clone(),
            value: stored,
        });
    }
    Ok(inputs)
}
