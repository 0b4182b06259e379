//! JSON envelopes exchanged on stdin/stdout

use declarative::{ChangeRecord, CurrentState, DesiredItem, Ensure, PackageState};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use thiserror::Error;

/// Input that is not a usable request object
#[derive(Debug, Error)]
pub enum InputError {
    #[error("input must be a dict")]
    NotAnObject,

    #[error("invalid JSON input: {0}")]
    Json(#[source] serde_json::Error),

    #[error("malformed request: {0}")]
    Shape(#[source] serde_json::Error),
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetRequest {
    /// Empty means every installed package
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub updates: Vec<Update>,
    #[serde(default)]
    pub ral: RalOptions,
}

impl SetRequest {
    /// Desired items in request order
    pub fn desired_items(&self) -> Vec<DesiredItem> {
        self.updates
            .iter()
            .map(|u| DesiredItem::new(&u.name, u.should.ensure.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub name: String,
    pub should: Should,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Should {
    pub ensure: Ensure,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RalOptions {
    #[serde(default)]
    pub noop: bool,
}

/// Read one request object from `reader`.
pub fn read_request<T: DeserializeOwned>(reader: impl Read) -> Result<T, InputError> {
    let value: serde_json::Value = serde_json::from_reader(reader).map_err(InputError::Json)?;
    if !value.is_object() {
        return Err(InputError::NotAnObject);
    }
    serde_json::from_value(value).map_err(InputError::Shape)
}

// ============================================================================
// Responses
// ============================================================================

/// One package in a `get` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    pub name: String,
    pub ensure: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub name: String,
    pub ensure: EnsureChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnsureChange {
    pub is: PackageState,
    pub was: PackageState,
}

impl From<ChangeRecord> for Change {
    fn from(record: ChangeRecord) -> Self {
        Self {
            name: record.name,
            ensure: EnsureChange {
                is: record.is,
                was: record.was,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub message: String,
    pub kind: ErrorKind,
}

/// A complete response: success and error shapes never mix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Resources {
        resources: Vec<Resource>,
    },
    Changes {
        changes: Vec<Change>,
        derive: bool,
    },
    Error {
        error: ErrorBody,
    },
}

impl Response {
    /// `get` result: installed packages, then requested-but-absent names.
    pub fn resources(state: CurrentState) -> Self {
        let present = state.present.into_iter().map(|p| Resource {
            name: p.name,
            ensure: p.evr,
            platform: Some(p.arch),
        });
        let absent = state.absent.into_iter().map(|name| Resource {
            name,
            ensure: PackageState::Absent.to_string(),
            platform: None,
        });

        Self::Resources {
            resources: present.chain(absent).collect(),
        }
    }

    /// `set` result
    pub fn changes(records: Vec<ChangeRecord>) -> Self {
        Self::Changes {
            changes: records.into_iter().map(Change::from).collect(),
            derive: false,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Error {
            error: ErrorBody {
                message: message.into(),
                kind: ErrorKind::Failed,
            },
        }
    }
}

/// Write a response as one line of JSON.
pub fn write_response(mut writer: impl Write, response: &Response) -> std::io::Result<()> {
    serde_json::to_writer(&mut writer, response)?;
    writeln!(writer)?;
    writer.flush()
}
