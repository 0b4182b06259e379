//! Action dispatch for `describe`, `get` and `set`

use crate::cli::Action;
use crate::metadata::METADATA;
use crate::privilege::PrivilegeCheck;
use crate::protocol::{GetRequest, Response, SetRequest, read_request, write_response};
use anyhow::{Context, Result};
use declarative::{ExecuteOptions, converge, current_state};
use pkgkit::{EngineFactory, RetryConfig};
use std::io::{Read, Write};

const ROOT_REQUIRED: &str = "only the root user can make package changes";

/// Write the capability document. Needs neither input nor an engine.
pub fn describe(mut output: impl Write) -> Result<()> {
    output
        .write_all(METADATA.as_bytes())
        .context("Failed to write metadata")
}

pub struct Provider<F, P> {
    factory: F,
    privilege: P,
    retry: RetryConfig,
}

impl<F: EngineFactory, P: PrivilegeCheck> Provider<F, P> {
    pub fn new(factory: F, privilege: P, retry: RetryConfig) -> Self {
        Self {
            factory,
            privilege,
            retry,
        }
    }

    /// Run `action`, reading the request from `input` and writing the
    /// result to `output`.
    ///
    /// Unusable input is returned as an error; everything else, including
    /// engine failures, becomes a response envelope.
    pub fn handle(&self, action: Action, input: impl Read, output: impl Write) -> Result<()> {
        let response = match action {
            Action::Describe => return describe(output),
            Action::Get => self.get(&read_request(input)?),
            Action::Set => self.set(&read_request(input)?),
        };

        write_response(output, &response).context("Failed to write response")
    }

    pub fn get(&self, request: &GetRequest) -> Response {
        match current_state(&self.factory, &request.names) {
            Ok(state) => {
                log::info!("Found {} package(s)", state.len());
                Response::resources(state)
            }
            Err(e) => {
                log::error!("get failed: {e}");
                Response::failure(e.to_string())
            }
        }
    }

    pub fn set(&self, request: &SetRequest) -> Response {
        if !self.privilege.is_privileged() {
            return Response::failure(ROOT_REQUIRED);
        }

        let opts = ExecuteOptions {
            noop: request.ral.noop,
            retry: self.retry.clone(),
        };

        match converge(&self.factory, &request.desired_items(), &opts) {
            Ok(changes) => {
                log::info!("{} change(s)", changes.len());
                Response::changes(changes)
            }
            Err(e) => {
                log::error!("set failed: {e}");
                Response::failure(e.to_string())
            }
        }
    }
}
