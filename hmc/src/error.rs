// SPDX-FileCopyrightText: Copyright (c) 2025 NVIDIA CORPORATION & AFFILIATES. All rights reserved.
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use hmc_core::BuildError;
use hmc_core::CliFailure;
use hmc_core::DecodeError;
use hmc_core::PollError;
use hmc_core::XmlError;
use http::StatusCode;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

pub type JsonError = serde_path_to_error::Error<serde_json::Error>;

/// Errors of HMC operations. `E` is the transport error.
#[derive(Debug)]
pub enum Error<E> {
    /// Request parameters rejected before any remote call.
    Validation(String),
    Build(BuildError),
    /// CLI command exited with non-zero status.
    Cli(CliFailure),
    Transport(E),
    Decode(DecodeError),
    Xml(XmlError),
    Json(JsonError),
    /// REST request answered with an error status.
    Rest { status: StatusCode, message: String },
    /// REST job reached a terminal status other than `COMPLETED_OK`.
    Job {
        id: String,
        status: String,
        message: String,
    },
    /// Polled object reached a state it cannot leave.
    Failed { what: String, reason: String },
    Timeout { what: String, attempts: u32 },
    NotFound(String),
}

impl<E> Error<E> {
    /// Classification of a CLI failure, if this is one.
    #[must_use]
    pub const fn cli_failure(&self) -> Option<&CliFailure> {
        match self {
            Self::Cli(failure) => Some(failure),
            _ => None,
        }
    }
}

impl<E: Display> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Validation(reason) => write!(f, "invalid parameters: {reason}"),
            Self::Build(err) => write!(f, "cannot build command: {err}"),
            Self::Cli(err) => write!(f, "command failed: {err}"),
            Self::Transport(err) => write!(f, "transport error: {err}"),
            Self::Decode(err) => write!(f, "cannot decode command output: {err}"),
            Self::Xml(err) => write!(f, "cannot decode XML response: {err}"),
            Self::Json(err) => write!(
                f,
                "JSON deserialization error at line {} column {} path {}: {err}",
                err.inner().line(),
                err.inner().column(),
                err.path(),
            ),
            Self::Rest { status, message } => write!(f, "REST error {status}: {message}"),
            Self::Job {
                id,
                status,
                message,
            } => {
                write!(f, "job {id} finished with status {status}")?;
                if !message.is_empty() {
                    write!(f, ": {message}")?;
                }
                Ok(())
            }
            Self::Failed { what, reason } => write!(f, "{what} failed: {reason}"),
            Self::Timeout { what, attempts } => {
                write!(f, "timed out waiting for {what} after {attempts} attempts")
            }
            Self::NotFound(what) => write!(f, "{what} not found"),
        }
    }
}

impl<E: StdError + 'static> StdError for Error<E> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Build(err) => Some(err),
            Self::Cli(err) => Some(err),
            Self::Transport(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Xml(err) => Some(err),
            Self::Json(err) => Some(err.inner()),
            _ => None,
        }
    }
}

impl<E> From<BuildError> for Error<E> {
    fn from(err: BuildError) -> Self {
        Self::Build(err)
    }
}

impl<E> From<DecodeError> for Error<E> {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}

impl<E> From<XmlError> for Error<E> {
    fn from(err: XmlError) -> Self {
        Self::Xml(err)
    }
}

impl<E> From<JsonError> for Error<E> {
    fn from(err: JsonError) -> Self {
        Self::Json(err)
    }
}

impl<E> From<PollError<Error<E>>> for Error<E> {
    fn from(err: PollError<Error<E>>) -> Self {
        match err {
            PollError::Probe(err) => err,
            PollError::Failed { what, reason } => Self::Failed { what, reason },
            PollError::Timeout { what, attempts } => Self::Timeout { what, attempts },
        }
    }
}
