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

//! Expectations for the transport mocks.

use hmc_core::CliOutput;
use hmc_core::RestResponse;
use http::Method;
use http::StatusCode;
use std::fmt::Display;

pub type Response<T, E> = Result<T, E>;

/// Command line expected by [`crate::Cli`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedCommand {
    /// Exact command text.
    Exact(String),
    /// Command text starting with the prefix.
    Prefix(String),
}

impl ExpectedCommand {
    #[must_use]
    pub fn matches(&self, command: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == command,
            Self::Prefix(prefix) => command.starts_with(prefix.as_str()),
        }
    }
}

/// Expectation of one CLI command.
#[derive(Debug)]
pub struct ExpectCommand<E> {
    pub command: ExpectedCommand,
    pub response: Response<CliOutput, E>,
}

impl<E> ExpectCommand<E> {
    /// Command succeeds printing `stdout`.
    pub fn ok(command: impl Display, stdout: impl Display) -> Self {
        Self {
            command: ExpectedCommand::Exact(command.to_string()),
            response: Ok(CliOutput::success(stdout.to_string())),
        }
    }

    /// Command exits with `exit_code` printing `stderr`.
    pub fn fail(command: impl Display, exit_code: i32, stderr: impl Display) -> Self {
        Self {
            command: ExpectedCommand::Exact(command.to_string()),
            response: Ok(CliOutput {
                exit_code,
                stdout: String::new(),
                stderr: stderr.to_string(),
            }),
        }
    }

    /// Transport failure.
    pub fn error(command: impl Display, err: E) -> Self {
        Self {
            command: ExpectedCommand::Exact(command.to_string()),
            response: Err(err),
        }
    }

    /// Match on the command prefix instead of the exact text.
    #[must_use]
    pub fn prefix(mut self) -> Self {
        if let ExpectedCommand::Exact(command) = self.command {
            self.command = ExpectedCommand::Prefix(command);
        }
        self
    }
}

/// REST request expected by [`crate::Rest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedRequest {
    pub method: Method,
    pub path: String,
    /// Substrings the request body must contain.
    pub body_contains: Vec<String>,
}

/// Expectation of one REST request.
#[derive(Debug)]
pub struct ExpectRequest<E> {
    pub request: ExpectedRequest,
    pub response: Response<RestResponse, E>,
}

impl<E> ExpectRequest<E> {
    fn new(method: Method, path: impl Display, status: StatusCode, body: impl Display) -> Self {
        Self {
            request: ExpectedRequest {
                method,
                path: path.to_string(),
                body_contains: Vec::new(),
            },
            response: Ok(RestResponse::new(status, body.to_string())),
        }
    }

    pub fn get(path: impl Display, body: impl Display) -> Self {
        Self::new(Method::GET, path, StatusCode::OK, body)
    }

    pub fn put(path: impl Display, body: impl Display) -> Self {
        Self::new(Method::PUT, path, StatusCode::OK, body)
    }

    pub fn delete(path: impl Display) -> Self {
        Self::new(Method::DELETE, path, StatusCode::NO_CONTENT, "")
    }

    /// Override the response status.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        if let Ok(response) = &mut self.response {
            response.status = status;
        }
        self
    }

    /// Require the request body to contain `needle`.
    #[must_use]
    pub fn body_contains(mut self, needle: impl Display) -> Self {
        self.request.body_contains.push(needle.to_string());
        self
    }

    /// Transport failure for the request.
    pub fn error(method: Method, path: impl Display, err: E) -> Self {
        Self {
            request: ExpectedRequest {
                method,
                path: path.to_string(),
                body_contains: Vec::new(),
            },
            response: Err(err),
        }
    }
}
