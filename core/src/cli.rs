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

//! HMC CLI transport abstraction
//!
//! [`HmcCli`] executes one command line on the HMC and returns what the
//! remote side printed together with its exit status. A non-zero exit is
//! not a transport error: callers turn it into a [`CliFailure`], which
//! classifies the exit code and scrapes a diagnostic message from the
//! output.

use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::future::Future;

/// Access to the HMC command line.
pub trait HmcCli: Send + Sync {
    /// Transport error (process could not be started, connection lost).
    type Error: StdError + Send + Sync + 'static;

    /// Execute a command line and collect its output.
    fn execute(&self, command: &str) -> impl Future<Output = Result<CliOutput, Self::Error>> + Send;
}

/// Output of one executed command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CliOutput {
    /// Successful output with given stdout.
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Best available human readable message: the first HMC message line
    /// (`HSC...`) from stderr or stdout, otherwise trimmed stderr, otherwise
    /// trimmed stdout.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let hmc_message = self
            .stderr
            .lines()
            .chain(self.stdout.lines())
            .map(str::trim)
            .find(|line| line.starts_with("HSC"));
        if let Some(line) = hmc_message {
            return line.to_string();
        }
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Classification of a non-zero CLI exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorKind {
    /// 1
    InvalidArgument,
    /// 2
    ConflictingArguments,
    /// 3
    RuntimeError,
    /// 4: unrecognized response from ssh.
    SshParseError,
    /// 5
    InvalidCredentials,
    /// 6
    UnknownHostKey,
    Other(i32),
}

impl CliErrorKind {
    #[must_use]
    pub const fn from_exit_code(code: i32) -> Self {
        match code {
            1 => Self::InvalidArgument,
            2 => Self::ConflictingArguments,
            3 => Self::RuntimeError,
            4 => Self::SshParseError,
            5 => Self::InvalidCredentials,
            6 => Self::UnknownHostKey,
            other => Self::Other(other),
        }
    }
}

impl Display for CliErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::InvalidArgument => "invalid command line argument".fmt(f),
            Self::ConflictingArguments => "conflicting arguments given".fmt(f),
            Self::RuntimeError => "general runtime error".fmt(f),
            Self::SshParseError => "unrecognized response from ssh (parse error)".fmt(f),
            Self::InvalidCredentials => "invalid or incorrect password".fmt(f),
            Self::UnknownHostKey => "host public key is unknown".fmt(f),
            Self::Other(code) => write!(f, "command failed with exit code {code}"),
        }
    }
}

/// Failed CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliFailure {
    pub kind: CliErrorKind,
    pub exit_code: i32,
    /// Command as shown to humans (passwords masked).
    pub command: String,
    pub message: String,
}

impl CliFailure {
    #[must_use]
    pub fn new(command: impl Display, output: &CliOutput) -> Self {
        Self {
            kind: CliErrorKind::from_exit_code(output.exit_code),
            exit_code: output.exit_code,
            command: command.to_string(),
            message: output.diagnostic(),
        }
    }
}

impl Display for CliFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.command, self.kind)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl StdError for CliFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(exit_code: i32, stdout: &str, stderr: &str) -> CliOutput {
        CliOutput {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    #[test]
    fn exit_codes_are_classified() {
        assert_eq!(CliErrorKind::from_exit_code(5), CliErrorKind::InvalidCredentials);
        assert_eq!(CliErrorKind::from_exit_code(3), CliErrorKind::RuntimeError);
        assert_ne!(
            CliErrorKind::from_exit_code(5),
            CliErrorKind::from_exit_code(3)
        );
        assert_eq!(CliErrorKind::from_exit_code(6), CliErrorKind::UnknownHostKey);
        assert_eq!(CliErrorKind::from_exit_code(255), CliErrorKind::Other(255));
    }

    #[test]
    fn diagnostic_prefers_hmc_message() {
        let output = failed(
            1,
            "some noise\nHSCL8012 The partition name lpar9 was not found.\n",
            "",
        );
        assert_eq!(
            output.diagnostic(),
            "HSCL8012 The partition name lpar9 was not found."
        );
        let output = failed(3, "stdout text", "  stderr text \n");
        assert_eq!(output.diagnostic(), "stderr text");
        let output = failed(3, " only stdout ", "");
        assert_eq!(output.diagnostic(), "only stdout");
    }

    #[test]
    fn failure_display() {
        let failure = CliFailure::new("lssyscfg -r sys", &failed(5, "", "Permission denied"));
        assert_eq!(failure.kind, CliErrorKind::InvalidCredentials);
        assert_eq!(
            failure.to_string(),
            "lssyscfg -r sys: invalid or incorrect password: Permission denied"
        );
    }
}
