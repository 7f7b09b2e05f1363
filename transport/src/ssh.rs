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

//! CLI transport over the system ssh client.
//!
//! Password logins go through `sshpass -e`, which reads the password from
//! the `SSHPASS` environment variable of the child process so it never
//! shows up in a process listing. The exit status of the child is returned
//! unchanged: `sshpass` reports its own failures as 1 to 6 (see
//! [`hmc_core::CliErrorKind`]), otherwise it is the status of the remote
//! command.

use hmc_core::CliOutput;
use hmc_core::HmcCli;
use hmc_core::HmcCredentials;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::io::Error as IoError;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug)]
pub enum SshError {
    /// Local program could not be started.
    Spawn { program: String, source: IoError },
    /// Command did not finish in time; the child was killed.
    Timeout { host: String, timeout: Duration },
}

impl Display for SshError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Spawn { program, source } => write!(f, "cannot run {program}: {source}"),
            Self::Timeout { host, timeout } => {
                write!(f, "command on {host} did not finish within {timeout:?}")
            }
        }
    }
}

impl StdError for SshError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Spawn { source, .. } => Some(source),
            Self::Timeout { .. } => None,
        }
    }
}

/// Configuration parameters of the ssh transport.
#[derive(Debug, Clone)]
pub struct SshParams {
    /// Remote port, ssh default when `None`.
    pub port: Option<u16>,
    /// `ConnectTimeout` passed to ssh.
    pub connect_timeout: Duration,
    /// Limit for one command, including connection setup.
    pub command_timeout: Option<Duration>,
    /// Verify the HMC host key against `known_hosts`.
    pub strict_host_key_checking: bool,
    pub ssh_program: String,
    pub sshpass_program: String,
}

impl Default for SshParams {
    fn default() -> Self {
        Self {
            port: None,
            connect_timeout: Duration::from_secs(30),
            command_timeout: Some(Duration::from_secs(3600)),
            strict_host_key_checking: false,
            ssh_program: "ssh".to_string(),
            sshpass_program: "sshpass".to_string(),
        }
    }
}

impl SshParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn strict_host_key_checking(mut self, strict: bool) -> Self {
        self.strict_host_key_checking = strict;
        self
    }

    #[must_use]
    pub fn ssh_program<S: Into<String>>(mut self, program: S) -> Self {
        self.ssh_program = program.into();
        self
    }

    #[must_use]
    pub fn sshpass_program<S: Into<String>>(mut self, program: S) -> Self {
        self.sshpass_program = program.into();
        self
    }
}

#[derive(Clone)]
enum Login {
    Password(HmcCredentials),
    Key(String),
}

/// [`HmcCli`] over ssh.
#[derive(Clone)]
pub struct SshCli {
    host: String,
    login: Login,
    params: SshParams,
}

impl std::fmt::Debug for SshCli {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SshCli")
            .field("host", &self.host)
            .field("user", &self.username())
            .field("params", &self.params)
            .finish()
    }
}

impl SshCli {
    /// Password login through `sshpass`.
    #[must_use]
    pub fn new(host: impl Into<String>, credentials: HmcCredentials) -> Self {
        Self {
            host: host.into(),
            login: Login::Password(credentials),
            params: SshParams::default(),
        }
    }

    /// Key based login, `ssh` is run directly.
    #[must_use]
    pub fn with_key(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            login: Login::Key(username.into()),
            params: SshParams::default(),
        }
    }

    #[must_use]
    pub fn params(mut self, params: SshParams) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn username(&self) -> &str {
        match &self.login {
            Login::Password(credentials) => &credentials.username,
            Login::Key(username) => username,
        }
    }

    /// Arguments passed to ssh for `remote_command`.
    #[must_use]
    pub fn ssh_args(&self, remote_command: &str) -> Vec<String> {
        let strict = if self.params.strict_host_key_checking {
            "yes"
        } else {
            "no"
        };
        let mut args = vec![
            "-o".to_string(),
            format!("StrictHostKeyChecking={strict}"),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.params.connect_timeout.as_secs().max(1)),
            "-o".to_string(),
            "LogLevel=ERROR".to_string(),
        ];
        if let Login::Key(_) = self.login {
            args.push("-o".to_string());
            args.push("BatchMode=yes".to_string());
        }
        if let Some(port) = self.params.port {
            args.push("-p".to_string());
            args.push(port.to_string());
        }
        args.push(format!("{}@{}", self.username(), self.host));
        args.push(remote_command.to_string());
        args
    }

    fn command(&self, remote_command: &str) -> (String, Command) {
        let (program, mut command) = match &self.login {
            Login::Password(credentials) => {
                let mut command = Command::new(&self.params.sshpass_program);
                command
                    .arg("-e")
                    .arg(&self.params.ssh_program)
                    .env("SSHPASS", credentials.password());
                (self.params.sshpass_program.clone(), command)
            }
            Login::Key(_) => (
                self.params.ssh_program.clone(),
                Command::new(&self.params.ssh_program),
            ),
        };
        command
            .args(self.ssh_args(remote_command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        (program, command)
    }
}

impl HmcCli for SshCli {
    type Error = SshError;

    async fn execute(&self, command: &str) -> Result<CliOutput, Self::Error> {
        let (program, mut child) = self.command(command);
        tracing::debug!(host = %self.host, user = self.username(), "ssh exec");

        let running = child.output();
        let output = match self.params.command_timeout {
            Some(timeout) => tokio::time::timeout(timeout, running)
                .await
                .map_err(|_| SshError::Timeout {
                    host: self.host.clone(),
                    timeout,
                })?,
            None => running.await,
        }
        .map_err(|source| SshError::Spawn { program, source })?;

        // Killed by a signal: no exit code.
        let exit_code = output.status.code().unwrap_or(-1);
        tracing::debug!(host = %self.host, exit_code, "ssh exec finished");
        Ok(CliOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_login_args() {
        let cli = SshCli::new(
            "hmc01",
            HmcCredentials::new("hscroot".into(), "secret".into()),
        )
        .params(SshParams::new().port(2222));
        let args = cli.ssh_args("lshmc -V");
        assert_eq!(args[args.len() - 2], "hscroot@hmc01");
        assert_eq!(args[args.len() - 1], "lshmc -V");
        assert!(args.contains(&"StrictHostKeyChecking=no".to_string()));
        assert!(args.windows(2).any(|w| w[0] == "-p" && w[1] == "2222"));
        assert!(!args.iter().any(|a| a.contains("secret")));
        assert!(!args.contains(&"BatchMode=yes".to_string()));
        assert!(!format!("{cli:?}").contains("secret"));
    }

    #[test]
    fn key_login_args() {
        let cli = SshCli::with_key("hmc01", "hscroot")
            .params(SshParams::new().strict_host_key_checking(true));
        let args = cli.ssh_args("lssyscfg -r sys");
        assert!(args.contains(&"StrictHostKeyChecking=yes".to_string()));
        assert!(args.contains(&"BatchMode=yes".to_string()));
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let cli = SshCli::with_key("hmc01", "hscroot")
            .params(SshParams::new().ssh_program("/nonexistent/ssh-binary"));
        let err = cli.execute("lshmc -V").await.unwrap_err();
        assert!(matches!(err, SshError::Spawn { ref program, .. } if program == "/nonexistent/ssh-binary"));
    }
}
