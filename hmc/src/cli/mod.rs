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

//! HMC operations over the CLI transport.
//!
//! Every operation builds its command lines with
//! [`hmc_core::CommandBuilder`], executes them one after the other and
//! decodes the output. State changing operations first read the current
//! state and report [`Changed`](crate::Changed) accordingly.

mod encryption;
mod hmc;
mod partition;
mod password_policy;
mod system;
mod user;

pub use encryption::EncryptionComponent;
pub use encryption::EncryptionListing;
pub use hmc::HmcVersion;
pub use hmc::ImageSource;
pub use hmc::SourceKind;
pub use partition::NewPartition;
pub use user::UserSpec;

use crate::Error;
use hmc_core::decode_output;
use hmc_core::CliFailure;
use hmc_core::CommandLine;
use hmc_core::DecodeMode;
use hmc_core::HmcCli;
use hmc_core::Poller;
use hmc_core::Record;

/// Output of listing commands that matched nothing.
const NO_RESULTS: &str = "No results were found.";

/// Polling policies of [`CliHmc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polling {
    pub system_state: Poller,
    pub partition_state: Poller,
    pub hmc_reboot: Poller,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            system_state: Poller::system_state(),
            partition_state: Poller::partition_state(),
            hmc_reboot: Poller::hmc_reboot(),
        }
    }
}

impl Polling {
    /// Same policy for every wait.
    #[must_use]
    pub const fn uniform(poller: Poller) -> Self {
        Self {
            system_state: poller,
            partition_state: poller,
            hmc_reboot: poller,
        }
    }
}

/// HMC reached through [`HmcCli`].
#[derive(Debug)]
pub struct CliHmc<C> {
    cli: C,
    polling: Polling,
}

impl<C: HmcCli> CliHmc<C> {
    #[must_use]
    pub fn new(cli: C) -> Self {
        Self {
            cli,
            polling: Polling::default(),
        }
    }

    #[must_use]
    pub const fn with_polling(mut self, polling: Polling) -> Self {
        self.polling = polling;
        self
    }

    pub const fn cli(&self) -> &C {
        &self.cli
    }

    /// Execute a command and return its stdout.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] if the command could not be run,
    /// [`Error::Cli`] if it exited with non-zero status.
    pub async fn run(&self, command: &CommandLine) -> Result<String, Error<C::Error>> {
        tracing::debug!(%command, "executing");
        let output = self
            .cli
            .execute(command.as_str())
            .await
            .map_err(Error::Transport)?;
        if output.is_success() {
            Ok(output.stdout)
        } else {
            let failure = CliFailure::new(command, &output);
            tracing::debug!(%failure, "command failed");
            Err(Error::Cli(failure))
        }
    }

    /// Execute a listing command and decode its records: positionally when
    /// the command selects fields with `-F`, free-form otherwise.
    ///
    /// # Errors
    ///
    /// Same as [`CliHmc::run`], plus [`Error::Decode`].
    pub async fn query(&self, command: &CommandLine) -> Result<Vec<Record>, Error<C::Error>> {
        let stdout = self.run(command).await?;
        if stdout.trim() == NO_RESULTS {
            return Ok(Vec::new());
        }
        let records = match command.fields() {
            Some(fields) => decode_output(&stdout, DecodeMode::Positional(&fields))?,
            None => decode_output(&stdout, DecodeMode::FreeForm)?,
        };
        Ok(records)
    }

    async fn query_one(
        &self,
        command: &CommandLine,
        what: impl FnOnce() -> String,
    ) -> Result<Record, Error<C::Error>> {
        self.query(command)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(what()))
    }
}

fn required<'a, E>(record: &'a Record, key: &str) -> Result<&'a str, Error<E>> {
    record
        .get_str(key)
        .ok_or_else(|| Error::NotFound(format!("field {key}")))
}
