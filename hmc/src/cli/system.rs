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

//! Managed systems.

use super::required;
use super::CliHmc;
use crate::Changed;
use crate::Error;
use hmc_core::Command;
use hmc_core::CommandBuilder;
use hmc_core::HmcCli;
use hmc_core::Opt;
use hmc_core::PollStatus;
use hmc_core::Poller;
use hmc_core::Record;

/// Fields listed for every managed system.
pub const SYSTEM_FIELDS: &[&str] = &["name", "type_model", "serial_num", "state"];

pub const STATE_OPERATING: &str = "Operating";
pub const STATE_POWER_OFF: &str = "Power Off";

impl<C: HmcCli> CliHmc<C> {
    /// All managed systems, keyed by [`SYSTEM_FIELDS`].
    ///
    /// # Errors
    ///
    /// Transport, command and decode failures.
    pub async fn managed_systems(&self) -> Result<Vec<Record>, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lssyscfg)
            .opt(Opt::Resource, "sys")?
            .fields(SYSTEM_FIELDS)?
            .build();
        self.query(&command).await
    }

    /// # Errors
    ///
    /// [`Error::NotFound`] when no system has this name.
    pub async fn managed_system(&self, name: &str) -> Result<Record, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lssyscfg)
            .opt(Opt::Resource, "sys")?
            .filter(&[("names", name)])?
            .fields(SYSTEM_FIELDS)?
            .build();
        self.query_one(&command, || format!("managed system {name}"))
            .await
    }

    /// Current state (`Operating`, `Power Off`, `Standby`, ...).
    ///
    /// # Errors
    ///
    /// Transport, command and decode failures.
    pub async fn system_state(&self, name: &str) -> Result<String, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lssyscfg)
            .opt(Opt::Resource, "sys")?
            .opt(Opt::System, name)?
            .fields(&["state"])?
            .build();
        let record = self
            .query_one(&command, || format!("managed system {name}"))
            .await?;
        required(&record, "state").map(ToString::to_string)
    }

    /// Power the system on and wait for `Operating`.
    ///
    /// # Errors
    ///
    /// Command failures, [`Error::Failed`] when the system enters an error
    /// state, [`Error::Timeout`].
    pub async fn power_on_system(&self, name: &str) -> Result<Changed<String>, Error<C::Error>> {
        let state = self.system_state(name).await?;
        if state == STATE_OPERATING {
            return Ok(Changed::unchanged(state));
        }
        let command = CommandBuilder::new(Command::Chsysstate)
            .opt(Opt::Resource, "sys")?
            .opt(Opt::System, name)?
            .opt(Opt::Operation, "on")?
            .build();
        self.run(&command).await?;
        tracing::info!(system = name, from = %state, "powering on");
        self.wait_for_system_state(name, STATE_OPERATING).await
    }

    /// Power the system off (`immediate` skips the normal shutdown) and
    /// wait for `Power Off`.
    ///
    /// # Errors
    ///
    /// Command failures, [`Error::Failed`], [`Error::Timeout`].
    pub async fn power_off_system(
        &self,
        name: &str,
        immediate: bool,
    ) -> Result<Changed<String>, Error<C::Error>> {
        let state = self.system_state(name).await?;
        if state == STATE_POWER_OFF {
            return Ok(Changed::unchanged(state));
        }
        let mut builder = CommandBuilder::new(Command::Chsysstate)
            .opt(Opt::Resource, "sys")?
            .opt(Opt::System, name)?
            .opt(Opt::Operation, "off")?;
        if immediate {
            builder = builder.flag(Opt::Immediate)?;
        }
        self.run(&builder.build()).await?;
        tracing::info!(system = name, from = %state, "powering off");
        self.wait_for_system_state(name, STATE_POWER_OFF).await
    }

    async fn wait_for_system_state(
        &self,
        name: &str,
        target: &str,
    ) -> Result<Changed<String>, Error<C::Error>> {
        let state = wait_for_state(
            self.polling.system_state,
            &format!("managed system {name}"),
            || self.system_state(name),
            target,
        )
        .await?;
        Ok(Changed::changed(state))
    }
}

/// Poll `probe` until it reports `target`. States starting with `Error`
/// are terminal.
pub(super) async fn wait_for_state<F, Fut, E>(
    poller: Poller,
    what: &str,
    probe: F,
    target: &str,
) -> Result<String, Error<E>>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<String, Error<E>>>,
{
    let state = poller
        .poll(what, probe, |state| {
            if state == target {
                PollStatus::Done(state)
            } else if state.starts_with("Error") {
                PollStatus::Failed(format!("entered state {state}"))
            } else {
                PollStatus::Pending
            }
        })
        .await?;
    tracing::info!(what, state = %state, "state reached");
    Ok(state)
}
