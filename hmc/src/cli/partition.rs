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

//! Logical partitions and their profiles.

use super::required;
use super::system::wait_for_state;
use super::CliHmc;
use crate::Changed;
use crate::Error;
use hmc_core::Command;
use hmc_core::CommandBuilder;
use hmc_core::HmcCli;
use hmc_core::Opt;
use hmc_core::Record;

/// Fields listed for every partition.
pub const PARTITION_FIELDS: &[&str] = &[
    "name",
    "lpar_id",
    "lpar_env",
    "state",
    "curr_profile",
    "os_version",
];

pub const STATE_RUNNING: &str = "Running";
pub const STATE_NOT_ACTIVATED: &str = "Not Activated";

/// HMC message of `lssyscfg` for an unknown partition name.
const PARTITION_NOT_FOUND: &str = "HSCL8012";

/// Partition to create with `mksyscfg`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewPartition {
    pub name: String,
    pub profile_name: String,
    /// `aixlinux`, `os400` or `vioserver`.
    pub lpar_env: String,
    /// Remaining profile attributes (`min_mem`, `desired_procs`, ...).
    pub attributes: Vec<(String, String)>,
}

impl NewPartition {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            Err("partition name is empty".to_string())
        } else if self.profile_name.is_empty() {
            Err(format!("partition {} has no profile name", self.name))
        } else if self.lpar_env.is_empty() {
            Err(format!("partition {} has no environment", self.name))
        } else {
            Ok(())
        }
    }

    fn assignments(&self) -> Vec<(&str, &str)> {
        let mut pairs = vec![
            ("name", self.name.as_str()),
            ("profile_name", self.profile_name.as_str()),
            ("lpar_env", self.lpar_env.as_str()),
        ];
        pairs.extend(
            self.attributes
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        pairs
    }
}

impl<C: HmcCli> CliHmc<C> {
    /// Partitions of a managed system, keyed by [`PARTITION_FIELDS`].
    ///
    /// # Errors
    ///
    /// Transport, command and decode failures.
    pub async fn partitions(&self, system: &str) -> Result<Vec<Record>, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lssyscfg)
            .opt(Opt::Resource, "lpar")?
            .opt(Opt::System, system)?
            .fields(PARTITION_FIELDS)?
            .build();
        self.query(&command).await
    }

    /// Partition by name, `None` if the system has no such partition.
    ///
    /// # Errors
    ///
    /// Transport, command and decode failures.
    pub async fn partition(
        &self,
        system: &str,
        name: &str,
    ) -> Result<Option<Record>, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lssyscfg)
            .opt(Opt::Resource, "lpar")?
            .opt(Opt::System, system)?
            .filter(&[("lpar_names", name)])?
            .fields(PARTITION_FIELDS)?
            .build();
        match self.query(&command).await {
            Ok(records) => Ok(records.into_iter().next()),
            Err(Error::Cli(failure)) if failure.message.starts_with(PARTITION_NOT_FOUND) => {
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown partition.
    pub async fn partition_state(&self, system: &str, name: &str) -> Result<String, Error<C::Error>> {
        let record = self
            .partition(system, name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("partition {name}")))?;
        required(&record, "state").map(ToString::to_string)
    }

    /// Create a partition with its first profile. Nothing happens when a
    /// partition with this name exists.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an incomplete definition, command failures.
    pub async fn create_partition(
        &self,
        system: &str,
        partition: &NewPartition,
    ) -> Result<Changed<Record>, Error<C::Error>> {
        partition.validate().map_err(Error::Validation)?;
        let command = CommandBuilder::new(Command::Mksyscfg)
            .opt(Opt::Resource, "lpar")?
            .opt(Opt::System, system)?
            .attributes(&partition.assignments())?
            .build();
        if let Some(existing) = self.partition(system, &partition.name).await? {
            return Ok(Changed::unchanged(existing));
        }
        self.run(&command).await?;
        tracing::info!(system, partition = %partition.name, "partition created");
        let created = self
            .partition(system, &partition.name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("partition {}", partition.name)))?;
        Ok(Changed::changed(created))
    }

    /// Delete a partition. It has to be shut down.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for a partition that is not `Not Activated`,
    /// command failures.
    pub async fn delete_partition(
        &self,
        system: &str,
        name: &str,
    ) -> Result<Changed<()>, Error<C::Error>> {
        let Some(existing) = self.partition(system, name).await? else {
            return Ok(Changed::unchanged(()));
        };
        let state = required(&existing, "state")?;
        if state != STATE_NOT_ACTIVATED {
            return Err(Error::Validation(format!(
                "partition {name} is {state}, shut it down first"
            )));
        }
        let command = CommandBuilder::new(Command::Rmsyscfg)
            .opt(Opt::Resource, "lpar")?
            .opt(Opt::System, system)?
            .opt(Opt::Name, name)?
            .build();
        self.run(&command).await?;
        tracing::info!(system, partition = name, "partition deleted");
        Ok(Changed::changed(()))
    }

    /// Profile of a partition, all attributes as printed by `lssyscfg`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown profile.
    pub async fn profile(
        &self,
        system: &str,
        partition: &str,
        profile: &str,
    ) -> Result<Record, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lssyscfg)
            .opt(Opt::Resource, "prof")?
            .opt(Opt::System, system)?
            .filter(&[("lpar_names", partition), ("profile_names", profile)])?
            .build();
        self.query_one(&command, || format!("profile {profile} of partition {partition}"))
            .await
    }

    /// Change profile attributes. A value with a leading `+` or `-` adds to
    /// or removes from the current value (`virtual_eth_adapters`, memory).
    /// The profile is read before and after to report whether anything
    /// changed.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] without changes, command failures.
    pub async fn change_profile<K, V>(
        &self,
        system: &str,
        partition: &str,
        profile: &str,
        changes: &[(K, V)],
    ) -> Result<Changed<Record>, Error<C::Error>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if changes.is_empty() {
            return Err(Error::Validation(format!("no changes for profile {profile}")));
        }
        let mut pairs = vec![("name", profile), ("lpar_name", partition)];
        pairs.extend(changes.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
        let command = CommandBuilder::new(Command::Chsyscfg)
            .opt(Opt::Resource, "prof")?
            .opt(Opt::System, system)?
            .attributes(&pairs)?
            .build();

        let before = self.profile(system, partition, profile).await?;
        self.run(&command).await?;
        let after = self.profile(system, partition, profile).await?;
        let changed = before != after;
        tracing::info!(system, partition, profile, changed, "profile updated");
        Ok(Changed::new(changed, after))
    }

    /// Activate a partition with `profile`, or with its current profile,
    /// and wait for `Running`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`], command failures, [`Error::Failed`],
    /// [`Error::Timeout`].
    pub async fn activate_partition(
        &self,
        system: &str,
        name: &str,
        profile: Option<&str>,
    ) -> Result<Changed<String>, Error<C::Error>> {
        let record = self
            .partition(system, name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("partition {name}")))?;
        let state = required(&record, "state")?;
        if state == STATE_RUNNING {
            return Ok(Changed::unchanged(state.to_string()));
        }
        let profile = match profile {
            Some(profile) => profile,
            None => record
                .get_str("curr_profile")
                .filter(|profile| !profile.is_empty())
                .ok_or_else(|| {
                    Error::Validation(format!("partition {name} has no current profile"))
                })?,
        };
        let command = CommandBuilder::new(Command::Chsysstate)
            .opt(Opt::Resource, "lpar")?
            .opt(Opt::System, system)?
            .opt(Opt::Name, name)?
            .opt(Opt::Operation, "on")?
            .opt(Opt::Profile, profile)?
            .build();
        self.run(&command).await?;
        tracing::info!(system, partition = name, profile, "activating");
        self.wait_for_partition_state(system, name, STATE_RUNNING)
            .await
    }

    /// Shut a partition down (`immediate` for a hard stop) and wait for
    /// `Not Activated`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`], command failures, [`Error::Failed`],
    /// [`Error::Timeout`].
    pub async fn shutdown_partition(
        &self,
        system: &str,
        name: &str,
        immediate: bool,
    ) -> Result<Changed<String>, Error<C::Error>> {
        let state = self.partition_state(system, name).await?;
        if state == STATE_NOT_ACTIVATED {
            return Ok(Changed::unchanged(state));
        }
        let mut builder = CommandBuilder::new(Command::Chsysstate)
            .opt(Opt::Resource, "lpar")?
            .opt(Opt::System, system)?
            .opt(Opt::Name, name)?
            .opt(Opt::Operation, "shutdown")?;
        if immediate {
            builder = builder.flag(Opt::Immediate)?;
        }
        self.run(&builder.build()).await?;
        tracing::info!(system, partition = name, from = %state, "shutting down");
        self.wait_for_partition_state(system, name, STATE_NOT_ACTIVATED)
            .await
    }

    async fn wait_for_partition_state(
        &self,
        system: &str,
        name: &str,
        target: &str,
    ) -> Result<Changed<String>, Error<C::Error>> {
        let state = wait_for_state(
            self.polling.partition_state,
            &format!("partition {name}"),
            || self.partition_state(system, name),
            target,
        )
        .await?;
        Ok(Changed::changed(state))
    }
}
