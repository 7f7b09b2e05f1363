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

//! Password policies.
//!
//! `lspwdpolicy -t p` lists the policies, `lspwdpolicy -t s` shows which
//! one is active. At most one policy is active at a time.

use super::CliHmc;
use crate::Changed;
use crate::Error;
use hmc_core::Command;
use hmc_core::CommandBuilder;
use hmc_core::HmcCli;
use hmc_core::Opt;
use hmc_core::Record;

const ACTIVE_POLICY: &str = "ACTIVE_POLICY_NAME";

impl<C: HmcCli> CliHmc<C> {
    /// # Errors
    ///
    /// Transport, command and decode failures.
    pub async fn password_policies(&self) -> Result<Vec<Record>, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lspwdpolicy)
            .opt(Opt::Type, "p")?
            .build();
        self.query(&command).await
    }

    /// Policy by name, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Transport, command and decode failures.
    pub async fn password_policy(&self, name: &str) -> Result<Option<Record>, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lspwdpolicy)
            .opt(Opt::Type, "p")?
            .filter(&[("names", name)])?
            .build();
        Ok(self.query(&command).await?.into_iter().next())
    }

    /// `lspwdpolicy -t s`: the active policy and related status.
    ///
    /// # Errors
    ///
    /// Transport, command and decode failures.
    pub async fn password_policy_status(&self) -> Result<Record, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lspwdpolicy)
            .opt(Opt::Type, "s")?
            .build();
        self.query_one(&command, || "password policy status".to_string())
            .await
    }

    /// Name of the active policy, if any.
    ///
    /// # Errors
    ///
    /// Transport, command and decode failures.
    pub async fn active_password_policy(&self) -> Result<Option<String>, Error<C::Error>> {
        let status = self.password_policy_status().await?;
        Ok(status
            .get_str(ACTIVE_POLICY)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string))
    }

    /// `mkpwdpolicy -i "name=<name>,..."`
    ///
    /// # Errors
    ///
    /// Command failures.
    pub async fn create_password_policy<K, V>(
        &self,
        name: &str,
        attributes: &[(K, V)],
    ) -> Result<Record, Error<C::Error>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut pairs = vec![("name", name)];
        pairs.extend(attributes.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
        let command = CommandBuilder::new(Command::Mkpwdpolicy)
            .attributes(&pairs)?
            .build();
        self.run(&command).await?;
        tracing::info!(policy = name, "password policy created");
        self.password_policy(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("password policy {name}")))
    }

    /// `chpwdpolicy -o s -i "name=<name>,..."`
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] without changes, command failures.
    pub async fn modify_password_policy<K, V>(
        &self,
        name: &str,
        changes: &[(K, V)],
    ) -> Result<Record, Error<C::Error>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if changes.is_empty() {
            return Err(Error::Validation(format!(
                "no changes for password policy {name}"
            )));
        }
        let mut pairs = vec![("name", name)];
        pairs.extend(changes.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
        let command = CommandBuilder::new(Command::Chpwdpolicy)
            .opt(Opt::Operation, "s")?
            .attributes(&pairs)?
            .build();
        self.run(&command).await?;
        tracing::info!(policy = name, "password policy modified");
        self.password_policy(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("password policy {name}")))
    }

    /// # Errors
    ///
    /// [`Error::NotFound`] for an unknown policy, command failures.
    pub async fn activate_password_policy(
        &self,
        name: &str,
    ) -> Result<Changed<()>, Error<C::Error>> {
        if self.active_password_policy().await?.as_deref() == Some(name) {
            return Ok(Changed::unchanged(()));
        }
        if self.password_policy(name).await?.is_none() {
            return Err(Error::NotFound(format!("password policy {name}")));
        }
        let command = CommandBuilder::new(Command::Chpwdpolicy)
            .opt(Opt::Operation, "a")?
            .opt(Opt::Name, name)?
            .build();
        self.run(&command).await?;
        tracing::info!(policy = name, "password policy activated");
        Ok(Changed::changed(()))
    }

    /// # Errors
    ///
    /// Transport and command failures.
    pub async fn deactivate_password_policy(&self) -> Result<Changed<()>, Error<C::Error>> {
        let Some(active) = self.active_password_policy().await? else {
            return Ok(Changed::unchanged(()));
        };
        let command = CommandBuilder::new(Command::Chpwdpolicy)
            .opt(Opt::Operation, "d")?
            .build();
        self.run(&command).await?;
        tracing::info!(policy = %active, "password policy deactivated");
        Ok(Changed::changed(()))
    }

    /// Remove a policy. The active policy cannot be removed.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for the active policy, command failures.
    pub async fn remove_password_policy(&self, name: &str) -> Result<Changed<()>, Error<C::Error>> {
        if self.password_policy(name).await?.is_none() {
            return Ok(Changed::unchanged(()));
        }
        if self.active_password_policy().await?.as_deref() == Some(name) {
            return Err(Error::Validation(format!(
                "password policy {name} is active, deactivate it first"
            )));
        }
        let command = CommandBuilder::new(Command::Rmpwdpolicy)
            .opt(Opt::Name, name)?
            .build();
        self.run(&command).await?;
        tracing::info!(policy = name, "password policy removed");
        Ok(Changed::changed(()))
    }

    /// Create the policy, or change the attributes that differ.
    ///
    /// # Errors
    ///
    /// Same as [`CliHmc::create_password_policy`] and
    /// [`CliHmc::modify_password_policy`].
    pub async fn ensure_password_policy<K, V>(
        &self,
        name: &str,
        attributes: &[(K, V)],
    ) -> Result<Changed<Record>, Error<C::Error>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let Some(current) = self.password_policy(name).await? else {
            return Ok(Changed::changed(
                self.create_password_policy(name, attributes).await?,
            ));
        };
        let differences: Vec<(&str, &str)> = attributes
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_ref()))
            .filter(|(k, v)| current.get_str(&k.to_uppercase()) != Some(*v))
            .collect();
        if differences.is_empty() {
            return Ok(Changed::unchanged(current));
        }
        Ok(Changed::changed(
            self.modify_password_policy(name, &differences).await?,
        ))
    }
}
