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

//! HMC user accounts.

use super::CliHmc;
use crate::Changed;
use crate::Error;
use hmc_core::Command;
use hmc_core::CommandBuilder;
use hmc_core::HmcCli;
use hmc_core::Opt;
use hmc_core::Record;
use std::fmt;

/// Desired HMC user.
#[derive(Clone, Default)]
pub struct UserSpec {
    pub name: String,
    /// `hmcsuperadmin`, `hmcoperator`, `hmcviewer`, ...
    pub taskrole: String,
    pub description: Option<String>,
    /// Only used when the user is created.
    pub password: Option<String>,
    /// Further `mkhmcusr`/`chhmcusr` attributes (`resourcerole`,
    /// `pwage`, `authentication_type`, ...).
    pub attributes: Vec<(String, String)>,
}

impl fmt::Debug for UserSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSpec")
            .field("name", &self.name)
            .field("taskrole", &self.taskrole)
            .field("description", &self.description)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl UserSpec {
    #[must_use]
    pub fn new(name: impl Into<String>, taskrole: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            taskrole: taskrole.into(),
            ..Self::default()
        }
    }

    /// Attributes compared against `lshmcusr` output. The password cannot
    /// be read back and is not part of it.
    fn settings(&self) -> Vec<(&str, &str)> {
        let mut pairs = vec![("taskrole", self.taskrole.as_str())];
        if let Some(description) = &self.description {
            pairs.push(("description", description.as_str()));
        }
        pairs.extend(
            self.attributes
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        pairs
    }

    /// Settings that differ from what `current` shows.
    fn differences<'a>(&'a self, current: &Record) -> Vec<(&'a str, &'a str)> {
        self.settings()
            .into_iter()
            .filter(|(key, value)| current.get_str(&key.to_uppercase()) != Some(*value))
            .collect()
    }
}

impl<C: HmcCli> CliHmc<C> {
    /// # Errors
    ///
    /// Transport, command and decode failures.
    pub async fn users(&self) -> Result<Vec<Record>, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lshmcusr).build();
        self.query(&command).await
    }

    /// User by name, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Transport, command and decode failures.
    pub async fn user(&self, name: &str) -> Result<Option<Record>, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lshmcusr)
            .filter(&[("names", name)])?
            .build();
        Ok(self.query(&command).await?.into_iter().next())
    }

    /// `mkhmcusr`
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] without name, task role or password, command
    /// failures.
    pub async fn create_user(&self, user: &UserSpec) -> Result<Record, Error<C::Error>> {
        if user.name.is_empty() || user.taskrole.is_empty() {
            return Err(Error::Validation(
                "a user needs a name and a task role".to_string(),
            ));
        }
        let password = user.password.as_deref().ok_or_else(|| {
            Error::Validation(format!("user {} needs an initial password", user.name))
        })?;
        let mut pairs = vec![("name", user.name.as_str())];
        pairs.extend(user.settings());
        pairs.push(("passwd", password));
        let command = CommandBuilder::new(Command::Mkhmcusr)
            .attributes(&pairs)?
            .build();
        self.run(&command).await?;
        tracing::info!(user = %user.name, "user created");
        self.user(&user.name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {}", user.name)))
    }

    /// `chhmcusr -i "name=<name>,..."`
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] without changes, command failures.
    pub async fn modify_user<K, V>(
        &self,
        name: &str,
        changes: &[(K, V)],
    ) -> Result<Record, Error<C::Error>>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        if changes.is_empty() {
            return Err(Error::Validation(format!("no changes for user {name}")));
        }
        let mut pairs = vec![("name", name)];
        pairs.extend(changes.iter().map(|(k, v)| (k.as_ref(), v.as_ref())));
        let command = CommandBuilder::new(Command::Chhmcusr)
            .attributes(&pairs)?
            .build();
        self.run(&command).await?;
        tracing::info!(user = name, "user modified");
        self.user(name)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {name}")))
    }

    /// # Errors
    ///
    /// Transport and command failures.
    pub async fn remove_user(&self, name: &str) -> Result<Changed<()>, Error<C::Error>> {
        if self.user(name).await?.is_none() {
            return Ok(Changed::unchanged(()));
        }
        let command = CommandBuilder::new(Command::Rmhmcusr)
            .opt(Opt::User, name)?
            .build();
        self.run(&command).await?;
        tracing::info!(user = name, "user removed");
        Ok(Changed::changed(()))
    }

    /// Create the user, or change the settings that differ.
    ///
    /// # Errors
    ///
    /// Same as [`CliHmc::create_user`] and [`CliHmc::modify_user`].
    pub async fn ensure_user(&self, user: &UserSpec) -> Result<Changed<Record>, Error<C::Error>> {
        let Some(current) = self.user(&user.name).await? else {
            return Ok(Changed::changed(self.create_user(user).await?));
        };
        let differences = user.differences(&current);
        if differences.is_empty() {
            return Ok(Changed::unchanged(current));
        }
        tracing::debug!(user = %user.name, ?differences, "user settings differ");
        Ok(Changed::changed(
            self.modify_user(&user.name, &differences).await?,
        ))
    }
}
