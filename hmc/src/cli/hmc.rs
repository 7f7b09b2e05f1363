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

//! The HMC itself: version, network settings, reboot, update, upgrade.

use super::CliHmc;
use crate::Changed;
use crate::Error;
use hmc_core::BuildError;
use hmc_core::Command;
use hmc_core::CommandBuilder;
use hmc_core::HmcCli;
use hmc_core::Opt;
use hmc_core::PollStatus;
use hmc_core::Record;
use serde::Serialize;
use std::fmt;

/// Exit status of ssh when the connection drops, as it does while the HMC
/// goes down for a restart.
const SSH_CONNECTION_CLOSED: i32 = 255;

/// Version reported by `lshmc -V`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HmcVersion {
    pub version: String,
    pub release: String,
    pub service_pack: String,
    pub build_level: String,
    /// `V10R1` style base version.
    pub base_version: String,
    /// Installed fixes (`MH01877 - HMC V9R2 M950`).
    pub fixes: Vec<String>,
}

impl HmcVersion {
    /// Parse the output of `lshmc -V`.
    #[must_use]
    pub fn parse(output: &str) -> Self {
        let mut version = Self::default();
        for line in output.lines() {
            let line = line.trim().trim_matches(|c: char| c == '"' || c == ',');
            if let Some((_, value)) = line.split_once("base_version=") {
                version.base_version = clean(value);
            } else if let Some((_, value)) = line.split_once("Version:") {
                version.version = clean(value);
            } else if let Some((_, value)) = line.split_once("Release:") {
                version.release = clean(value);
            } else if let Some((_, value)) = line.split_once("Service Pack:") {
                version.service_pack = clean(value);
            } else if let Some(value) = line.strip_prefix("HMC Build level") {
                version.build_level = clean(value);
            } else if is_fix(line) {
                version.fixes.push(line.to_string());
            }
        }
        version
    }
}

impl fmt::Display for HmcVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (version {} release {} service pack {}, build {})",
            self.base_version, self.version, self.release, self.service_pack, self.build_level
        )
    }
}

fn clean(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c: char| c == '"' || c == ',')
        .trim()
        .to_string()
}

fn is_fix(line: &str) -> bool {
    line.strip_prefix("MH")
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
}

/// Where update and upgrade images are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Image already on the HMC disk.
    Disk,
    Ftp,
    Sftp,
    Nfs,
}

impl SourceKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disk => "disk",
            Self::Ftp => "ftp",
            Self::Sftp => "sftp",
            Self::Nfs => "nfs",
        }
    }
}

/// Location of an update image (`updhmc`) or of the upgrade files
/// (`getupgfiles`).
#[derive(Clone)]
pub struct ImageSource {
    pub kind: SourceKind,
    pub host: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    /// Image file for updates, directory for upgrades.
    pub path: String,
    /// NFS mount location.
    pub mount_location: Option<String>,
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSource")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("path", &self.path)
            .field("mount_location", &self.mount_location)
            .finish()
    }
}

impl ImageSource {
    #[must_use]
    pub fn disk(path: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Disk,
            host: None,
            user: None,
            password: None,
            path: path.into(),
            mount_location: None,
        }
    }

    /// Check that the fields the source kind needs are present.
    ///
    /// # Errors
    ///
    /// Returns a description of the first missing field.
    pub fn validate(&self) -> Result<(), String> {
        let missing = |field: &str| format!("{} source needs {field}", self.kind.as_str());
        if self.path.is_empty() {
            return Err(missing("a path"));
        }
        match self.kind {
            SourceKind::Disk => Ok(()),
            SourceKind::Ftp | SourceKind::Sftp => {
                if self.host.is_none() {
                    Err(missing("a host"))
                } else if self.user.is_none() {
                    Err(missing("a user"))
                } else if self.password.is_none() {
                    Err(missing("a password"))
                } else {
                    Ok(())
                }
            }
            SourceKind::Nfs => {
                if self.host.is_none() {
                    Err(missing("a host"))
                } else if self.mount_location.is_none() {
                    Err(missing("a mount location"))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn apply(&self, mut builder: CommandBuilder, path: Opt) -> Result<CommandBuilder, BuildError> {
        if let Some(host) = &self.host {
            builder = builder.opt(Opt::Host, host)?;
        }
        if let Some(user) = &self.user {
            builder = builder.opt(Opt::User, user)?;
        }
        if let Some(password) = &self.password {
            builder = builder.opt(Opt::Password, password)?;
        }
        if let Some(mount_location) = &self.mount_location {
            builder = builder.opt(Opt::MountLocation, mount_location)?;
        }
        builder.opt(path, &self.path)
    }
}

impl<C: HmcCli> CliHmc<C> {
    /// `lshmc -V`
    ///
    /// # Errors
    ///
    /// Transport and command failures.
    pub async fn version(&self) -> Result<HmcVersion, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lshmc)
            .flag(Opt::Version)?
            .build();
        Ok(HmcVersion::parse(&self.run(&command).await?))
    }

    /// `lshmc -n`: host name, domain, addresses.
    ///
    /// # Errors
    ///
    /// Transport, command and decode failures.
    pub async fn network_config(&self) -> Result<Record, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lshmc)
            .flag(Opt::Network)?
            .build();
        self.query_one(&command, || "HMC network configuration".to_string())
            .await
    }

    /// Restart the HMC and wait until it answers again.
    ///
    /// # Errors
    ///
    /// Command failures and [`Error::Timeout`] if the HMC does not come back.
    pub async fn reboot(&self) -> Result<HmcVersion, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Hmcshutdown)
            .opt(Opt::Type, "now")?
            .flag(Opt::Restart)?
            .build();
        self.run_restarting(&command).await?;
        tracing::info!("HMC restarting");
        self.wait_for_hmc().await
    }

    /// Apply a service pack or fix with `updhmc`. With `restart` the HMC is
    /// restarted and waited for.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an incomplete source, command failures.
    pub async fn update(
        &self,
        source: &ImageSource,
        restart: bool,
    ) -> Result<Changed<HmcVersion>, Error<C::Error>> {
        source.validate().map_err(Error::Validation)?;
        let builder = CommandBuilder::new(Command::Updhmc).opt(Opt::Type, source.kind.as_str())?;
        let mut builder = source.apply(builder, Opt::File)?;
        if restart {
            builder = builder.flag(Opt::Restart)?;
        }
        let command = builder.build();

        let before = self.version().await?;
        let after = if restart {
            self.run_restarting(&command).await?;
            tracing::info!(%before, "HMC updated, restarting");
            self.wait_for_hmc().await?
        } else {
            self.run(&command).await?;
            self.version().await?
        };
        tracing::info!(%after, "HMC update finished");
        Ok(Changed::new(before != after, after))
    }

    /// Upgrade the HMC to a new release: fetch the upgrade files, save the
    /// upgrade data, enable alternate disk boot and restart.
    ///
    /// Nothing is done when `target_base_version` is already installed.
    /// When any step after the file transfer has started fails, alternate
    /// disk boot is disabled again before the error is returned.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for an incomplete or on-disk source, command
    /// failures, [`Error::Timeout`] if the HMC does not come back.
    pub async fn upgrade(
        &self,
        source: &ImageSource,
        target_base_version: Option<&str>,
    ) -> Result<Changed<HmcVersion>, Error<C::Error>> {
        source.validate().map_err(Error::Validation)?;
        if source.kind == SourceKind::Disk {
            return Err(Error::Validation(
                "upgrade files must be fetched from a remote source".to_string(),
            ));
        }
        let fetch = source
            .apply(
                CommandBuilder::new(Command::Getupgfiles).opt(Opt::Resource, source.kind.as_str())?,
                Opt::Directory,
            )?
            .build();

        let before = self.version().await?;
        if target_base_version.is_some_and(|target| target == before.base_version) {
            tracing::info!(%before, "HMC already at target version");
            return Ok(Changed::unchanged(before));
        }

        match self.upgrade_steps(&fetch).await {
            Ok(after) => {
                tracing::info!(%before, %after, "HMC upgraded");
                Ok(Changed::new(before != after, after))
            }
            Err(err) => {
                self.disable_alt_disk_boot().await;
                Err(err)
            }
        }
    }

    async fn upgrade_steps(
        &self,
        fetch: &hmc_core::CommandLine,
    ) -> Result<HmcVersion, Error<C::Error>> {
        self.run(fetch).await?;
        let save = CommandBuilder::new(Command::Saveupgdata)
            .opt(Opt::Resource, "disk")?
            .build();
        self.run(&save).await?;
        let alt_disk_boot = CommandBuilder::new(Command::Chhmc)
            .opt(Opt::Change, "altdiskboot")?
            .opt(Opt::State, "enable")?
            .opt(Opt::Mode, "upgrade")?
            .build();
        self.run(&alt_disk_boot).await?;
        self.reboot().await
    }

    async fn disable_alt_disk_boot(&self) {
        tracing::warn!("upgrade failed, disabling alternate disk boot");
        let cleanup = CommandBuilder::new(Command::Chhmc)
            .opt(Opt::Change, "altdiskboot")
            .and_then(|builder| builder.opt(Opt::State, "disable"))
            .map(CommandBuilder::build);
        let result = match cleanup {
            Ok(command) => self.run(&command).await.map(drop),
            Err(err) => Err(Error::Build(err)),
        };
        if let Err(err) = result {
            tracing::warn!(%err, "cannot disable alternate disk boot");
        }
    }

    /// Run a command that restarts the HMC. The ssh connection may be cut
    /// before the command reports back, which is not a failure.
    async fn run_restarting(&self, command: &hmc_core::CommandLine) -> Result<(), Error<C::Error>> {
        match self.run(command).await {
            Ok(_) => Ok(()),
            Err(Error::Cli(failure)) if failure.exit_code == SSH_CONNECTION_CLOSED => {
                tracing::debug!(%failure, "connection closed by restart");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Wait one interval for the HMC to go down, then until `lshmc -V`
    /// answers.
    async fn wait_for_hmc(&self) -> Result<HmcVersion, Error<C::Error>> {
        let poller = self.polling.hmc_reboot;
        tokio::time::sleep(poller.interval).await;
        let version = poller
            .poll(
                "HMC restart",
                || async { Ok::<_, Error<C::Error>>(self.version().await.ok()) },
                |version| version.map_or(PollStatus::Pending, PollStatus::Done),
            )
            .await?;
        Ok(version)
    }
}
