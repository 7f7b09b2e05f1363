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

//! YAML inventory of HMCs and collection of their partitions.
//!
//! ```yaml
//! hmcs:
//!   - host: hmc01.example.com
//!     user: hscroot
//!     password_env: HMC01_PASSWORD
//!     accept_invalid_certs: true
//! exclude_systems: [Server-9009-42A-SN0000000]
//! exclude_partitions: [vios-test]
//! ```

use crate::rest::RestHmc;
use crate::Error;
use hmc_core::HmcCredentials;
use hmc_core::RestClient;
use serde::Deserialize;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use uuid::Uuid;

const DEFAULT_USER: &str = "hscroot";
const DEFAULT_REST_PORT: u16 = 12443;

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Yaml(serde_yaml::Error),
    NoHosts,
    MissingPassword { host: String },
    MissingEnv { host: String, var: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Yaml(err) => write!(f, "invalid inventory: {err}"),
            Self::NoHosts => write!(f, "inventory lists no HMC"),
            Self::MissingPassword { host } => {
                write!(f, "{host}: neither password nor password_env is set")
            }
            Self::MissingEnv { host, var } => {
                write!(f, "{host}: environment variable {var} is not set")
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Yaml(err) => Some(err),
            _ => None,
        }
    }
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

const fn default_rest_port() -> u16 {
    DEFAULT_REST_PORT
}

/// One HMC of the inventory.
#[derive(Clone, Deserialize, Serialize)]
pub struct HmcHost {
    pub host: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Environment variable holding the password.
    #[serde(default)]
    pub password_env: Option<String>,
    #[serde(default = "default_rest_port")]
    pub rest_port: u16,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl fmt::Debug for HmcHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmcHost")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("password_env", &self.password_env)
            .field("rest_port", &self.rest_port)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

impl HmcHost {
    /// Credentials, the password taken from `password` or from the
    /// environment variable named by `password_env`.
    ///
    /// # Errors
    ///
    /// Returns an error when no password can be found.
    pub fn credentials(&self) -> Result<HmcCredentials, ConfigError> {
        let password = match (&self.password, &self.password_env) {
            (Some(password), _) => password.clone(),
            (None, Some(var)) => std::env::var(var).map_err(|_| ConfigError::MissingEnv {
                host: self.host.clone(),
                var: var.clone(),
            })?,
            (None, None) => {
                return Err(ConfigError::MissingPassword {
                    host: self.host.clone(),
                })
            }
        };
        Ok(HmcCredentials::new(self.user.clone(), password))
    }

    /// Base URL of the REST API.
    #[must_use]
    pub fn rest_endpoint(&self) -> String {
        format!("https://{}:{}", self.host, self.rest_port)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InventoryConfig {
    pub hmcs: Vec<HmcHost>,
    #[serde(default)]
    pub exclude_systems: Vec<String>,
    #[serde(default)]
    pub exclude_partitions: Vec<String>,
}

impl InventoryConfig {
    /// # Errors
    ///
    /// Invalid YAML or an empty HMC list.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text).map_err(ConfigError::Yaml)?;
        if config.hmcs.is_empty() {
            return Err(ConfigError::NoHosts);
        }
        Ok(config)
    }

    /// # Errors
    ///
    /// Unreadable file, see also [`InventoryConfig::from_yaml`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// HMC entry by host name.
    #[must_use]
    pub fn host(&self, host: &str) -> Option<&HmcHost> {
        self.hmcs.iter().find(|hmc| hmc.host == host)
    }

    fn system_excluded(&self, name: &str) -> bool {
        self.exclude_systems.iter().any(|excluded| excluded == name)
    }

    fn partition_excluded(&self, name: &str) -> bool {
        self.exclude_partitions.iter().any(|excluded| excluded == name)
    }
}

/// Partition or VIOS found on an HMC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryEntry {
    pub hmc: String,
    pub system: String,
    pub name: String,
    pub uuid: Uuid,
    pub partition_type: String,
    pub state: String,
}

/// Enumerate the partitions and VIOSes of every managed system of one
/// HMC, in HMC order, skipping excluded systems and partitions.
///
/// # Errors
///
/// Logon, request and decode failures.
pub async fn collect_inventory<C: RestClient>(
    hmc_name: &str,
    hmc: &RestHmc<C>,
    config: &InventoryConfig,
) -> Result<Vec<InventoryEntry>, Error<C::Error>> {
    hmc.with_session(|session| async move {
        let mut entries = Vec::new();
        for system in session.managed_systems_quick().await? {
            if config.system_excluded(&system.name) {
                tracing::debug!(hmc = hmc_name, system = %system.name, "system excluded");
                continue;
            }
            let mut partitions = session.partitions_quick(&system.uuid).await?;
            partitions.extend(session.vioses_quick(&system.uuid).await?);
            entries.extend(
                partitions
                    .into_iter()
                    .filter(|partition| !config.partition_excluded(&partition.name))
                    .map(|partition| InventoryEntry {
                        hmc: hmc_name.to_string(),
                        system: system.name.clone(),
                        name: partition.name,
                        uuid: partition.uuid,
                        partition_type: partition.partition_type,
                        state: partition.state,
                    }),
            );
        }
        tracing::info!(hmc = hmc_name, partitions = entries.len(), "inventory collected");
        Ok(entries)
    })
    .await
}
