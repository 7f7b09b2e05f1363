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

//! `hmcctl` subcommands
//!
//! Every subcommand except `decode` talks to one HMC of the inventory
//! file (`--hmc`, the first listed by default). CLI operations run over
//! SSH, `inventory` and `migrate` use the REST API. Results are printed
//! as pretty JSON.

use crate::Error;
use clap::Subcommand;
use clap::ValueEnum;
use hmc::cli::EncryptionComponent;
use hmc::cli::EncryptionListing;
use hmc::collect_inventory;
use hmc::inventory::ConfigError;
use hmc::inventory::HmcHost;
use hmc::CliHmc;
use hmc::InventoryConfig;
use hmc::RestHmc;
use hmc_core::decode_output;
use hmc_core::DecodeMode;
use hmc_core::Record;
use hmc_transport::reqwest::Client;
use hmc_transport::reqwest::ClientParams;
use hmc_transport::reqwest::TransportError;
use hmc_transport::ssh::SshCli;
use serde::Serialize;
use std::fs::read_to_string;
use std::io::Read as _;
use std::path::Path;
use std::path::PathBuf;
use url::Url;

/// Default inventory file.
pub const DEFAULT_CONFIG: &str = "hmc.yaml";

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Component {
    Webui,
    Ssh,
    Sshmac,
    Sshkex,
    Passwd,
}

impl From<Component> for EncryptionComponent {
    fn from(value: Component) -> Self {
        match value {
            Component::Webui => Self::WebUi,
            Component::Ssh => Self::Ssh,
            Component::Sshmac => Self::SshMac,
            Component::Sshkex => Self::SshKex,
            Component::Passwd => Self::Password,
        }
    }
}

/// `hmcctl` high-level commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode HMC CLI output (file or stdin) into JSON records.
    Decode {
        /// Attribute names of `-F` output. Free-form `KEY=VALUE` output
        /// is expected when empty.
        #[arg(short = 'F', long, value_delimiter = ',')]
        fields: Vec<String>,
        /// Input file, stdin when absent.
        input: Option<PathBuf>,
    },
    /// Show the HMC version (`lshmc -V`).
    HmcVersion,
    /// Show the HMC network configuration (`lshmc -n`).
    Network,
    /// Reboot the HMC and wait until it answers again.
    Reboot,
    /// List managed systems.
    Systems,
    /// Power a managed system on or off and wait for the new state.
    Power {
        system: String,
        #[arg(value_enum)]
        state: PowerState,
        /// Immediate power off.
        #[arg(long)]
        immediate: bool,
    },
    /// List the partitions of a managed system.
    Partitions { system: String },
    /// Activate a partition and wait until it is running.
    Activate {
        system: String,
        partition: String,
        /// Profile to activate with, current profile by default.
        #[arg(short, long)]
        profile: Option<String>,
    },
    /// Shut a partition down and wait until it is not activated.
    Shutdown {
        system: String,
        partition: String,
        #[arg(long)]
        immediate: bool,
    },
    /// List HMC users.
    Users,
    /// List password policies and the policy status.
    PasswordPolicies,
    /// Show current or available encryption settings.
    Encryption {
        #[arg(value_enum)]
        component: Component,
        /// List the available settings instead of the current ones.
        #[arg(long)]
        available: bool,
    },
    /// Partitions and VIOSes of every HMC of the inventory (REST).
    Inventory,
    /// Live partition mobility (REST).
    Migrate {
        system: String,
        partition: String,
        /// Destination managed system.
        target: String,
        /// Only validate the migration.
        #[arg(long)]
        validate_only: bool,
    },
}

/// HMC selected on the command line.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    /// Inventory file.
    pub config: &'a Path,
    /// HMC host of the inventory, the first one when absent.
    pub hmc: Option<&'a str>,
}

impl Target<'_> {
    fn inventory(&self) -> Result<InventoryConfig, Error> {
        Ok(InventoryConfig::load(self.config)?)
    }

    fn host(&self) -> Result<HmcHost, Error> {
        let mut config = self.inventory()?;
        match self.hmc {
            Some(name) => config
                .host(name)
                .cloned()
                .ok_or_else(|| Error::UnknownHmc(name.to_string())),
            None if config.hmcs.is_empty() => Err(Error::Config(ConfigError::NoHosts)),
            None => Ok(config.hmcs.swap_remove(0)),
        }
    }

    fn cli(&self) -> Result<CliHmc<SshCli>, Error> {
        let host = self.host()?;
        Ok(CliHmc::new(SshCli::new(host.host.clone(), host.credentials()?)))
    }
}

#[derive(Serialize)]
struct PasswordPolicies {
    policies: Vec<Record>,
    status: Record,
}

/// Process a `hmcctl` command.
///
/// # Errors
///
/// Returns an error if the inventory cannot be read or the operation fails.
pub async fn process_command(command: &Commands, target: Target<'_>) -> Result<Vec<String>, Error> {
    let output = match command {
        Commands::Decode { fields, input } => decode(fields, input.as_deref())?,
        Commands::Inventory => {
            let config = target.inventory()?;
            let mut entries = Vec::new();
            for host in &config.hmcs {
                let rest = rest_hmc(host)?;
                entries.extend(collect_inventory(&host.host, &rest, &config).await?);
            }
            json(&entries)?
        }
        Commands::Migrate {
            system,
            partition,
            target: destination,
            validate_only,
        } => {
            let job = rest_hmc(&target.host()?)?
                .with_session(|session| async move {
                    let system = session.managed_system_by_name(system).await?;
                    let partition = session.partition_by_name(&system.uuid, partition).await?;
                    if *validate_only {
                        session
                            .validate_migration(&partition.uuid, destination, &[])
                            .await
                    } else {
                        session
                            .migrate_partition(&partition.uuid, destination, &[])
                            .await
                    }
                })
                .await?;
            json(&job)?
        }
        Commands::HmcVersion => json(&target.cli()?.version().await?)?,
        Commands::Network => json(&target.cli()?.network_config().await?)?,
        Commands::Reboot => json(&target.cli()?.reboot().await?)?,
        Commands::Systems => json(&target.cli()?.managed_systems().await?)?,
        Commands::Power {
            system,
            state,
            immediate,
        } => {
            let hmc = target.cli()?;
            let changed = match state {
                PowerState::On => hmc.power_on_system(system).await?,
                PowerState::Off => hmc.power_off_system(system, *immediate).await?,
            };
            json(&changed)?
        }
        Commands::Partitions { system } => json(&target.cli()?.partitions(system).await?)?,
        Commands::Activate {
            system,
            partition,
            profile,
        } => json(
            &target
                .cli()?
                .activate_partition(system, partition, profile.as_deref())
                .await?,
        )?,
        Commands::Shutdown {
            system,
            partition,
            immediate,
        } => json(
            &target
                .cli()?
                .shutdown_partition(system, partition, *immediate)
                .await?,
        )?,
        Commands::Users => json(&target.cli()?.users().await?)?,
        Commands::PasswordPolicies => {
            let hmc = target.cli()?;
            json(&PasswordPolicies {
                policies: hmc.password_policies().await?,
                status: hmc.password_policy_status().await?,
            })?
        }
        Commands::Encryption {
            component,
            available,
        } => {
            let listing = if *available {
                EncryptionListing::Available
            } else {
                EncryptionListing::Current
            };
            json(
                &target
                    .cli()?
                    .encryption_config((*component).into(), listing)
                    .await?,
            )?
        }
    };
    Ok(vec![output])
}

fn decode(fields: &[String], input: Option<&Path>) -> Result<String, Error> {
    let text = match input {
        Some(path) => {
            read_to_string(path).map_err(|err| Error::Io(path.display().to_string(), err))?
        }
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| Error::Io("<stdin>".to_string(), err))?;
            text
        }
    };
    let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
    let mode = if fields.is_empty() {
        DecodeMode::FreeForm
    } else {
        DecodeMode::Positional(&fields)
    };
    let records = decode_output(&text, mode).map_err(Error::Decode)?;
    json(&records)
}

fn rest_hmc(host: &HmcHost) -> Result<RestHmc<Client>, Error> {
    let endpoint = host.rest_endpoint();
    let url = Url::parse(&endpoint).map_err(|err| Error::InvalidEndpoint(endpoint, err))?;
    let params = ClientParams::new().accept_invalid_certs(host.accept_invalid_certs);
    let client = Client::with_params(url, params)
        .map_err(|err| Error::HttpClient(TransportError::from(err)))?;
    Ok(RestHmc::new(client, host.credentials()?))
}

fn json<T: Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string_pretty(value).map_err(Error::Output)
}
