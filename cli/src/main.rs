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

use clap::Parser;
use hmc_cli::commands::process_command;
use hmc_cli::commands::Commands;
use hmc_cli::commands::Target;
use hmc_cli::commands::DEFAULT_CONFIG;
use hmc_cli::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// HMC automation CLI.
#[derive(Parser, Debug)]
#[command(name = "hmcctl")]
#[command(about = "IBM Hardware Management Console automation", long_about = None)]
struct Cli {
    /// YAML inventory of HMCs.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,
    /// HMC host to operate on, the first of the inventory by default.
    #[arg(long, global = true)]
    hmc: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    init_tracing();

    let target = Target {
        config: &cli.config,
        hmc: cli.hmc.as_deref(),
    };
    for msg in process_command(&cli.command, target).await? {
        println!("{msg}");
    }
    Ok(())
}
