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

use super::CliHmc;
use crate::Error;
use hmc_core::Command;
use hmc_core::CommandBuilder;
use hmc_core::HmcCli;
use hmc_core::Opt;
use hmc_core::Record;

/// Component whose ciphers `lshmcencr` lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionComponent {
    WebUi,
    Ssh,
    SshMac,
    SshKex,
    /// Password hashing.
    Password,
}

impl EncryptionComponent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WebUi => "webui",
            Self::Ssh => "ssh",
            Self::SshMac => "sshmac",
            Self::SshKex => "sshkex",
            Self::Password => "passwd",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionListing {
    Current,
    Available,
}

impl EncryptionListing {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Current => "c",
            Self::Available => "a",
        }
    }
}

impl<C: HmcCli> CliHmc<C> {
    /// `lshmcencr -c <component> -t c|a`
    ///
    /// # Errors
    ///
    /// Transport, command and decode failures.
    pub async fn encryption_config(
        &self,
        component: EncryptionComponent,
        listing: EncryptionListing,
    ) -> Result<Vec<Record>, Error<C::Error>> {
        let command = CommandBuilder::new(Command::Lshmcencr)
            .opt(Opt::Component, component.as_str())?
            .opt(Opt::Type, listing.as_str())?
            .build();
        self.query(&command).await
    }
}
