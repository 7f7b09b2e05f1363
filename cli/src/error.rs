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

use hmc::inventory::ConfigError;
use hmc_core::DecodeError;
use hmc_transport::reqwest::TransportError;
use hmc_transport::ssh::SshError;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::io::Error as IoError;

/// `hmcctl` errors.
#[derive(Debug)]
pub enum Error {
    Config(ConfigError),
    UnknownHmc(String),
    InvalidEndpoint(String, url::ParseError),
    Io(String, IoError),
    Decode(DecodeError),
    HttpClient(TransportError),
    Cli(hmc::Error<SshError>),
    Rest(hmc::Error<TransportError>),
    Output(serde_json::Error),
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<hmc::Error<SshError>> for Error {
    fn from(value: hmc::Error<SshError>) -> Self {
        Self::Cli(value)
    }
}

impl From<hmc::Error<TransportError>> for Error {
    fn from(value: hmc::Error<TransportError>) -> Self {
        Self::Rest(value)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Config(error) => write!(f, "configuration error: {error}"),
            Self::UnknownHmc(host) => write!(f, "HMC {host} is not in the inventory"),
            Self::InvalidEndpoint(endpoint, error) => {
                write!(f, "invalid REST endpoint {endpoint}: {error}")
            }
            Self::Io(fname, error) => write!(f, "input/output error: {fname}: {error}"),
            Self::Decode(error) => write!(f, "decode error: {error}"),
            Self::HttpClient(error) => write!(f, "cannot create HTTP client: {error}"),
            Self::Cli(error) => error.fmt(f),
            Self::Rest(error) => error.fmt(f),
            Self::Output(error) => write!(f, "cannot render output: {error}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Config(error) => Some(error),
            Self::InvalidEndpoint(_, error) => Some(error),
            Self::Io(_, error) => Some(error),
            Self::Decode(error) => Some(error),
            Self::HttpClient(error) => Some(error),
            Self::Cli(error) => Some(error),
            Self::Rest(error) => Some(error),
            Self::Output(error) => Some(error),
            Self::UnknownHmc(_) => None,
        }
    }
}
