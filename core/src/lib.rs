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

//! Building blocks of HMC automation.
//!
//! - [`cli_output`]: decoder of the tabular text printed by HMC CLI
//!   commands, in positional (`-F a,b,c`) and free-form (`k=v,k=v`) modes.
//! - [`command`]: table driven command line builder.
//! - [`xml`]: REST payload templates and namespace-agnostic response
//!   decoding.
//! - [`poll`]: bounded fixed-interval polling.
//! - [`HmcCli`] and [`RestClient`]: transport traits implemented by
//!   `hmc-transport` and `hmc-mock`.

pub mod cli;
pub mod cli_output;
pub mod command;
pub mod credentials;
pub mod poll;
pub mod record;
pub mod rest;
pub mod xml;

#[doc(inline)]
pub use cli::CliErrorKind;
#[doc(inline)]
pub use cli::CliFailure;
#[doc(inline)]
pub use cli::CliOutput;
#[doc(inline)]
pub use cli::HmcCli;
#[doc(inline)]
pub use cli_output::decode_line;
#[doc(inline)]
pub use cli_output::decode_output;
#[doc(inline)]
pub use cli_output::decode_positional;
#[doc(inline)]
pub use cli_output::DecodeError;
#[doc(inline)]
pub use cli_output::DecodeMode;
#[doc(inline)]
pub use command::BuildError;
#[doc(inline)]
pub use command::Command;
#[doc(inline)]
pub use command::CommandBuilder;
#[doc(inline)]
pub use command::CommandLine;
#[doc(inline)]
pub use command::Opt;
#[doc(inline)]
pub use credentials::HmcCredentials;
#[doc(inline)]
pub use poll::PollError;
#[doc(inline)]
pub use poll::PollStatus;
#[doc(inline)]
pub use poll::Poller;
#[doc(inline)]
pub use record::FieldValue;
#[doc(inline)]
pub use record::Record;
#[doc(inline)]
pub use rest::RestClient;
#[doc(inline)]
pub use rest::RestRequest;
#[doc(inline)]
pub use rest::RestResponse;
#[doc(inline)]
pub use xml::XmlError;
