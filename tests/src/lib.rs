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

//! This is tests support lib.

/// Errors used in tests.
pub mod error;
/// REST payloads as the HMC sends them.
pub mod rest;

#[doc(inline)]
pub use error::Error;

use error::TestError;
use hmc::CliHmc;
use hmc::Polling;
use hmc::RestHmc;
use hmc_core::HmcCredentials;
use hmc_core::Poller;
use hmc_mock::Cli as MockCli;
use hmc_mock::ExpectCommand as MockExpectCommand;
use hmc_mock::ExpectRequest as MockExpectRequest;
use hmc_mock::Rest as MockRest;
use std::time::Duration;

pub type Cli = MockCli<TestError>;
pub type Rest = MockRest<TestError>;
pub type ExpectCommand = MockExpectCommand<TestError>;
pub type ExpectRequest = MockExpectRequest<TestError>;

/// Poller that does not sleep.
#[must_use]
pub fn instant_poller(attempts: u32) -> Poller {
    Poller::with_attempts(Duration::ZERO, attempts)
}

/// CLI facade over a fresh mock, polling without delay.
#[must_use]
pub fn cli_hmc() -> CliHmc<Cli> {
    CliHmc::new(Cli::new()).with_polling(Polling::uniform(instant_poller(5)))
}

/// REST facade over a fresh mock, polling jobs without delay.
#[must_use]
pub fn rest_hmc(job_attempts: u32) -> RestHmc<Rest> {
    RestHmc::new(
        Rest::new(),
        HmcCredentials::new("hscroot".into(), "abc123".into()),
    )
    .with_job_poller(instant_poller(job_attempts))
}
