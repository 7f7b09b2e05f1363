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

//! Transport mocks with expectation queues.
//!
//! Each mock pops the next expectation for every call and fails with a
//! descriptive [`Error`] when the call does not match it. Tests queue the
//! exact conversation they expect and check [`Cli::remaining`] /
//! [`Rest::remaining`] at the end.

pub mod expect;

#[doc(inline)]
pub use expect::ExpectCommand;
#[doc(inline)]
pub use expect::ExpectRequest;
pub use expect::ExpectedCommand;
pub use expect::ExpectedRequest;

use hmc_core::CliOutput;
use hmc_core::HmcCli;
use hmc_core::RestClient;
use hmc_core::RestRequest;
use hmc_core::RestResponse;
use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::sync::Mutex;
use std::sync::PoisonError;

#[derive(Debug)]
pub enum Error {
    ErrorResponse(Box<dyn StdError + Send + Sync>),
    MutexLock(String),
    NothingIsExpected,
    UnexpectedCommand(String, ExpectedCommand),
    UnexpectedRequest(String, ExpectedRequest),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::ErrorResponse(err) => write!(f, "response: {err}"),
            Self::MutexLock(err) => write!(f, "lock error: {err}"),
            Self::NothingIsExpected => {
                write!(f, "nothing is expected to happen but something happened")
            }
            Self::UnexpectedCommand(command, expected) => {
                write!(f, "unexpected command: {command}; expected: {expected:?}")
            }
            Self::UnexpectedRequest(request, expected) => {
                write!(f, "unexpected request: {request}; expected: {expected:?}")
            }
        }
    }
}

impl StdError for Error {}

impl Error {
    pub fn mutex_lock<T>(err: PoisonError<T>) -> Self {
        Self::MutexLock(err.to_string())
    }
}

/// Mock of [`HmcCli`].
#[derive(Debug)]
pub struct Cli<E> {
    expect: Mutex<VecDeque<ExpectCommand<E>>>,
    executed: Mutex<Vec<String>>,
}

impl<E> Default for Cli<E> {
    fn default() -> Self {
        Self {
            expect: Mutex::new(VecDeque::new()),
            executed: Mutex::new(Vec::new()),
        }
    }
}

impl<E> Cli<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an expectation.
    pub fn expect(&self, exp: ExpectCommand<E>) {
        self.expect.lock().expect("not poisoned").push_back(exp);
    }

    /// Number of expectations not consumed yet.
    pub fn remaining(&self) -> usize {
        self.expect.lock().expect("not poisoned").len()
    }

    /// Every command executed so far, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().expect("not poisoned").clone()
    }
}

impl<E> HmcCli for Cli<E>
where
    E: StdError + Send + Sync + 'static,
{
    type Error = Error;

    async fn execute(&self, command: &str) -> Result<CliOutput, Self::Error> {
        self.executed
            .lock()
            .map_err(Error::mutex_lock)?
            .push(command.to_string());
        let expect = self
            .expect
            .lock()
            .map_err(Error::mutex_lock)?
            .pop_front()
            .ok_or(Error::NothingIsExpected)?;
        if !expect.command.matches(command) {
            return Err(Error::UnexpectedCommand(command.to_string(), expect.command));
        }
        expect
            .response
            .map_err(|err| Error::ErrorResponse(Box::new(err)))
    }
}

/// Mock of [`RestClient`].
#[derive(Debug)]
pub struct Rest<E> {
    expect: Mutex<VecDeque<ExpectRequest<E>>>,
    received: Mutex<Vec<RestRequest>>,
}

impl<E> Default for Rest<E> {
    fn default() -> Self {
        Self {
            expect: Mutex::new(VecDeque::new()),
            received: Mutex::new(Vec::new()),
        }
    }
}

impl<E> Rest<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an expectation.
    pub fn expect(&self, exp: ExpectRequest<E>) {
        self.expect.lock().expect("not poisoned").push_back(exp);
    }

    /// Number of expectations not consumed yet.
    pub fn remaining(&self) -> usize {
        self.expect.lock().expect("not poisoned").len()
    }

    /// Every request received so far, in order.
    pub fn received(&self) -> Vec<RestRequest> {
        self.received.lock().expect("not poisoned").clone()
    }

    pub fn debug_expect(&self) {
        let expect = self.expect.lock().expect("not poisoned");
        println!("Expectations (total: {})", expect.len());
        for v in expect.iter() {
            println!("{:#?}", v.request);
        }
    }
}

impl<E> RestClient for Rest<E>
where
    E: StdError + Send + Sync + 'static,
{
    type Error = Error;

    async fn request(&self, request: RestRequest) -> Result<RestResponse, Self::Error> {
        self.received
            .lock()
            .map_err(Error::mutex_lock)?
            .push(request.clone());
        let expect = self
            .expect
            .lock()
            .map_err(Error::mutex_lock)?
            .pop_front()
            .ok_or(Error::NothingIsExpected)?;
        let body = request.body.as_deref().unwrap_or_default();
        let matched = expect.request.method == request.method
            && expect.request.path == request.path
            && expect
                .request
                .body_contains
                .iter()
                .all(|needle| body.contains(needle.as_str()));
        if !matched {
            return Err(Error::UnexpectedRequest(
                format!("{} {} {body}", request.method, request.path),
                expect.request,
            ));
        }
        expect
            .response
            .map_err(|err| Error::ErrorResponse(Box::new(err)))
    }
}
