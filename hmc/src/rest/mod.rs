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

//! HMC operations over the REST API.
//!
//! Every request except logon carries the `X-API-Session` token of a
//! [`RestSession`]. Use [`RestHmc::with_session`] so the session is logged
//! off on every path out of the work done with it.

mod job;
mod partition;
mod quick;

pub use job::JobStatus;
pub use job::COMPLETED_OK;
pub use partition::PartitionDetail;
pub use quick::ManagedSystemQuick;
pub use quick::PartitionQuick;

use crate::Error;
use hmc_core::rest::SESSION_HEADER;
use hmc_core::xml;
use hmc_core::HmcCredentials;
use hmc_core::Poller;
use hmc_core::RestClient;
use hmc_core::RestRequest;
use hmc_core::RestResponse;
use std::fmt;
use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const LOGON_PATH: &str = "/rest/api/web/Logon";
const LOGON_REQUEST_TYPE: &str = "application/vnd.ibm.powervm.web+xml; type=LogonRequest";
const LOGON_RESPONSE_TYPE: &str = "application/vnd.ibm.powervm.web+xml; type=LogonResponse";

/// HMC reached through [`RestClient`].
pub struct RestHmc<C> {
    client: Arc<C>,
    credentials: HmcCredentials,
    job_poller: Poller,
}

impl<C> fmt::Debug for RestHmc<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestHmc")
            .field("credentials", &self.credentials)
            .field("job_poller", &self.job_poller)
            .finish_non_exhaustive()
    }
}

impl<C: RestClient> RestHmc<C> {
    #[must_use]
    pub fn new(client: C, credentials: HmcCredentials) -> Self {
        Self {
            client: Arc::new(client),
            credentials,
            job_poller: Poller::job(),
        }
    }

    #[must_use]
    pub const fn with_job_poller(mut self, poller: Poller) -> Self {
        self.job_poller = poller;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Open a session. Prefer [`RestHmc::with_session`], which also closes
    /// it.
    ///
    /// # Errors
    ///
    /// [`Error::Rest`] when the HMC rejects the credentials, transport and
    /// XML failures.
    pub async fn logon(&self) -> Result<RestSession<C>, Error<C::Error>> {
        let request = RestRequest::put(LOGON_PATH, xml::logon_request(&self.credentials))
            .with_header("Content-Type", LOGON_REQUEST_TYPE)
            .with_header("Accept", LOGON_RESPONSE_TYPE);
        let response = self
            .client
            .request(request)
            .await
            .map_err(Error::Transport)?;
        let response = check_status(response)?;
        let token = xml::logon_token(&response.body)?;
        tracing::debug!(user = %self.credentials.username, "logged on");
        Ok(RestSession {
            inner: Arc::new(SessionInner {
                client: Arc::clone(&self.client),
                token,
                logged_off: AtomicBool::new(false),
            }),
            job_poller: self.job_poller,
        })
    }

    /// Log on, run `work` with the session and log off, whatever `work`
    /// returned.
    ///
    /// Logoff needs `work` to return. If `work` panics or the returned
    /// future is dropped before completion, the session is left open on
    /// the HMC until it expires; dropping the last handle only logs a
    /// warning.
    ///
    /// # Errors
    ///
    /// The error of `work` if it failed, otherwise a logon or logoff error.
    /// A logoff failure after a failed `work` is logged.
    pub async fn with_session<T, F, Fut>(&self, work: F) -> Result<T, Error<C::Error>>
    where
        F: FnOnce(RestSession<C>) -> Fut,
        Fut: Future<Output = Result<T, Error<C::Error>>>,
    {
        let session = self.logon().await?;
        let result = work(session.clone()).await;
        let logoff = session.logoff().await;
        match (result, logoff) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), logoff) => {
                if let Err(logoff_err) = logoff {
                    tracing::warn!(error = %logoff_err, "logoff failed");
                }
                Err(err)
            }
        }
    }
}

struct SessionInner<C> {
    client: Arc<C>,
    token: String,
    logged_off: AtomicBool,
}

impl<C> Drop for SessionInner<C> {
    fn drop(&mut self) {
        if !self.logged_off.load(Ordering::Acquire) {
            tracing::warn!("REST session dropped without logoff");
        }
    }
}

/// Logged on REST session. Clones share the token.
pub struct RestSession<C> {
    inner: Arc<SessionInner<C>>,
    job_poller: Poller,
}

impl<C> Clone for RestSession<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            job_poller: self.job_poller,
        }
    }
}

impl<C> fmt::Debug for RestSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestSession")
            .field("token", &"[REDACTED]")
            .field("logged_off", &self.is_logged_off())
            .finish_non_exhaustive()
    }
}

impl<C> RestSession<C> {
    #[must_use]
    pub fn is_logged_off(&self) -> bool {
        self.inner.logged_off.load(Ordering::Acquire)
    }
}

impl<C: RestClient> RestSession<C> {
    /// Send a request with the session token.
    ///
    /// # Errors
    ///
    /// [`Error::Rest`] for an error status, [`Error::Transport`].
    pub async fn request(&self, request: RestRequest) -> Result<RestResponse, Error<C::Error>> {
        let request = request.with_header(SESSION_HEADER, self.inner.token.clone());
        let response = self
            .inner
            .client
            .request(request)
            .await
            .map_err(Error::Transport)?;
        check_status(response)
    }

    /// Release the session on the HMC.
    ///
    /// # Errors
    ///
    /// [`Error::Rest`], [`Error::Transport`].
    pub async fn logoff(&self) -> Result<(), Error<C::Error>> {
        if self.is_logged_off() {
            return Ok(());
        }
        self.request(RestRequest::delete(LOGON_PATH)).await?;
        self.inner.logged_off.store(true, Ordering::Release);
        tracing::debug!("logged off");
        Ok(())
    }
}

fn check_status<E>(response: RestResponse) -> Result<RestResponse, Error<E>> {
    if response.is_success() {
        return Ok(response);
    }
    let message = xml::error_message(&response.body)
        .or_else(|| {
            let body = response.body.trim();
            (!body.is_empty()).then(|| body.chars().take(200).collect())
        })
        .or_else(|| response.status.canonical_reason().map(ToString::to_string))
        .unwrap_or_default();
    Err(Error::Rest {
        status: response.status,
        message,
    })
}
