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

//! Bounded polling
//!
//! Every wait on the HMC (system and partition state transitions, the HMC
//! coming back after a reboot, REST jobs) is a fixed number of probes
//! separated by a fixed interval. There is no backoff.

use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::future::Future;
use std::time::Duration;

/// Default interval between two probes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Outcome of one probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    /// Not there yet, probe again.
    Pending,
    Done(T),
    /// Terminal failure, stop polling.
    Failed(String),
}

#[derive(Debug)]
pub enum PollError<E> {
    /// Probe itself failed.
    Probe(E),
    Failed { what: String, reason: String },
    Timeout { what: String, attempts: u32 },
}

impl<E: Display> Display for PollError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Probe(err) => write!(f, "{err}"),
            Self::Failed { what, reason } => write!(f, "{what} failed: {reason}"),
            Self::Timeout { what, attempts } => {
                write!(f, "timed out waiting for {what} after {attempts} attempts")
            }
        }
    }
}

impl<E: StdError + 'static> StdError for PollError<E> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Probe(err) => Some(err),
            _ => None,
        }
    }
}

/// Fixed-interval, fixed-attempt polling policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poller {
    pub interval: Duration,
    pub attempts: u32,
}

impl Poller {
    /// Poll every `interval` for at most `timeout` (`timeout / interval`
    /// attempts, at least one).
    #[must_use]
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        let attempts = if interval.is_zero() {
            1
        } else {
            u32::try_from(timeout.as_millis() / interval.as_millis().max(1)).unwrap_or(u32::MAX)
        };
        Self::with_attempts(interval, attempts)
    }

    #[must_use]
    pub fn with_attempts(interval: Duration, attempts: u32) -> Self {
        Self {
            interval,
            attempts: attempts.max(1),
        }
    }

    /// Managed system power state transitions.
    #[must_use]
    pub fn system_state() -> Self {
        Self::new(DEFAULT_INTERVAL, Duration::from_secs(10 * 60))
    }

    /// Partition activation and shutdown.
    #[must_use]
    pub fn partition_state() -> Self {
        Self::new(DEFAULT_INTERVAL, Duration::from_secs(10 * 60))
    }

    /// HMC reboot.
    #[must_use]
    pub fn hmc_reboot() -> Self {
        Self::new(DEFAULT_INTERVAL, Duration::from_secs(20 * 60))
    }

    /// REST jobs.
    #[must_use]
    pub fn job() -> Self {
        Self::new(DEFAULT_INTERVAL, Duration::from_secs(60 * 60))
    }

    /// Probe until `classify` reports a terminal status or attempts run out.
    ///
    /// `what` names the polled object in logs and in the timeout error.
    ///
    /// # Errors
    ///
    /// Probe errors are returned immediately as [`PollError::Probe`].
    /// [`PollStatus::Failed`] becomes [`PollError::Failed`]; exhausting all
    /// attempts is [`PollError::Timeout`].
    pub async fn poll<R, T, E, P, F, C>(
        &self,
        what: &str,
        mut probe: P,
        mut classify: C,
    ) -> Result<T, PollError<E>>
    where
        P: FnMut() -> F,
        F: Future<Output = Result<R, E>>,
        C: FnMut(R) -> PollStatus<T>,
    {
        for attempt in 1..=self.attempts {
            let observed = probe().await.map_err(PollError::Probe)?;
            match classify(observed) {
                PollStatus::Done(value) => {
                    tracing::debug!(what, attempt, "poll finished");
                    return Ok(value);
                }
                PollStatus::Failed(reason) => {
                    return Err(PollError::Failed {
                        what: what.to_string(),
                        reason,
                    });
                }
                PollStatus::Pending => {
                    tracing::debug!(what, attempt, attempts = self.attempts, "still pending");
                    if attempt < self.attempts {
                        tokio::time::sleep(self.interval).await;
                    }
                }
            }
        }
        Err(PollError::Timeout {
            what: what.to_string(),
            attempts: self.attempts,
        })
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::partition_state()
    }
}
