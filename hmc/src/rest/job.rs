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

//! REST jobs.
//!
//! A job is started with `PUT .../do/<operation>` and then followed with
//! `GET /rest/api/uom/jobs/<id>` until it leaves `RUNNING`. Any other status is terminal.

use super::RestSession;
use crate::Error;
use hmc_core::xml;
use hmc_core::xml::Text;
use hmc_core::PollStatus;
use hmc_core::RestClient;
use hmc_core::RestRequest;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

pub const COMPLETED_OK: &str = "COMPLETED_OK";
const RUNNING: &str = "RUNNING";

const JOB_REQUEST_TYPE: &str = "application/vnd.ibm.powervm.web+xml; type=JobRequest";
const JOB_RESPONSE_TYPE: &str = "application/atom+xml, application/vnd.ibm.powervm.web+xml; type=JobResponse";

/// Result parameter carrying the failure text of a job.
const EXCEPTION_TEXT: &str = "ExceptionText";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub id: String,
    pub status: String,
    pub message: String,
    /// Result parameters, name and value.
    pub results: Vec<(String, String)>,
}

impl JobStatus {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == RUNNING
    }

    #[must_use]
    pub fn is_completed_ok(&self) -> bool {
        self.status == COMPLETED_OK
    }

    #[must_use]
    pub fn result(&self, name: &str) -> Option<&str> {
        self.results
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Parse a `JobResponse` document.
    ///
    /// # Errors
    ///
    /// [`xml::XmlError`] for anything but a job response with an id.
    pub fn parse(body: &str) -> Result<Self, xml::XmlError> {
        let de: DeJobResponse = xml::parse(body)?;
        let id = de.id.as_str().to_string();
        if id.is_empty() {
            return Err(xml::XmlError::MissingElement("JobID"));
        }
        let results: Vec<(String, String)> = de
            .results
            .parameters
            .into_iter()
            .map(|p| (p.name.as_str().to_string(), p.value.as_str().to_string()))
            .collect();
        let message = de
            .exception
            .and_then(|e| e.message)
            .map(|m| m.as_str().to_string())
            .filter(|m| !m.is_empty())
            .or_else(|| {
                results
                    .iter()
                    .find(|(name, _)| name == EXCEPTION_TEXT)
                    .map(|(_, value)| value.clone())
            })
            .unwrap_or_default();
        Ok(Self {
            id,
            status: de.status.as_str().to_string(),
            message,
            results,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DeJobResponse {
    #[serde(rename = "JobID", default)]
    id: Text,
    #[serde(rename = "Status", default)]
    status: Text,
    #[serde(rename = "Results", default)]
    results: DeResults,
    #[serde(rename = "ResponseException")]
    exception: Option<DeException>,
}

#[derive(Debug, Default, Deserialize)]
struct DeResults {
    #[serde(rename = "JobParameter", default)]
    parameters: Vec<DeJobParameter>,
}

#[derive(Debug, Deserialize)]
struct DeJobParameter {
    #[serde(rename = "ParameterName", default)]
    name: Text,
    #[serde(rename = "ParameterValue", default)]
    value: Text,
}

#[derive(Debug, Deserialize)]
struct DeException {
    #[serde(rename = "Message")]
    message: Option<Text>,
}

impl<C: RestClient> RestSession<C> {
    /// Start a job on a resource (`PUT /rest/api/uom/<resource>/<uuid>/do/<operation>`).
    ///
    /// # Errors
    ///
    /// Request failures and [`Error::Xml`].
    pub async fn run_job(
        &self,
        resource: &str,
        uuid: &Uuid,
        operation: &str,
        group: &str,
        parameters: &[(&str, &str)],
    ) -> Result<JobStatus, Error<C::Error>> {
        let request = RestRequest::put(
            format!("/rest/api/uom/{resource}/{uuid}/do/{operation}"),
            xml::job_request(operation, group, parameters),
        )
        .with_header("Content-Type", JOB_REQUEST_TYPE)
        .with_header("Accept", JOB_RESPONSE_TYPE);
        let response = self.request(request).await?;
        let job = JobStatus::parse(&response.body)?;
        tracing::info!(job = %job.id, operation, %uuid, "job started");
        Ok(job)
    }

    /// # Errors
    ///
    /// Request failures and [`Error::Xml`].
    pub async fn job_status(&self, id: &str) -> Result<JobStatus, Error<C::Error>> {
        let response = self
            .request(
                RestRequest::get(format!("/rest/api/uom/jobs/{id}"))
                    .with_header("Accept", JOB_RESPONSE_TYPE),
            )
            .await?;
        Ok(JobStatus::parse(&response.body)?)
    }

    /// Poll a job until it is no longer running.
    ///
    /// # Errors
    ///
    /// [`Error::Job`] when it ends in any status but `COMPLETED_OK`,
    /// [`Error::Timeout`] naming the job, request failures.
    pub async fn wait_for_job(&self, id: &str) -> Result<JobStatus, Error<C::Error>> {
        let job = self
            .job_poller
            .poll(
                &format!("job {id}"),
                || self.job_status(id),
                |job| {
                    if job.is_running() {
                        PollStatus::Pending
                    } else {
                        PollStatus::Done(job)
                    }
                },
            )
            .await?;
        if job.is_completed_ok() {
            tracing::info!(job = id, "job completed");
            Ok(job)
        } else {
            Err(Error::Job {
                id: job.id,
                status: job.status,
                message: job.message,
            })
        }
    }

    /// Live partition mobility: move a partition to `target_system`.
    ///
    /// # Errors
    ///
    /// Same as [`RestSession::wait_for_job`].
    pub async fn migrate_partition(
        &self,
        partition: &Uuid,
        target_system: &str,
        parameters: &[(&str, &str)],
    ) -> Result<JobStatus, Error<C::Error>> {
        self.migration_job("MigrateLogicalPartition", partition, target_system, parameters)
            .await
    }

    /// Check that a partition can be moved to `target_system`.
    ///
    /// # Errors
    ///
    /// Same as [`RestSession::wait_for_job`].
    pub async fn validate_migration(
        &self,
        partition: &Uuid,
        target_system: &str,
        parameters: &[(&str, &str)],
    ) -> Result<JobStatus, Error<C::Error>> {
        self.migration_job("MigrateValidate", partition, target_system, parameters)
            .await
    }

    async fn migration_job(
        &self,
        operation: &str,
        partition: &Uuid,
        target_system: &str,
        parameters: &[(&str, &str)],
    ) -> Result<JobStatus, Error<C::Error>> {
        if target_system.is_empty() {
            return Err(Error::Validation("migration needs a target system".to_string()));
        }
        let mut all = vec![("TargetManagedSystemName", target_system)];
        all.extend_from_slice(parameters);
        let job = self
            .run_job("LogicalPartition", partition, operation, "LogicalPartition", &all)
            .await?;
        self.wait_for_job(&job.id).await
    }
}
