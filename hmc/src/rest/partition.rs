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

use super::RestSession;
use crate::Error;
use hmc_core::xml;
use hmc_core::xml::Text;
use hmc_core::RestClient;
use hmc_core::RestRequest;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Partition attributes from the full `LogicalPartition` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PartitionDetail {
    pub name: String,
    pub id: String,
    pub uuid: String,
    pub state: String,
    pub partition_type: String,
    pub os_version: String,
    pub rmc_state: String,
    /// MB
    pub current_memory: String,
    /// MB
    pub desired_memory: String,
}

#[derive(Debug, Deserialize)]
struct DeEntry {
    content: DeContent,
}

#[derive(Debug, Deserialize)]
struct DeContent {
    #[serde(rename = "LogicalPartition")]
    partition: DeLogicalPartition,
}

#[derive(Debug, Default, Deserialize)]
struct DeLogicalPartition {
    #[serde(rename = "PartitionName", default)]
    name: Text,
    #[serde(rename = "PartitionID", default)]
    id: Text,
    #[serde(rename = "PartitionUUID", default)]
    uuid: Text,
    #[serde(rename = "PartitionState", default)]
    state: Text,
    #[serde(rename = "PartitionType", default)]
    partition_type: Text,
    #[serde(rename = "OperatingSystemVersion", default)]
    os_version: Text,
    #[serde(rename = "ResourceMonitoringControlState", default)]
    rmc_state: Text,
    #[serde(rename = "PartitionMemoryConfiguration", default)]
    memory: DeMemory,
}

#[derive(Debug, Default, Deserialize)]
struct DeMemory {
    #[serde(rename = "CurrentMemory", default)]
    current: Text,
    #[serde(rename = "DesiredMemory", default)]
    desired: Text,
}

impl From<DeLogicalPartition> for PartitionDetail {
    fn from(de: DeLogicalPartition) -> Self {
        Self {
            name: de.name.as_str().to_string(),
            id: de.id.as_str().to_string(),
            uuid: de.uuid.as_str().to_string(),
            state: de.state.as_str().to_string(),
            partition_type: de.partition_type.as_str().to_string(),
            os_version: de.os_version.as_str().to_string(),
            rmc_state: de.rmc_state.as_str().to_string(),
            current_memory: de.memory.current.as_str().to_string(),
            desired_memory: de.memory.desired.as_str().to_string(),
        }
    }
}

impl PartitionDetail {
    /// Parse an Atom entry wrapping a `LogicalPartition`, or a bare
    /// `LogicalPartition` document.
    ///
    /// # Errors
    ///
    /// [`xml::XmlError`] if the document is neither.
    pub fn parse(body: &str) -> Result<Self, xml::XmlError> {
        let partition = match xml::parse::<DeEntry>(body) {
            Ok(entry) => entry.content.partition,
            Err(_) => xml::parse::<DeLogicalPartition>(body)?,
        };
        if partition.name.as_str().is_empty() {
            return Err(xml::XmlError::MissingElement("PartitionName"));
        }
        Ok(partition.into())
    }
}

impl<C: RestClient> RestSession<C> {
    /// Full partition document (`GET /rest/api/uom/LogicalPartition/<uuid>`).
    ///
    /// # Errors
    ///
    /// Request failures and [`Error::Xml`].
    pub async fn partition_advanced(
        &self,
        partition: &Uuid,
    ) -> Result<PartitionDetail, Error<C::Error>> {
        let response = self
            .request(
                RestRequest::get(format!("/rest/api/uom/LogicalPartition/{partition}"))
                    .with_header("Accept", "application/atom+xml; charset=UTF-8"),
            )
            .await?;
        Ok(PartitionDetail::parse(&response.body)?)
    }
}
