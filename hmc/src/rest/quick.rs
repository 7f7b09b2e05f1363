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

//! "Quick" JSON listings of managed systems and partitions.

use super::RestSession;
use crate::Error;
use hmc_core::RestClient;
use hmc_core::RestRequest;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value as JsonValue;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ManagedSystemQuick {
    #[serde(rename = "UUID")]
    pub uuid: Uuid,
    #[serde(rename = "SystemName")]
    pub name: String,
    #[serde(rename = "State", default)]
    pub state: String,
    #[serde(rename = "MachineType", default)]
    pub machine_type: Option<String>,
    #[serde(rename = "Model", default)]
    pub model: Option<String>,
    #[serde(rename = "SerialNumber", default)]
    pub serial_number: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, JsonValue>,
}

/// Logical partition or Virtual I/O Server.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PartitionQuick {
    #[serde(rename = "UUID")]
    pub uuid: Uuid,
    #[serde(rename = "PartitionName")]
    pub name: String,
    #[serde(rename = "PartitionID", default)]
    pub id: Option<u32>,
    #[serde(rename = "PartitionState", default)]
    pub state: String,
    #[serde(rename = "PartitionType", default)]
    pub partition_type: String,
    #[serde(flatten)]
    pub other: Map<String, JsonValue>,
}

impl<C: RestClient> RestSession<C> {
    /// # Errors
    ///
    /// Request failures and [`Error::Json`].
    pub async fn managed_systems_quick(&self) -> Result<Vec<ManagedSystemQuick>, Error<C::Error>> {
        self.quick("/rest/api/uom/ManagedSystem/quick/All").await
    }

    /// # Errors
    ///
    /// [`Error::NotFound`] when no managed system has this name.
    pub async fn managed_system_by_name(
        &self,
        name: &str,
    ) -> Result<ManagedSystemQuick, Error<C::Error>> {
        self.managed_systems_quick()
            .await?
            .into_iter()
            .find(|system| system.name == name)
            .ok_or_else(|| Error::NotFound(format!("managed system {name}")))
    }

    /// Logical partitions (without VIOS) of a managed system.
    ///
    /// # Errors
    ///
    /// Request failures and [`Error::Json`].
    pub async fn partitions_quick(
        &self,
        system: &Uuid,
    ) -> Result<Vec<PartitionQuick>, Error<C::Error>> {
        self.quick(&format!(
            "/rest/api/uom/ManagedSystem/{system}/LogicalPartition/quick/All"
        ))
        .await
    }

    /// Virtual I/O Servers of a managed system.
    ///
    /// # Errors
    ///
    /// Request failures and [`Error::Json`].
    pub async fn vioses_quick(&self, system: &Uuid) -> Result<Vec<PartitionQuick>, Error<C::Error>> {
        self.quick(&format!(
            "/rest/api/uom/ManagedSystem/{system}/VirtualIOServer/quick/All"
        ))
        .await
    }

    /// Partition or VIOS by name on a managed system.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when there is none with this name.
    pub async fn partition_by_name(
        &self,
        system: &Uuid,
        name: &str,
    ) -> Result<PartitionQuick, Error<C::Error>> {
        let mut partitions = self.partitions_quick(system).await?;
        partitions.extend(self.vioses_quick(system).await?);
        partitions
            .into_iter()
            .find(|partition| partition.name == name)
            .ok_or_else(|| Error::NotFound(format!("partition {name}")))
    }

    async fn quick<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, Error<C::Error>> {
        let response = self
            .request(RestRequest::get(path).with_header("Accept", "application/json"))
            .await?;
        // No content: nothing of that kind exists.
        if response.body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let de = &mut serde_json::Deserializer::from_str(&response.body);
        Ok(serde_path_to_error::deserialize(de)?)
    }
}
