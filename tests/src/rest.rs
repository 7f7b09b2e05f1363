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

use crate::ExpectRequest;
use crate::Rest;
use serde_json::json;
use uuid::Uuid;

pub const LOGON_PATH: &str = "/rest/api/web/Logon";
pub const TOKEN: &str = "tok-4a1b==";

const WEB_NS: &str = "http://www.ibm.com/xmlns/systems/power/firmware/web/mc/2012_10/";

#[must_use]
pub fn logon_response(token: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<LogonResponse xmlns="{WEB_NS}" xmlns:ns2="http://www.w3.org/XML/1998/namespace/k2" schemaVersion="V1_0">
    <Metadata>
        <Atom/>
    </Metadata>
    <X-API-Session kb="ROR" kxe="false">{token}</X-API-Session>
</LogonResponse>"#
    )
}

#[must_use]
pub fn job_response(id: &str, status: &str) -> String {
    format!(
        r#"<JobResponse:JobResponse xmlns:JobResponse="{WEB_NS}" xmlns="{WEB_NS}" schemaVersion="V1_0">
    <Metadata>
        <Atom/>
    </Metadata>
    <JobID kb="ROR" kxe="false">{id}</JobID>
    <Status kb="ROR" kxe="false">{status}</Status>
    <Results kb="ROR" kxe="false" schemaVersion="V1_0">
        <Metadata>
            <Atom/>
        </Metadata>
    </Results>
</JobResponse:JobResponse>"#
    )
}

#[must_use]
pub fn error_response(status: u16, message: &str) -> String {
    format!(
        r#"<HttpErrorResponse:HttpErrorResponse xmlns:HttpErrorResponse="{WEB_NS}" xmlns="{WEB_NS}" schemaVersion="V1_0">
    <Metadata>
        <Atom/>
    </Metadata>
    <HTTPStatus kb="ROR" kxe="false">{status}</HTTPStatus>
    <Message kb="ROR" kxe="false">{message}</Message>
</HttpErrorResponse:HttpErrorResponse>"#
    )
}

#[must_use]
pub fn system_quick(uuid: &Uuid, name: &str) -> serde_json::Value {
    json!({
        "UUID": uuid,
        "SystemName": name,
        "State": "operating",
        "MachineType": "9009",
        "Model": "42A",
        "SerialNumber": "7800000",
    })
}

#[must_use]
pub fn partition_quick(uuid: &Uuid, name: &str, id: u32, partition_type: &str) -> serde_json::Value {
    json!({
        "UUID": uuid,
        "PartitionName": name,
        "PartitionID": id,
        "PartitionState": "running",
        "PartitionType": partition_type,
    })
}

/// Queue a successful logon.
pub fn expect_logon(rest: &Rest) {
    rest.expect(
        ExpectRequest::put(LOGON_PATH, logon_response(TOKEN))
            .body_contains("<UserID kb=\"CUR\" kxe=\"false\">hscroot</UserID>"),
    );
}

/// Queue a successful logoff.
pub fn expect_logoff(rest: &Rest) {
    rest.expect(ExpectRequest::delete(LOGON_PATH));
}
