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

use hmc::collect_inventory;
use hmc::InventoryConfig;
use hmc_core::rest::SESSION_HEADER;
use hmc_tests::rest::error_response;
use hmc_tests::rest::expect_logoff;
use hmc_tests::rest::expect_logon;
use hmc_tests::rest::job_response;
use hmc_tests::rest::partition_quick;
use hmc_tests::rest::system_quick;
use hmc_tests::rest::LOGON_PATH;
use hmc_tests::rest::TOKEN;
use hmc_tests::rest_hmc;
use hmc_tests::Error;
use hmc_tests::ExpectRequest;
use http::Method;
use http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use tokio::test;

const SYSTEMS: &str = "/rest/api/uom/ManagedSystem/quick/All";
const SYS1: Uuid = Uuid::from_u128(0x1c5a_4f1e_6d7c_3e61_9a5b_7cf2_0000_0001);
const SYS2: Uuid = Uuid::from_u128(0x1c5a_4f1e_6d7c_3e61_9a5b_7cf2_0000_0002);
const LPAR1: Uuid = Uuid::from_u128(0x3ed4_0000_0000_4000_8000_0000_0000_0001);
const VIOS1: Uuid = Uuid::from_u128(0x3ed4_0000_0000_4000_8000_0000_0000_0002);

fn partitions_path(system: &Uuid) -> String {
    format!("/rest/api/uom/ManagedSystem/{system}/LogicalPartition/quick/All")
}

fn vioses_path(system: &Uuid) -> String {
    format!("/rest/api/uom/ManagedSystem/{system}/VirtualIOServer/quick/All")
}

// Session token is sent with every request after logon and the session is
// released at the end.
#[test]
async fn session_round_trip() -> Result<(), Error> {
    let hmc = rest_hmc(1);
    expect_logon(hmc.client());
    hmc.client().expect(ExpectRequest::get(
        SYSTEMS,
        json!([system_quick(&SYS1, "sys1")]),
    ));
    expect_logoff(hmc.client());

    let systems = hmc
        .with_session(|session| async move { session.managed_systems_quick().await })
        .await?;
    assert_eq!(systems.len(), 1);
    assert_eq!(systems[0].uuid, SYS1);
    assert_eq!(systems[0].serial_number.as_deref(), Some("7800000"));

    let received = hmc.client().received();
    assert_eq!(received.len(), 3);
    assert_eq!(received[0].header(SESSION_HEADER), None);
    assert_eq!(received[1].header(SESSION_HEADER), Some(TOKEN));
    assert_eq!(received[2].method, Method::DELETE);
    assert_eq!(received[2].header(SESSION_HEADER), Some(TOKEN));
    assert_eq!(hmc.client().remaining(), 0);
    Ok(())
}

// Logoff runs when the work fails, and the work's error is returned.
#[test]
async fn session_logged_off_on_error() -> Result<(), Error> {
    let hmc = rest_hmc(1);
    expect_logon(hmc.client());
    hmc.client().expect(
        ExpectRequest::get(SYSTEMS, error_response(403, "User is not authorized"))
            .status(StatusCode::FORBIDDEN),
    );
    expect_logoff(hmc.client());

    let err = hmc
        .with_session(|session| async move { session.managed_systems_quick().await })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        hmc::Error::Rest { status, ref message }
            if status == StatusCode::FORBIDDEN && message == "User is not authorized"
    ));
    assert_eq!(hmc.client().remaining(), 0);
    Ok(())
}

// Dropping a session handle does not log it off; only logoff releases it.
#[test]
async fn dropped_session_stays_logged_on() -> Result<(), Error> {
    let hmc = rest_hmc(1);
    expect_logon(hmc.client());
    expect_logoff(hmc.client());

    let session = hmc.logon().await?;
    drop(session);
    assert_eq!(hmc.client().received().len(), 1);
    assert_eq!(hmc.client().remaining(), 1);
    Ok(())
}

// Rejected credentials: no session, nothing to log off.
#[test]
async fn logon_rejected() -> Result<(), Error> {
    let hmc = rest_hmc(1);
    hmc.client().expect(
        ExpectRequest::put(LOGON_PATH, "").status(StatusCode::UNAUTHORIZED),
    );
    let err = hmc
        .with_session(|session| async move { session.managed_systems_quick().await })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        hmc::Error::Rest { status, ref message }
            if status == StatusCode::UNAUTHORIZED && message == "Unauthorized"
    ));
    assert_eq!(hmc.client().received().len(), 1);
    Ok(())
}

fn expect_migration_start(hmc: &hmc::RestHmc<hmc_tests::Rest>, job_id: &str) {
    hmc.client().expect(
        ExpectRequest::put(
            format!("/rest/api/uom/LogicalPartition/{LPAR1}/do/MigrateLogicalPartition"),
            job_response(job_id, "NOT_STARTED"),
        )
        .body_contains("<OperationName kb=\"ROR\" kxe=\"false\">MigrateLogicalPartition</OperationName>")
        .body_contains("<ParameterValue kb=\"CUR\" kxe=\"false\">sys2</ParameterValue>"),
    );
}

// RUNNING, RUNNING, COMPLETED_OK: done after exactly three status polls.
#[test]
async fn job_completes_after_three_polls() -> Result<(), Error> {
    let hmc = rest_hmc(10);
    expect_logon(hmc.client());
    expect_migration_start(&hmc, "42");
    for status in ["RUNNING", "RUNNING", "COMPLETED_OK"] {
        hmc.client()
            .expect(ExpectRequest::get("/rest/api/uom/jobs/42", job_response("42", status)));
    }
    expect_logoff(hmc.client());

    let job = hmc
        .with_session(|session| async move {
            session.migrate_partition(&LPAR1, "sys2", &[]).await
        })
        .await?;
    assert!(job.is_completed_ok());
    let polls = hmc
        .client()
        .received()
        .iter()
        .filter(|request| request.path == "/rest/api/uom/jobs/42")
        .count();
    assert_eq!(polls, 3);
    assert_eq!(hmc.client().remaining(), 0);
    Ok(())
}

// A job that never leaves RUNNING times out naming the job.
#[test]
async fn job_times_out() -> Result<(), Error> {
    let hmc = rest_hmc(3);
    expect_logon(hmc.client());
    expect_migration_start(&hmc, "43");
    for _ in 0..3 {
        hmc.client()
            .expect(ExpectRequest::get("/rest/api/uom/jobs/43", job_response("43", "RUNNING")));
    }
    expect_logoff(hmc.client());

    let err = hmc
        .with_session(|session| async move {
            session.migrate_partition(&LPAR1, "sys2", &[]).await
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        hmc::Error::Timeout { ref what, attempts: 3 } if what == "job 43"
    ));
    assert!(err.to_string().contains("job 43"));
    assert_eq!(hmc.client().remaining(), 0);
    Ok(())
}

// Any terminal status but COMPLETED_OK fails the job.
#[test]
async fn job_failure_status() -> Result<(), Error> {
    let hmc = rest_hmc(5);
    expect_logon(hmc.client());
    expect_migration_start(&hmc, "44");
    hmc.client().expect(ExpectRequest::get(
        "/rest/api/uom/jobs/44",
        job_response("44", "FAILED_BEFORE_COMPLETION"),
    ));
    expect_logoff(hmc.client());

    let err = hmc
        .with_session(|session| async move {
            session.migrate_partition(&LPAR1, "sys2", &[]).await
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        hmc::Error::Job { ref id, ref status, .. } if id == "44" && status == "FAILED_BEFORE_COMPLETION"
    ));
    Ok(())
}

// Only RUNNING is polled again; a status poll answering NOT_STARTED ends the wait.
#[test]
async fn job_not_started_is_terminal() -> Result<(), Error> {
    let hmc = rest_hmc(5);
    expect_logon(hmc.client());
    expect_migration_start(&hmc, "45");
    hmc.client().expect(ExpectRequest::get(
        "/rest/api/uom/jobs/45",
        job_response("45", "NOT_STARTED"),
    ));
    expect_logoff(hmc.client());

    let err = hmc
        .with_session(|session| async move {
            session.migrate_partition(&LPAR1, "sys2", &[]).await
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        hmc::Error::Job { ref id, ref status, .. } if id == "45" && status == "NOT_STARTED"
    ));
    assert_eq!(hmc.client().remaining(), 0);
    Ok(())
}

// An empty target is rejected before the job is submitted.
#[test]
async fn migration_needs_target() -> Result<(), Error> {
    let hmc = rest_hmc(1);
    expect_logon(hmc.client());
    expect_logoff(hmc.client());
    let err = hmc
        .with_session(|session| async move {
            session.validate_migration(&LPAR1, "", &[]).await
        })
        .await
        .unwrap_err();
    assert!(matches!(err, hmc::Error::Validation(_)));
    assert_eq!(hmc.client().received().len(), 2);
    Ok(())
}

// Inventory lists LPARs then VIOSes per system and honours exclusions.
#[test]
async fn inventory_with_exclusions() -> Result<(), Error> {
    let config = InventoryConfig::from_yaml(
        "hmcs:\n  - host: hmc01\n    password: abc123\nexclude_systems: [sys2]\nexclude_partitions: [lpar-test]\n",
    )
    .map_err(|err| Error::Unexpected(err.to_string()))?;
    let hmc = rest_hmc(1);
    expect_logon(hmc.client());
    hmc.client().expect(ExpectRequest::get(
        SYSTEMS,
        json!([system_quick(&SYS1, "sys1"), system_quick(&SYS2, "sys2")]),
    ));
    hmc.client().expect(ExpectRequest::get(
        partitions_path(&SYS1),
        json!([
            partition_quick(&LPAR1, "lpar1", 2, "AIX/Linux"),
            partition_quick(&Uuid::from_u128(7), "lpar-test", 3, "AIX/Linux"),
        ]),
    ));
    // No VIOS on this system: the HMC answers with an empty body.
    hmc.client().expect(ExpectRequest::get(vioses_path(&SYS1), ""));
    expect_logoff(hmc.client());

    let entries = collect_inventory("hmc01", &hmc, &config).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].hmc, "hmc01");
    assert_eq!(entries[0].system, "sys1");
    assert_eq!(entries[0].name, "lpar1");
    assert_eq!(entries[0].uuid, LPAR1);
    assert_eq!(entries[0].partition_type, "AIX/Linux");
    assert_eq!(hmc.client().remaining(), 0);
    Ok(())
}

// Partition lookup by name searches LPARs and VIOSes.
#[test]
async fn partition_by_name_finds_vios() -> Result<(), Error> {
    let hmc = rest_hmc(1);
    expect_logon(hmc.client());
    hmc.client().expect(ExpectRequest::get(
        partitions_path(&SYS1),
        json!([partition_quick(&LPAR1, "lpar1", 2, "AIX/Linux")]),
    ));
    hmc.client().expect(ExpectRequest::get(
        vioses_path(&SYS1),
        json!([partition_quick(&VIOS1, "vios1", 1, "Virtual IO Server")]),
    ));
    expect_logoff(hmc.client());
    let vios = hmc
        .with_session(|session| async move { session.partition_by_name(&SYS1, "vios1").await })
        .await?;
    assert_eq!(vios.uuid, VIOS1);
    assert_eq!(vios.id, Some(1));
    Ok(())
}
