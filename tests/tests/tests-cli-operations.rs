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

use hmc::cli::ImageSource;
use hmc::cli::SourceKind;
use hmc::cli::UserSpec;
use hmc::Changed;
use hmc_core::CliErrorKind;
use hmc_tests::cli_hmc;
use hmc_tests::Error;
use hmc_tests::ExpectCommand;

use tokio::test;

const LSHMC_V10R1: &str = r#""version= Version: 10
 Release: 1
 Service Pack: 1010
HMC Build level 2106180208
MH01892 - HMC V10R1 M1010
","base_version=V10R1
"
"#;

const SYS_STATE: &str = "lssyscfg -r sys -m sys1 -F state";
const LPAR1: &str = "lssyscfg -r lpar -m sys1 --filter \"lpar_names=lpar1\" -F name,lpar_id,lpar_env,state,curr_profile,os_version";
const USER_OPS: &str = "lshmcusr --filter \"names=ops\"";

// Check positional listing of managed systems.
#[test]
async fn list_managed_systems() -> Result<(), Error> {
    let hmc = cli_hmc();
    hmc.cli().expect(ExpectCommand::ok(
        "lssyscfg -r sys -F name,type_model,serial_num,state",
        "sys1,9009-42A,7800001,Operating\nsys2,9080-M9S,7800002,Power Off\n",
    ));
    let systems = hmc.managed_systems().await?;
    assert_eq!(systems.len(), 2);
    assert_eq!(systems[0].get_str("name"), Some("sys1"));
    assert_eq!(systems[1].get_str("state"), Some("Power Off"));
    assert_eq!(hmc.cli().remaining(), 0);
    Ok(())
}

// An empty listing is not an error.
#[test]
async fn no_results_is_empty_listing() -> Result<(), Error> {
    let hmc = cli_hmc();
    hmc.cli()
        .expect(ExpectCommand::ok(USER_OPS, "No results were found.\n"));
    assert_eq!(hmc.user("ops").await?, None);
    Ok(())
}

// Exit code 5 is a credential failure, distinct from a runtime error
// (exit code 3).
#[test]
async fn exit_codes_are_classified() -> Result<(), Error> {
    let hmc = cli_hmc();
    let list = "lssyscfg -r sys -F name,type_model,serial_num,state";
    hmc.cli().expect(ExpectCommand::fail(
        list,
        5,
        "Permission denied, please try again.",
    ));
    hmc.cli().expect(ExpectCommand::fail(
        list,
        3,
        "HSCL350B The user does not have the appropriate authority.",
    ));

    let credentials = hmc.managed_systems().await.unwrap_err();
    let runtime = hmc.managed_systems().await.unwrap_err();
    let credentials = credentials
        .cli_failure()
        .ok_or_else(|| Error::Unexpected(credentials.to_string()))?;
    let runtime = runtime
        .cli_failure()
        .ok_or_else(|| Error::Unexpected(runtime.to_string()))?;
    assert_eq!(credentials.kind, CliErrorKind::InvalidCredentials);
    assert_eq!(runtime.kind, CliErrorKind::RuntimeError);
    assert_ne!(credentials.kind, runtime.kind);
    assert_eq!(
        runtime.message,
        "HSCL350B The user does not have the appropriate authority."
    );
    Ok(())
}

// Power on polls the state until the system is operating.
#[test]
async fn power_on_waits_for_operating() -> Result<(), Error> {
    let hmc = cli_hmc();
    hmc.cli().expect(ExpectCommand::ok(SYS_STATE, "Power Off\n"));
    hmc.cli()
        .expect(ExpectCommand::ok("chsysstate -r sys -m sys1 -o on", ""));
    hmc.cli().expect(ExpectCommand::ok(SYS_STATE, "Initializing\n"));
    hmc.cli().expect(ExpectCommand::ok(SYS_STATE, "Standby\n"));
    hmc.cli().expect(ExpectCommand::ok(SYS_STATE, "Operating\n"));
    let result = hmc.power_on_system("sys1").await?;
    assert_eq!(result, Changed::changed("Operating".to_string()));
    assert_eq!(hmc.cli().remaining(), 0);

    hmc.cli().expect(ExpectCommand::ok(SYS_STATE, "Operating\n"));
    let result = hmc.power_on_system("sys1").await?;
    assert!(!result.changed);
    Ok(())
}

// A system entering an error state stops polling.
#[test]
async fn power_off_error_state_is_fatal() -> Result<(), Error> {
    let hmc = cli_hmc();
    hmc.cli().expect(ExpectCommand::ok(SYS_STATE, "Operating\n"));
    hmc.cli().expect(ExpectCommand::ok(
        "chsysstate -r sys -m sys1 -o off --immed",
        "",
    ));
    hmc.cli()
        .expect(ExpectCommand::ok(SYS_STATE, "Error - Terminated\n"));
    let err = hmc.power_off_system("sys1", true).await.unwrap_err();
    assert!(matches!(err, hmc::Error::Failed { ref what, .. } if what == "managed system sys1"));
    assert_eq!(hmc.cli().remaining(), 0);
    Ok(())
}

// HSCL8012 (unknown partition) is reported as absence.
#[test]
async fn unknown_partition() -> Result<(), Error> {
    let hmc = cli_hmc();
    let query = LPAR1.replace("lpar1", "lpar9");
    hmc.cli().expect(ExpectCommand::fail(
        &query,
        1,
        "HSCL8012 The partition name lpar9 was not found.",
    ));
    assert_eq!(hmc.partition("sys1", "lpar9").await?, None);

    hmc.cli().expect(ExpectCommand::fail(
        &query,
        1,
        "HSCL8012 The partition name lpar9 was not found.",
    ));
    let err = hmc.partition_state("sys1", "lpar9").await.unwrap_err();
    assert!(matches!(err, hmc::Error::NotFound(ref what) if what == "partition lpar9"));
    Ok(())
}

// Activation uses the current profile and waits for Running.
#[test]
async fn activate_with_current_profile() -> Result<(), Error> {
    let hmc = cli_hmc();
    hmc.cli().expect(ExpectCommand::ok(
        LPAR1,
        "lpar1,2,aixlinux,Not Activated,default,Unknown\n",
    ));
    hmc.cli().expect(ExpectCommand::ok(
        "chsysstate -r lpar -m sys1 -n lpar1 -o on -f default",
        "",
    ));
    hmc.cli().expect(ExpectCommand::ok(
        LPAR1,
        "lpar1,2,aixlinux,Starting,default,Unknown\n",
    ));
    hmc.cli().expect(ExpectCommand::ok(
        LPAR1,
        "lpar1,2,aixlinux,Running,default,AIX 7.2 7200-05-03-2148\n",
    ));
    let result = hmc.activate_partition("sys1", "lpar1", None).await?;
    assert_eq!(result, Changed::changed("Running".to_string()));
    assert_eq!(hmc.cli().remaining(), 0);
    Ok(())
}

// A running partition cannot be deleted; nothing is sent to the HMC.
#[test]
async fn delete_running_partition_rejected() -> Result<(), Error> {
    let hmc = cli_hmc();
    hmc.cli().expect(ExpectCommand::ok(
        LPAR1,
        "lpar1,2,aixlinux,Running,default,Unknown\n",
    ));
    let err = hmc.delete_partition("sys1", "lpar1").await.unwrap_err();
    assert!(matches!(err, hmc::Error::Validation(_)));
    assert_eq!(hmc.cli().executed().len(), 1);
    Ok(())
}

// Only the differing user settings are changed.
#[test]
async fn ensure_user_modifies_differences() -> Result<(), Error> {
    let hmc = cli_hmc();
    hmc.cli().expect(ExpectCommand::ok(
        USER_OPS,
        "name=ops,taskrole=hmcoperator,description=Operations,pwage=99999\n",
    ));
    hmc.cli().expect(ExpectCommand::ok(
        "chhmcusr -i \"name=ops,taskrole=hmcviewer\"",
        "",
    ));
    hmc.cli().expect(ExpectCommand::ok(
        USER_OPS,
        "name=ops,taskrole=hmcviewer,description=Operations,pwage=99999\n",
    ));
    let mut user = UserSpec::new("ops", "hmcviewer");
    user.description = Some("Operations".into());
    let result = hmc.ensure_user(&user).await?;
    assert!(result.changed);
    assert_eq!(result.value.get_str("TASKROLE"), Some("hmcviewer"));

    hmc.cli().expect(ExpectCommand::ok(
        USER_OPS,
        "name=ops,taskrole=hmcviewer,description=Operations,pwage=99999\n",
    ));
    assert!(!hmc.ensure_user(&user).await?.changed);
    assert_eq!(hmc.cli().remaining(), 0);
    Ok(())
}

// Passwords never show up in errors.
#[test]
async fn create_user_failure_masks_password() -> Result<(), Error> {
    let hmc = cli_hmc();
    hmc.cli()
        .expect(ExpectCommand::ok(USER_OPS, "No results were found.\n"));
    hmc.cli().expect(
        ExpectCommand::fail(
            "mkhmcusr -i",
            1,
            "HSCL2A42 The password does not meet the password policy.",
        )
        .prefix(),
    );
    let mut user = UserSpec::new("ops", "hmcoperator");
    user.password = Some("Secret123".into());
    let err = hmc.ensure_user(&user).await.unwrap_err();
    assert!(err.to_string().contains("HSCL2A42"));
    assert!(!err.to_string().contains("Secret123"));
    assert!(hmc.cli().executed()[1].contains("passwd=Secret123"));
    Ok(())
}

// The active password policy is not removed.
#[test]
async fn active_password_policy_is_kept() -> Result<(), Error> {
    let hmc = cli_hmc();
    hmc.cli().expect(ExpectCommand::ok(
        "lspwdpolicy -t p --filter \"names=strict\"",
        "name=strict,description=Strict,min_pwage=1,pwage=90,min_length=12\n",
    ));
    hmc.cli().expect(ExpectCommand::ok(
        "lspwdpolicy -t s",
        "active_policy_name=strict,min_pwage=1,pwage=90\n",
    ));
    let err = hmc.remove_password_policy("strict").await.unwrap_err();
    assert!(matches!(err, hmc::Error::Validation(_)));
    assert_eq!(hmc.cli().remaining(), 0);
    Ok(())
}

// Nested cipher records of lshmcencr.
#[test]
async fn encryption_ciphers() -> Result<(), Error> {
    let hmc = cli_hmc();
    hmc.cli().expect(ExpectCommand::ok(
        "lshmcencr -c webui -t c",
        "ciphers=cipher=TLS_AES_256_GCM_SHA384: enabled=1,cipher=TLS_AES_128_GCM_SHA256: enabled=0\n",
    ));
    let records = hmc
        .encryption_config(
            hmc::cli::EncryptionComponent::WebUi,
            hmc::cli::EncryptionListing::Current,
        )
        .await?;
    let ciphers = records[0]
        .get_records("CIPHERS")
        .ok_or_else(|| Error::Unexpected("no nested ciphers".into()))?;
    assert_eq!(ciphers.len(), 2);
    assert_eq!(ciphers[1].get_str("ENABLED"), Some("0"));
    Ok(())
}

// A reboot may cut the ssh connection (exit 255); the HMC is then polled
// until it answers.
#[test]
async fn reboot_tolerates_closed_connection() -> Result<(), Error> {
    let hmc = cli_hmc();
    hmc.cli().expect(ExpectCommand::fail(
        "hmcshutdown -t now -r",
        255,
        "Connection to hmc01 closed by remote host.",
    ));
    hmc.cli().expect(ExpectCommand::fail(
        "lshmc -V",
        255,
        "ssh: connect to host hmc01 port 22: Connection refused",
    ));
    hmc.cli().expect(ExpectCommand::ok("lshmc -V", LSHMC_V10R1));
    let version = hmc.reboot().await?;
    assert_eq!(version.base_version, "V10R1");
    assert_eq!(hmc.cli().remaining(), 0);
    Ok(())
}

fn sftp_source() -> ImageSource {
    ImageSource {
        kind: SourceKind::Sftp,
        host: Some("10.0.0.5".into()),
        user: Some("ftpuser".into()),
        password: Some("ftppass".into()),
        path: "/images/V10R2".into(),
        mount_location: None,
    }
}

// A failed upgrade step disables alternate disk boot before the error is
// returned.
#[test]
async fn upgrade_failure_cleans_up() -> Result<(), Error> {
    let hmc = cli_hmc();
    hmc.cli().expect(ExpectCommand::ok("lshmc -V", LSHMC_V10R1));
    hmc.cli().expect(ExpectCommand::ok(
        "getupgfiles -r sftp -h 10.0.0.5 -u ftpuser --passwd ftppass -d /images/V10R2",
        "",
    ));
    hmc.cli().expect(ExpectCommand::fail(
        "saveupgdata -r disk",
        3,
        "HSCL3B1C Not enough space to save upgrade data.",
    ));
    hmc.cli()
        .expect(ExpectCommand::ok("chhmc -c altdiskboot -s disable", ""));
    let err = hmc.upgrade(&sftp_source(), Some("V10R2")).await.unwrap_err();
    let failure = err
        .cli_failure()
        .ok_or_else(|| Error::Unexpected(err.to_string()))?;
    assert_eq!(failure.command, "saveupgdata -r disk");
    assert_eq!(failure.kind, CliErrorKind::RuntimeError);
    assert_eq!(hmc.cli().remaining(), 0);
    Ok(())
}

// Nothing happens when the target release is installed already.
#[test]
async fn upgrade_already_at_target() -> Result<(), Error> {
    let hmc = cli_hmc();
    hmc.cli().expect(ExpectCommand::ok("lshmc -V", LSHMC_V10R1));
    let result = hmc.upgrade(&sftp_source(), Some("V10R1")).await?;
    assert!(!result.changed);
    assert_eq!(hmc.cli().executed(), vec!["lshmc -V".to_string()]);
    Ok(())
}

// Upgrade files cannot come from the HMC disk; rejected before any call.
#[test]
async fn upgrade_from_disk_rejected() -> Result<(), Error> {
    let hmc = cli_hmc();
    let err = hmc
        .upgrade(&ImageSource::disk("/tmp/img"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, hmc::Error::Validation(_)));
    assert!(hmc.cli().executed().is_empty());
    Ok(())
}
