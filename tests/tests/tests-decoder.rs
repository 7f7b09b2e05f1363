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

//! Decoder acceptance on HMC output samples.

use hmc_core::decode_line;
use hmc_core::decode_output;
use hmc_core::decode_positional;
use hmc_core::DecodeError;
use hmc_core::DecodeMode;

#[test]
fn free_form_line() {
    let record = decode_line("NAME=lpar1,STATE=running,ID=5").unwrap();
    assert_eq!(record.to_string(), "NAME=lpar1,STATE=running,ID=5");
    assert_eq!(record.get_str("ID"), Some("5"));
}

#[test]
fn positional_line() {
    let record = decode_positional(&["name", "state"], "lpar1,running").unwrap();
    assert_eq!(record.get_str("name"), Some("lpar1"));
    assert_eq!(record.get_str("state"), Some("running"));
}

#[test]
fn positional_quoted_comma() {
    let record = decode_positional(&["name", "desc"], "lpar1,\"a, b\"").unwrap();
    assert_eq!(record.get_str("desc"), Some("a, b"));
}

#[test]
fn lssyscfg_lpar_listing() {
    let output = r#"name=vios1,lpar_id=1,lpar_env=vioserver,state=Running,resource_config=1,os_version=VIOS 3.1.2.10,logical_serial_num=78000001,default_profile=default,curr_profile=default,"virtual_eth_adapters=""2/0/1//0/0/ETHERNET0//all/none"",""3/0/2//0/0/ETHERNET0//all/none""",rmc_state=active
name=lpar1,lpar_id=2,lpar_env=aixlinux,state=Not Activated,resource_config=1,os_version=Unknown,logical_serial_num=78000002,default_profile=default,curr_profile=default,virtual_eth_adapters=none,rmc_state=inactive

"#;
    let records = decode_output(output, DecodeMode::FreeForm).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get_str("OS_VERSION"), Some("VIOS 3.1.2.10"));
    assert_eq!(
        records[0].get_str("VIRTUAL_ETH_ADAPTERS"),
        Some("\"2/0/1//0/0/ETHERNET0//all/none\",\"3/0/2//0/0/ETHERNET0//all/none\"")
    );
    assert_eq!(records[0].get_str("RMC_STATE"), Some("active"));
    assert_eq!(records[1].get_str("STATE"), Some("Not Activated"));
}

#[test]
fn lshmcencr_ciphers() {
    let line = "ciphers=cipher=TLS_AES_256_GCM_SHA384: enabled=1: protocol=TLSv1.3,cipher=TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384: enabled=1: protocol=TLSv1.2,cipher=TLS_RSA_WITH_AES_128_CBC_SHA: enabled=0: protocol=TLSv1.2";
    let record = decode_line(line).unwrap();
    let ciphers = record.get_records("CIPHERS").unwrap();
    assert_eq!(ciphers.len(), 3);
    assert_eq!(ciphers[2].get_str("CIPHER"), Some("TLS_RSA_WITH_AES_128_CBC_SHA"));
    assert_eq!(ciphers[2].get_str("ENABLED"), Some("0"));
    assert_eq!(decode_line(&record.to_string()).unwrap(), record);
}

#[test]
fn positional_count_mismatch_reports_counts() {
    let err = decode_output(
        "lpar1,2,Running\nlpar2,3\n",
        DecodeMode::Positional(&["name", "lpar_id", "state"]),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::FieldCount { expected: 3, actual: 2, ref line } if line == "lpar2,3"
    ));
}
