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

//! XML payloads of the HMC REST API.
//!
//! Responses are namespace-qualified (`<JobResponse:JobResponse ...>`).
//! [`parse`] strips element prefixes and deserializes into serde types that
//! name only the elements callers need; everything else is ignored.
//! Requests are rendered from fixed templates with every interpolated
//! value escaped.

use crate::credentials::HmcCredentials;
use quick_xml::escape::escape;
use quick_xml::DeError;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::error::Error as StdError;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

const WEB_NS: &str = "http://www.ibm.com/xmlns/systems/power/firmware/web/mc/2012_10/";

/// XML decoding error.
#[derive(Debug)]
pub enum XmlError {
    Deserialize(DeError),
    /// Document parsed but the named element is absent or empty.
    MissingElement(&'static str),
}

impl Display for XmlError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Deserialize(err) => write!(f, "XML deserialization error: {err}"),
            Self::MissingElement(name) => write!(f, "XML element {name} is missing"),
        }
    }
}

impl StdError for XmlError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Deserialize(err) => Some(err),
            Self::MissingElement(_) => None,
        }
    }
}

/// Text content of an element. Attributes (`kb`, `kxe`, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Text {
    #[serde(rename = "$text", default)]
    value: String,
}

impl Text {
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.value.trim()
    }
}

impl Display for Text {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        self.as_str().fmt(f)
    }
}

/// Remove namespace prefixes from element names: `<a:B>` becomes `<B>`,
/// `</a:B>` becomes `</B>`. Attributes, comments, processing instructions
/// and text are left alone.
#[must_use]
pub fn strip_namespace_prefixes(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut rest = xml;
    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let (open, after) = if rest.starts_with("</") {
            ("</", &rest[2..])
        } else {
            ("<", &rest[1..])
        };
        if after.starts_with('?') || after.starts_with('!') {
            out.push_str(open);
            rest = after;
            continue;
        }
        let name_len = after
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(after.len());
        let name = &after[..name_len];
        let local = name.rsplit(':').next().unwrap_or(name);
        out.push_str(open);
        out.push_str(local);
        rest = &after[name_len..];
    }
    out.push_str(rest);
    out
}

/// Strip namespace prefixes and deserialize.
///
/// # Errors
///
/// Returns an error if the document does not match `T`.
pub fn parse<T: DeserializeOwned>(xml: &str) -> Result<T, XmlError> {
    quick_xml::de::from_str(&strip_namespace_prefixes(xml)).map_err(XmlError::Deserialize)
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(rename = "Message")]
    message: Option<Text>,
}

#[derive(Debug, Deserialize)]
struct ErrorContent {
    #[serde(rename = "HttpErrorResponse")]
    error: Option<ErrorResponse>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    content: Option<ErrorContent>,
}

/// Message of an `HttpErrorResponse`, bare or wrapped in an Atom entry.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    let bare = parse::<ErrorResponse>(body).ok().and_then(|e| e.message);
    let wrapped = || {
        parse::<ErrorEntry>(body)
            .ok()
            .and_then(|e| e.content)
            .and_then(|c| c.error)
            .and_then(|e| e.message)
    };
    bare.or_else(wrapped)
        .map(|text| text.as_str().to_string())
        .filter(|message| !message.is_empty())
}

/// Body of `PUT /rest/api/web/Logon`.
#[must_use]
pub fn logon_request(credentials: &HmcCredentials) -> String {
    format!(
        r#"<LogonRequest xmlns="{WEB_NS}" schemaVersion="V1_0"><Metadata><Atom/></Metadata><UserID kb="CUR" kxe="false">{}</UserID><Password kb="CUR" kxe="false">{}</Password></LogonRequest>"#,
        escape(credentials.username.as_str()),
        escape(credentials.password()),
    )
}

#[derive(Debug, Deserialize)]
struct LogonResponse {
    #[serde(rename = "X-API-Session")]
    session: Option<Text>,
}

/// Session token from a `LogonResponse`.
///
/// # Errors
///
/// Returns an error if the document is not a logon response with a token.
pub fn logon_token(body: &str) -> Result<String, XmlError> {
    parse::<LogonResponse>(body)?
        .session
        .map(|token| token.as_str().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(XmlError::MissingElement("X-API-Session"))
}

/// Body of a job request (`PUT .../do/<operation>`).
#[must_use]
pub fn job_request(operation: &str, group: &str, parameters: &[(&str, &str)]) -> String {
    let parameters: String = parameters
        .iter()
        .map(|(name, value)| {
            format!(
                r#"<JobParameter schemaVersion="V1_0"><Metadata><Atom/></Metadata><ParameterName kb="ROR" kxe="false">{}</ParameterName><ParameterValue kb="CUR" kxe="false">{}</ParameterValue></JobParameter>"#,
                escape(*name),
                escape(*value),
            )
        })
        .collect();
    format!(
        r#"<JobRequest:JobRequest xmlns:JobRequest="{WEB_NS}" xmlns="{WEB_NS}" schemaVersion="V1_0"><Metadata><Atom/></Metadata><RequestedOperation kb="CUR" kxe="false" schemaVersion="V1_0"><Metadata><Atom/></Metadata><OperationName kb="ROR" kxe="false">{}</OperationName><GroupName kb="ROR" kxe="false">{}</GroupName></RequestedOperation><JobParameters kb="CUR" kxe="false" schemaVersion="V1_0"><Metadata><Atom/></Metadata>{parameters}</JobParameters></JobRequest:JobRequest>"#,
        escape(operation),
        escape(group),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_element_prefixes_only() {
        let xml = r#"<?xml version="1.0"?><a:Root xmlns:a="urn:x" a:attr="1"><a:Child>v</a:Child><Plain/><!-- c:d --></a:Root>"#;
        assert_eq!(
            strip_namespace_prefixes(xml),
            r#"<?xml version="1.0"?><Root xmlns:a="urn:x" a:attr="1"><Child>v</Child><Plain/><!-- c:d --></Root>"#
        );
    }

    #[test]
    fn reads_logon_token() {
        let body = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<LogonResponse xmlns="http://www.ibm.com/xmlns/systems/power/firmware/web/mc/2012_10/" xmlns:ns2="http://www.w3.org/XML/1998/namespace/k2" schemaVersion="V1_0">
    <Metadata>
        <Atom/>
    </Metadata>
    <X-API-Session kb="ROR" kxe="false">tok-123==</X-API-Session>
</LogonResponse>"#;
        assert_eq!(logon_token(body).unwrap(), "tok-123==");
        assert!(matches!(
            logon_token("<LogonResponse/>"),
            Err(XmlError::MissingElement("X-API-Session"))
        ));
    }

    #[test]
    fn logon_request_escapes_values() {
        let body = logon_request(&HmcCredentials::new("hscroot".into(), "a<b&c".into()));
        assert!(body.contains("<UserID kb=\"CUR\" kxe=\"false\">hscroot</UserID>"));
        assert!(body.contains("a&lt;b&amp;c"));
    }

    #[test]
    fn job_request_lists_parameters() {
        let body = job_request(
            "MigrateLogicalPartition",
            "LogicalPartition",
            &[("TargetManagedSystemName", "sys2")],
        );
        assert!(body.contains("<OperationName kb=\"ROR\" kxe=\"false\">MigrateLogicalPartition</OperationName>"));
        assert!(body.contains("<GroupName kb=\"ROR\" kxe=\"false\">LogicalPartition</GroupName>"));
        assert!(body.contains("<ParameterName kb=\"ROR\" kxe=\"false\">TargetManagedSystemName</ParameterName><ParameterValue kb=\"CUR\" kxe=\"false\">sys2</ParameterValue>"));
    }

    #[test]
    fn error_message_bare_and_wrapped() {
        let bare = r#"<HttpErrorResponse:HttpErrorResponse xmlns:HttpErrorResponse="urn:x"><HTTPStatus>403</HTTPStatus><Message kb="ROR" kxe="false">User is not authorized</Message></HttpErrorResponse:HttpErrorResponse>"#;
        assert_eq!(error_message(bare).as_deref(), Some("User is not authorized"));
        let wrapped = r#"<entry xmlns="http://www.w3.org/2005/Atom"><id>1</id><content type="application/vnd.ibm.powervm.web+xml; type=HttpErrorResponse"><HttpErrorResponse:HttpErrorResponse xmlns:HttpErrorResponse="urn:x"><Message>Partition not found</Message></HttpErrorResponse:HttpErrorResponse></content></entry>"#;
        assert_eq!(error_message(wrapped).as_deref(), Some("Partition not found"));
        assert_eq!(error_message("not xml at all"), None);
    }
}
