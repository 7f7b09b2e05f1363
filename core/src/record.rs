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

//! Records produced by the CLI output decoder.
//!
//! A [`Record`] is an insertion-ordered mapping from field name to
//! [`FieldValue`]. Field names come verbatim from the HMC output (upper-cased
//! in free-form mode) or from the caller's attribute list (positional mode).

use serde::ser::SerializeMap as _;
use serde::Serialize;
use serde::Serializer;
use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;

/// Value of a single record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Plain string value.
    Scalar(String),
    /// Colon-delimited sub-records found inside one field.
    Nested(Vec<Record>),
}

impl FieldValue {
    /// Scalar value, `None` for nested values.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Nested(_) => None,
        }
    }

    /// Nested records, `None` for scalar values.
    #[must_use]
    pub fn as_records(&self) -> Option<&[Record]> {
        match self {
            Self::Scalar(_) => None,
            Self::Nested(records) => Some(records),
        }
    }
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Scalar(v) => v.fmt(f),
            Self::Nested(records) => {
                let mut first = true;
                for record in records {
                    if !first {
                        ",".fmt(f)?;
                    }
                    first = false;
                    record.fmt_inner(f)?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(v) => serializer.serialize_str(v),
            Self::Nested(records) => records.serialize(serializer),
        }
    }
}

/// Insertion-ordered mapping of field names to values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Insert a field. An existing field with the same name keeps its
    /// position and gets the new value.
    pub(crate) fn insert(&mut self, key: String, value: FieldValue) {
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.fields.push((key, value));
        }
    }

    /// Field value by exact name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Scalar field value by exact name.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    /// Nested records of a field by exact name.
    #[must_use]
    pub fn get_records(&self, key: &str) -> Option<&[Record]> {
        self.get(key).and_then(FieldValue::as_records)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    // Inner records are written as `k=v: k=v`.
    fn fmt_inner(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut first = true;
        for (k, v) in &self.fields {
            if !first {
                ": ".fmt(f)?;
            }
            first = false;
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

/// Renders the record back in HMC free-form syntax: `K=V,K=V`. Nested
/// fields are written as `K=k=v: k=v,k=v: k=v`.
impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mut first = true;
        for (k, v) in &self.fields {
            if !first {
                ",".fmt(f)?;
            }
            first = false;
            write!(f, "{k}={v}")?;
        }
        Ok(())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a str, &'a FieldValue);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a FieldValue)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
