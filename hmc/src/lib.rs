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

//! IBM Hardware Management Console automation.
//!
//! [`CliHmc`] drives the HMC command line through any
//! [`hmc_core::HmcCli`] transport (SSH in production, a scripted mock in
//! tests). [`RestHmc`] talks to the REST API through any
//! [`hmc_core::RestClient`]. Both facades are generic over the transport
//! and report its errors as [`Error::Transport`].

/// Operations over the HMC command line.
pub mod cli;
/// Error of HMC operations.
pub mod error;
/// YAML inventory and partition collection.
pub mod inventory;
/// Operations over the HMC REST API.
pub mod rest;

use serde::Serialize;

#[doc(inline)]
pub use cli::CliHmc;
#[doc(inline)]
pub use cli::Polling;
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use inventory::collect_inventory;
#[doc(inline)]
pub use inventory::InventoryConfig;
#[doc(inline)]
pub use inventory::InventoryEntry;
#[doc(inline)]
pub use rest::RestHmc;
#[doc(inline)]
pub use rest::RestSession;

/// Result of a state changing operation: whether the HMC was modified and
/// the resulting value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Changed<T> {
    pub changed: bool,
    pub value: T,
}

impl<T> Changed<T> {
    #[must_use]
    pub const fn new(changed: bool, value: T) -> Self {
        Self { changed, value }
    }

    #[must_use]
    pub const fn changed(value: T) -> Self {
        Self::new(true, value)
    }

    #[must_use]
    pub const fn unchanged(value: T) -> Self {
        Self::new(false, value)
    }
}
