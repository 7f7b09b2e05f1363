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

//! HTTPS transport built on reqwest.

use hmc_core::RestClient;
use hmc_core::RestRequest;
use hmc_core::RestResponse;
use http::HeaderMap;
use std::time::Duration;
use url::Url;

#[derive(Debug)]
pub enum TransportError {
    ReqwestError(reqwest::Error),
    InvalidUrl(url::ParseError),
}

impl From<reqwest::Error> for TransportError {
    fn from(value: reqwest::Error) -> Self {
        Self::ReqwestError(value)
    }
}

#[allow(clippy::absolute_paths)]
impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReqwestError(e) => write!(f, "HTTP client error: {e:?}"),
            Self::InvalidUrl(e) => write!(f, "invalid request URL: {e}"),
        }
    }
}

#[allow(clippy::absolute_paths)]
impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReqwestError(e) => Some(e),
            Self::InvalidUrl(e) => Some(e),
        }
    }
}

/// Configuration parameters for the reqwest HTTP client.
///
/// HMCs usually present a self-signed certificate; set
/// `accept_invalid_certs(true)` explicitly when that is acceptable.
///
/// # Examples
///
/// ```rust
/// use hmc_transport::reqwest::ClientParams;
/// use std::time::Duration;
///
/// let params = ClientParams::new()
///     .timeout(Duration::from_secs(30))
///     .connect_timeout(Duration::from_secs(10))
///     .user_agent("MyApp/1.0")
///     .accept_invalid_certs(true);
/// ```
#[derive(Debug, Clone)]
pub struct ClientParams {
    /// HTTP request timeout
    pub timeout: Option<Duration>,
    /// TCP connection timeout
    pub connect_timeout: Option<Duration>,
    /// User-Agent header value
    pub user_agent: Option<String>,
    /// Whether to accept invalid TLS certificates
    pub accept_invalid_certs: bool,
    /// TCP keep-alive timeout
    pub tcp_keepalive: Option<Duration>,
    /// List of default headers, added to every request
    pub default_headers: Option<HeaderMap>,
}

impl Default for ClientParams {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(300)),
            connect_timeout: Some(Duration::from_secs(10)),
            user_agent: Some("hmc-rs/v1".to_string()),
            accept_invalid_certs: false,
            tcp_keepalive: Some(Duration::from_secs(60)),
            default_headers: None,
        }
    }
}

impl ClientParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    #[must_use]
    pub const fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    #[must_use]
    pub const fn tcp_keepalive(mut self, keepalive: Duration) -> Self {
        self.tcp_keepalive = Some(keepalive);
        self
    }

    #[must_use]
    pub const fn no_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    #[must_use]
    pub fn default_headers(mut self, default_headers: HeaderMap) -> Self {
        self.default_headers = Some(default_headers);
        self
    }
}

/// REST client of one HMC.
///
/// Request paths are joined to `endpoint` (`https://hmc:12443`).
///
/// ```rust,no_run
/// use hmc_transport::reqwest::Client;
/// use hmc_transport::reqwest::ClientParams;
/// use url::Url;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let endpoint = Url::parse("https://hmc01.example.com:12443")?;
/// let client = Client::with_params(endpoint, ClientParams::new().accept_invalid_certs(true))?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    client: reqwest::Client,
    endpoint: Url,
}

#[allow(clippy::missing_errors_doc)]
impl Client {
    pub fn new(endpoint: Url) -> Result<Self, reqwest::Error> {
        Self::with_params(endpoint, ClientParams::default())
    }

    pub fn with_params(endpoint: Url, params: ClientParams) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().use_rustls_tls();

        if let Some(timeout) = params.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(connect_timeout) = params.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        if let Some(user_agent) = params.user_agent {
            builder = builder.user_agent(user_agent);
        }

        if params.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(keepalive) = params.tcp_keepalive {
            builder = builder.tcp_keepalive(keepalive);
        }

        if let Some(default_headers) = params.default_headers {
            builder = builder.default_headers(default_headers);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
        })
    }

    #[must_use]
    pub const fn with_client(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl RestClient for Client {
    type Error = TransportError;

    async fn request(&self, request: RestRequest) -> Result<RestResponse, Self::Error> {
        let url = self
            .endpoint
            .join(&request.path)
            .map_err(TransportError::InvalidUrl)?;
        tracing::debug!(method = %request.method, %url, "REST request");

        let mut builder = self.client.request(request.method, url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(%status, "REST response");
        Ok(RestResponse::new(status, body))
    }
}
