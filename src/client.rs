//! Authenticated HTTP dispatcher for the Azure management REST surface.
//!
//! `RestClient` turns a [`RequestDescriptor`] into exactly one HTTP
//! round-trip:
//!
//! - URL: `{uri}?api-version={api_version}`, appended unconditionally.
//! - Headers: `Authorization` always; `x-ms-version` only when the
//!   descriptor asks for it (the generic directory-method path).
//! - Body: GET sends none. POST/PUT/DELETE/PATCH send the supplied body
//!   verbatim (empty if none) as `application/json`.
//! - Response: decoded as JSON and returned unmodified.
//!
//! There is no token handling and no retry here. A 401 is just another
//! `OmsError::Api`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::auth::AuthorizationHeader;
use crate::error::{OmsError, Result};

/// Azure Resource Manager endpoint for the public cloud.
pub const MANAGEMENT_URL: &str = "https://management.azure.com";

/// Connect timeout. Covers TCP + TLS handshake only.
const API_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Overall request timeout. Search queries over large workspaces can take
/// a while to return.
const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Header carrying the API version on directory calls.
const VERSION_HEADER: &str = "x-ms-version";

/// HTTP verbs accepted by [`RestClient::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// Read; sent without a body.
    Get,
    /// Create or action.
    Post,
    /// Create or replace.
    Put,
    /// Remove.
    Delete,
    /// Partial update.
    Patch,
}

impl HttpMethod {
    fn as_reqwest(self) -> Method {
        match self {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Patch => Method::PATCH,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_reqwest().as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = OmsError;

    /// Case-insensitive: `get`, `GET` and `Get` all parse.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            other => Err(OmsError::config(format!(
                "unsupported HTTP method '{other}', expected GET, POST, PUT, DELETE or PATCH"
            ))),
        }
    }
}

/// Everything needed for one authenticated call. Built fresh per call.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    /// Absolute target URI without a query string.
    pub uri: String,
    /// HTTP verb.
    pub method: HttpMethod,
    /// Value of the `api-version` query parameter.
    pub api_version: String,
    /// JSON body for non-GET methods; ignored for GET.
    pub body: Option<String>,
    /// `Authorization` header value.
    pub header: AuthorizationHeader,
    /// Also send `x-ms-version: {api_version}`.
    pub version_header: bool,
}

impl RequestDescriptor {
    /// The final URL with the `api-version` query parameter appended.
    pub fn versioned_url(&self) -> String {
        format!("{}?api-version={}", self.uri, self.api_version)
    }
}

/// Builds a `reqwest::Client` with explicit timeouts for API calls.
fn build_api_client() -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(API_CONNECT_TIMEOUT)
        .timeout(API_REQUEST_TIMEOUT)
        .build()?)
}

/// Sends authenticated requests to the management REST surface.
///
/// `management_url` is stored as a `String` so tests can point it at a
/// wiremock server. It is only used by callers that build resource URLs
/// (see [`crate::workspace`]); `dispatch` itself takes absolute URIs.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
    management_url: String,
}

impl RestClient {
    /// Creates a client for the public-cloud management endpoint.
    ///
    /// # Errors
    ///
    /// - `OmsError::Network` — the HTTP client could not be initialised.
    pub fn new() -> Result<Self> {
        Self::with_base_url(MANAGEMENT_URL)
    }

    /// Creates a client against a custom management endpoint.
    ///
    /// # Errors
    ///
    /// - `OmsError::Network` — the HTTP client could not be initialised.
    pub fn with_base_url(management_url: &str) -> Result<Self> {
        Ok(RestClient {
            client: build_api_client()?,
            management_url: management_url.trim_end_matches('/').to_string(),
        })
    }

    /// Management endpoint without a trailing slash.
    pub fn management_url(&self) -> &str {
        &self.management_url
    }

    /// Sends one authenticated request and decodes the JSON response.
    ///
    /// The body is read as text before the status check so service error
    /// details survive into `OmsError::Api`. An empty success body decodes
    /// to `Value::Null` (DELETE and some PUTs return nothing).
    ///
    /// # Errors
    ///
    /// - `OmsError::Api` — non-success status; carries status and body.
    /// - `OmsError::Network` — the connection could not be established or
    ///   the body could not be read.
    /// - `OmsError::Parse` — a success body that is not JSON.
    pub async fn dispatch(&self, request: &RequestDescriptor) -> Result<Value> {
        let url = request.versioned_url();
        debug!(method = %request.method, %url, "dispatching request");

        let mut builder = self
            .client
            .request(request.method.as_reqwest(), &url)
            .header(AUTHORIZATION, request.header.as_str());
        if request.version_header {
            builder = builder.header(VERSION_HEADER, request.api_version.as_str());
        }
        if request.method != HttpMethod::Get {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(request.body.clone().unwrap_or_default());
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "response received");

        if !status.is_success() {
            return Err(OmsError::Api { status, body });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}
