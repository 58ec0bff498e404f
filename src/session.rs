//! Caller-facing operations.
//!
//! [`AzureSession`] is the entry point most callers want. Each operation:
//!
//! 1. Resolves explicit args against the optional bulk config
//!    ([`crate::config::resolve`]).
//! 2. Validates mandatory parameters. Failures return `OmsError::Config`
//!    before anything touches the network.
//! 3. Acquires one token.
//! 4. Sends one request.
//!
//! No state is kept between calls; a session only holds the two HTTP
//! clients and their endpoints.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use crate::auth::{AuthorizationHeader, TokenProvider};
use crate::client::{HttpMethod, RequestDescriptor, RestClient};
use crate::config::{
    ConnectionConfig, DIRECTORY_DEFAULTS, EffectiveParameters, WORKSPACE_DEFAULTS, required,
    resolve,
};
use crate::error::{OmsError, Result};
use crate::workspace;

/// Token provider plus REST client, bound to one cloud's endpoints.
#[derive(Debug, Clone)]
pub struct AzureSession {
    tokens: TokenProvider,
    rest: RestClient,
}

impl AzureSession {
    /// Session against the Azure public cloud.
    ///
    /// # Errors
    ///
    /// - `OmsError::Network` — an HTTP client could not be initialised.
    pub fn new() -> Result<Self> {
        Ok(AzureSession {
            tokens: TokenProvider::new()?,
            rest: RestClient::new()?,
        })
    }

    /// Session against custom authority and management endpoints.
    ///
    /// # Errors
    ///
    /// - `OmsError::Network` — an HTTP client could not be initialised.
    pub fn with_endpoints(authority_host: &str, management_url: &str) -> Result<Self> {
        Ok(AzureSession {
            tokens: TokenProvider::with_authority_host(authority_host)?,
            rest: RestClient::with_base_url(management_url)?,
        })
    }

    /// Validates credentials from `params` and performs one token exchange.
    async fn authorize(&self, params: &EffectiveParameters) -> Result<AuthorizationHeader> {
        let credentials = params.credentials()?;
        self.tokens.acquire_token(&credentials).await
    }

    /// Acquires an authorization header.
    ///
    /// # Errors
    ///
    /// - `OmsError::Config` — no usable credential set.
    /// - `OmsError::Auth` — the token exchange failed.
    pub async fn get_token(
        &self,
        explicit: &ConnectionConfig,
        config: Option<&ConnectionConfig>,
    ) -> Result<AuthorizationHeader> {
        let params = resolve(explicit, config, &DIRECTORY_DEFAULTS);
        self.authorize(&params).await
    }

    /// Lists the workspaces of a region, or gets the named one.
    ///
    /// Always returns a sequence; a named workspace yields one element.
    ///
    /// # Errors
    ///
    /// - `OmsError::Config` — missing subscription id, region or credentials.
    /// - `OmsError::Auth` — the token exchange failed; no API call is made.
    /// - `OmsError::Api` / `Network` / `Parse` — the API call failed.
    pub async fn get_workspace<T: DeserializeOwned>(
        &self,
        explicit: &ConnectionConfig,
        config: Option<&ConnectionConfig>,
    ) -> Result<Vec<T>> {
        let params = resolve(explicit, config, &WORKSPACE_DEFAULTS);
        let (subscription_id, region) = params.workspace_scope()?;
        let token = self.authorize(&params).await?;

        info!(
            subscription_id,
            region,
            workspace = params.workspace_name().unwrap_or("*"),
            "fetching OMS workspaces"
        );
        workspace::list_or_get_workspace(
            &self.rest,
            &token,
            subscription_id,
            region,
            params.workspace_name(),
            &params.api_version,
        )
        .await
    }

    /// Runs a log search query against a named workspace.
    ///
    /// # Errors
    ///
    /// - `OmsError::Config` — missing subscription id, region, workspace or
    ///   credentials.
    /// - `OmsError::Auth` — the token exchange failed; no API call is made.
    /// - `OmsError::Api` / `Network` / `Parse` — the search call failed.
    pub async fn search_workspace<T: DeserializeOwned>(
        &self,
        explicit: &ConnectionConfig,
        config: Option<&ConnectionConfig>,
        query: &str,
    ) -> Result<Vec<T>> {
        let params = resolve(explicit, config, &WORKSPACE_DEFAULTS);
        let (subscription_id, region) = params.workspace_scope()?;
        let workspace_name = required(params.workspace_name(), "workspace")?;
        let token = self.authorize(&params).await?;

        info!(subscription_id, region, workspace = workspace_name, "searching OMS workspace");
        workspace::search_workspace(
            &self.rest,
            &token,
            subscription_id,
            workspace_name,
            region,
            &params.api_version,
            query,
        )
        .await
    }

    /// Sends an arbitrary authenticated request to an absolute URI.
    ///
    /// Adds `?api-version=` and `x-ms-version`, both from the resolved
    /// `apiVersion` (default `2013-03-01`). The decoded response is returned
    /// as-is.
    ///
    /// # Errors
    ///
    /// - `OmsError::Config` — empty or unparseable URI, or no usable
    ///   credential set.
    /// - `OmsError::Auth` — the token exchange failed; no API call is made.
    /// - `OmsError::Api` / `Network` / `Parse` — the call failed.
    pub async fn invoke_method(
        &self,
        explicit: &ConnectionConfig,
        config: Option<&ConnectionConfig>,
        uri: &str,
        method: HttpMethod,
        body: Option<&str>,
    ) -> Result<Value> {
        let params = resolve(explicit, config, &DIRECTORY_DEFAULTS);
        let uri = required(Some(uri), "uri")?;
        reqwest::Url::parse(uri).map_err(|e| OmsError::Config {
            message: format!("invalid uri '{uri}'"),
            source: Some(Box::new(e)),
        })?;
        let token = self.authorize(&params).await?;

        let request = RequestDescriptor {
            uri: uri.to_string(),
            method,
            api_version: params.api_version,
            body: body.map(str::to_owned),
            header: token,
            version_header: true,
        };
        self.rest.dispatch(&request).await
    }
}
