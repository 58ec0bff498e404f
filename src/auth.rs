//! Azure AD token acquisition.
//!
//! Two OAuth2 grants are supported against the resource-based
//! `/oauth2/token` endpoint:
//!
//! - **Password** (resource owner): authority `common`, the caller's
//!   username/password, and the well-known public client id as the
//!   application identity.
//! - **Client secret** (client credentials): authority is the caller's AD
//!   domain, identity is the application's client id and secret.
//!
//! The flow is chosen by [`Credentials::select`]: a non-empty username means
//! password flow, anything else means client-secret flow.
//!
//! Tokens are not cached. Each call performs exactly one exchange and returns
//! the header value as issued (`"{token_type} {access_token}"`).

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{EffectiveParameters, required};
use crate::error::{OmsError, Result};

/// Default Azure AD host for the public cloud.
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Tenant segment used by the password flow.
const COMMON_TENANT: &str = "common";

/// Token requests are small; anything slower than this is treated as an
/// unreachable identity provider.
const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the token endpoint URL for a tenant (`common` or an AD domain).
fn token_url(authority_host: &str, tenant: &str) -> String {
    format!(
        "{}/{}/oauth2/token",
        authority_host.trim_end_matches('/'),
        tenant
    )
}

// ── Credentials ──────────────────────────────────────────────────────

/// The credential set for one token exchange. Exactly one flow per call.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Resource-owner password flow against the `common` authority.
    Password {
        /// Azure AD user principal name.
        username: String,
        /// The user's password.
        password: String,
        /// AD domain, carried for completeness; the authority is always `common`.
        domain: Option<String>,
        /// Public client id presented as the application identity.
        client_id: String,
        /// Resource the token is scoped to.
        app_id_uri: String,
    },
    /// Client-credentials flow against the domain's authority.
    ClientSecret {
        /// Application (client) id.
        client_id: String,
        /// Application secret.
        secret: String,
        /// AD domain used as the authority tenant.
        domain: String,
        /// Resource the token is scoped to.
        app_id_uri: String,
    },
}

impl Credentials {
    /// Chooses the credential flow for a resolved parameter set.
    ///
    /// A non-empty `username` selects [`Credentials::Password`]; otherwise
    /// [`Credentials::ClientSecret`] is selected.
    ///
    /// # Errors
    ///
    /// - `OmsError::Config` — the password flow has no password, or the
    ///   client-secret flow is missing its secret or domain.
    pub fn select(params: &EffectiveParameters) -> Result<Self> {
        match params.username.as_deref() {
            Some(username) if !username.is_empty() => {
                let password = params.password.clone().ok_or_else(|| {
                    OmsError::config("password is required when a username is supplied")
                })?;
                Ok(Credentials::Password {
                    username: username.to_string(),
                    password,
                    domain: params.domain.clone(),
                    client_id: params.client_id.clone(),
                    app_id_uri: params.app_id_uri.clone(),
                })
            }
            _ => {
                let secret = required(params.secret.as_deref(), "secret (or username)")?;
                let domain = required(params.domain.as_deref(), "domain")?;
                Ok(Credentials::ClientSecret {
                    client_id: params.client_id.clone(),
                    secret: secret.to_string(),
                    domain: domain.to_string(),
                    app_id_uri: params.app_id_uri.clone(),
                })
            }
        }
    }

    /// Tenant segment of the authority URL.
    fn tenant(&self) -> &str {
        match self {
            Credentials::Password { .. } => COMMON_TENANT,
            Credentials::ClientSecret { domain, .. } => domain.as_str(),
        }
    }

    /// Short flow name for logs.
    fn flow(&self) -> &'static str {
        match self {
            Credentials::Password { .. } => "password",
            Credentials::ClientSecret { .. } => "client_credentials",
        }
    }

    /// Form body sent to the token endpoint for this flow.
    fn token_request(&self) -> TokenRequest<'_> {
        match self {
            Credentials::Password {
                username,
                password,
                client_id,
                app_id_uri,
                ..
            } => TokenRequest {
                grant_type: "password",
                resource: app_id_uri.as_str(),
                client_id: client_id.as_str(),
                username: Some(username.as_str()),
                password: Some(password.as_str()),
                client_secret: None,
            },
            Credentials::ClientSecret {
                client_id,
                secret,
                app_id_uri,
                ..
            } => TokenRequest {
                grant_type: "client_credentials",
                resource: app_id_uri.as_str(),
                client_id: client_id.as_str(),
                username: None,
                password: None,
                client_secret: Some(secret.as_str()),
            },
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Password {
                username,
                domain,
                client_id,
                app_id_uri,
                ..
            } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .field("domain", domain)
                .field("client_id", client_id)
                .field("app_id_uri", app_id_uri)
                .finish(),
            Credentials::ClientSecret {
                client_id,
                domain,
                app_id_uri,
                ..
            } => f
                .debug_struct("ClientSecret")
                .field("client_id", client_id)
                .field("secret", &"<redacted>")
                .field("domain", domain)
                .field("app_id_uri", app_id_uri)
                .finish(),
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────────

/// Form body sent to the token endpoint.
/// Serialized as `application/x-www-form-urlencoded` by reqwest's `.form()`.
#[derive(Serialize)]
pub(crate) struct TokenRequest<'a> {
    grant_type: &'a str,
    resource: &'a str,
    client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_secret: Option<&'a str>,
}

/// Subset of the token response we need. `expires_in`, `resource` and the
/// refresh token are ignored since nothing is cached.
#[derive(Deserialize)]
pub(crate) struct TokenResponse {
    /// Scheme, normally `Bearer`.
    pub token_type: String,
    /// The access token itself.
    pub access_token: String,
}

impl TokenResponse {
    fn into_header(self) -> AuthorizationHeader {
        AuthorizationHeader(format!("{} {}", self.token_type, self.access_token))
    }
}

/// Ready-to-send `Authorization` header value.
///
/// Opaque to this crate: it is forwarded exactly as the token endpoint
/// produced it. `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationHeader(String);

impl AuthorizationHeader {
    /// Wraps an existing header value, e.g. `"Bearer eyJ0..."`.
    pub fn new(value: impl Into<String>) -> Self {
        AuthorizationHeader(value.into())
    }

    /// The header value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for AuthorizationHeader {
    fn from(value: String) -> Self {
        AuthorizationHeader(value)
    }
}

impl fmt::Debug for AuthorizationHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthorizationHeader(<redacted>)")
    }
}

// ── Provider ─────────────────────────────────────────────────────────

/// Exchanges [`Credentials`] for an [`AuthorizationHeader`].
///
/// Holds only an HTTP client and the authority host; there is no token
/// state, so one provider can serve any number of concurrent calls.
#[derive(Debug, Clone)]
pub struct TokenProvider {
    client: reqwest::Client,
    authority_host: String,
}

impl TokenProvider {
    /// Creates a provider for the public-cloud authority.
    ///
    /// # Errors
    ///
    /// - `OmsError::Network` — the HTTP client could not be initialised.
    pub fn new() -> Result<Self> {
        Self::with_authority_host(AUTHORITY_HOST)
    }

    /// Creates a provider against a custom authority host (sovereign
    /// clouds, or a local mock server in tests).
    ///
    /// # Errors
    ///
    /// - `OmsError::Network` — the HTTP client could not be initialised.
    pub fn with_authority_host(authority_host: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()?;
        Ok(TokenProvider {
            client,
            authority_host: authority_host.to_string(),
        })
    }

    /// Performs one token exchange.
    ///
    /// The body is read as text before the status check so the AADSTS
    /// diagnostics survive into the error message.
    ///
    /// # Errors
    ///
    /// - `OmsError::Auth` — the endpoint rejected the credentials, could not
    ///   be reached, or returned a body without a token.
    pub async fn acquire_token(&self, credentials: &Credentials) -> Result<AuthorizationHeader> {
        let url = token_url(&self.authority_host, credentials.tenant());
        debug!(flow = credentials.flow(), %url, "requesting Azure AD token");

        let response = self
            .client
            .post(&url)
            .form(&credentials.token_request())
            .send()
            .await
            .map_err(|e| OmsError::Auth {
                message: format!("token endpoint {url} unreachable"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| OmsError::Auth {
            message: "failed to read token response".to_string(),
            source: Some(Box::new(e)),
        })?;

        if !status.is_success() {
            return Err(OmsError::Auth {
                message: format!("token request failed ({status}): {body}"),
                source: None,
            });
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| OmsError::Auth {
            message: "failed to parse token response".to_string(),
            source: Some(Box::new(e)),
        })?;
        debug!(flow = credentials.flow(), "Azure AD token acquired");
        Ok(token.into_header())
    }
}
