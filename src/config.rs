//! Connection parameters and their resolution.
//!
//! Every caller-facing operation accepts two sources of connection
//! parameters: discrete named arguments and an optional bulk
//! [`ConnectionConfig`] (typically loaded from a TOML file). Both share the
//! same all-optional shape. [`resolve`] merges them field by field with the
//! precedence
//!
//! ```text
//! explicit Some(_)  >  config Some(_)  >  built-in default
//! ```
//!
//! Built-in defaults exist only for `apiVersion`, `appIdUri` and `clientId`,
//! so those three are always present on [`EffectiveParameters`].
//!
//! The merge itself never fails. Checks for mandatory combinations live on
//! [`EffectiveParameters`] and return `OmsError::Config` so they can run
//! before any network call.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::auth::Credentials;
use crate::error::{OmsError, Result};

/// Resource the token is requested for when no `appIdUri` is supplied.
pub const DEFAULT_APP_ID_URI: &str = "https://management.core.windows.net/";

/// Well-known public client id used as the application identity for the
/// username/password flow when no `clientId` is supplied.
pub const DEFAULT_CLIENT_ID: &str = "1950a258-227b-4e31-a9cf-717495945fc2";

/// Built-in fallbacks applied when neither explicit args nor the bulk
/// config supply a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaults {
    /// Value of the `api-version` query parameter.
    pub api_version: &'static str,
    /// Resource the token is scoped to.
    pub app_id_uri: &'static str,
    /// Application identity presented to Azure AD.
    pub client_id: &'static str,
}

/// Defaults for the OMS workspace operations.
pub const WORKSPACE_DEFAULTS: Defaults = Defaults {
    api_version: "2014-10-10",
    app_id_uri: DEFAULT_APP_ID_URI,
    client_id: DEFAULT_CLIENT_ID,
};

/// Defaults for token acquisition and the generic directory method.
pub const DIRECTORY_DEFAULTS: Defaults = Defaults {
    api_version: "2013-03-01",
    app_id_uri: DEFAULT_APP_ID_URI,
    client_id: DEFAULT_CLIENT_ID,
};

/// Optional bag of connection parameters.
///
/// Used both for discrete named arguments and for the bulk configuration
/// object. `None` means "not supplied". Keys are camelCase on the wire
/// (`appIdUri`, `subscriptionId`, ...); snake_case aliases are accepted so
/// hand-written TOML files can use either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Azure AD user name. A non-empty value selects the password flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password for `username`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Azure AD domain (tenant), e.g. `contoso.onmicrosoft.com`. Required
    /// for the client-secret flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Resource the token is requested for.
    #[serde(default, alias = "app_id_uri", skip_serializing_if = "Option::is_none")]
    pub app_id_uri: Option<String>,

    /// Application (client) id.
    #[serde(default, alias = "client_id", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Client secret for the client-credentials flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// `api-version` query parameter of the target REST surface.
    #[serde(default, alias = "api_version", skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    /// Azure subscription id.
    #[serde(default, alias = "subscription_id", skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,

    /// Region used in the `OI-Default-{region}` resource group name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// OMS workspace name. Empty or absent means "all workspaces".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
}

impl ConnectionConfig {
    /// Loads a bulk configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// - `OmsError::Config` — the file could not be read or is not a valid
    ///   connection config.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| OmsError::Config {
            message: format!("cannot read config file {}", path.display()),
            source: Some(Box::new(e)),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a bulk configuration from TOML text.
    ///
    /// # Errors
    ///
    /// - `OmsError::Config` — the text is not valid TOML or has a field of
    ///   the wrong type.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| OmsError::Config {
            message: "malformed connection config".to_string(),
            source: Some(Box::new(e)),
        })
    }
}

/// The merged parameter set used by a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveParameters {
    /// Azure AD user name, if supplied.
    pub username: Option<String>,
    /// Password, if supplied.
    pub password: Option<String>,
    /// Azure AD domain, if supplied.
    pub domain: Option<String>,
    /// Token resource; always present after resolution.
    pub app_id_uri: String,
    /// Application identity; always present after resolution.
    pub client_id: String,
    /// Client secret, if supplied.
    pub secret: Option<String>,
    /// `api-version`; always present after resolution.
    pub api_version: String,
    /// Subscription id, if supplied.
    pub subscription_id: Option<String>,
    /// Region, if supplied.
    pub region: Option<String>,
    /// Workspace name exactly as merged. See [`EffectiveParameters::workspace_name`].
    pub workspace: Option<String>,
}

/// Merges explicit arguments with an optional bulk config and defaults.
///
/// Field by field: an explicit `Some` always wins (even when empty), then
/// the config's `Some`, then the default where one exists.
pub fn resolve(
    explicit: &ConnectionConfig,
    config: Option<&ConnectionConfig>,
    defaults: &Defaults,
) -> EffectiveParameters {
    let fallback = ConnectionConfig::default();
    let config = config.unwrap_or(&fallback);

    let pick = |e: &Option<String>, c: &Option<String>| e.clone().or_else(|| c.clone());
    let pick_or = |e: &Option<String>, c: &Option<String>, d: &str| {
        pick(e, c).unwrap_or_else(|| d.to_string())
    };

    EffectiveParameters {
        username: pick(&explicit.username, &config.username),
        password: pick(&explicit.password, &config.password),
        domain: pick(&explicit.domain, &config.domain),
        app_id_uri: pick_or(&explicit.app_id_uri, &config.app_id_uri, defaults.app_id_uri),
        client_id: pick_or(&explicit.client_id, &config.client_id, defaults.client_id),
        secret: pick(&explicit.secret, &config.secret),
        api_version: pick_or(
            &explicit.api_version,
            &config.api_version,
            defaults.api_version,
        ),
        subscription_id: pick(&explicit.subscription_id, &config.subscription_id),
        region: pick(&explicit.region, &config.region),
        workspace: pick(&explicit.workspace, &config.workspace),
    }
}

impl EffectiveParameters {
    /// Workspace name, with an empty string treated as absent.
    pub fn workspace_name(&self) -> Option<&str> {
        self.workspace.as_deref().filter(|w| !w.is_empty())
    }

    /// Selects and validates the credential flow for this call.
    ///
    /// # Errors
    ///
    /// - `OmsError::Config` — the selected flow is missing a mandatory field.
    pub fn credentials(&self) -> Result<Credentials> {
        Credentials::select(self)
    }

    /// Returns `(subscription_id, region)`, both mandatory for workspace
    /// operations.
    ///
    /// # Errors
    ///
    /// - `OmsError::Config` — either value is missing or empty.
    pub fn workspace_scope(&self) -> Result<(&str, &str)> {
        let subscription_id = required(self.subscription_id.as_deref(), "subscriptionId")?;
        let region = required(self.region.as_deref(), "region")?;
        Ok((subscription_id, region))
    }
}

/// Returns the value if present and non-empty, else a `Config` error
/// naming the field.
pub(crate) fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(OmsError::config(format!("{field} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn conn(f: impl FnOnce(&mut ConnectionConfig)) -> ConnectionConfig {
        let mut c = ConnectionConfig::default();
        f(&mut c);
        c
    }

    #[test]
    fn explicit_value_beats_config_value() {
        let explicit = conn(|c| c.region = Some("West-Europe".into()));
        let config = conn(|c| c.region = Some("East-US".into()));
        let params = resolve(&explicit, Some(&config), &WORKSPACE_DEFAULTS);
        assert_eq!(params.region.as_deref(), Some("West-Europe"));
    }

    #[test]
    fn config_value_fills_missing_explicit() {
        let explicit = ConnectionConfig::default();
        let config = conn(|c| {
            c.subscription_id = Some("sub-1".into());
            c.api_version = Some("2015-03-20".into());
        });
        let params = resolve(&explicit, Some(&config), &WORKSPACE_DEFAULTS);
        assert_eq!(params.subscription_id.as_deref(), Some("sub-1"));
        assert_eq!(params.api_version, "2015-03-20");
    }

    #[test]
    fn defaults_apply_only_when_both_absent() {
        let params = resolve(&ConnectionConfig::default(), None, &WORKSPACE_DEFAULTS);
        assert_eq!(params.api_version, "2014-10-10");
        assert_eq!(params.app_id_uri, DEFAULT_APP_ID_URI);
        assert_eq!(params.client_id, DEFAULT_CLIENT_ID);

        let params = resolve(&ConnectionConfig::default(), None, &DIRECTORY_DEFAULTS);
        assert_eq!(params.api_version, "2013-03-01");
    }

    #[test]
    fn explicit_empty_string_still_wins() {
        let explicit = conn(|c| c.workspace = Some(String::new()));
        let config = conn(|c| c.workspace = Some("contoso".into()));
        let params = resolve(&explicit, Some(&config), &WORKSPACE_DEFAULTS);
        assert_eq!(params.workspace.as_deref(), Some(""));
        assert_eq!(
            params.workspace_name(),
            None,
            "empty workspace selects the list-all path"
        );
    }

    #[test]
    fn empty_and_absent_workspace_are_equivalent() {
        let empty = resolve(
            &conn(|c| c.workspace = Some(String::new())),
            None,
            &WORKSPACE_DEFAULTS,
        );
        let absent = resolve(&ConnectionConfig::default(), None, &WORKSPACE_DEFAULTS);
        assert_eq!(empty.workspace_name(), absent.workspace_name());
    }

    #[test]
    fn workspace_scope_requires_subscription_and_region() {
        let params = resolve(
            &conn(|c| c.region = Some("East-US".into())),
            None,
            &WORKSPACE_DEFAULTS,
        );
        let err = params.workspace_scope().unwrap_err();
        assert!(err.to_string().contains("subscriptionId"));

        let params = resolve(
            &conn(|c| {
                c.subscription_id = Some("S".into());
                c.region = Some(String::new());
            }),
            None,
            &WORKSPACE_DEFAULTS,
        );
        let err = params.workspace_scope().unwrap_err();
        assert!(err.to_string().contains("region"));
    }

    #[test]
    fn workspace_scope_returns_both_values() {
        let params = resolve(
            &conn(|c| {
                c.subscription_id = Some("S".into());
                c.region = Some("East-US".into());
            }),
            None,
            &WORKSPACE_DEFAULTS,
        );
        assert_eq!(params.workspace_scope().unwrap(), ("S", "East-US"));
    }

    #[test]
    fn toml_config_accepts_camel_and_snake_case() {
        let camel = ConnectionConfig::from_toml_str(
            r#"
            subscriptionId = "sub-1"
            region = "East-US"
            appIdUri = "https://management.core.windows.net/"
            "#,
        )
        .unwrap();
        let snake = ConnectionConfig::from_toml_str(
            r#"
            subscription_id = "sub-1"
            region = "East-US"
            app_id_uri = "https://management.core.windows.net/"
            "#,
        )
        .unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.subscription_id.as_deref(), Some("sub-1"));
        assert!(camel.username.is_none());
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        let err = ConnectionConfig::from_toml_str("region = 42").unwrap_err();
        assert!(matches!(err, OmsError::Config { source: Some(_), .. }));
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let err = ConnectionConfig::from_toml_file("/nonexistent/azure-oms.toml").unwrap_err();
        assert!(matches!(err, OmsError::Config { .. }));
        assert!(err.to_string().contains("/nonexistent/azure-oms.toml"));
    }

    #[test]
    fn config_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("conn.toml");
        std::fs::write(&file, "domain = \"contoso.onmicrosoft.com\"\nworkspace = \"ops\"\n").unwrap();
        let config = ConnectionConfig::from_toml_file(&file).unwrap();
        assert_eq!(config.domain.as_deref(), Some("contoso.onmicrosoft.com"));
        assert_eq!(config.workspace.as_deref(), Some("ops"));
    }

    fn field() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[a-z0-9-]{0,8}")
    }

    fn connection_config() -> impl Strategy<Value = ConnectionConfig> {
        (
            field(),
            field(),
            field(),
            field(),
            field(),
            field(),
            field(),
            field(),
            field(),
            field(),
        )
            .prop_map(
                |(
                    username,
                    password,
                    domain,
                    app_id_uri,
                    client_id,
                    secret,
                    api_version,
                    subscription_id,
                    region,
                    workspace,
                )| ConnectionConfig {
                    username,
                    password,
                    domain,
                    app_id_uri,
                    client_id,
                    secret,
                    api_version,
                    subscription_id,
                    region,
                    workspace,
                },
            )
    }

    proptest! {
        #[test]
        fn precedence_holds_for_every_field(
            explicit in connection_config(),
            config in proptest::option::of(connection_config()),
        ) {
            let params = resolve(&explicit, config.as_ref(), &WORKSPACE_DEFAULTS);
            let base = config.clone().unwrap_or_default();
            let merged = |e: &Option<String>, c: &Option<String>| e.clone().or_else(|| c.clone());

            prop_assert_eq!(params.username, merged(&explicit.username, &base.username));
            prop_assert_eq!(params.password, merged(&explicit.password, &base.password));
            prop_assert_eq!(params.domain, merged(&explicit.domain, &base.domain));
            prop_assert_eq!(params.secret, merged(&explicit.secret, &base.secret));
            prop_assert_eq!(
                params.subscription_id,
                merged(&explicit.subscription_id, &base.subscription_id)
            );
            prop_assert_eq!(params.region, merged(&explicit.region, &base.region));
            prop_assert_eq!(params.workspace, merged(&explicit.workspace, &base.workspace));
            prop_assert_eq!(
                params.api_version,
                merged(&explicit.api_version, &base.api_version)
                    .unwrap_or_else(|| WORKSPACE_DEFAULTS.api_version.to_string())
            );
            prop_assert_eq!(
                params.app_id_uri,
                merged(&explicit.app_id_uri, &base.app_id_uri)
                    .unwrap_or_else(|| DEFAULT_APP_ID_URI.to_string())
            );
            prop_assert_eq!(
                params.client_id,
                merged(&explicit.client_id, &base.client_id)
                    .unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string())
            );
        }
    }
}
