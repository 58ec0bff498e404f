//! Operational Insights (OMS) workspace operations.
//!
//! OMS workspaces live in a per-region resource group that follows the
//! `OI-Default-{region}` naming convention:
//!
//! ```text
//! {management}/subscriptions/{sub}/resourcegroups/OI-Default-{region}
//!     /providers/Microsoft.OperationalInsights/workspaces[/{workspace}[/search]]
//! ```
//!
//! - [`list_or_get_workspace`] — GET all workspaces in the group, or one
//!   workspace by name.
//! - [`search_workspace`] — POST a log search query to one workspace.
//!
//! Both functions take an already-acquired [`AuthorizationHeader`] and
//! always return a sequence. Collection responses (`{"value": [...]}`) are
//! unwrapped; a single resource comes back as a one-element sequence.
//! See [`normalize_collection`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthorizationHeader;
use crate::client::{HttpMethod, RequestDescriptor, RestClient};
use crate::error::{OmsError, Result};

const PROVIDER: &str = "Microsoft.OperationalInsights";

// ── Response types ─────────────────────────────────────────────────────

/// An OMS workspace as returned by the management API.
///
/// Only `name` is guaranteed; the rest depends on API version and
/// provisioning state. Unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Full ARM resource id.
    #[serde(default)]
    pub id: Option<String>,

    /// Workspace name.
    pub name: String,

    /// Resource type, `Microsoft.OperationalInsights/workspaces`.
    #[serde(rename = "type", default)]
    pub resource_type: Option<String>,

    /// Azure location (e.g. `"East US"`).
    #[serde(default)]
    pub location: Option<String>,

    /// Resource tags.
    #[serde(default)]
    pub tags: Option<serde_json::Map<String, Value>>,

    /// Workspace-specific properties.
    #[serde(default)]
    pub properties: Option<WorkspaceProperties>,
}

/// The `properties` block of a [`Workspace`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceProperties {
    /// Workspace (customer) id used by agents to report data.
    #[serde(default)]
    pub customer_id: Option<String>,

    /// `Creating`, `Succeeded`, `Failed`, ...
    #[serde(default)]
    pub provisioning_state: Option<String>,

    /// Origin of the workspace, e.g. `"Azure"` or `"External"`.
    #[serde(default)]
    pub source: Option<String>,

    /// Link to the workspace in the OMS portal.
    #[serde(default)]
    pub portal_url: Option<String>,

    /// Pricing tier.
    #[serde(default)]
    pub sku: Option<Value>,
}

/// Request body for the search endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchRequest<'a> {
    /// Log search query, e.g. `"Type:Alert"`.
    pub query: &'a str,
}

// ── URL construction ───────────────────────────────────────────────────

/// Builds the workspace collection URL, or a single workspace's URL when
/// `workspace` is a non-empty name.
///
/// Each value becomes exactly one percent-encoded path segment, so a name
/// containing `/`, `?` or spaces cannot change the request target.
///
/// # Errors
///
/// - `OmsError::Config` — `management_url` is not an absolute base URL.
pub fn workspace_url(
    management_url: &str,
    subscription_id: &str,
    region: &str,
    workspace: Option<&str>,
) -> Result<String> {
    let mut url = reqwest::Url::parse(management_url).map_err(|e| OmsError::Config {
        message: format!("invalid management url '{management_url}'"),
        source: Some(Box::new(e)),
    })?;
    let resource_group = format!("OI-Default-{region}");
    {
        let mut segments = url.path_segments_mut().map_err(|()| {
            OmsError::config(format!("management url '{management_url}' cannot be a base"))
        })?;
        segments.pop_if_empty().extend([
            "subscriptions",
            subscription_id,
            "resourcegroups",
            resource_group.as_str(),
            "providers",
            PROVIDER,
            "workspaces",
        ]);
        if let Some(name) = workspace.filter(|name| !name.is_empty()) {
            segments.push(name);
        }
    }
    Ok(url.into())
}

/// Builds the search URL for one workspace.
///
/// # Errors
///
/// - `OmsError::Config` — `management_url` is not an absolute base URL.
pub fn search_url(
    management_url: &str,
    subscription_id: &str,
    region: &str,
    workspace: &str,
) -> Result<String> {
    let target = workspace_url(management_url, subscription_id, region, Some(workspace))?;
    Ok(format!("{target}/search"))
}

// ── Response normalization ─────────────────────────────────────────────

/// Flattens a decoded response into a sequence.
///
/// - `{"value": [...]}` → the inner array.
/// - `[...]` → its elements.
/// - `null` → empty.
/// - anything else → a one-element sequence holding the original value.
pub fn normalize_collection(response: Value) -> Vec<Value> {
    match response {
        Value::Object(mut map) if map.get("value").is_some_and(Value::is_array) => {
            match map.remove("value") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            }
        }
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn decode_items<T: DeserializeOwned>(response: Value) -> Result<Vec<T>> {
    normalize_collection(response)
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(OmsError::from))
        .collect()
}

// ── Endpoint functions ─────────────────────────────────────────────────

/// Lists every workspace in `OI-Default-{region}`, or fetches one when
/// `workspace` is a non-empty name. Absent and empty names behave the same.
///
/// # Errors
///
/// - `OmsError::Config` — the management URL cannot carry a path.
/// - `OmsError::Api` — non-success status (404 for an unknown workspace or
///   resource group, 403 for missing RBAC rights).
/// - `OmsError::Network` — transport-level failure.
/// - `OmsError::Parse` — a result item does not match `T`.
pub async fn list_or_get_workspace<T: DeserializeOwned>(
    client: &RestClient,
    token: &AuthorizationHeader,
    subscription_id: &str,
    region: &str,
    workspace: Option<&str>,
    api_version: &str,
) -> Result<Vec<T>> {
    let request = RequestDescriptor {
        uri: workspace_url(client.management_url(), subscription_id, region, workspace)?,
        method: HttpMethod::Get,
        api_version: api_version.to_string(),
        body: None,
        header: token.clone(),
        version_header: false,
    };
    decode_items(client.dispatch(&request).await?)
}

/// Runs a log search query against one workspace.
///
/// The body is produced by `serde_json`, so quotes, backslashes and control
/// characters in `query` are escaped.
///
/// # Errors
///
/// - `OmsError::Config` — the management URL cannot carry a path.
/// - `OmsError::Api` — non-success status (400 for a malformed query).
/// - `OmsError::Network` — transport-level failure.
/// - `OmsError::Parse` — a result item does not match `T`.
pub async fn search_workspace<T: DeserializeOwned>(
    client: &RestClient,
    token: &AuthorizationHeader,
    subscription_id: &str,
    workspace: &str,
    region: &str,
    api_version: &str,
    query: &str,
) -> Result<Vec<T>> {
    let request = RequestDescriptor {
        uri: search_url(client.management_url(), subscription_id, region, workspace)?,
        method: HttpMethod::Post,
        api_version: api_version.to_string(),
        body: Some(serde_json::to_string(&SearchRequest { query })?),
        header: token.clone(),
        version_header: false,
    };
    decode_items(client.dispatch(&request).await?)
}
