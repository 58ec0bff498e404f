//! Async Rust client for Azure AD tokens, the Azure management REST API,
//! and Operational Insights (OMS) workspaces.
//!
//! Every call is self-contained: resolve parameters, acquire one token,
//! send one request. Nothing is cached and nothing is retried.
//!
//! # Modules
//!
//! - [`auth`] — credential-flow selection and Azure AD token exchange.
//! - [`client`] — authenticated request dispatcher (`RestClient`).
//! - [`config`] — connection parameters, defaults, and their resolution.
//! - [`error`] — typed error hierarchy (`OmsError`).
//! - [`session`] — the four caller-facing operations.
//! - [`workspace`] — OMS workspace list/get and search.
//!
//! # Quick Start
//!
//! ```ignore
//! use azure_oms::config::ConnectionConfig;
//! use azure_oms::session::AzureSession;
//! use azure_oms::workspace::Workspace;
//!
//! let session = AzureSession::new()?;
//! let args = ConnectionConfig {
//!     domain: Some("contoso.onmicrosoft.com".into()),
//!     client_id: Some("app-id".into()),
//!     secret: Some("secret".into()),
//!     subscription_id: Some("sub-id".into()),
//!     region: Some("East-US".into()),
//!     ..Default::default()
//! };
//! let workspaces: Vec<Workspace> = session.get_workspace(&args, None).await?;
//! ```

#![warn(missing_docs)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod workspace;
