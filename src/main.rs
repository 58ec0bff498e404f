//! CLI entry point for azure-oms.
//!
//! Subcommands map one-to-one onto the session operations:
//! `token`, `workspace`, `search`, `invoke`. Connection parameters come from
//! flags (secrets may come from environment variables) and an optional TOML
//! file given by `--config`; flags win over the file.
//!
//! Exit codes:
//! - 0: success
//! - 1: runtime error (configuration, auth failure, API error, etc.)
//! - 2: argument validation error (clap handles this automatically)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use azure_oms::client::HttpMethod;
use azure_oms::config::ConnectionConfig;
use azure_oms::error::Result;
use azure_oms::session::AzureSession;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionFlags,

    #[command(subcommand)]
    command: Commands,
}

/// Connection parameters shared by every subcommand.
#[derive(clap::Args)]
struct ConnectionFlags {
    /// TOML file with connection parameters. Flags override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Azure AD user name. When set, the username/password flow is used.
    #[arg(long, global = true)]
    username: Option<String>,

    /// Password for --username. Prefer the AZURE_AD_PASSWORD environment
    /// variable to keep it out of shell history.
    #[arg(long, global = true, env = "AZURE_AD_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Azure AD domain, e.g. contoso.onmicrosoft.com (client-secret flow).
    #[arg(long, global = true)]
    domain: Option<String>,

    /// Resource the token is requested for.
    #[arg(long, global = true)]
    app_id_uri: Option<String>,

    /// Application (client) id.
    #[arg(long, global = true)]
    client_id: Option<String>,

    /// Client secret. Prefer the AZURE_CLIENT_SECRET environment variable.
    #[arg(long, global = true, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    secret: Option<String>,

    /// Value of the api-version query parameter.
    #[arg(long, global = true)]
    api_version: Option<String>,

    /// Azure subscription id (workspace and search).
    #[arg(long, global = true)]
    subscription_id: Option<String>,

    /// Region of the OI-Default-{region} resource group (workspace and search).
    #[arg(long, global = true)]
    region: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire a token and print the Authorization header value.
    Token,

    /// List the OMS workspaces of a region, or get one by name.
    Workspace {
        /// Workspace name. Omit to list all.
        #[arg(long)]
        workspace: Option<String>,
    },

    /// Run a log search query against an OMS workspace.
    Search {
        /// Workspace name (may also come from --config).
        #[arg(long)]
        workspace: Option<String>,

        /// Log search query, e.g. "Type:Alert".
        #[arg(long)]
        query: String,
    },

    /// Send an authenticated request to any management or directory URI.
    Invoke {
        /// Absolute URI without query string.
        #[arg(long)]
        uri: String,

        /// HTTP method: GET, POST, PUT, DELETE or PATCH.
        #[arg(long, default_value = "GET")]
        method: HttpMethod,

        /// JSON body sent verbatim with non-GET methods.
        #[arg(long)]
        body: Option<String>,
    },
}

impl ConnectionFlags {
    /// Explicit arguments as a connection bag. `workspace` comes from the
    /// subcommand, not from the shared flags.
    fn explicit(&self, workspace: Option<String>) -> ConnectionConfig {
        ConnectionConfig {
            username: self.username.clone(),
            password: self.password.clone(),
            domain: self.domain.clone(),
            app_id_uri: self.app_id_uri.clone(),
            client_id: self.client_id.clone(),
            secret: self.secret.clone(),
            api_version: self.api_version.clone(),
            subscription_id: self.subscription_id.clone(),
            region: self.region.clone(),
            workspace,
        }
    }

    fn bulk(&self) -> Result<Option<ConnectionConfig>> {
        self.config
            .as_ref()
            .map(ConnectionConfig::from_toml_file)
            .transpose()
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let bulk = cli.connection.bulk()?;
    let session = AzureSession::new()?;

    match cli.command {
        Commands::Token => {
            let header = session
                .get_token(&cli.connection.explicit(None), bulk.as_ref())
                .await?;
            println!("{}", header.as_str());
        }
        Commands::Workspace { workspace } => {
            let workspaces: Vec<Value> = session
                .get_workspace(&cli.connection.explicit(workspace), bulk.as_ref())
                .await?;
            print_json(&workspaces)?;
        }
        Commands::Search { workspace, query } => {
            let results: Vec<Value> = session
                .search_workspace(&cli.connection.explicit(workspace), bulk.as_ref(), &query)
                .await?;
            print_json(&results)?;
        }
        Commands::Invoke { uri, method, body } => {
            let response = session
                .invoke_method(
                    &cli.connection.explicit(None),
                    bulk.as_ref(),
                    &uri,
                    method,
                    body.as_deref(),
                )
                .await?;
            print_json(&response)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
