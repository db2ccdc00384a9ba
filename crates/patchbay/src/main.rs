use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use patchbay::{
    CloudflareClient, Command, LocationCatalog, Orchestrator, Settings, SshProxyHost,
};
use patchbay_store::RecordStore;

/// Provision DNS records and reverse-proxy routes for subdomains of a
/// managed domain
#[derive(Parser, Debug)]
#[command(name = "patchbay")]
#[command(about = "Provision DNS records and reverse-proxy routes for a managed domain")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "patchbay.toml")]
    config: String,

    /// Identity recorded as the owner of created records
    #[arg(long, env = "PATCHBAY_OWNER")]
    owner: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// List proxy server locations
    Locations,

    /// Create a new proxy route. Example: patchbay proxy us-iad myservice 100.64.0.1:80
    Proxy {
        location: String,
        hostname: String,
        ip_port: String,
    },

    /// Create a new DNS record. Example: patchbay dns myservice 100.64.0.1
    Dns { hostname: String, ip: String },

    /// List proxies and DNS records that you have created
    List,

    /// List all proxies and DNS records created by all users
    ListAll,

    /// Delete a proxy route. Example: patchbay delete us-iad myservice
    Delete { location: String, hostname: String },

    /// Delete a DNS record. Example: patchbay delete-dns myservice
    DeleteDns { hostname: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("patchbay=info".parse()?)
                .add_directive("patchbay_store=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Load and resolve configuration (resolves credential references)
    let settings = Settings::load_and_resolve(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config))?;

    tracing::info!("Managed domain: {}.{}", settings.subdomain, settings.domain);
    tracing::info!(
        "Remote host key policy: {}",
        settings.remote.host_key_policy
    );

    // Process-scoped resources, acquired once and injected
    let catalog = LocationCatalog::load(&settings.locations_path).with_context(|| {
        format!(
            "Failed to load location catalog from {}",
            settings.locations_path.display()
        )
    })?;

    let store = RecordStore::open(&settings.store_path).with_context(|| {
        format!(
            "Failed to open record store at {}",
            settings.store_path.display()
        )
    })?;

    let dns = Arc::new(CloudflareClient::new(
        &settings.cloudflare.api_token,
        &settings.cloudflare.zone_id,
    ));

    let remote = Arc::new(SshProxyHost::new(
        &settings.remote.user,
        &settings.remote.config_dir,
        &settings.remote.service,
        settings.remote.host_key_policy,
    ));

    let orchestrator = Orchestrator::new(
        catalog,
        dns,
        remote,
        store,
        &settings.domain,
        &settings.subdomain,
    );

    let command = build_command(&cli)?;

    match orchestrator.dispatch(command).await {
        Ok(reply) => {
            println!("{}", reply);
            Ok(())
        }
        // Rejections are replies to the user, not failures of the tool
        Err(e) if e.is_rejection() => {
            println!("{}", e);
            Ok(())
        }
        Err(e) => Err(e).context("Command failed"),
    }
}

/// Map CLI arguments onto an orchestrator command
fn build_command(cli: &Cli) -> Result<Command> {
    let owner = || {
        cli.owner
            .clone()
            .context("Owner identity required. Use --owner or set PATCHBAY_OWNER")
    };

    let command = match &cli.command {
        CliCommand::Locations => Command::Locations,
        CliCommand::Proxy {
            location,
            hostname,
            ip_port,
        } => Command::CreateProxy {
            owner: owner()?,
            location: location.clone(),
            hostname: hostname.clone(),
            ip_port: ip_port.clone(),
        },
        CliCommand::Dns { hostname, ip } => Command::CreateDns {
            owner: owner()?,
            hostname: hostname.clone(),
            ip: ip.clone(),
        },
        CliCommand::List => Command::ListOwn { owner: owner()? },
        CliCommand::ListAll => Command::ListAll,
        CliCommand::Delete { location, hostname } => Command::DeleteProxy {
            owner: owner()?,
            location: location.clone(),
            hostname: hostname.clone(),
        },
        CliCommand::DeleteDns { hostname } => Command::DeleteDns {
            owner: owner()?,
            hostname: hostname.clone(),
        },
    };

    Ok(command)
}
