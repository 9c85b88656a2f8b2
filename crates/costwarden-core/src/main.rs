//! Costwarden CLI
//!
//! Serves the cost monitor and notification relay services.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use costwarden::api::{self, monitor_router, relay_router, MonitorState, RelayState};
use costwarden::config::LoggingConfig;
use costwarden::gcp::{
    BillingCostSource, FirestoreStateStore, PubSubPublisher, SecretStore, ServiceUsageClient,
    TokenProvider,
};
use costwarden::monitor::BudgetEvaluator;
use costwarden::relay::build_mailer;
use costwarden::Config;

/// Costwarden - Budget enforcement for GCP service spend
#[derive(Parser)]
#[command(name = "costwarden")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "COSTWARDEN_CONFIG")]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the cost monitor endpoint
    Monitor {
        /// HTTP port (overrides server.port)
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },

    /// Serve the notification relay endpoint
    Relay {
        /// HTTP port (overrides server.port)
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.logging, cli.verbose);

    let result = match cli.command {
        Commands::Monitor { port } => run_monitor(config, port).await,
        Commands::Relay { port } => run_relay(config, port).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.level.as_str() };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if config.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn http_client() -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?)
}

fn bind_addr(config: &Config, port: Option<u16>) -> String {
    format!(
        "{}:{}",
        config.server.host,
        port.unwrap_or(config.server.port)
    )
}

async fn run_monitor(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    let client = http_client()?;
    let token = Arc::new(TokenProvider::new(
        client.clone(),
        config.gcp.endpoints.metadata.clone(),
    ));

    let evaluator = BudgetEvaluator::new(
        config.budgets.clone(),
        Arc::new(BillingCostSource),
        Arc::new(ServiceUsageClient::new(
            client.clone(),
            token.clone(),
            config.gcp.endpoints.service_usage.clone(),
            config.gcp.project_id.clone(),
        )),
        Arc::new(PubSubPublisher::new(
            client.clone(),
            token.clone(),
            config.gcp.endpoints.pubsub.clone(),
            config.gcp.project_id.clone(),
            config.gcp.alert_topic.clone(),
        )),
        Arc::new(FirestoreStateStore::new(
            client,
            token,
            config.gcp.endpoints.firestore.clone(),
            config.gcp.project_id.clone(),
            config.gcp.state_collection.clone(),
        )),
    );

    let app = monitor_router(MonitorState {
        evaluator: Arc::new(evaluator),
    });

    let addr = bind_addr(&config, port);
    api::serve(app, &addr).await?;

    Ok(())
}

async fn run_relay(config: Config, port: Option<u16>) -> anyhow::Result<()> {
    let client = http_client()?;
    let token = Arc::new(TokenProvider::new(
        client.clone(),
        config.gcp.endpoints.metadata.clone(),
    ));
    let secrets = Arc::new(SecretStore::new(
        client.clone(),
        token,
        config.gcp.endpoints.secret_manager.clone(),
        config.gcp.project_id.clone(),
    ));

    let recipient = config.relay.recipient()?.to_string();
    let mailer = build_mailer(&config.relay, client, secrets)?;

    let app = relay_router(RelayState { mailer, recipient });

    let addr = bind_addr(&config, port);
    api::serve(app, &addr).await?;

    Ok(())
}
