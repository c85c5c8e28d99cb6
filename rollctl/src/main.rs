//! rollctl - Entry Point
//!
//! Drives a rolling or canary deployment of a containerized service:
//! registers a task definition revision with a new container image, points
//! the service at it, and waits for the cluster to converge.

use std::collections::HashMap;
use std::env;

use colored::Colorize;
use secrecy::SecretString;
use tracing::{error, info};

use rollctl::app::options::{DeployOptions, DEFAULT_REGION_ENV};
use rollctl::app::run::run;
use rollctl::errors::DeployError;
use rollctl::http::client::HttpClient;
use rollctl::logs::{init_logging, LogOptions};
use rollctl::utils::version_info;

/// Environment variable holding the opaque API bearer token
const API_TOKEN_ENV: &str = "ROLLCTL_API_TOKEN";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        println!("{}", serde_json::to_string_pretty(&version_info()).unwrap());
        return;
    }

    if cli_args.contains_key("help") {
        print_usage();
        return;
    }

    // Validate configuration before touching the network
    let options = match DeployOptions::from_args(&cli_args, env::var(DEFAULT_REGION_ENV).ok()) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{} {}", "error:".red(), e);
            print_usage();
            std::process::exit(1);
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: options.log_level.clone(),
        json_format: options.json_logs,
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let api_token = env::var(API_TOKEN_ENV).ok().map(SecretString::from);
    let (orchestration, canary) = match build_clients(&options, api_token) {
        Ok(clients) => clients,
        Err(e) => {
            error!("Failed to construct API clients: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Deploying {}/{} (task family {})",
        options.cluster, options.service, options.family
    );

    match run(&options, &orchestration, &canary, await_shutdown_signal()).await {
        Ok(()) => {
            info!("Update service success");
            eprintln!("{}", "deploy complete".green());
        }
        Err(e) => {
            error!("Deploy failed: {}", e);
            eprintln!("{} {}", "error:".red(), e);
            std::process::exit(1);
        }
    }
}

fn build_clients(
    options: &DeployOptions,
    api_token: Option<SecretString>,
) -> Result<(HttpClient, HttpClient), DeployError> {
    let orchestration = HttpClient::new(
        &options.orchestrator_url,
        api_token.clone(),
        options.retry.clone(),
    )?;
    let canary = HttpClient::new(&options.canary_url, api_token, options.retry.clone())?;
    Ok((orchestration, canary))
}

fn print_usage() {
    eprintln!("Usage: rollctl --service=<name> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --service=<name>        Name of service to update. Required.");
    eprintln!("  --task=<family>         Task definition family. Defaults to the service name.");
    eprintln!("  --image=<repository>    Container image repository to roll out.");
    eprintln!("  --tag=<tag>             Container image tag to roll out.");
    eprintln!("  --cluster=<name>        Cluster name. Defaults to \"default\".");
    eprintln!("  --region=<region>       API region. Defaults to \"us-east-1\";");
    eprintln!("                          --region= falls back to {}.", DEFAULT_REGION_ENV);
    eprintln!("  --count=<n>             Desired count. -1 (default) leaves it unchanged.");
    eprintln!("  --nowait                Skip waiting for convergence.");
    eprintln!("  --require-latest=<bool> Pre-flight check that the latest task definition");
    eprintln!("                          is running. Defaults to true.");
    eprintln!("  --canary                Hand the revision to the canary deployer instead");
    eprintln!("                          of updating the service directly.");
    eprintln!("  --app=<name>            Canary application name (canary only).");
    eprintln!("  --deploygroup=<name>    Canary deployment group (canary only).");
    eprintln!("  --port=<port>           Container port (canary only).");
    eprintln!("  --interval=<secs>       Convergence poll interval. Defaults to 5.");
    eprintln!("  --timeout=<secs>        Give up on convergence after this long.");
    eprintln!("  --orchestrator-url=<u>  Override the orchestration API endpoint.");
    eprintln!("  --canary-url=<u>        Override the canary deployer endpoint.");
    eprintln!("  --log-level=<level>     trace|debug|info|warn|error. Defaults to info.");
    eprintln!("  --json-logs             Emit JSON-formatted logs.");
    eprintln!("  --version               Print version information and exit.");
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).unwrap();
        let mut sigint = signal(SignalKind::interrupt()).unwrap();

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
        info!("Ctrl+C received, shutting down...");
    }
}
