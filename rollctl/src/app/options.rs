//! Deployment configuration options

use std::collections::HashMap;
use std::time::Duration;

use url::Url;

use crate::deploy::poller;
use crate::errors::DeployError;
use crate::http::client::RetryOptions;
use crate::logs::LogLevel;

/// Environment variable consulted when `--region=` is explicitly empty
pub const DEFAULT_REGION_ENV: &str = "ROLLCTL_DEFAULT_REGION";

/// Immutable, validated configuration for one deployment invocation
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Target service name
    pub service: String,

    /// Task definition family (defaults to the service name)
    pub family: String,

    /// Cluster name
    pub cluster: String,

    /// Region used to derive the default API endpoints
    pub region: String,

    /// New container image, when this deploy changes the image
    pub image: Option<ImageOptions>,

    /// New desired count; `None` leaves the count unchanged
    pub count: Option<i64>,

    /// Skip convergence polling after the update
    pub nowait: bool,

    /// Run the pre-flight latest-definition check before mutating
    pub require_latest: bool,

    /// Canary flow configuration; `None` selects the direct-update flow
    pub canary: Option<CanaryOptions>,

    /// Orchestration API base URL
    pub orchestrator_url: String,

    /// Canary deployer API base URL
    pub canary_url: String,

    /// Convergence poller options
    pub poller: poller::Options,

    /// Gateway retry policy
    pub retry: RetryOptions,

    /// Log level for stderr diagnostics
    pub log_level: LogLevel,

    /// Emit JSON-formatted logs
    pub json_logs: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            service: String::new(),
            family: String::new(),
            cluster: "default".to_string(),
            region: "us-east-1".to_string(),
            image: None,
            count: None,
            nowait: false,
            require_latest: true,
            canary: None,
            orchestrator_url: orchestrator_url_for("us-east-1"),
            canary_url: canary_url_for("us-east-1"),
            poller: poller::Options::default(),
            retry: RetryOptions::default(),
            log_level: LogLevel::default(),
            json_logs: false,
        }
    }
}

/// Target image for the registrar
#[derive(Debug, Clone)]
pub struct ImageOptions {
    /// Image repository; containers matching this prefix are rewritten
    pub repository: String,

    /// Image tag
    pub tag: String,
}

/// Canary flow configuration
#[derive(Debug, Clone)]
pub struct CanaryOptions {
    /// Canary deployer application name
    pub application: String,

    /// Deployment group within the application
    pub deployment_group: String,

    /// Container port exposed to the load balancer
    pub port: u16,
}

impl DeployOptions {
    /// Build validated options from parsed `--key=value` arguments.
    ///
    /// `default_region` is the environment fallback used when `--region=` is
    /// explicitly empty. All validation happens here, before any network
    /// call.
    pub fn from_args(
        args: &HashMap<String, String>,
        default_region: Option<String>,
    ) -> Result<Self, DeployError> {
        let service = non_empty(args, "service")
            .ok_or_else(|| DeployError::ConfigError("service name is required".to_string()))?;

        let family = non_empty(args, "task").unwrap_or_else(|| service.clone());

        let cluster = non_empty(args, "cluster").unwrap_or_else(|| "default".to_string());

        let region = match args.get("region") {
            Some(region) if region.is_empty() => default_region
                .filter(|r| !r.is_empty())
                .ok_or_else(|| {
                    DeployError::ConfigError(format!(
                        "--region is empty and {} is not set",
                        DEFAULT_REGION_ENV
                    ))
                })?,
            Some(region) => region.clone(),
            None => "us-east-1".to_string(),
        };

        let image = match (non_empty(args, "image"), non_empty(args, "tag")) {
            (Some(repository), Some(tag)) => Some(ImageOptions { repository, tag }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(DeployError::ConfigError(
                    "--tag is required when --image is set".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(DeployError::ConfigError(
                    "--image is required when --tag is set".to_string(),
                ))
            }
        };

        let count = match args.get("count") {
            Some(raw) => {
                let count: i64 = raw.parse().map_err(|_| {
                    DeployError::ConfigError(format!("invalid --count: {}", raw))
                })?;
                match count {
                    // -1 is the "leave unchanged" sentinel
                    -1 => None,
                    c if c >= 0 => Some(c),
                    c => {
                        return Err(DeployError::ConfigError(format!("invalid --count: {}", c)))
                    }
                }
            }
            None => None,
        };

        let nowait = parse_bool(args, "nowait", false)?;
        let require_latest = parse_bool(args, "require-latest", true)?;

        let canary = if parse_bool(args, "canary", false)? {
            let application = non_empty(args, "app").ok_or_else(|| {
                DeployError::ConfigError("--app is required for canary deployments".to_string())
            })?;
            let deployment_group = non_empty(args, "deploygroup").ok_or_else(|| {
                DeployError::ConfigError(
                    "--deploygroup is required for canary deployments".to_string(),
                )
            })?;
            let port = non_empty(args, "port")
                .ok_or_else(|| {
                    DeployError::ConfigError(
                        "--port is required for canary deployments".to_string(),
                    )
                })?
                .parse::<u16>()
                .map_err(|_| {
                    DeployError::ConfigError(format!(
                        "invalid --port: {}",
                        args.get("port").cloned().unwrap_or_default()
                    ))
                })?;
            Some(CanaryOptions {
                application,
                deployment_group,
                port,
            })
        } else {
            None
        };

        if canary.is_some() && image.is_none() {
            return Err(DeployError::ConfigError(
                "canary deployments require --image and --tag".to_string(),
            ));
        }
        if image.is_none() && count.is_none() {
            return Err(DeployError::ConfigError(
                "nothing to deploy: provide --image/--tag or --count".to_string(),
            ));
        }

        let mut poller = poller::Options::default();
        if let Some(raw) = args.get("interval") {
            poller.interval = Duration::from_secs(parse_seconds(raw, "interval")?);
        }
        if let Some(raw) = args.get("timeout") {
            poller.timeout = Some(Duration::from_secs(parse_seconds(raw, "timeout")?));
        }

        let orchestrator_url =
            non_empty(args, "orchestrator-url").unwrap_or_else(|| orchestrator_url_for(&region));
        let canary_url = non_empty(args, "canary-url").unwrap_or_else(|| canary_url_for(&region));
        for url in [orchestrator_url.as_str(), canary_url.as_str()] {
            Url::parse(url).map_err(|e| {
                DeployError::ConfigError(format!("invalid API URL {}: {}", url, e))
            })?;
        }

        let log_level = match args.get("log-level") {
            Some(raw) => raw.parse::<LogLevel>().map_err(DeployError::ConfigError)?,
            None => LogLevel::default(),
        };
        let json_logs = parse_bool(args, "json-logs", false)?;

        Ok(Self {
            service,
            family,
            cluster,
            region,
            image,
            count,
            nowait,
            require_latest,
            canary,
            orchestrator_url,
            canary_url,
            poller,
            retry: RetryOptions::default(),
            log_level,
            json_logs,
        })
    }
}

fn orchestrator_url_for(region: &str) -> String {
    format!("https://orchestrator.{}.fleetops.dev/v1", region)
}

fn canary_url_for(region: &str) -> String {
    format!("https://canary.{}.fleetops.dev/v1", region)
}

fn non_empty(args: &HashMap<String, String>, key: &str) -> Option<String> {
    args.get(key).filter(|v| !v.is_empty()).cloned()
}

fn parse_bool(
    args: &HashMap<String, String>,
    key: &str,
    default: bool,
) -> Result<bool, DeployError> {
    match args.get(key).map(String::as_str) {
        None => Ok(default),
        // A bare `--flag` arrives as "true"
        Some("true") | Some("1") | Some("") => Ok(true),
        Some("false") | Some("0") => Ok(false),
        Some(other) => Err(DeployError::ConfigError(format!(
            "invalid boolean for --{}: {}",
            key, other
        ))),
    }
}

fn parse_seconds(raw: &str, flag: &str) -> Result<u64, DeployError> {
    match raw.parse::<u64>() {
        Ok(secs) if secs >= 1 => Ok(secs),
        _ => Err(DeployError::ConfigError(format!(
            "invalid --{}: {}",
            flag, raw
        ))),
    }
}
