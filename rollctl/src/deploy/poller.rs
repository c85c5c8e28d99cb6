//! Convergence polling worker

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::errors::DeployError;
use crate::http::orchestration::OrchestrationApi;
use crate::models::service::{Deployment, Service};

/// Poller options
#[derive(Debug, Clone)]
pub struct Options {
    /// Polling interval
    pub interval: Duration,

    /// Maximum time to wait for convergence; `None` polls until converged
    pub timeout: Option<Duration>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: None,
        }
    }
}

/// Poll state for the watched deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Running count has not reached desired count
    Waiting,

    /// Running count equals desired count; terminal
    Converged,
}

/// How a poll loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The watched deployment converged
    Converged,

    /// The timeout elapsed before convergence
    TimedOut,

    /// The shutdown signal fired before convergence
    Cancelled,
}

/// Observe a deployment and derive the poll state.
///
/// Convergence is running == desired; the pending count never participates.
pub fn observe(deployment: &Deployment) -> PollState {
    if deployment.running_count == deployment.desired_count {
        PollState::Converged
    } else {
        PollState::Waiting
    }
}

/// Select the deployment to watch: the one rolling toward `target_arn` when
/// given, otherwise the newest deployment in the list.
fn watched<'a>(service: &'a Service, target_arn: Option<&str>) -> Option<&'a Deployment> {
    match target_arn {
        Some(arn) => service
            .deployments
            .iter()
            .find(|d| d.task_definition == arn),
        None => service.deployments.first(),
    }
}

/// Run the convergence poll loop.
///
/// Polls the service on a fixed interval until the watched deployment's
/// running count equals its desired count. The timeout is expressed as a
/// tick budget derived from the interval, so an injected `sleep_fn` keeps
/// the loop deterministic under test. Gateway errors abort the loop.
pub async fn run<S, F>(
    options: &Options,
    orchestration: &dyn OrchestrationApi,
    cluster: &str,
    service: &str,
    target_arn: Option<&str>,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) -> Result<PollOutcome, DeployError>
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Waiting for service to converge...");

    let max_ticks = options.timeout.map(|timeout| {
        (timeout.as_secs_f64() / options.interval.as_secs_f64())
            .ceil()
            .max(1.0) as u64
    });
    let mut ticks: u64 = 0;

    loop {
        if let Some(max) = max_ticks {
            if ticks >= max {
                warn!("Service did not converge within {} ticks", ticks);
                return Ok(PollOutcome::TimedOut);
            }
        }

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Shutdown requested, abandoning convergence wait");
                return Ok(PollOutcome::Cancelled);
            }
            _ = sleep_fn(options.interval) => {
                // Continue with poll
            }
        }
        ticks += 1;

        let state = orchestration.describe_service(cluster, service).await?;
        let deployment = match watched(&state, target_arn) {
            Some(deployment) => deployment,
            None => {
                // The new deployment may not be visible yet.
                debug!("Target deployment not listed yet");
                continue;
            }
        };

        info!(
            "--> desired: {}, pending: {}, running: {}",
            deployment.desired_count, deployment.pending_count, deployment.running_count
        );

        if observe(deployment) == PollState::Converged {
            info!("Deployment converged");
            return Ok(PollOutcome::Converged);
        }
    }
}
