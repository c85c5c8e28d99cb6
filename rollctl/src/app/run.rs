//! Deployment orchestration flow

use std::future::Future;

use tracing::{info, Instrument};

use crate::app::options::DeployOptions;
use crate::deploy::poller::PollOutcome;
use crate::deploy::{canary, poller, preflight, registrar, updater};
use crate::errors::DeployError;
use crate::http::canary::CanaryApi;
use crate::http::orchestration::OrchestrationApi;
use crate::models::service::ServiceUpdate;

/// Run one deployment invocation.
///
/// Direct flow: optional preflight → register revision → update service →
/// poll to convergence (unless `nowait`). Canary flow: optional preflight →
/// register revision → submit to the canary deployer and stop.
///
/// Every diagnostic is emitted inside a `cluster`/`service` span. Any error
/// at any stage aborts the invocation.
pub async fn run(
    options: &DeployOptions,
    orchestration: &dyn OrchestrationApi,
    canary_api: &dyn CanaryApi,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DeployError> {
    let span = tracing::info_span!(
        "deploy",
        cluster = %options.cluster,
        service = %options.service,
    );

    run_impl(options, orchestration, canary_api, shutdown_signal)
        .instrument(span)
        .await
}

async fn run_impl(
    options: &DeployOptions,
    orchestration: &dyn OrchestrationApi,
    canary_api: &dyn CanaryApi,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DeployError> {
    if options.require_latest {
        preflight::check(
            orchestration,
            &options.cluster,
            &options.service,
            &options.family,
        )
        .await?;
    }

    let new_arn = match &options.image {
        Some(image) => Some(
            registrar::register_revision(
                orchestration,
                &options.family,
                &image.repository,
                &image.tag,
            )
            .await?,
        ),
        None => None,
    };

    if let Some(canary_options) = &options.canary {
        // Validated at configuration time; the canary flow cannot run
        // without a freshly registered revision.
        let arn = new_arn.as_deref().ok_or_else(|| {
            DeployError::ConfigError("canary deployments require --image and --tag".to_string())
        })?;
        canary::create(
            canary_api,
            &canary_options.application,
            &canary_options.deployment_group,
            &options.service,
            canary_options.port,
            arn,
        )
        .await?;
        return Ok(());
    }

    updater::apply(
        orchestration,
        &options.cluster,
        &options.service,
        ServiceUpdate {
            desired_count: options.count,
            task_definition: new_arn.clone(),
        },
    )
    .await?;

    if options.nowait {
        info!("Not waiting for convergence (--nowait)");
        return Ok(());
    }

    let outcome = poller::run(
        &options.poller,
        orchestration,
        &options.cluster,
        &options.service,
        new_arn.as_deref(),
        tokio::time::sleep,
        Box::pin(shutdown_signal),
    )
    .await?;

    match outcome {
        PollOutcome::Converged => Ok(()),
        PollOutcome::TimedOut => Err(DeployError::Timeout(
            "service did not converge before the timeout".to_string(),
        )),
        PollOutcome::Cancelled => Err(DeployError::Cancelled(
            "shutdown requested before the service converged".to_string(),
        )),
    }
}
