//! Pre-flight deployment safety check

use tracing::info;

use crate::errors::DeployError;
use crate::http::orchestration::OrchestrationApi;

/// Verify the service is in an unambiguous, fully-absorbed state before any
/// mutation: exactly one active deployment, already running the latest
/// registered task definition.
///
/// More than one deployment means a rollout is mid-flight and it is not
/// possible to tell from here whether it will succeed; a stale deployment
/// means the cluster has not absorbed the previous change yet. Both must be
/// resolved by an operator.
pub async fn check(
    orchestration: &dyn OrchestrationApi,
    cluster: &str,
    service: &str,
    family: &str,
) -> Result<(), DeployError> {
    let latest = orchestration.get_task_definition(family).await?;
    let latest_arn = latest.arn().ok_or_else(|| {
        DeployError::ApiError(format!("task definition {} has no arn", family))
    })?;

    let state = orchestration.describe_service(cluster, service).await?;
    if state.deployments.len() != 1 {
        return Err(DeployError::PreconditionFailed(format!(
            "not exactly one deployment found: {}",
            state.deployments.len()
        )));
    }

    let deployment = &state.deployments[0];
    if deployment.task_definition != latest_arn {
        return Err(DeployError::PreconditionFailed(format!(
            "latest task definition not running: {} is active, latest is {}",
            deployment.task_definition, latest_arn
        )));
    }

    info!("Latest task definition running: {}", latest_arn);
    Ok(())
}
