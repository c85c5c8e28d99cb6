//! Service update application

use tracing::info;

use crate::errors::DeployError;
use crate::http::orchestration::OrchestrationApi;
use crate::models::service::ServiceUpdate;

/// Issue the single update call pointing the service at a new task definition
/// and/or desired count. Fields left as `None` never reach the wire, so the
/// orchestrator leaves them unchanged.
pub async fn apply(
    orchestration: &dyn OrchestrationApi,
    cluster: &str,
    service: &str,
    update: ServiceUpdate,
) -> Result<(), DeployError> {
    info!(
        "Updating service: desired_count={:?}, task_definition={:?}",
        update.desired_count, update.task_definition
    );
    orchestration.update_service(cluster, service, &update).await
}
