//! Canary deployment creation

use tracing::info;

use crate::errors::DeployError;
use crate::http::canary::CanaryApi;
use crate::models::revision::{
    CanaryDeploymentRequest, Revision, RevisionSpec, REVISION_SPEC_VERSION,
};

/// Render the revision document binding a container and port to a task
/// definition, and hand it to the canary deployer.
///
/// The deployer owns progression from here; this path never polls.
pub async fn create(
    canary: &dyn CanaryApi,
    application: &str,
    deployment_group: &str,
    container_name: &str,
    container_port: u16,
    task_definition_arn: &str,
) -> Result<String, DeployError> {
    let spec = RevisionSpec {
        version: REVISION_SPEC_VERSION,
        task_definition_arn: task_definition_arn.to_string(),
        container_name: container_name.to_string(),
        container_port,
    };
    let request = CanaryDeploymentRequest {
        revision: Revision::from_spec(&spec)?,
    };

    let deployment_id = canary
        .create_deployment(application, deployment_group, &request)
        .await?;
    info!("Canary deployment created: {}", deployment_id);
    Ok(deployment_id)
}
