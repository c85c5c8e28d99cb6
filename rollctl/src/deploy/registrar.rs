//! Task definition registration

use tracing::{info, warn};

use crate::errors::DeployError;
use crate::http::orchestration::OrchestrationApi;
use crate::models::task::TaskDefinition;

/// Rewrite the image of every container whose image repository starts with
/// `repository`. Non-matching containers pass through untouched.
pub fn rewrite_images(mut definition: TaskDefinition, repository: &str, tag: &str) -> TaskDefinition {
    for container in &mut definition.container_definitions {
        if container.repository().starts_with(repository) {
            container.image = format!("{}:{}", repository, tag);
        }
    }
    definition
}

/// Fetch the latest revision of `family`, rewrite matching container images
/// to `repository:tag`, and register the result as a new revision.
///
/// Every attribute of the fetched definition other than the rewritten images
/// is re-registered unchanged. Returns the new revision's ARN.
pub async fn register_revision(
    orchestration: &dyn OrchestrationApi,
    family: &str,
    repository: &str,
    tag: &str,
) -> Result<String, DeployError> {
    let current = orchestration.get_task_definition(family).await?;

    let matched = current
        .container_definitions
        .iter()
        .filter(|c| c.repository().starts_with(repository))
        .count();
    if matched == 0 {
        // A no-op revision is still valid; whether the image actually changed
        // has to be verified externally.
        warn!(
            "No containers in family {} match repository {}",
            family, repository
        );
    }

    let input = rewrite_images(current, repository, tag).into_register_input();
    let arn = orchestration.register_task_definition(input).await?;
    info!("Registered task definition revision: {}", arn);
    Ok(arn)
}
