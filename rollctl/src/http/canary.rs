//! Canary deployer API gateway

use async_trait::async_trait;

use crate::errors::DeployError;
use crate::http::client::HttpClient;
use crate::models::revision::{CanaryDeploymentRequest, CanaryDeploymentResponse};

/// Canary deployer API surface.
///
/// One operation: submit a deployment revision. The deployer owns the
/// rollout's lifecycle after submission.
#[async_trait]
pub trait CanaryApi: Send + Sync {
    /// Submit a deployment revision, returning the created deployment id
    async fn create_deployment(
        &self,
        application: &str,
        deployment_group: &str,
        request: &CanaryDeploymentRequest,
    ) -> Result<String, DeployError>;
}

#[async_trait]
impl CanaryApi for HttpClient {
    async fn create_deployment(
        &self,
        application: &str,
        deployment_group: &str,
        request: &CanaryDeploymentRequest,
    ) -> Result<String, DeployError> {
        let path = format!(
            "/applications/{}/deployment-groups/{}/deployments",
            application, deployment_group
        );
        let response: CanaryDeploymentResponse = self.post(&path, request).await?;
        Ok(response.deployment_id)
    }
}
