//! Orchestration API gateway

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::DeployError;
use crate::http::client::HttpClient;
use crate::models::service::{Service, ServiceUpdate};
use crate::models::task::TaskDefinition;

/// Orchestration API surface consumed by the deployment workflow.
///
/// Trait for testability: the workflow components never touch the wire
/// directly, and failures propagate as opaque errors without interpretation.
#[async_trait]
pub trait OrchestrationApi: Send + Sync {
    /// Get the latest registered revision for a task definition family
    async fn get_task_definition(&self, family: &str) -> Result<TaskDefinition, DeployError>;

    /// Register a new task definition revision, returning its ARN
    async fn register_task_definition(
        &self,
        definition: TaskDefinition,
    ) -> Result<String, DeployError>;

    /// Describe a service, including its active deployments (newest first)
    async fn describe_service(&self, cluster: &str, service: &str)
        -> Result<Service, DeployError>;

    /// Apply a desired count and/or task definition change to a service
    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        update: &ServiceUpdate,
    ) -> Result<(), DeployError>;
}

/// Single task definition response
#[derive(Debug, Clone, Deserialize)]
pub struct TaskDefinitionResponse {
    pub task_definition: TaskDefinition,
}

/// Service state response
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceResponse {
    pub service: Service,
}

#[async_trait]
impl OrchestrationApi for HttpClient {
    async fn get_task_definition(&self, family: &str) -> Result<TaskDefinition, DeployError> {
        let path = format!("/task-definitions/{}", family);
        let response: TaskDefinitionResponse = self.get(&path).await?;
        Ok(response.task_definition)
    }

    async fn register_task_definition(
        &self,
        definition: TaskDefinition,
    ) -> Result<String, DeployError> {
        let response: TaskDefinitionResponse = self.post("/task-definitions", &definition).await?;
        response
            .task_definition
            .task_definition_arn
            .ok_or_else(|| {
                DeployError::ApiError("register response missing task definition arn".to_string())
            })
    }

    async fn describe_service(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<Service, DeployError> {
        let path = format!("/clusters/{}/services/{}", cluster, service);
        let response: ServiceResponse = self.get(&path).await?;
        Ok(response.service)
    }

    async fn update_service(
        &self,
        cluster: &str,
        service: &str,
        update: &ServiceUpdate,
    ) -> Result<(), DeployError> {
        let path = format!("/clusters/{}/services/{}", cluster, service);
        let _: serde_json::Value = self.patch(&path, update).await?;
        Ok(())
    }
}
