//! Service and deployment state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A long-running declaration of how many task instances should run in a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Service name
    pub name: String,

    /// Cluster the service runs in
    pub cluster: String,

    pub desired_count: i64,

    #[serde(default)]
    pub pending_count: i64,

    #[serde(default)]
    pub running_count: i64,

    /// Active deployments, newest first. Exactly one when the service is stable.
    #[serde(default)]
    pub deployments: Vec<Deployment>,
}

/// A point-in-time record of a service transitioning toward a task definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Deployment status as reported by the orchestrator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// ARN of the task definition this deployment rolls toward
    pub task_definition: String,

    pub desired_count: i64,

    pub pending_count: i64,

    pub running_count: i64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields to change on a service.
///
/// `None` fields are omitted from the request entirely and left unchanged by
/// the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_count: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_definition: Option<String>,
}
