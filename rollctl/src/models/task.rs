//! Task definition models

use serde::{Deserialize, Serialize};

/// A single container within a task definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerDefinition {
    /// Container name
    pub name: String,

    /// Image reference in `repository[:tag]` form
    pub image: String,

    /// Attributes this tool does not model (ports, environment, limits...).
    /// Flattened so they re-register exactly as fetched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ContainerDefinition {
    /// The repository portion of the image reference (text before the tag separator)
    pub fn repository(&self) -> &str {
        self.image.split(':').next().unwrap_or(&self.image)
    }
}

/// A versioned template describing the containers a service runs together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Full ARN of this revision; absent on definitions being registered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_definition_arn: Option<String>,

    /// Family name
    pub family: String,

    /// Revision number within the family; assigned by the orchestrator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<i64>,

    /// Ordered container definitions
    pub container_definitions: Vec<ContainerDefinition>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_compatibilities: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volumes: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement_constraints: Option<serde_json::Value>,

    /// Anything else the orchestrator returned; round-trips untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TaskDefinition {
    /// Strip server-assigned identity so the definition can be submitted as
    /// a new revision of the same family.
    pub fn into_register_input(mut self) -> Self {
        self.task_definition_arn = None;
        self.revision = None;
        self
    }

    /// The ARN of this revision, if assigned
    pub fn arn(&self) -> Option<&str> {
        self.task_definition_arn.as_deref()
    }
}
