//! Canary revision models

use serde::{Deserialize, Serialize};

use crate::errors::DeployError;
use crate::utils::sha256_hash;

/// Current revision document version
pub const REVISION_SPEC_VERSION: u32 = 1;

/// The deployment target rendered into a revision document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionSpec {
    pub version: u32,

    /// Task definition the canary deployer should roll toward
    pub task_definition_arn: String,

    /// Container receiving load balancer traffic
    pub container_name: String,

    pub container_port: u16,
}

/// How the canary deployer should interpret a revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionType {
    /// The revision document travels inline with the request
    Content,

    /// The revision document lives at an external location
    Location,
}

/// A content-addressed revision handed to the canary deployer.
///
/// Once submitted, the deployer owns the rollout; this tool's responsibility
/// ends at submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub revision_type: RevisionType,

    /// Rendered revision document, opaque to the deployer's API
    pub content: String,

    /// SHA-256 digest of `content`
    pub content_sha256: String,
}

impl Revision {
    /// Render a spec into an opaque content revision
    pub fn from_spec(spec: &RevisionSpec) -> Result<Self, DeployError> {
        let content = serde_json::to_string_pretty(spec)?;
        let content_sha256 = sha256_hash(content.as_bytes());
        Ok(Self {
            revision_type: RevisionType::Content,
            content,
            content_sha256,
        })
    }
}

/// Request body for creating a canary deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanaryDeploymentRequest {
    pub revision: Revision,
}

/// Response from the canary deployer
#[derive(Debug, Clone, Deserialize)]
pub struct CanaryDeploymentResponse {
    pub deployment_id: String,
}
