//! End-to-end deployment flow tests with mock gateways

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio_test::assert_ok;

use rollctl::app::options::{CanaryOptions, DeployOptions, ImageOptions};
use rollctl::app::run::run;
use rollctl::deploy::poller;
use rollctl::errors::DeployError;
use rollctl::http::canary::CanaryApi;
use rollctl::http::orchestration::OrchestrationApi;
use rollctl::models::revision::{CanaryDeploymentRequest, RevisionType};
use rollctl::models::service::{Deployment, Service, ServiceUpdate};
use rollctl::models::task::{ContainerDefinition, TaskDefinition};

const OLD_ARN: &str = "arn:task-definition/payments:7";
const NEW_ARN: &str = "arn:task-definition/payments:8";

struct MockOrchestration {
    latest: TaskDefinition,
    new_arn: String,
    states: Mutex<VecDeque<Service>>,
    registered: Mutex<Vec<TaskDefinition>>,
    updates: Mutex<Vec<ServiceUpdate>>,
    describe_calls: Mutex<usize>,
}

impl MockOrchestration {
    fn new(latest: TaskDefinition, new_arn: &str, states: Vec<Service>) -> Self {
        Self {
            latest,
            new_arn: new_arn.to_string(),
            states: Mutex::new(states.into()),
            registered: Mutex::new(Vec::new()),
            updates: Mutex::new(Vec::new()),
            describe_calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl OrchestrationApi for MockOrchestration {
    async fn get_task_definition(&self, family: &str) -> Result<TaskDefinition, DeployError> {
        if family == self.latest.family {
            Ok(self.latest.clone())
        } else {
            Err(DeployError::NotFound(family.to_string()))
        }
    }

    async fn register_task_definition(
        &self,
        definition: TaskDefinition,
    ) -> Result<String, DeployError> {
        self.registered.lock().unwrap().push(definition);
        Ok(self.new_arn.clone())
    }

    async fn describe_service(
        &self,
        _cluster: &str,
        _service: &str,
    ) -> Result<Service, DeployError> {
        *self.describe_calls.lock().unwrap() += 1;
        let mut states = self.states.lock().unwrap();
        if states.len() > 1 {
            Ok(states.pop_front().unwrap())
        } else {
            states
                .front()
                .cloned()
                .ok_or_else(|| DeployError::ApiError("no service state queued".to_string()))
        }
    }

    async fn update_service(
        &self,
        _cluster: &str,
        _service: &str,
        update: &ServiceUpdate,
    ) -> Result<(), DeployError> {
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }
}

#[derive(Default)]
struct MockCanary {
    submissions: Mutex<Vec<(String, String, CanaryDeploymentRequest)>>,
}

#[async_trait]
impl CanaryApi for MockCanary {
    async fn create_deployment(
        &self,
        application: &str,
        deployment_group: &str,
        request: &CanaryDeploymentRequest,
    ) -> Result<String, DeployError> {
        self.submissions.lock().unwrap().push((
            application.to_string(),
            deployment_group.to_string(),
            request.clone(),
        ));
        Ok("d-12345".to_string())
    }
}

fn latest_definition(family: &str, arn: &str) -> TaskDefinition {
    TaskDefinition {
        task_definition_arn: Some(arn.to_string()),
        family: family.to_string(),
        revision: Some(7),
        container_definitions: vec![ContainerDefinition {
            name: family.to_string(),
            image: format!("registry.fleetops.dev/{}:v1", family),
            extra: serde_json::Map::new(),
        }],
        task_role_arn: Some("arn:role/deploy".to_string()),
        execution_role_arn: None,
        network_mode: Some("bridge".to_string()),
        cpu: None,
        memory: None,
        requires_compatibilities: None,
        volumes: None,
        placement_constraints: None,
        extra: serde_json::Map::new(),
    }
}

fn deployment(arn: &str, desired: i64, running: i64) -> Deployment {
    Deployment {
        id: None,
        status: None,
        task_definition: arn.to_string(),
        desired_count: desired,
        pending_count: (desired - running).max(0),
        running_count: running,
        created_at: None,
        updated_at: None,
    }
}

fn service_with(deployments: Vec<Deployment>) -> Service {
    Service {
        name: "payments".to_string(),
        cluster: "default".to_string(),
        desired_count: 3,
        pending_count: 0,
        running_count: 3,
        deployments,
    }
}

fn fast_poller() -> poller::Options {
    poller::Options {
        interval: Duration::from_millis(1),
        timeout: None,
    }
}

/// Scenario A: rolling deploy of a new image tag converges once the new
/// deployment's running count reaches the desired count.
#[tokio::test]
async fn test_rolling_deploy_converges() {
    let orchestration = MockOrchestration::new(
        latest_definition("payments", OLD_ARN),
        NEW_ARN,
        vec![
            // Preflight: stable on the latest definition.
            service_with(vec![deployment(OLD_ARN, 3, 3)]),
            // First poll: new deployment still rolling out.
            service_with(vec![deployment(NEW_ARN, 3, 1), deployment(OLD_ARN, 3, 3)]),
            // Second poll: converged.
            service_with(vec![deployment(NEW_ARN, 3, 3)]),
        ],
    );
    let canary = MockCanary::default();
    let options = DeployOptions {
        service: "payments".to_string(),
        family: "payments".to_string(),
        image: Some(ImageOptions {
            repository: "registry.fleetops.dev/payments".to_string(),
            tag: "v2".to_string(),
        }),
        poller: fast_poller(),
        ..Default::default()
    };

    tokio_test::assert_ok!(
        run(&options, &orchestration, &canary, std::future::pending()).await
    );

    let registered = orchestration.registered.lock().unwrap();
    assert_eq!(registered.len(), 1);
    assert!(registered[0].task_definition_arn.is_none());
    assert!(registered[0].revision.is_none());
    assert_eq!(
        registered[0].container_definitions[0].image,
        "registry.fleetops.dev/payments:v2"
    );
    assert_eq!(registered[0].task_role_arn.as_deref(), Some("arn:role/deploy"));

    let updates = orchestration.updates.lock().unwrap();
    assert_eq!(
        *updates,
        vec![ServiceUpdate {
            desired_count: None,
            task_definition: Some(NEW_ARN.to_string()),
        }]
    );

    assert_eq!(*orchestration.describe_calls.lock().unwrap(), 3);
    assert!(canary.submissions.lock().unwrap().is_empty());
}

/// Scenario B: more than one active deployment aborts before any mutation.
#[tokio::test]
async fn test_ambiguous_deployment_count_aborts_before_mutation() {
    let orchestration = MockOrchestration::new(
        latest_definition("payments", OLD_ARN),
        NEW_ARN,
        vec![service_with(vec![
            deployment(NEW_ARN, 3, 1),
            deployment(OLD_ARN, 3, 3),
        ])],
    );
    let canary = MockCanary::default();
    let options = DeployOptions {
        service: "payments".to_string(),
        family: "payments".to_string(),
        image: Some(ImageOptions {
            repository: "registry.fleetops.dev/payments".to_string(),
            tag: "v2".to_string(),
        }),
        poller: fast_poller(),
        ..Default::default()
    };

    let result = run(&options, &orchestration, &canary, std::future::pending()).await;
    assert!(matches!(result, Err(DeployError::PreconditionFailed(_))));

    assert!(orchestration.registered.lock().unwrap().is_empty());
    assert!(orchestration.updates.lock().unwrap().is_empty());
}

/// Zero active deployments is just as ambiguous as two.
#[tokio::test]
async fn test_zero_deployments_aborts_before_mutation() {
    let orchestration = MockOrchestration::new(
        latest_definition("payments", OLD_ARN),
        NEW_ARN,
        vec![service_with(vec![])],
    );
    let canary = MockCanary::default();
    let options = DeployOptions {
        service: "payments".to_string(),
        family: "payments".to_string(),
        image: Some(ImageOptions {
            repository: "registry.fleetops.dev/payments".to_string(),
            tag: "v2".to_string(),
        }),
        poller: fast_poller(),
        ..Default::default()
    };

    let result = run(&options, &orchestration, &canary, std::future::pending()).await;
    assert!(matches!(result, Err(DeployError::PreconditionFailed(_))));
    assert!(orchestration.registered.lock().unwrap().is_empty());
    assert!(orchestration.updates.lock().unwrap().is_empty());
}

/// A single active deployment on a stale definition also aborts.
#[tokio::test]
async fn test_stale_task_definition_aborts_before_mutation() {
    let orchestration = MockOrchestration::new(
        latest_definition("payments", OLD_ARN),
        NEW_ARN,
        vec![service_with(vec![deployment(
            "arn:task-definition/payments:6",
            3,
            3,
        )])],
    );
    let canary = MockCanary::default();
    let options = DeployOptions {
        service: "payments".to_string(),
        family: "payments".to_string(),
        image: Some(ImageOptions {
            repository: "registry.fleetops.dev/payments".to_string(),
            tag: "v2".to_string(),
        }),
        poller: fast_poller(),
        ..Default::default()
    };

    let result = run(&options, &orchestration, &canary, std::future::pending()).await;
    assert!(matches!(result, Err(DeployError::PreconditionFailed(_))));
    assert!(orchestration.registered.lock().unwrap().is_empty());
    assert!(orchestration.updates.lock().unwrap().is_empty());
}

/// Scenario C: the canary flow submits exactly one content revision
/// referencing the new ARN; no service update, no polling.
#[tokio::test]
async fn test_canary_flow_submits_one_revision_and_nothing_else() {
    let orchestration = MockOrchestration::new(
        latest_definition("checkout", "arn:task-definition/checkout:11"),
        "arn:task-definition/checkout:12",
        vec![],
    );
    let canary = MockCanary::default();
    let options = DeployOptions {
        service: "checkout".to_string(),
        family: "checkout".to_string(),
        image: Some(ImageOptions {
            repository: "registry.fleetops.dev/checkout".to_string(),
            tag: "v3".to_string(),
        }),
        require_latest: false,
        canary: Some(CanaryOptions {
            application: "checkout-app".to_string(),
            deployment_group: "prod".to_string(),
            port: 8080,
        }),
        poller: fast_poller(),
        ..Default::default()
    };

    tokio_test::assert_ok!(
        run(&options, &orchestration, &canary, std::future::pending()).await
    );

    let submissions = canary.submissions.lock().unwrap();
    assert_eq!(submissions.len(), 1);
    let (application, group, request) = &submissions[0];
    assert_eq!(application, "checkout-app");
    assert_eq!(group, "prod");
    assert_eq!(request.revision.revision_type, RevisionType::Content);
    assert!(request.revision.content.contains("arn:task-definition/checkout:12"));
    assert!(request.revision.content.contains("\"checkout\""));
    assert!(request.revision.content.contains("8080"));

    assert!(orchestration.updates.lock().unwrap().is_empty());
    assert_eq!(*orchestration.describe_calls.lock().unwrap(), 0);
}

/// The preflight policy applies to the canary flow when left enabled.
#[tokio::test]
async fn test_canary_flow_honors_preflight_policy() {
    let orchestration = MockOrchestration::new(
        latest_definition("checkout", "arn:task-definition/checkout:11"),
        "arn:task-definition/checkout:12",
        vec![service_with(vec![deployment(
            "arn:task-definition/checkout:11",
            3,
            3,
        )])],
    );
    let canary = MockCanary::default();
    let options = DeployOptions {
        service: "checkout".to_string(),
        family: "checkout".to_string(),
        image: Some(ImageOptions {
            repository: "registry.fleetops.dev/checkout".to_string(),
            tag: "v3".to_string(),
        }),
        canary: Some(CanaryOptions {
            application: "checkout-app".to_string(),
            deployment_group: "prod".to_string(),
            port: 8080,
        }),
        poller: fast_poller(),
        ..Default::default()
    };

    tokio_test::assert_ok!(
        run(&options, &orchestration, &canary, std::future::pending()).await
    );

    assert_eq!(*orchestration.describe_calls.lock().unwrap(), 1);
    assert_eq!(canary.submissions.lock().unwrap().len(), 1);
}

/// --nowait returns right after the update call.
#[tokio::test]
async fn test_nowait_skips_polling() {
    let orchestration = MockOrchestration::new(
        latest_definition("payments", OLD_ARN),
        NEW_ARN,
        vec![service_with(vec![deployment(OLD_ARN, 3, 3)])],
    );
    let canary = MockCanary::default();
    let options = DeployOptions {
        service: "payments".to_string(),
        family: "payments".to_string(),
        image: Some(ImageOptions {
            repository: "registry.fleetops.dev/payments".to_string(),
            tag: "v2".to_string(),
        }),
        nowait: true,
        poller: fast_poller(),
        ..Default::default()
    };

    tokio_test::assert_ok!(
        run(&options, &orchestration, &canary, std::future::pending()).await
    );

    // Preflight reads the service once; no polling afterwards.
    assert_eq!(*orchestration.describe_calls.lock().unwrap(), 1);
    assert_eq!(orchestration.updates.lock().unwrap().len(), 1);
}

/// A count-only deploy registers nothing and polls the newest deployment.
#[tokio::test]
async fn test_count_only_update_polls_newest_deployment() {
    let orchestration = MockOrchestration::new(
        latest_definition("payments", OLD_ARN),
        NEW_ARN,
        vec![
            service_with(vec![deployment(OLD_ARN, 5, 3)]),
            service_with(vec![deployment(OLD_ARN, 5, 5)]),
        ],
    );
    let canary = MockCanary::default();
    let options = DeployOptions {
        service: "payments".to_string(),
        family: "payments".to_string(),
        count: Some(5),
        require_latest: false,
        poller: fast_poller(),
        ..Default::default()
    };

    tokio_test::assert_ok!(
        run(&options, &orchestration, &canary, std::future::pending()).await
    );

    assert!(orchestration.registered.lock().unwrap().is_empty());
    assert_eq!(
        *orchestration.updates.lock().unwrap(),
        vec![ServiceUpdate {
            desired_count: Some(5),
            task_definition: None,
        }]
    );
}
