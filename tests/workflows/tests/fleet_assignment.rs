use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use pkgtest_core::{
    DeployerRegistry, DeploymentError, FactoryOptions, FixtureMode, ServiceContext,
    ServiceDeployer, WaitError, WaitPolicy, factory::DefinitionLayout,
};
use pkgtest_fleet::{Agent, AssignmentError, FleetClient, FleetConfig, FleetError, Policy};
use pkgtest_system::{DynError, EventSource, PolicyAssignment, SystemTest};
use serde_json::{Value, json};
use tests_workflows::{FakeFleet, PackageTree};

const POLL: Duration = Duration::from_millis(10);

fn agent(id: &str) -> Agent {
    Agent {
        id: id.into(),
        policy_id: "fleet-server-policy".into(),
        policy_revision: 1,
        ..Agent::default()
    }
}

fn apache_policy() -> Policy {
    Policy {
        id: "apache-access".into(),
        revision: 2,
        name: "apache access logs".into(),
        namespace: "ep".into(),
    }
}

async fn fleet(lag: usize) -> (FakeFleet, FleetClient) {
    let fleet = FakeFleet::start(vec![agent("a1")], vec![apache_policy()], lag)
        .await
        .unwrap();
    let config = FleetConfig::new(&fleet.base_url())
        .unwrap()
        .with_basic_auth("elastic".into(), "changeme".into())
        .with_assignment_wait(WaitPolicy::new(POLL).with_timeout(Duration::from_secs(10)));
    (fleet, FleetClient::new(config))
}

#[tokio::test]
async fn lists_enrolled_agents() {
    let (_fleet, client) = fleet(0).await;

    let agents = client.list_agents().await.unwrap();

    assert_eq!(agents, vec![agent("a1")]);
}

#[tokio::test]
async fn reassignment_waits_for_the_new_revision() {
    let (fleet, client) = fleet(3).await;

    let converged = client
        .assign_policy_to_agent(&agent("a1"), &apache_policy())
        .await
        .unwrap();

    assert_eq!(converged.policy_id, "apache-access");
    assert_eq!(converged.policy_revision, 2);
    // Three stale reads before the revision lands.
    assert_eq!(fleet.agent_polls(), 4);
}

#[tokio::test]
async fn null_revision_during_rollout_keeps_polling() {
    let fleet = FakeFleet::start(vec![agent("a1")], vec![apache_policy()], 1000)
        .await
        .unwrap();
    let config = FleetConfig::new(&fleet.base_url())
        .unwrap()
        .with_assignment_wait(WaitPolicy::new(POLL).with_timeout(Duration::from_millis(200)));
    let client = FleetClient::new(config);

    let err = client
        .assign_policy_to_agent(&agent("a1"), &apache_policy())
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            AssignmentError::Converge {
                source: WaitError::Timeout { .. },
                ..
            }
        ),
        "unexpected error: {err}"
    );
    assert!(fleet.agent_polls() > 1);

    let pending = client.get_agent("a1").await.unwrap();
    assert_eq!(pending.policy_id, "apache-access");
    assert_eq!(pending.policy_revision, 0);
}

#[tokio::test]
async fn unknown_policy_surfaces_status_and_body() {
    let (fleet, client) = fleet(0).await;
    let unknown = Policy {
        id: "missing".into(),
        ..apache_policy()
    };

    let err = client
        .assign_policy_to_agent(&agent("a1"), &unknown)
        .await
        .unwrap_err();

    match err {
        AssignmentError::Reassign {
            source: FleetError::Status { status, body, .. },
            ..
        } => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("policy missing not found"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(fleet.agent_polls(), 0);
}

#[tokio::test]
async fn unknown_agent_is_a_status_error() {
    let (_fleet, client) = fleet(0).await;

    let err = client.get_agent("ghost").await.unwrap_err();

    assert!(matches!(err, FleetError::Status { status, .. } if status.as_u16() == 404));
}

struct StubDeployer;

#[async_trait]
impl ServiceDeployer for StubDeployer {
    fn kind(&self) -> &'static str {
        "stub"
    }

    async fn deploy(&mut self, ctx: ServiceContext) -> Result<ServiceContext, DeploymentError> {
        Ok(ctx.mark_started("apache", vec![80]))
    }

    async fn tear_down(&mut self) -> Result<(), DeploymentError> {
        Ok(())
    }
}

fn stub_registry() -> DeployerRegistry {
    DeployerRegistry::new()
        .register("stub", DefinitionLayout::Directory, |_| Ok(Box::new(StubDeployer)))
        .unwrap()
}

struct AccessLog;

#[async_trait]
impl EventSource for AccessLog {
    async fn collect(&self, ctx: &ServiceContext) -> Result<Vec<Value>, DynError> {
        let vars = ctx.template_vars()?;
        Ok(vec![json!({"url": format!("http://{}:{}/", vars["Hostname"], vars["Port"])})])
    }
}

#[tokio::test]
async fn system_test_assigns_policy_before_collecting() {
    let (_fleet, client) = fleet(1).await;
    let tree = PackageTree::new("apache").unwrap();
    tree.mkdir("data_stream/access/_dev/deploy/stub").unwrap();
    let test_case = tree
        .write("data_stream/access/_dev/test/system/test-default-config.yml", "vars: {}\n")
        .unwrap();

    let system_test = |mode| {
        SystemTest::new(
            Arc::new(stub_registry()),
            FactoryOptions::new(tree.root()).with_data_stream_root(tree.data_stream()),
            "apache",
            test_case.clone(),
        )
        .with_logs_dir(tree.root().join("logs"))
        .with_fixture_mode(mode)
        .with_policy_assignment(PolicyAssignment {
            client: client.clone(),
            agent: agent("a1"),
            policy: apache_policy(),
        })
    };

    let recorded = system_test(FixtureMode::Generate).run(&AccessLog).await.unwrap();
    let verified = system_test(FixtureMode::Verify).run(&AccessLog).await.unwrap();

    assert_eq!(recorded.agent.map(|a| a.policy_revision), Some(2));
    assert_eq!(verified.events, 1);
    assert_eq!(verified.context.ports(), &[80]);
}
