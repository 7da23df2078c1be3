use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use pkgtest_core::{
    DeployerRegistry, DeploymentError, FactoryOptions, FixtureMode, ServiceContext,
    ServiceDeployer, WaitError, WaitPolicy, factory::DefinitionLayout,
};
use pkgtest_elasticsearch::{ElasticsearchClient, ElasticsearchConfig};
use pkgtest_system::{DataStreamEvents, SystemTest, SystemTestError};
use serde_json::{Value, json};
use tests_workflows::{FakeElasticsearch, PackageTree};

const INDEX: &str = "logs-apache.access-ep";

fn documents() -> Vec<Value> {
    vec![
        json!({"@timestamp": "2026-01-01T00:00:00Z", "http": {"response": {"status_code": 200}}}),
        json!({"@timestamp": "2026-01-01T00:00:01Z", "http": {"response": {"status_code": 404}}}),
    ]
}

fn client(es: &FakeElasticsearch, timeout: Duration) -> ElasticsearchClient {
    let config = ElasticsearchConfig::new(&es.base_url())
        .unwrap()
        .with_basic_auth("elastic".into(), "changeme".into())
        .with_arrival_wait(WaitPolicy::new(Duration::from_millis(10)).with_timeout(timeout));
    ElasticsearchClient::new(config)
}

#[tokio::test]
async fn waits_for_data_stream_to_appear() {
    let es = FakeElasticsearch::start(INDEX, documents(), 3).await.unwrap();

    let found = client(&es, Duration::from_secs(10))
        .wait_for_documents(INDEX, 2)
        .await
        .unwrap();

    assert_eq!(found, documents());
    assert_eq!(es.searches(), 4);
}

#[tokio::test]
async fn missing_data_stream_times_out() {
    let es = FakeElasticsearch::start(INDEX, documents(), 0).await.unwrap();

    let err = client(&es, Duration::from_millis(200))
        .wait_for_documents("logs-apache.error-ep", 1)
        .await
        .unwrap_err();

    assert!(matches!(err.source, WaitError::Timeout { .. }), "unexpected error: {err}");
    assert!(es.searches() > 1);
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

#[tokio::test]
async fn system_test_verifies_indexed_events() {
    let es = FakeElasticsearch::start(INDEX, documents(), 1).await.unwrap();
    let tree = PackageTree::new("apache").unwrap();
    tree.mkdir("data_stream/access/_dev/deploy/stub").unwrap();
    let test_case = tree
        .write("data_stream/access/_dev/test/system/test-default-config.yml", "vars: {}\n")
        .unwrap();
    let registry = Arc::new(
        DeployerRegistry::new()
            .register("stub", DefinitionLayout::Directory, |_| Ok(Box::new(StubDeployer)))
            .unwrap(),
    );
    let events = DataStreamEvents::for_data_stream(
        client(&es, Duration::from_secs(10)),
        "logs",
        "apache",
        "access",
        "ep",
    );

    let system_test = |mode| {
        SystemTest::new(
            Arc::clone(&registry),
            FactoryOptions::new(tree.root()).with_data_stream_root(tree.data_stream()),
            "apache",
            test_case.clone(),
        )
        .with_logs_dir(tree.root().join("logs"))
        .with_fixture_mode(mode)
    };

    system_test(FixtureMode::Generate).run(&events).await.unwrap();
    let verified = system_test(FixtureMode::Verify).run(&events).await.unwrap();
    assert_eq!(verified.events, 2);

    let short_of_data =
        DataStreamEvents::new(client(&es, Duration::from_millis(200)), INDEX).with_min_documents(3);
    let err = system_test(FixtureMode::Verify)
        .run(&short_of_data)
        .await
        .unwrap_err();
    assert!(matches!(err, SystemTestError::Collect { .. }), "unexpected error: {err}");
}
