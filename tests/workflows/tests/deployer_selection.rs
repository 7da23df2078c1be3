use pkgtest_core::{
    FactoryError, FactoryOptions,
    factory::FactoryErrorKind,
    package::{find_data_stream_root, find_package_root},
};
use pkgtest_system::{RunnerConfig, default_registry};
use tests_workflows::PackageTree;

fn select_error(tree: &PackageTree) -> FactoryError {
    let registry = default_registry(&RunnerConfig::default()).unwrap();
    let options = FactoryOptions::new(tree.root()).with_data_stream_root(tree.data_stream());
    match registry.select(&options) {
        Ok(deployer) => panic!("unexpectedly selected `{}`", deployer.kind()),
        Err(err) => err,
    }
}

#[test]
fn compose_definition_under_data_stream_selects_docker() {
    let tree = PackageTree::new("apache").unwrap();
    tree.write(
        "data_stream/access/_dev/deploy/docker/docker-compose.yml",
        "services:\n  apache:\n    image: httpd:2.4\n",
    )
    .unwrap();
    tree.mkdir("_dev/deploy/tf").unwrap();

    let nested = tree.mkdir("data_stream/access/_dev/test/system").unwrap();
    let options = FactoryOptions::new(find_package_root(&nested).unwrap().unwrap())
        .with_data_stream_root(find_data_stream_root(&nested).unwrap().unwrap());

    let registry = default_registry(&RunnerConfig::default()).unwrap();
    let deployer = registry.select(&options).unwrap();

    assert_eq!(deployer.kind(), "docker");
}

#[test]
fn package_level_terraform_is_used_without_data_stream_definitions() {
    let tree = PackageTree::new("aws").unwrap();
    tree.write("_dev/deploy/tf/main.tf", "output \"hostname\" { value = \"localhost\" }\n")
        .unwrap();

    let registry = default_registry(&RunnerConfig::default()).unwrap();
    let options = FactoryOptions::new(tree.root()).with_data_stream_root(tree.data_stream());
    let deployer = registry.select(&options).unwrap();

    assert_eq!(deployer.kind(), "tf");
}

#[test]
fn two_deployers_are_a_configuration_error() {
    let tree = PackageTree::new("apache").unwrap();
    tree.write("_dev/deploy/docker/docker-compose.yml", "services: {}\n").unwrap();
    tree.mkdir("_dev/deploy/tf").unwrap();

    let err = select_error(&tree);

    assert_eq!(err.kind(), FactoryErrorKind::Configuration);
    assert!(matches!(err, FactoryError::MultipleDeployers { entries, .. } if entries == ["docker", "tf"]));
}

#[test]
fn empty_deploy_dir_is_a_configuration_error() {
    let tree = PackageTree::new("apache").unwrap();
    tree.mkdir("data_stream/access/_dev/deploy").unwrap();

    let err = select_error(&tree);

    assert!(matches!(err, FactoryError::NoDeployer { .. }));
    assert_eq!(err.kind(), FactoryErrorKind::Configuration);
}

#[test]
fn docker_without_compose_file_is_unsupported() {
    let tree = PackageTree::new("apache").unwrap();
    tree.write("_dev/deploy/docker/compose.yaml", "services: {}\n").unwrap();

    let err = select_error(&tree);

    assert!(matches!(err, FactoryError::MissingDefinition { ref name, .. } if name == "docker"));
    assert_eq!(err.kind(), FactoryErrorKind::Unsupported);
}

#[test]
fn unknown_deployer_is_unsupported() {
    let tree = PackageTree::new("apache").unwrap();
    tree.mkdir("_dev/deploy/k8s").unwrap();

    let err = select_error(&tree);

    assert_eq!(err.kind(), FactoryErrorKind::Unsupported);
    assert!(err.to_string().contains("k8s"));
}

#[test]
fn missing_deploy_dir_is_not_found() {
    let tree = PackageTree::new("apache").unwrap();

    let err = select_error(&tree);

    assert_eq!(err.kind(), FactoryErrorKind::NotFound);
    assert!(!tree.package_deploy_dir().exists());
    assert!(!tree.data_stream_deploy_dir().exists());
}
