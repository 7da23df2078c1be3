use std::{env, path::PathBuf};

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn secs(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|raw| raw.parse::<u64>().ok())
}

#[must_use]
pub fn slow_test_env() -> bool {
    env::var("SLOW_TEST_ENV").is_ok_and(|s| s == "true")
}

#[must_use]
pub fn aws_access_key_id() -> Option<String> {
    non_empty("AWS_ACCESS_KEY_ID")
}

#[must_use]
pub fn aws_secret_access_key() -> Option<String> {
    non_empty("AWS_SECRET_ACCESS_KEY")
}

#[must_use]
pub fn aws_profile() -> Option<String> {
    non_empty("AWS_PROFILE")
}

#[must_use]
pub fn aws_region() -> Option<String> {
    non_empty("AWS_REGION")
}

/// Variables handed through to executor subprocesses whose environment is
/// otherwise cleared.
#[must_use]
pub fn executor_passthrough() -> Vec<(String, String)> {
    ["PATH", "HOME", "TMPDIR"]
        .into_iter()
        .filter_map(|key| non_empty(key).map(|value| (key.to_owned(), value)))
        .collect()
}

#[must_use]
pub fn kibana_host() -> Option<String> {
    non_empty("PKGTEST_KIBANA_HOST")
}

#[must_use]
pub fn elasticsearch_host() -> Option<String> {
    non_empty("PKGTEST_ELASTICSEARCH_HOST")
}

#[must_use]
pub fn data_wait_timeout_secs() -> Option<u64> {
    secs("PKGTEST_DATA_WAIT_TIMEOUT_SECS")
}

#[must_use]
pub fn elasticsearch_username() -> Option<String> {
    non_empty("PKGTEST_ELASTICSEARCH_USERNAME")
}

#[must_use]
pub fn elasticsearch_password() -> Option<String> {
    non_empty("PKGTEST_ELASTICSEARCH_PASSWORD")
}

#[must_use]
pub fn policy_wait_timeout_secs() -> Option<u64> {
    secs("PKGTEST_POLICY_WAIT_TIMEOUT_SECS")
}

#[must_use]
pub fn policy_poll_interval_secs() -> Option<u64> {
    secs("PKGTEST_POLICY_POLL_INTERVAL_SECS")
}

#[must_use]
pub fn compose_up_timeout_secs() -> Option<u64> {
    secs("PKGTEST_COMPOSE_UP_TIMEOUT_SECS")
}

#[must_use]
pub fn terraform_timeout_secs() -> Option<u64> {
    secs("PKGTEST_TERRAFORM_TIMEOUT_SECS")
}

#[must_use]
pub fn preserve_services() -> bool {
    env::var("PKGTEST_PRESERVE_SERVICES").is_ok()
}

#[must_use]
pub fn generate_fixtures() -> bool {
    env::var("PKGTEST_GENERATE_FIXTURES").is_ok_and(|val| val.eq_ignore_ascii_case("true"))
}

#[must_use]
pub fn logs_dir() -> Option<PathBuf> {
    non_empty("PKGTEST_LOGS_DIR").map(PathBuf::from)
}

#[must_use]
pub fn package_root() -> Option<PathBuf> {
    non_empty("PKGTEST_PACKAGE_ROOT").map(PathBuf::from)
}

#[must_use]
pub fn data_stream_root() -> Option<PathBuf> {
    non_empty("PKGTEST_DATA_STREAM_ROOT").map(PathBuf::from)
}

#[must_use]
pub fn rust_log() -> Option<String> {
    env::var("RUST_LOG").ok()
}
