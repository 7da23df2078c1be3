use std::{collections::BTreeMap, path::Path};

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const AWS_PROFILE: &str = "AWS_PROFILE";
pub const AWS_REGION: &str = "AWS_REGION";

pub const SERVICE_LOGS_DIR_ENV: &str = "SERVICE_LOGS_DIR";
pub const TF_DIR_ENV: &str = "TF_DIR";

/// Cloud credentials forwarded to the terraform executor.
///
/// Missing credentials are not an error here; terraform reports them when a
/// provider actually needs them.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct AwsCredentials {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub profile: Option<String>,
    pub region: Option<String>,
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "<set>"))
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<set>"))
            .field("profile", &self.profile)
            .field("region", &self.region)
            .finish()
    }
}

impl AwsCredentials {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            access_key_id: pkgtest_env::aws_access_key_id(),
            secret_access_key: pkgtest_env::aws_secret_access_key(),
            profile: pkgtest_env::aws_profile(),
            region: pkgtest_env::aws_region(),
        }
    }

    fn key_pair(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) if !id.is_empty() && !secret.is_empty() => {
                Some((id.as_str(), secret.as_str()))
            }
            _ => None,
        }
    }
}

/// Variables set for every terraform invocation.
///
/// An explicit key pair wins over a named profile; the region is forwarded
/// whenever it is known.
#[must_use]
pub fn build_executor_environment(
    credentials: &AwsCredentials,
    logs_dir: &Path,
    definitions_dir: &Path,
) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    vars.insert(SERVICE_LOGS_DIR_ENV.to_owned(), logs_dir.display().to_string());
    vars.insert(TF_DIR_ENV.to_owned(), definitions_dir.display().to_string());

    if let Some((id, secret)) = credentials.key_pair() {
        vars.insert(AWS_ACCESS_KEY_ID.to_owned(), id.to_owned());
        vars.insert(AWS_SECRET_ACCESS_KEY.to_owned(), secret.to_owned());
    } else if let Some(profile) = credentials.profile.as_ref().filter(|p| !p.is_empty()) {
        vars.insert(AWS_PROFILE.to_owned(), profile.clone());
    }

    if let Some(region) = credentials.region.as_ref().filter(|r| !r.is_empty()) {
        vars.insert(AWS_REGION.to_owned(), region.clone());
    }

    vars
}
