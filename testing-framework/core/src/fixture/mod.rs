mod diff;

use std::{
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
};

pub use diff::{Comparison, RecordDiff};
use serde::{Deserialize, Serialize};
use serde_json::{Value, ser::PrettyFormatter};
use thiserror::Error;
use tracing::{debug, info};

/// Appended to a test case file name to form its golden fixture name.
pub const EXPECTED_RESULT_SUFFIX: &str = "-expected.json";

const FIXTURE_INDENT: &[u8] = b"    ";

#[cfg(unix)]
const FIXTURE_MODE: u32 = 0o644;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("no expected result to compare against at {path}")]
    Missing { path: PathBuf },
    #[error("observed events differ from {path}:\n{comparison}")]
    Mismatch {
        path: PathBuf,
        comparison: Comparison,
    },
    #[error("malformed expected result at {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("marshalling test result failed: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },
    #[error("{action} {path} failed: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Ordered events produced by one test case.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestResult {
    pub events: Vec<Value>,
}

impl TestResult {
    #[must_use]
    pub const fn new(events: Vec<Value>) -> Self {
        Self { events }
    }
}

#[derive(Serialize, Deserialize)]
struct TestResultDefinition {
    expected: Vec<Value>,
}

/// Whether golden fixtures are rewritten or checked.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FixtureMode {
    #[default]
    Verify,
    Generate,
}

impl FixtureMode {
    #[must_use]
    pub fn from_env() -> Self {
        if pkgtest_env::generate_fixtures() {
            Self::Generate
        } else {
            Self::Verify
        }
    }
}

#[must_use]
pub fn expected_result_path(test_case_path: &Path) -> PathBuf {
    let mut file_name = test_case_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    file_name.push(EXPECTED_RESULT_SUFFIX);
    test_case_path.with_file_name(file_name)
}

/// Canonical fixture encoding shared by the write and compare paths.
pub fn marshal_test_result(events: &[Value]) -> Result<Vec<u8>, FixtureError> {
    let definition = TestResultDefinition {
        expected: events.to_vec(),
    };
    let mut body = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut body, PrettyFormatter::with_indent(FIXTURE_INDENT));
    definition
        .serialize(&mut serializer)
        .map_err(|source| FixtureError::Serialize { source })?;
    body.push(b'\n');
    Ok(body)
}

/// Replace the fixture for `test_case_path` with `result`.
///
/// The new content is staged next to the target and renamed over it, so a
/// failed write never leaves a truncated fixture behind.
pub fn write_test_result(test_case_path: &Path, result: &TestResult) -> Result<PathBuf, FixtureError> {
    let path = expected_result_path(test_case_path);
    let body = marshal_test_result(&result.events)?;
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let io_err = |action, source| FixtureError::Io {
        action,
        path: path.clone(),
        source,
    };

    let mut staged = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_err("staging", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        staged
            .as_file()
            .set_permissions(fs::Permissions::from_mode(FIXTURE_MODE))
            .map_err(|e| io_err("setting permissions on", e))?;
    }
    staged.write_all(&body).map_err(|e| io_err("writing", e))?;
    staged.as_file().sync_all().map_err(|e| io_err("syncing", e))?;
    staged
        .persist(&path)
        .map_err(|e| io_err("persisting", e.error))?;

    info!(
        fixture = %path.display(),
        events = result.events.len(),
        "expected test result written"
    );
    Ok(path)
}

/// Compare `result` with the stored fixture.
///
/// Both sides go through [`marshal_test_result`]; the record-level diff is
/// only built when the canonical encodings differ.
pub fn compare_results(test_case_path: &Path, result: &TestResult) -> Result<Comparison, FixtureError> {
    let path = expected_result_path(test_case_path);
    let stored = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(FixtureError::Missing { path });
        }
        Err(source) => {
            return Err(FixtureError::Io {
                action: "reading",
                path,
                source,
            });
        }
    };

    let expected: TestResultDefinition =
        serde_json::from_slice(&stored).map_err(|source| FixtureError::Malformed {
            path: path.clone(),
            source,
        })?;

    let comparison = if marshal_test_result(&expected.expected)? == marshal_test_result(&result.events)? {
        Comparison::identical(result.events.len())
    } else {
        Comparison::between(&expected.expected, &result.events)
    };
    debug!(
        fixture = %path.display(),
        equal = comparison.is_equal(),
        expected = expected.expected.len(),
        actual = result.events.len(),
        "compared test result"
    );
    Ok(comparison)
}

/// Records or verifies golden fixtures depending on [`FixtureMode`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ResultComparator {
    mode: FixtureMode,
}

impl ResultComparator {
    #[must_use]
    pub const fn new(mode: FixtureMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub const fn mode(&self) -> FixtureMode {
        self.mode
    }

    pub fn record(&self, test_case_path: &Path, result: &TestResult) -> Result<PathBuf, FixtureError> {
        write_test_result(test_case_path, result)
    }

    pub fn verify(&self, test_case_path: &Path, result: &TestResult) -> Result<Comparison, FixtureError> {
        compare_results(test_case_path, result)
    }

    /// Record in generate mode; otherwise fail unless the fixture matches.
    pub fn check(&self, test_case_path: &Path, result: &TestResult) -> Result<(), FixtureError> {
        match self.mode {
            FixtureMode::Generate => self.record(test_case_path, result).map(|_| ()),
            FixtureMode::Verify => {
                let comparison = self.verify(test_case_path, result)?;
                if comparison.is_equal() {
                    Ok(())
                } else {
                    Err(FixtureError::Mismatch {
                        path: expected_result_path(test_case_path),
                        comparison,
                    })
                }
            }
        }
    }
}
