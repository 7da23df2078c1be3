use std::{future::Future, time::Duration};

use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::debug;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Cadence and upper bound of a convergence wait.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WaitPolicy {
    pub poll_interval: Duration,
    /// `None` polls until the predicate holds or the caller cancels.
    pub timeout: Option<Duration>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

impl WaitPolicy {
    #[must_use]
    pub const fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            timeout: None,
        }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Error)]
pub enum WaitError<E> {
    #[error("{what}: probe failed: {source}")]
    Probe {
        what: String,
        #[source]
        source: E,
    },
    #[error("{what}: not converged after {timeout:?}")]
    Timeout { what: String, timeout: Duration },
    #[error("{what}: wait cancelled")]
    Cancelled { what: String },
}

/// Poll `probe` until it yields a value.
///
/// `Ok(None)` means the remote state has not converged yet and the probe is
/// retried after `poll_interval`. A probe error aborts the wait immediately;
/// retrying failed fetches is left to the caller.
pub async fn wait_until<T, E, F, Fut>(
    what: &str,
    policy: WaitPolicy,
    probe: F,
) -> Result<T, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    wait_until_cancelled(what, policy, probe, std::future::pending::<()>()).await
}

/// Like [`wait_until`], additionally giving up once `cancel` resolves.
pub async fn wait_until_cancelled<T, E, F, Fut, C>(
    what: &str,
    policy: WaitPolicy,
    probe: F,
    cancel: C,
) -> Result<T, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
    C: Future<Output = ()>,
{
    let polling = poll_loop(what, policy.poll_interval, probe);
    let bounded = async {
        match policy.timeout {
            Some(limit) => timeout(limit, polling)
                .await
                .unwrap_or_else(|_| {
                    Err(WaitError::Timeout {
                        what: what.to_owned(),
                        timeout: limit,
                    })
                }),
            None => polling.await,
        }
    };

    tokio::select! {
        outcome = bounded => outcome,
        () = cancel => Err(WaitError::Cancelled { what: what.to_owned() }),
    }
}

async fn poll_loop<T, E, F, Fut>(
    what: &str,
    poll_interval: Duration,
    mut probe: F,
) -> Result<T, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        match probe().await {
            Ok(Some(value)) => {
                debug!(what, attempt, "converged");
                return Ok(value);
            }
            Ok(None) => {
                debug!(what, attempt, poll_ms = poll_interval.as_millis(), "not converged yet");
                sleep(poll_interval).await;
            }
            Err(source) => {
                return Err(WaitError::Probe {
                    what: what.to_owned(),
                    source,
                });
            }
        }
    }
}
