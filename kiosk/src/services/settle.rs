//! Waiting for a newly created file to finish being written.
//!
//! There is no completion signal from the writer, so this is a heuristic:
//! wait a fixed grace period, then poll the size until two consecutive reads
//! agree and are non-zero. A writer that stalls longer than a poll interval
//! can still be read early.

use std::path::Path;
use std::time::Duration;

use tokio::time::sleep;

/// How long and how carefully to wait for a file to settle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    /// Fixed grace period after the create notification.
    pub initial_delay: Duration,
    /// Delay between size checks.
    pub poll_interval: Duration,
    /// Size checks before proceeding anyway. 0 disables polling.
    pub max_polls: u32,
}

impl SettlePolicy {
    /// No waiting at all.
    pub const IMMEDIATE: Self = Self {
        initial_delay: Duration::ZERO,
        poll_interval: Duration::ZERO,
        max_polls: 0,
    };
}

/// Wait for `path` to settle. Returns its final observed size.
///
/// Fails only when the file cannot be stat'ed (e.g. it was removed).
pub async fn wait_for_settle(path: &Path, policy: &SettlePolicy) -> std::io::Result<u64> {
    sleep(policy.initial_delay).await;

    let mut size = file_size(path).await?;
    for _ in 0..policy.max_polls {
        sleep(policy.poll_interval).await;
        let next = file_size(path).await?;
        if next == size && next > 0 {
            return Ok(next);
        }
        tracing::debug!(path = %path.display(), previous = size, current = next, "File still growing");
        size = next;
    }

    if policy.max_polls > 0 {
        tracing::warn!(
            path = %path.display(),
            size,
            polls = policy.max_polls,
            "File size did not settle, processing anyway"
        );
    }
    Ok(size)
}

async fn file_size(path: &Path) -> std::io::Result<u64> {
    Ok(tokio::fs::metadata(path).await?.len())
}
