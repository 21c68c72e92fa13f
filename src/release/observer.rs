//! Write-once handoff of the image build result.
//!
//! The image platform runs on its own task and publishes a [`BuildResult`]
//! exactly once. The chart save step waits for it before exporting images.
//! Readers never block when the observer is disabled.

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Final status of an asynchronous build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// The build produced its artifact.
    Success,
    /// The build failed or was skipped.
    Failure,
}

/// Outcome of an asynchronous build, with the produced artifact on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    status: BuildStatus,
    artifact: Option<String>,
}

impl BuildResult {
    /// Successful build that produced `artifact` (e.g. an image tag).
    pub fn success(artifact: impl Into<String>) -> Self {
        Self {
            status: BuildStatus::Success,
            artifact: Some(artifact.into()),
        }
    }

    /// Failed or skipped build.
    pub fn failure() -> Self {
        Self {
            status: BuildStatus::Failure,
            artifact: None,
        }
    }

    /// Build status.
    pub fn status(&self) -> BuildStatus {
        self.status
    }

    /// Produced artifact identifier, only set on success.
    pub fn artifact(&self) -> Option<&str> {
        self.artifact.as_deref()
    }

    /// Returns true on success.
    pub fn is_success(&self) -> bool {
        self.status == BuildStatus::Success
    }
}

/// Result of [`BuildObserver::wait`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// Observer disabled, nothing to wait for.
    Disabled,
    /// Producer published its result.
    Ready(BuildResult),
    /// Cancellation fired before the producer published.
    Cancelled,
}

/// Shared slot for the result of the asynchronous image build.
///
/// Cloning yields another handle onto the same slot.
#[derive(Debug, Clone)]
pub struct BuildObserver {
    enabled: bool,
    slot: Arc<watch::Sender<Option<BuildResult>>>,
}

impl BuildObserver {
    /// Creates an observer. `enabled` is fixed for its whole life.
    pub fn new(enabled: bool) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            enabled,
            slot: Arc::new(tx),
        }
    }

    /// Observer that never waits.
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Whether consumers should wait for a result.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Non-blocking read. `None` until the producer publishes.
    pub fn result(&self) -> Option<BuildResult> {
        self.slot.borrow().clone()
    }

    /// Publishes the result. Only the first call has any effect.
    ///
    /// Returns `true` when this call stored the result.
    pub fn publish(&self, result: BuildResult) -> bool {
        let mut pending = Some(result);
        self.slot.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = pending.take();
            true
        })
    }

    /// Waits until the result is published or `cancel` fires.
    ///
    /// Returns immediately with [`WaitOutcome::Disabled`] for a disabled
    /// observer. The token is left as-is so the caller still sees the
    /// cancellation.
    pub async fn wait(&self, cancel: &CancellationToken) -> WaitOutcome {
        if !self.enabled {
            return WaitOutcome::Disabled;
        }

        let mut rx = self.slot.subscribe();
        let published = async move {
            rx.wait_for(Option::is_some)
                .await
                .ok()
                .and_then(|slot| slot.clone())
        };

        tokio::select! {
            biased;
            // The sender lives in `self`, so the channel cannot close here.
            result = published => match result {
                Some(result) => WaitOutcome::Ready(result),
                None => WaitOutcome::Cancelled,
            },
            _ = cancel.cancelled() => WaitOutcome::Cancelled,
        }
    }

    /// Guard that publishes [`BuildResult::failure`] on drop unless a result
    /// was published first.
    pub fn publish_guard(&self) -> PublishGuard {
        PublishGuard {
            observer: self.clone(),
        }
    }
}

/// RAII guard held by the producer for the lifetime of its pipeline.
///
/// Skips, early returns, panics and task aborts all end in a published
/// result, so a waiting consumer always wakes up.
#[derive(Debug)]
pub struct PublishGuard {
    observer: BuildObserver,
}

impl PublishGuard {
    /// Publishes through the guarded observer.
    pub fn publish(&self, result: BuildResult) -> bool {
        self.observer.publish(result)
    }
}

impl Drop for PublishGuard {
    fn drop(&mut self) {
        if self.observer.publish(BuildResult::failure()) {
            log::debug!("Image build ended without a result, published failure");
        }
    }
}
