//! One-shot, multi-waiter stop signal.

use std::fmt;
use std::sync::{Arc, OnceLock};

use tokio::sync::Notify;

/// Why a debugger process is considered stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The process exited. `None` when it was terminated by a signal.
    Exited(Option<i32>),
    /// The process could not be spawned or waited on.
    Failed(String),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Exited(Some(code)) => write!(f, "exited with code {code}"),
            StopReason::Exited(None) => write!(f, "terminated by signal"),
            StopReason::Failed(err) => write!(f, "exited with error {err}"),
        }
    }
}

#[derive(Debug, Default)]
struct Shared {
    reason: OnceLock<StopReason>,
    notify: Notify,
}

/// Fires at most once; any number of tasks can wait for it.
///
/// Clones share state. Waiting after the signal fired returns immediately.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    shared: Arc<Shared>,
}

impl StopSignal {
    /// A signal that has not fired.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal with `reason`.
    ///
    /// Returns `true` only for the call that actually fired it; later calls
    /// keep the first reason and return `false`.
    pub fn fire(&self, reason: StopReason) -> bool {
        let fired = self.shared.reason.set(reason).is_ok();
        if fired {
            self.shared.notify.notify_waiters();
        }
        fired
    }

    /// Whether the signal has fired.
    pub fn has_fired(&self) -> bool {
        self.shared.reason.get().is_some()
    }

    /// The reason recorded by the first [`fire`](Self::fire), if any.
    pub fn reason(&self) -> Option<StopReason> {
        self.shared.reason.get().cloned()
    }

    /// Wait until the signal fires and return its reason.
    pub async fn stopped(&self) -> StopReason {
        loop {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a fire in between is not missed.
            notified.as_mut().enable();
            if let Some(reason) = self.shared.reason.get() {
                return reason.clone();
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fires_once() {
        let signal = StopSignal::new();
        assert!(!signal.has_fired());
        assert!(signal.fire(StopReason::Exited(Some(0))));
        assert!(!signal.fire(StopReason::Failed("late".into())));
        assert_eq!(signal.reason(), Some(StopReason::Exited(Some(0))));
    }

    #[test]
    fn clones_share_state() {
        let signal = StopSignal::new();
        let other = signal.clone();
        other.fire(StopReason::Exited(None));
        assert!(signal.has_fired());
    }

    #[tokio::test]
    async fn wait_after_fire_returns_immediately() {
        let signal = StopSignal::new();
        signal.fire(StopReason::Exited(Some(3)));
        assert_eq!(signal.stopped().await, StopReason::Exited(Some(3)));
    }

    #[tokio::test]
    async fn all_waiters_are_released() {
        let signal = StopSignal::new();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let s = signal.clone();
                tokio::spawn(async move { s.stopped().await })
            })
            .collect();

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.fire(StopReason::Failed("boom".into()));

        for waiter in waiters {
            let reason = waiter.await.unwrap();
            assert_eq!(reason, StopReason::Failed("boom".into()));
        }
    }

    #[test]
    fn reason_display() {
        assert_eq!(StopReason::Exited(Some(1)).to_string(), "exited with code 1");
        assert_eq!(StopReason::Exited(None).to_string(), "terminated by signal");
        assert_eq!(
            StopReason::Failed("ENOENT".into()).to_string(),
            "exited with error ENOENT"
        );
    }
}
