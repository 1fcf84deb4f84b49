//! The port gate: a single-release publication point for one integer.

use std::time::Duration;

use tokio::sync::watch;

/// How long [`PortHandle::port`] waits for a release before answering with
/// the unreleased default.
pub const PORT_WAIT_BOUND: Duration = Duration::from_secs(100);

/// Outcome of waiting on the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateWait {
    /// The gate released; every waiter sees this same value.
    Released(i32),
    /// The wait bound elapsed (or the producer went away) before any release.
    Unreleased,
}

/// The producing side of the gate.
///
/// Exactly one exists per bootstrap; [`PortGate::release`] consumes it, so a
/// second release is unrepresentable. Observers hold [`PortHandle`]s created
/// before the release.
#[derive(Debug)]
pub struct PortGate {
    tx: watch::Sender<Option<i32>>,
}

impl PortGate {
    /// An unreleased gate.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    /// A waiting handle; any number may exist.
    pub fn handle(&self) -> PortHandle {
        PortHandle {
            rx: self.tx.subscribe(),
        }
    }

    /// Publish the final value and consume the gate.
    pub fn release(self, value: i32) {
        // Delivers even when no receiver is currently live; handles cloned
        // later still observe the value.
        self.tx.send_replace(Some(value));
    }
}

impl Default for PortGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Read/wait access to a [`PortGate`].
#[derive(Debug, Clone)]
pub struct PortHandle {
    rx: watch::Receiver<Option<i32>>,
}

impl PortHandle {
    /// Wait until the gate releases, bounded by `timeout`.
    ///
    /// Dropping the returned future (caller cancellation) leaves the gate and
    /// every other waiter untouched.
    pub async fn wait(&self, timeout: Duration) -> GateWait {
        let mut rx = self.rx.clone();
        let outcome = match tokio::time::timeout(timeout, rx.wait_for(Option::is_some)).await {
            Ok(Ok(value)) => GateWait::Released(value.unwrap_or(0)),
            // Producer dropped without releasing: the gate can never release.
            Ok(Err(_)) => GateWait::Unreleased,
            Err(_) => GateWait::Unreleased,
        };
        outcome
    }

    /// The current value, without waiting.
    pub fn current(&self) -> Option<i32> {
        *self.rx.borrow()
    }

    /// The resolved port, waiting up to [`PORT_WAIT_BOUND`].
    ///
    /// Answers `0`, the unreleased default, when nothing is published within
    /// the bound: degraded, not an error.
    pub async fn port(&self) -> i32 {
        match self.wait(PORT_WAIT_BOUND).await {
            GateWait::Released(port) => port,
            GateWait::Unreleased => 0,
        }
    }
}
