//! Listener lifecycle: decide, bind in the background, publish the port.

use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::EffectiveAddress;
use crate::http::{FunctionEndpoint, Transform};
use crate::sync::{PortGate, PortHandle};

/// Upper bound on how long the bind itself may take.
const BIND_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors fatal to the serving worker.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The configured host/port cannot form a socket address.
    #[error("invalid listen address `{0}`")]
    Address(String),

    /// The transport refused the bind (address in use, permission, ...).
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The bind did not complete within [`BIND_TIMEOUT`].
    #[error("bind did not complete within {0:?}")]
    BindTimeout(Duration),

    /// The accept/serve loop died.
    #[error("serve loop failed: {0}")]
    Serve(std::io::Error),

    /// The worker task itself was torn down.
    #[error("server worker terminated abnormally: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Lifecycle of the single listener.
///
/// One transition chain per process: `NotStarted -> Disabled` or
/// `NotStarted -> Binding -> Bound`; `Disabled` and `Bound` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerState {
    NotStarted,
    Disabled { port: i32 },
    Binding,
    Bound { port: u16 },
}

impl ServerState {
    /// The transition out of `NotStarted` for a configured port.
    fn on_start(port: i32) -> Self {
        if port < 0 {
            ServerState::Disabled { port }
        } else {
            ServerState::Binding
        }
    }

    /// What a terminal state publishes through the gate.
    ///
    /// Non-terminal states never publish; their value is the gate's
    /// unreleased default.
    fn gate_value(self) -> i32 {
        match self {
            ServerState::Disabled { port } => port,
            ServerState::Bound { port } => i32::from(port),
            ServerState::NotStarted | ServerState::Binding => 0,
        }
    }
}

/// Owns the listener lifecycle and the gate's producing side.
///
/// Built by the composition root; all other components only ever hold the
/// [`PortHandle`]s this hands out.
pub struct ServerBootstrap {
    address: EffectiveAddress,
    transform: Transform,
    gate: PortGate,
    started_at: Instant,
    state: ServerState,
}

impl std::fmt::Debug for ServerBootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerBootstrap")
            .field("address", &self.address)
            .field("transform", &"<transform>")
            .field("gate", &self.gate)
            .field("started_at", &self.started_at)
            .field("state", &self.state)
            .finish()
    }
}

impl ServerBootstrap {
    /// A bootstrap for the resolved address and injected transform.
    pub fn new(address: EffectiveAddress, transform: Transform) -> Self {
        Self {
            address,
            transform,
            gate: PortGate::new(),
            started_at: Instant::now(),
            state: ServerState::NotStarted,
        }
    }

    /// The configured listen address.
    pub fn address(&self) -> &EffectiveAddress {
        &self.address
    }

    /// Read/wait access to the resolved port; valid before and after `start`.
    pub fn ports(&self) -> PortHandle {
        self.gate.handle()
    }

    /// Run the start state machine. Never blocks the caller.
    ///
    /// A negative configured port disables serving and releases the gate with
    /// that port immediately; otherwise the bind and serve loop run on a
    /// spawned worker and the gate releases once the bind completes.
    pub fn start(self) -> ServeHandle {
        debug_assert!(matches!(self.state, ServerState::NotStarted));
        match ServerState::on_start(self.address.port) {
            state @ ServerState::Disabled { port } => {
                tracing::info!(port, "No server to run");
                self.gate.release(state.gate_value());
                ServeHandle { worker: None }
            }
            _ => {
                let worker = tokio::spawn(bind_and_serve(
                    self.address,
                    self.transform,
                    self.gate,
                    self.started_at,
                ));
                ServeHandle {
                    worker: Some(worker),
                }
            }
        }
    }
}

/// Handle to the serving worker returned by [`ServerBootstrap::start`].
///
/// The process should stay alive exactly as long as the worker, so the usual
/// pattern is to `join` this from `main`.
#[derive(Debug)]
pub struct ServeHandle {
    worker: Option<JoinHandle<Result<(), ServeError>>>,
}

impl ServeHandle {
    /// Whether a worker was spawned (false when serving is disabled).
    pub fn is_serving(&self) -> bool {
        self.worker.is_some()
    }

    /// Wait for the worker to exit.
    ///
    /// Resolves immediately on the disabled path. A bind failure surfaces
    /// here; it is fatal and never retried.
    pub async fn join(self) -> Result<(), ServeError> {
        match self.worker {
            Some(worker) => worker.await?,
            None => Ok(()),
        }
    }
}

/// Long-lived worker: bind, publish the actual port, serve until process exit.
async fn bind_and_serve(
    address: EffectiveAddress,
    transform: Transform,
    gate: PortGate,
    started_at: Instant,
) -> Result<(), ServeError> {
    let addr = socket_addr(&address)?;
    tracing::debug!(%addr, state = ?ServerState::Binding, "Binding listener");

    let listener = tokio::time::timeout(BIND_TIMEOUT, TcpListener::bind(addr))
        .await
        .map_err(|_| ServeError::BindTimeout(BIND_TIMEOUT))?
        .map_err(|source| ServeError::Bind { addr, source })?;

    // The actual port replaces an ephemeral 0 request with the OS choice.
    let bound_port = listener
        .local_addr()
        .map_err(|source| ServeError::Bind { addr, source })?
        .port();
    let state = ServerState::Bound { port: bound_port };
    tracing::debug!(?state, "Listener bound");

    gate.release(state.gate_value());
    tracing::info!(
        port = bound_port,
        uptime_ms = started_at.elapsed().as_millis() as u64,
        "Server started"
    );

    let app = FunctionEndpoint::new(transform).into_router();
    axum::serve(listener, app).await.map_err(ServeError::Serve)?;
    Ok(())
}

/// Turn the effective address into a bindable socket address.
fn socket_addr(address: &EffectiveAddress) -> Result<SocketAddr, ServeError> {
    let host: IpAddr = address
        .host
        .parse()
        .map_err(|_| ServeError::Address(address.host.clone()))?;
    let port = u16::try_from(address.port)
        .map_err(|_| ServeError::Address(format!("{}:{}", address.host, address.port)))?;
    Ok(SocketAddr::new(host, port))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::sync::GateWait;

    fn identity() -> Transform {
        Arc::new(|body: String| body)
    }

    fn address(host: &str, port: i32) -> EffectiveAddress {
        EffectiveAddress {
            host: host.to_string(),
            port,
        }
    }

    #[test]
    fn start_decision_follows_the_port_sign() {
        assert_eq!(
            ServerState::on_start(-1),
            ServerState::Disabled { port: -1 }
        );
        assert_eq!(ServerState::on_start(0), ServerState::Binding);
        assert_eq!(ServerState::on_start(8080), ServerState::Binding);
    }

    #[test]
    fn terminal_states_publish_their_port() {
        assert_eq!(ServerState::Disabled { port: -7 }.gate_value(), -7);
        assert_eq!(ServerState::Bound { port: 8080 }.gate_value(), 8080);
        assert_eq!(ServerState::Binding.gate_value(), 0);
    }

    #[test]
    fn socket_addr_rejects_bad_host_and_oversized_port() {
        assert!(matches!(
            socket_addr(&address("not-an-ip", 80)),
            Err(ServeError::Address(_))
        ));
        assert!(matches!(
            socket_addr(&address("127.0.0.1", 70_000)),
            Err(ServeError::Address(_))
        ));
    }

    #[tokio::test]
    async fn negative_port_disables_without_blocking() {
        let bootstrap = ServerBootstrap::new(address("127.0.0.1", -1), identity());
        let ports = bootstrap.ports();

        let handle = bootstrap.start();
        assert!(!handle.is_serving());

        // Released already; no waiting involved.
        assert_eq!(ports.current(), Some(-1));
        assert_eq!(ports.port().await, -1);
        handle.join().await.unwrap();
    }

    #[tokio::test]
    async fn ephemeral_bind_publishes_a_real_port() {
        let bootstrap = ServerBootstrap::new(address("127.0.0.1", 0), identity());
        let ports = bootstrap.ports();

        let handle = bootstrap.start();
        assert!(handle.is_serving());

        match ports.wait(Duration::from_secs(5)).await {
            GateWait::Released(port) => assert!(port > 0),
            GateWait::Unreleased => panic!("bind never completed"),
        }
    }

    #[tokio::test]
    async fn bad_host_is_fatal_and_leaves_the_gate_unreleased() {
        let bootstrap = ServerBootstrap::new(address("not-an-ip", 0), identity());
        let ports = bootstrap.ports();

        let err = bootstrap.start().join().await.unwrap_err();
        assert!(matches!(err, ServeError::Address(_)));
        assert_eq!(
            ports.wait(Duration::from_millis(100)).await,
            GateWait::Unreleased
        );
    }
}
