//! HTTP endpoint server for a single injected `String -> String` transform.
//!
//! # Architecture Overview
//!
//! ```text
//!   key=value CLI tokens ─┐
//!                         ├──▶ ┌────────┐  EffectiveAddress   ┌───────────┐
//!   process environment ──┘    │ config │ ──────────────────▶ │  server   │
//!                              └────────┘                     │ bootstrap │
//!                                                             └─────┬─────┘
//!                                               port < 0            │ port >= 0
//!                                        ┌───────────────────┬──────┴──────────┐
//!                                        ▼                   ▼                 │
//!                                 release(port)       spawn worker task        │
//!                                        │             bind ─▶ serve POST /    │
//!                                        │                   │                 │
//!                                        ▼                   ▼                 │
//!                                   ┌──────────┐     release(actual port)      │
//!                                   │   sync   │ ◀───────────┘                 │
//!                                   │ PortGate │                               ▼
//!                                   └────┬─────┘                  runs until process exit
//!                                        │ wait(timeout)
//!                                        ▼
//!                               any number of callers
//! ```
//!
//! [`ServerBootstrap::start`] never blocks its caller: with a negative
//! configured port it disables serving and releases the gate immediately;
//! otherwise the bind and accept loop run on a long-lived worker task and the
//! gate releases once the listener reports the port it actually bound. That
//! resolved value is what [`PortHandle`] waiters see, which matters when port
//! `0` ("any free port") was requested.

// Core subsystems
pub mod config;
pub mod http;
pub mod server;
pub mod sync;

pub use config::{ConfigError, ConfigurationSnapshot, EffectiveAddress};
pub use http::Transform;
pub use server::{ServeError, ServeHandle, ServerBootstrap};
pub use sync::{GateWait, PortHandle};

/// Composition root: build a [`ServerBootstrap`] from CLI override tokens,
/// the process environment, and the injected transform.
///
/// Configuration problems surface here, synchronously, before any network
/// resource is touched.
pub fn compose(overrides: &[String], transform: Transform) -> Result<ServerBootstrap, ConfigError> {
    let snapshot = ConfigurationSnapshot::from_process(overrides);
    let address = EffectiveAddress::resolve(&snapshot)?;
    Ok(ServerBootstrap::new(address, transform))
}
