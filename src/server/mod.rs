//! Server bootstrap subsystem.
//!
//! # Data Flow
//! ```text
//! EffectiveAddress ──▶ start()
//!     port < 0:  NotStarted ─▶ Disabled          (gate releases the negative port)
//!     port >= 0: NotStarted ─▶ Binding ─▶ Bound  (gate releases the actual port,
//!                                  │              then serve until process exit)
//!                                  └─ bind failure: fatal to the worker,
//!                                     gate never releases
//! ```
//!
//! # Design Decisions
//! - `start` consumes the bootstrap, so the one-transition-per-process rule
//!   is enforced by ownership
//! - The caller never blocks; only `PortHandle` waits, and only up to its bound
//! - No retry on bind failure; the error reaches `main` through `join`

pub mod bootstrap;

pub use bootstrap::{ServeError, ServeHandle, ServerBootstrap};
