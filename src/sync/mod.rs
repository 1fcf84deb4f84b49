//! One-shot synchronization between the serving worker and port observers.
//!
//! # Design Decisions
//! - Built on `tokio::sync::watch`: one writer, any number of waiters, every
//!   waiter observes the identical released value
//! - The producing side is consumed on release, so "released exactly once" is
//!   a compile-time property rather than a runtime check

pub mod gate;

pub use gate::{GateWait, PortGate, PortHandle, PORT_WAIT_BOUND};
