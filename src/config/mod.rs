//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! key=value CLI tokens ─┐
//!                       ├─▶ ConfigurationSnapshot (ordered property sources)
//! process environment ──┘               │
//!                                       ▼
//!                        placeholder resolution (resolver.rs)
//!                                       │
//!                                       ▼
//!                         EffectiveAddress { host, port }
//! ```
//!
//! # Design Decisions
//! - The snapshot is immutable once built; there is no reload path
//! - Precedence is positional: the CLI source, when present, always scans first
//! - A malformed port is an error, never silently defaulted

pub mod resolver;
pub mod source;

pub use resolver::{ConfigError, EffectiveAddress};
pub use source::{ConfigurationSnapshot, PropertySource};
