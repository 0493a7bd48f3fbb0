//! Typed wire schemas for the MAAS spaces deployment tooling
//!
//! This library defines every document exchanged with the outside world:
//! - Inventory responses and typed request builders for the MAAS API
//! - The bundle file consumed to derive per-machine segment requirements
//! - The cluster status document sampled while waiting for convergence

pub mod bundle;
pub mod maas;
pub mod status;

pub use bundle::{Bundle, BundleError, ServiceSpec};
pub use status::{ClusterStatus, Incomplete};
