//!
//! # est21 Parasitic RC Estimation
//!
//! Estimates the resistance and capacitance of signal nets ahead of detailed routing,
//! from either a Steiner-tree approximation of each net's placed pins,
//! or the segments produced by a global router.
//! Estimates are kept current across design edits through [IncrementalParasiticsGuard].
//!

// Re-exports of our sibling crates
pub use design21 as design;
pub use est21utils as utils;

pub mod error;
pub use error::*;

pub mod units;
pub use units::*;

pub mod corner;
pub use corner::*;

pub mod wire_rc;
pub use wire_rc::*;

pub mod steiner;
pub use steiner::*;

pub mod groute;
pub use groute::*;

pub mod network;
pub use network::*;

pub mod parasitics;
pub use parasitics::*;

pub mod timing;
pub use timing::*;

pub mod spef;
pub use spef::*;

pub mod estimator;
pub use estimator::*;

pub mod route;
pub use route::*;

pub mod resistance;
pub use resistance::*;

pub mod guard;
pub use guard::*;

pub mod config;
pub use config::*;

// Internal implementation modules
mod build;
mod pad;
mod placement;

#[cfg(test)]
mod tests;
