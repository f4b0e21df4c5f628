//!
//! # Physical Design Database
//!
//! The design data the est21 estimator reads:
//! technology layers and units, cell masters, instances, pins and nets.
//! Mutations made through [Block] are pushed to a single registered [BlockCallback] owner.
//!

// Crates.io
use slotmap::new_key_type;

// Internal modules & re-exports
pub use est21utils as utils;

pub mod error;
pub use error::*;

pub mod geom;
pub use geom::*;

pub mod tech;
pub use tech::*;

pub mod master;
pub use master::*;

pub mod block;
pub use block::*;

pub mod callback;
pub use callback::*;

pub mod db;
pub use db::*;

#[cfg(test)]
mod tests;

/// Integer Type-Alias for database distances, in database units (dbu)
pub type Int = isize;

// Create key-types for each internal type stored in [SlotMap]s
new_key_type! {
    /// Keys for [Master] entries
    pub struct MasterKey;
    /// Keys for [Inst] entries
    pub struct InstKey;
    /// Keys for [Net] entries
    pub struct NetKey;
    /// Keys for [Pin] entries, covering both instance terminals and top-level ports
    pub struct PinKey;
    /// Keys for [NonDefaultRule] entries
    pub struct NdrKey;
}
