//!
//! # est21 Internal Utilities Crate
//!

pub mod ptr;
pub use ptr::*;

pub mod ser;
pub use ser::*;

pub mod error;
pub use error::*;

pub mod context;
pub use context::*;

pub mod enumstr;
pub use enumstr::*;

pub mod msg;
pub use msg::*;

// Re-exported for the `warn_msg!` macro, which expands in downstream crates.
#[doc(hidden)]
pub use log;
