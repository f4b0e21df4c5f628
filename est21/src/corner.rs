//!
//! # Analysis Corners
//!

// Crates.io
use serde::{Deserialize, Serialize};

/// # Analysis Corner
///
/// Parasitics are estimated independently per corner.
/// `index` is the corner's position in its [Estimator](crate::Estimator)'s corner list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Corner {
    pub name: String,
    pub index: usize,
}
impl Corner {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}
