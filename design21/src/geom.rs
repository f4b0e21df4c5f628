//!
//! # Geometry Module
//!
//! Planar points and directions, in database units.
//!

// Crates.io
use derive_more::{Add, Sub};
use serde::{Deserialize, Serialize};

// Local imports
use crate::Int;

/// # Point in two-dimensional layout-space
#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Add,
    Sub,
)]
pub struct Point {
    pub x: Int,
    pub y: Int,
}
impl Point {
    /// Create a new [Point] from (x,y) coordinates
    pub fn new(x: Int, y: Int) -> Self {
        Self { x, y }
    }
    /// Get the coordinate associated with direction `dir`
    pub fn coord(&self, dir: Dir) -> Int {
        match dir {
            Dir::Horiz => self.x,
            Dir::Vert => self.y,
        }
    }
    /// Rectilinear (Manhattan) distance to `other`
    pub fn manhattan(&self, other: &Point) -> Int {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}
impl From<(Int, Int)> for Point {
    fn from(xy: (Int, Int)) -> Self {
        Self::new(xy.0, xy.1)
    }
}

/// Direction Enumeration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Dir {
    Horiz,
    Vert,
}
impl Dir {
    /// Whichever direction we are, return the other one.
    pub fn other(self) -> Self {
        match self {
            Self::Horiz => Self::Vert,
            Self::Vert => Self::Horiz,
        }
    }
}
