//!
//! # Database
//!

// Local imports
use crate::{Block, Tech};

/// # Chip
///
/// A loaded design, which may or may not yet have a top-level [Block].
#[derive(Default)]
pub struct Chip {
    pub block: Option<Block>,
}

/// # Database
///
/// Root of the design data: the technology plus an optionally-loaded [Chip].
#[derive(Default)]
pub struct Database {
    pub tech: Tech,
    pub chip: Option<Chip>,
}
impl Database {
    /// Create a new [Database] with no loaded design
    pub fn new(tech: Tech) -> Self {
        Self { tech, chip: None }
    }
    /// Create a new [Database] with design `block` loaded
    pub fn with_block(tech: Tech, block: Block) -> Self {
        Self {
            tech,
            chip: Some(Chip { block: Some(block) }),
        }
    }
    /// Get a reference to the top-level [Block], if loaded
    pub fn block(&self) -> Option<&Block> {
        self.chip.as_ref().and_then(|c| c.block.as_ref())
    }
    /// Get a mutable reference to the top-level [Block], if loaded
    pub fn block_mut(&mut self) -> Option<&mut Block> {
        self.chip.as_mut().and_then(|c| c.block.as_mut())
    }
    /// Split into the (shared) technology and a mutable [Block]
    pub fn split_mut(&mut self) -> (&Tech, Option<&mut Block>) {
        let block = self.chip.as_mut().and_then(|c| c.block.as_mut());
        (&self.tech, block)
    }
}
