//!
//! # Block Callbacks
//!
//! Observer interface for [Block] mutations.
//! A [Block] holds at most one registered owner at a time; see [Block::add_callback_owner].
//!

// Local imports
use crate::{Block, InstKey, NetKey, PinKey};

///
/// # Block Callback Trait
///
/// Every method is invoked *after* its mutation has been applied,
/// except [BlockCallback::net_destroyed], which is invoked while the net still exists.
/// Default implementations do nothing.
///
pub trait BlockCallback {
    fn inst_created(&mut self, _block: &Block, _inst: InstKey) {}
    fn inst_moved(&mut self, _block: &Block, _inst: InstKey) {}
    fn inst_master_swapped(&mut self, _block: &Block, _inst: InstKey) {}
    fn net_created(&mut self, _block: &Block, _net: NetKey) {}
    fn net_destroyed(&mut self, _block: &Block, _net: NetKey) {}
    fn pin_post_connect(&mut self, _block: &Block, _pin: PinKey) {}
    /// Called with the net `pin` was connected to before disconnection
    fn pin_post_disconnect(&mut self, _block: &Block, _pin: PinKey, _net: NetKey) {}
}
