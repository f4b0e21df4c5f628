//!
//! # Pad Nets
//!
//! A net joining a top-level port directly to a pad cell's terminal
//! is a bond-wire-length connection, modeled as a single minimum resistor.
//!

// Local imports
use crate::spef::reborrow;
use crate::design::{Block, NetKey, PinKey};
use crate::{EstResult, Estimator, NodeId, ParasiticNetwork, SpefWriter, MIN_RESISTANCE};

/// Boolean indication of whether `pin` is a terminal of a pad-cell instance
fn is_pad_pin(block: &Block, pin: PinKey) -> bool {
    block
        .pin_inst(pin)
        .and_then(|inst| block.inst_master(inst))
        .map(|m| m.master_type.is_pad())
        .unwrap_or(false)
}

/// Boolean indication of whether `net` has exactly two pins,
/// one a top-level port and the other a pad terminal
pub(crate) fn is_pad_net(block: &Block, net: NetKey) -> bool {
    let pins = match block.net(net) {
        Some(n) if n.pins.len() == 2 => &n.pins,
        _ => return false,
    };
    let (p1, p2) = (pins[0], pins[1]);
    (block.is_top_level_port(p1) && is_pad_pin(block, p2))
        || (is_pad_pin(block, p1) && block.is_top_level_port(p2))
}

impl Estimator {
    /// Estimate pad net `net`: its two pins joined by a minimum resistor, without capacitance
    pub(crate) fn make_pad_parasitic(
        &mut self,
        block: &Block,
        net: NetKey,
        spef: Option<&mut dyn SpefWriter>,
    ) -> EstResult<()> {
        let (p1, p2) = match block.net(net) {
            Some(n) if n.pins.len() == 2 => (n.pins[0], n.pins[1]),
            _ => return Ok(()),
        };
        let drvr = block.net_drivers(net).first().copied();
        log::debug!(target: "estimate_parasitics", "Pad net {}", block.pin_name(p1));
        let mut spef = spef;
        for corner in 0..self.corners.len() {
            let mut network = ParasiticNetwork::new(net);
            let n1 = network.ensure_node(NodeId::Pin(p1));
            let n2 = network.ensure_node(NodeId::Pin(p2));
            network.make_resistor(1, MIN_RESISTANCE, n1, n2);
            let keep = self.keep_networks;
            self.finish_network(block, network, drvr, corner, reborrow(&mut spef), keep)?;
        }
        Ok(())
    }
}
