//!
//! # Path Resistance
//!
//! Resistance along the unique path between two nodes of a tree-shaped network.
//! Estimated networks are always trees; a loop is reported as an error.
//!

// Std-Lib
use std::collections::HashSet;

// Local imports
use crate::design::{Block, NetKey, PinKey};
use crate::{EstError, EstResult, Estimator, NodeId, NodeIdx, ParasiticNetwork};

impl Estimator {
    ///
    /// Resistance between pins `pin1` and `pin2` of `net`, in the worst corner's retained network.
    ///
    /// Returns `None` if no network is retained for `net`,
    /// or either pin is absent from it.
    ///
    pub fn pin_resistance(
        &self,
        block: &Block,
        net: NetKey,
        pin1: PinKey,
        pin2: PinKey,
    ) -> EstResult<Option<f64>> {
        let state = self.state.read()?;
        let network = match state.parasitics.get(self.worst_corner).and_then(|p| p.network(net)) {
            Some(n) => n,
            None => return Ok(None),
        };
        path_resistance(block, network, &NodeId::Pin(pin1), &NodeId::Pin(pin2))
    }
}

/// Resistance between nodes `from` and `to` of `network`.
/// `None` if either node is absent, or they are not connected.
pub fn path_resistance(
    block: &Block,
    network: &ParasiticNetwork,
    from: &NodeId,
    to: &NodeId,
) -> EstResult<Option<f64>> {
    let (from, to) = match (network.find_node(from), network.find_node(to)) {
        (Some(f), Some(t)) => (f, t),
        _ => return Ok(None),
    };
    let mut on_path = HashSet::new();
    walk(block, network, from, to, None, &mut on_path)
}

/// Depth-first walk from `node` toward `target`, arriving through resistor `via`
fn walk(
    block: &Block,
    network: &ParasiticNetwork,
    node: NodeIdx,
    target: NodeIdx,
    via: Option<usize>,
    on_path: &mut HashSet<NodeIdx>,
) -> EstResult<Option<f64>> {
    if node == target {
        return Ok(Some(0.0));
    }
    on_path.insert(node);
    for (ridx, res) in network.incident(node) {
        if Some(ridx) == via {
            continue;
        }
        let next = match res.other(node) {
            Some(n) => n,
            None => continue,
        };
        if on_path.contains(&next) {
            let name = block.net(network.net).map(|n| n.name.clone()).unwrap_or_default();
            return Err(EstError::Loop {
                net: network.net,
                name,
            });
        }
        if let Some(r) = walk(block, network, next, target, Some(ridx), on_path)? {
            return Ok(Some(r + res.value));
        }
    }
    on_path.remove(&node);
    Ok(None)
}
