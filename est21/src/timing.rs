//!
//! # Timing Engine Interface
//!
//! The estimator hands each finished network to a [TimingEngine] for reduction,
//! and tells it which nets' delays have gone stale.
//! [ElmoreCalc] is a reference engine computing Elmore delays.
//!

// Std-Lib
use std::collections::HashSet;

// Local imports
use crate::design::{Block, NetKey, PinKey};
use crate::{Corner, NodeId, ParasiticNetwork, ReducedParasitic};

///
/// # Timing Engine Trait
///
pub trait TimingEngine {
    /// Boolean indication of whether `drvr` drives an ideal clock at `corner`.
    /// Ideal clock nets get no estimated parasitics.
    fn is_ideal_clock(&self, block: &Block, drvr: PinKey, corner: &Corner) -> bool;
    /// Reduce `network`, as driven from `drvr`, into a delay model
    fn reduce_parasitic(
        &mut self,
        block: &Block,
        network: &ParasiticNetwork,
        drvr: PinKey,
        corner: &Corner,
    ) -> Option<ReducedParasitic>;
    /// Invalidate any cached delays downstream of `net`'s fanin
    fn delays_invalid_from_fanin(&mut self, block: &Block, net: NetKey);
}

/// # Elmore Delay Calculator
#[derive(Debug, Clone, Default)]
pub struct ElmoreCalc {
    /// Nets treated as ideal clocks
    pub ideal_clocks: HashSet<NetKey>,
    /// Nets whose delays have been invalidated, in order
    pub invalidated: Vec<NetKey>,
}
impl TimingEngine for ElmoreCalc {
    fn is_ideal_clock(&self, block: &Block, drvr: PinKey, _corner: &Corner) -> bool {
        match block.pin(drvr).and_then(|p| p.net) {
            Some(net) => self.ideal_clocks.contains(&net),
            None => false,
        }
    }
    fn reduce_parasitic(
        &mut self,
        _block: &Block,
        network: &ParasiticNetwork,
        drvr: PinKey,
        _corner: &Corner,
    ) -> Option<ReducedParasitic> {
        let root = network.find_node(&NodeId::Pin(drvr))?;
        let count = network.nodes().len();

        // Spanning walk from the driver, recording each node's parent edge
        let mut order = Vec::with_capacity(count);
        let mut parent: Vec<Option<(usize, f64)>> = vec![None; count];
        let mut visited = vec![false; count];
        let mut stack = vec![root];
        visited[root] = true;
        while let Some(node) = stack.pop() {
            order.push(node);
            for (_, res) in network.incident(node) {
                if let Some(other) = res.other(node) {
                    if !visited[other] {
                        visited[other] = true;
                        parent[other] = Some((node, res.value));
                        stack.push(other);
                    }
                }
            }
        }
        // Downstream capacitance, leaves first
        let mut downstream: Vec<f64> = network.nodes().iter().map(|n| n.cap).collect();
        for node in order.iter().rev() {
            if let Some((p, _)) = parent[*node] {
                downstream[p] += downstream[*node];
            }
        }
        // Delays, root first
        let mut delay = vec![0.0; count];
        for node in order.iter() {
            if let Some((p, res)) = parent[*node] {
                delay[*node] = delay[p] + res * downstream[*node];
            }
        }
        let elmore = network
            .pins()
            .into_iter()
            .filter(|pin| *pin != drvr)
            .filter_map(|pin| {
                let idx = network.find_node(&NodeId::Pin(pin))?;
                if visited[idx] {
                    Some((pin, delay[idx]))
                } else {
                    None
                }
            })
            .collect();
        Some(ReducedParasitic {
            net: network.net,
            drvr,
            total_cap: network.total_cap(),
            elmore,
        })
    }
    fn delays_invalid_from_fanin(&mut self, _block: &Block, net: NetKey) {
        self.invalidated.push(net);
    }
}
