//!
//! # Parasitics Store
//!
//! Per-corner results of estimation: reduced driver models, and the networks retained for queries.
//!

// Std-Lib
use std::collections::HashMap;

// Local imports
use crate::design::{NetKey, PinKey};
use crate::ParasiticNetwork;

/// # Reduced Parasitic
///
/// A net's network as seen from its driver: total capacitance, and Elmore delay to each load pin.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedParasitic {
    pub net: NetKey,
    pub drvr: PinKey,
    /// Total capacitance, in farads
    pub total_cap: f64,
    /// Elmore delay to each load pin, in seconds
    pub elmore: Vec<(PinKey, f64)>,
}
impl ReducedParasitic {
    /// Elmore delay to `load`
    pub fn elmore(&self, load: PinKey) -> Option<f64> {
        self.elmore.iter().find(|(p, _)| *p == load).map(|(_, d)| *d)
    }
}

/// # Parasitics of one Corner
#[derive(Debug, Clone, Default)]
pub struct Parasitics {
    networks: HashMap<NetKey, ParasiticNetwork>,
    reduced: HashMap<PinKey, ReducedParasitic>,
}
impl Parasitics {
    /// Retain `network`, replacing any prior network of its net
    pub fn set_network(&mut self, network: ParasiticNetwork) {
        self.networks.insert(network.net, network);
    }
    /// Retained network of `net`
    pub fn network(&self, net: NetKey) -> Option<&ParasiticNetwork> {
        self.networks.get(&net)
    }
    /// Store `reduced`, replacing any prior model of its driver
    pub fn set_reduced(&mut self, reduced: ReducedParasitic) {
        self.reduced.insert(reduced.drvr, reduced);
    }
    /// Reduced model driven by `drvr`
    pub fn reduced(&self, drvr: PinKey) -> Option<&ReducedParasitic> {
        self.reduced.get(&drvr)
    }
    /// Discard everything estimated for `net`
    pub fn erase_net(&mut self, net: NetKey) {
        self.networks.remove(&net);
        self.reduced.retain(|_, r| r.net != net);
    }
    /// Boolean indication of whether anything is held for `net`
    pub fn has_net(&self, net: NetKey) -> bool {
        self.networks.contains_key(&net) || self.reduced.values().any(|r| r.net == net)
    }
    /// Discard everything
    pub fn clear(&mut self) {
        self.networks.clear();
        self.reduced.clear();
    }
    /// Number of retained networks
    pub fn network_count(&self) -> usize {
        self.networks.len()
    }
}
