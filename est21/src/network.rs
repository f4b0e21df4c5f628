//!
//! # Parasitic Networks
//!
//! One [ParasiticNetwork] per net per corner: lumped capacitance on nodes,
//! and resistors between them.
//! Networks are rebuilt from scratch whenever their net changes, never edited in place.
//!

// Std-Lib
use std::collections::HashMap;

// Local imports
use crate::design::{Int, NetKey, PinKey};
use crate::SteinerPt;

/// # Node Identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeId {
    /// A pin of the net
    Pin(PinKey),
    /// A point of the net's Steiner tree
    Steiner(SteinerPt),
    /// A global-route grid point, at (x, y) on a routing level
    Grid { x: Int, y: Int, layer: usize },
    /// Intermediate point of the via stack down to `pin`, just below cut layer number `layer`
    Via { pin: PinKey, layer: usize },
}

/// Index of a node in its [ParasiticNetwork]
pub type NodeIdx = usize;

/// # Parasitic Node
#[derive(Debug, Clone, PartialEq)]
pub struct ParasiticNode {
    pub id: NodeId,
    /// Lumped capacitance, in farads
    pub cap: f64,
}

/// # Resistor
#[derive(Debug, Clone, PartialEq)]
pub struct Resistor {
    /// Sequential id within the network, starting at one
    pub id: usize,
    /// Resistance, in ohms
    pub value: f64,
    pub n1: NodeIdx,
    pub n2: NodeIdx,
}
impl Resistor {
    /// The node across from `node`, if we are incident on it
    pub fn other(&self, node: NodeIdx) -> Option<NodeIdx> {
        if self.n1 == node {
            Some(self.n2)
        } else if self.n2 == node {
            Some(self.n1)
        } else {
            None
        }
    }
}

/// # Parasitic Network
#[derive(Debug, Clone, PartialEq)]
pub struct ParasiticNetwork {
    pub net: NetKey,
    nodes: Vec<ParasiticNode>,
    node_index: HashMap<NodeId, NodeIdx>,
    resistors: Vec<Resistor>,
    /// Resistor indices incident on each node
    incident: Vec<Vec<usize>>,
}
impl ParasiticNetwork {
    /// Create a new and empty network for `net`
    pub fn new(net: NetKey) -> Self {
        Self {
            net,
            nodes: Vec::new(),
            node_index: HashMap::new(),
            resistors: Vec::new(),
            incident: Vec::new(),
        }
    }
    /// Find or create the node identified by `id`
    pub fn ensure_node(&mut self, id: NodeId) -> NodeIdx {
        if let Some(idx) = self.node_index.get(&id) {
            return *idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(ParasiticNode { id, cap: 0.0 });
        self.incident.push(Vec::new());
        self.node_index.insert(id, idx);
        idx
    }
    /// Find the node identified by `id`
    pub fn find_node(&self, id: &NodeId) -> Option<NodeIdx> {
        self.node_index.get(id).copied()
    }
    /// Get a reference to node `idx`
    pub fn node(&self, idx: NodeIdx) -> Option<&ParasiticNode> {
        self.nodes.get(idx)
    }
    /// Add `cap` to node `idx`
    pub fn incr_cap(&mut self, idx: NodeIdx, cap: f64) {
        if let Some(node) = self.nodes.get_mut(idx) {
            node.cap += cap;
        }
    }
    /// Add a resistor of `value` ohms between `n1` and `n2`
    pub fn make_resistor(&mut self, id: usize, value: f64, n1: NodeIdx, n2: NodeIdx) {
        let ridx = self.resistors.len();
        self.resistors.push(Resistor { id, value, n1, n2 });
        if let Some(inc) = self.incident.get_mut(n1) {
            inc.push(ridx);
        }
        if n2 != n1 {
            if let Some(inc) = self.incident.get_mut(n2) {
                inc.push(ridx);
            }
        }
    }
    pub fn nodes(&self) -> &[ParasiticNode] {
        &self.nodes
    }
    pub fn resistors(&self) -> &[Resistor] {
        &self.resistors
    }
    /// Resistors incident on node `idx`, as (resistor index, resistor) pairs
    pub fn incident(&self, idx: NodeIdx) -> impl Iterator<Item = (usize, &Resistor)> + '_ {
        self.incident
            .get(idx)
            .into_iter()
            .flatten()
            .map(move |r| (*r, &self.resistors[*r]))
    }
    /// Sum of all node capacitance
    pub fn total_cap(&self) -> f64 {
        self.nodes.iter().map(|n| n.cap).sum()
    }
    /// Sum of all resistance
    pub fn total_res(&self) -> f64 {
        self.resistors.iter().map(|r| r.value).sum()
    }
    /// Pins with nodes in the network
    pub fn pins(&self) -> Vec<PinKey> {
        self.nodes
            .iter()
            .filter_map(|n| match n.id {
                NodeId::Pin(p) => Some(p),
                _ => None,
            })
            .collect()
    }
}
