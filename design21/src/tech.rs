//!
//! # Technology
//!
//! Layer stack, database units, and non-default routing rules.
//! Layers are stored in stack order, bottom-up; a layer's `number` is its index in that order,
//! so adjacent routing layers are separated by exactly one cut layer in a typical stack.
//!

// Crates.io
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

// Local imports
use crate::utils::{enumstr, EnumStr};
use crate::{Dir, Int, NdrKey};

enumstr!(
    /// # Layer Types
    LayerType {
        Routing: "ROUTING",
        Cut: "CUT",
        Masterslice: "MASTERSLICE",
        Overlap: "OVERLAP",
        Implant: "IMPLANT",
    }
);

/// # Technology Layer
///
/// Physical attributes are in LEF units:
/// `width` in dbu, `resistance` in ohms per square (routing) or ohms per cut (cut),
/// `capacitance` in pF per square micron and `edge_capacitance` in pF per micron.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechLayer {
    pub name: String,
    pub layer_type: LayerType,
    /// Index in the layer stack. Assigned by [Tech::add_layer].
    pub number: usize,
    /// One-based routing level, for routing layers. Assigned by [Tech::add_layer].
    pub routing_level: Option<usize>,
    pub direction: Option<Dir>,
    pub width: Int,
    pub resistance: f64,
    pub capacitance: f64,
    pub edge_capacitance: f64,
}
impl TechLayer {
    /// Create a new routing layer
    pub fn routing(
        name: impl Into<String>,
        direction: Dir,
        width: Int,
        resistance: f64,
        capacitance: f64,
        edge_capacitance: f64,
    ) -> Self {
        Self {
            name: name.into(),
            layer_type: LayerType::Routing,
            number: 0,
            routing_level: None,
            direction: Some(direction),
            width,
            resistance,
            capacitance,
            edge_capacitance,
        }
    }
    /// Create a new cut layer, with per-cut resistance `resistance`
    pub fn cut(name: impl Into<String>, resistance: f64) -> Self {
        Self {
            name: name.into(),
            layer_type: LayerType::Cut,
            number: 0,
            routing_level: None,
            direction: None,
            width: 0,
            resistance,
            capacitance: 0.0,
            edge_capacitance: 0.0,
        }
    }
    /// Create a new layer of type `layer_type`, carrying no electrical attributes
    pub fn other(name: impl Into<String>, layer_type: LayerType) -> Self {
        Self {
            name: name.into(),
            layer_type,
            number: 0,
            routing_level: None,
            direction: None,
            width: 0,
            resistance: 0.0,
            capacitance: 0.0,
            edge_capacitance: 0.0,
        }
    }
    /// Boolean indication of whether we are a cut layer
    pub fn is_cut(&self) -> bool {
        self.layer_type == LayerType::Cut
    }
    /// Boolean indication of whether we are a routing layer
    pub fn is_routing(&self) -> bool {
        self.layer_type == LayerType::Routing
    }
}

/// # Non-Default Routing Rule
///
/// Per-layer width overrides, applied to the nets which reference the rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NonDefaultRule {
    pub name: String,
    pub layer_rules: Vec<NdrLayerRule>,
}
/// Width override for a single layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NdrLayerRule {
    /// Layer number
    pub layer: usize,
    pub width: Int,
}

/// # Technology
#[derive(Debug, Clone, Default)]
pub struct Tech {
    /// Database units per micron
    pub dbu_per_micron: u32,
    layers: Vec<TechLayer>,
    ndrs: SlotMap<NdrKey, NonDefaultRule>,
}
impl Tech {
    /// Create a new and empty [Tech]
    pub fn new(dbu_per_micron: u32) -> Self {
        Self {
            dbu_per_micron,
            ..Default::default()
        }
    }
    /// Add a [TechLayer] atop the stack. Returns its layer number.
    pub fn add_layer(&mut self, mut layer: TechLayer) -> usize {
        let number = self.layers.len();
        layer.number = number;
        layer.routing_level = if layer.is_routing() {
            Some(self.routing_layer_count() + 1)
        } else {
            None
        };
        self.layers.push(layer);
        number
    }
    /// Get a reference to the layer numbered `number`
    pub fn layer(&self, number: usize) -> Option<&TechLayer> {
        self.layers.get(number)
    }
    /// Get a reference to the layer named `name`
    pub fn layer_named(&self, name: &str) -> Option<&TechLayer> {
        self.layers.iter().find(|l| l.name == name)
    }
    /// Get a reference to the routing layer at one-based routing level `level`
    pub fn find_routing_layer(&self, level: usize) -> Option<&TechLayer> {
        self.layers
            .iter()
            .find(|l| l.routing_level == Some(level))
    }
    /// Iterate over all layers, bottom-up
    pub fn layers(&self) -> impl Iterator<Item = &TechLayer> {
        self.layers.iter()
    }
    /// Total number of layers, of all types
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
    /// Number of routing layers
    pub fn routing_layer_count(&self) -> usize {
        self.layers.iter().filter(|l| l.is_routing()).count()
    }
    /// Add a [NonDefaultRule]
    pub fn add_ndr(&mut self, ndr: NonDefaultRule) -> NdrKey {
        self.ndrs.insert(ndr)
    }
    /// Get a reference to the [NonDefaultRule] at `key`
    pub fn ndr(&self, key: NdrKey) -> Option<&NonDefaultRule> {
        self.ndrs.get(key)
    }
}
