//!
//! # Layer & Wire RC Tables
//!
//! Per-corner resistance and capacitance per unit length, in ohms per meter and farads per meter.
//! Tables are sized lazily on first write; reads of an unconfigured table return zero.
//!

// Crates.io
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::design::{Block, Tech, TechLayer};

/// Floor for resistors representing nominally zero-length connections, in ohms
pub const MIN_RESISTANCE: f64 = 1.0e-3;

/// # Directional Wire RC
///
/// Horizontal and vertical resistance and capacitance per unit length for one corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DirRc {
    pub h_res: f64,
    pub h_cap: f64,
    pub v_res: f64,
    pub v_cap: f64,
}
impl DirRc {
    /// Mean of horizontal and vertical resistance, for callers which do not know the wire direction
    pub fn res(&self) -> f64 {
        (self.h_res + self.v_res) / 2.0
    }
    /// Mean of horizontal and vertical capacitance,
    /// for callers which do not know the wire direction
    pub fn cap(&self) -> f64 {
        (self.h_cap + self.v_cap) / 2.0
    }
    /// Resistance blended by the horizontal and vertical fractions `dx` and `dy` of a wire
    pub fn blend_res(&self, dx: f64, dy: f64) -> f64 {
        dx * self.h_res + dy * self.v_res
    }
    /// Capacitance blended by the horizontal and vertical fractions `dx` and `dy` of a wire
    pub fn blend_cap(&self, dx: f64, dy: f64) -> f64 {
        dx * self.h_cap + dy * self.v_cap
    }
}

/// Wire classes, with separately configured RC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireClass {
    Signal,
    Clock,
}

/// # Wire RC Tables
#[derive(Debug, Clone, Default)]
pub struct WireRc {
    corner_count: usize,
    layer_count: usize,
    /// Indexed `[layer number][corner]`
    layer_res: Vec<Vec<f64>>,
    layer_cap: Vec<Vec<f64>>,
    /// Indexed by corner
    signal: Vec<DirRc>,
    clock: Vec<DirRc>,
}
impl WireRc {
    /// Create empty tables for `layer_count` layers and `corner_count` corners
    pub fn new(layer_count: usize, corner_count: usize) -> Self {
        Self {
            corner_count,
            layer_count,
            ..Default::default()
        }
    }
    /// Number of corners the tables are sized for
    pub fn corner_count(&self) -> usize {
        self.corner_count
    }
    /// Set the resistance (ohm/m) and capacitance (F/m) of `layer` at `corner`.
    /// Cut layers store resistance per cut, in ohms.
    pub fn set_layer_rc(&mut self, layer: usize, corner: usize, res: f64, cap: f64) {
        if self.layer_res.is_empty() {
            self.layer_res = vec![vec![0.0; self.corner_count]; self.layer_count];
            self.layer_cap = vec![vec![0.0; self.corner_count]; self.layer_count];
        }
        // Grow for layers or corners beyond the initial sizing
        if layer >= self.layer_res.len() {
            self.layer_res.resize(layer + 1, vec![0.0; self.corner_count]);
            self.layer_cap.resize(layer + 1, vec![0.0; self.corner_count]);
        }
        for row in self.layer_res.iter_mut().chain(self.layer_cap.iter_mut()) {
            if corner >= row.len() {
                row.resize(corner + 1, 0.0);
            }
        }
        self.layer_res[layer][corner] = res;
        self.layer_cap[layer][corner] = cap;
    }
    /// Get the (resistance, capacitance) of `layer` at `corner`. Zeroes if never configured.
    pub fn layer_rc(&self, layer: usize, corner: usize) -> (f64, f64) {
        let res = self.layer_res.get(layer).and_then(|r| r.get(corner));
        let cap = self.layer_cap.get(layer).and_then(|c| c.get(corner));
        (res.copied().unwrap_or(0.0), cap.copied().unwrap_or(0.0))
    }
    /// Boolean indication of whether any per-layer RC has been configured
    pub fn has_layer_rc(&self) -> bool {
        !self.layer_res.is_empty()
    }
    /// Per-unit-length RC of routing layer `layer` at `corner`.
    /// Falls back to the layer's intrinsic sheet resistance and area/edge capacitance
    /// when no per-layer table has been configured.
    pub fn wire_layer_rc(
        &self,
        layer: &TechLayer,
        corner: usize,
        dbu_per_micron: u32,
    ) -> (f64, f64) {
        if self.has_layer_rc() {
            return self.layer_rc(layer.number, corner);
        }
        let width = layer.width as f64 / f64::from(dbu_per_micron);
        if width <= 0.0 {
            return (0.0, 0.0);
        }
        // ohm/um to ohm/m, and pF/um to F/m
        let res = 1e6 * layer.resistance / width;
        let cap = 1e6 * 1e-12 * (width * layer.capacitance + 2.0 * layer.edge_capacitance);
        (res, cap)
    }
    /// Resistance of a single cut on `layer` at `corner`, configured or intrinsic
    pub fn cut_resistance(&self, layer: &TechLayer, corner: usize) -> f64 {
        if self.has_layer_rc() {
            self.layer_rc(layer.number, corner).0
        } else {
            layer.resistance
        }
    }
    /// Average configured cut resistance across the block's routable layer range.
    /// An unset maximum routing layer defaults to half the technology's routing layers.
    /// Zero if no per-layer table has been configured.
    pub fn average_cut_resistance(&self, tech: &Tech, block: &Block, corner: usize) -> f64 {
        if !self.has_layer_rc() {
            return 0.0;
        }
        let max_level = block
            .max_routing_layer
            .unwrap_or_else(|| tech.routing_layer_count() / 2);
        let (min_layer, max_layer) = match (
            tech.find_routing_layer(block.min_routing_layer),
            tech.find_routing_layer(max_level),
        ) {
            (Some(lo), Some(hi)) => (lo.number, hi.number),
            _ => return 0.0,
        };
        let cuts: Vec<f64> = (min_layer..=max_layer)
            .filter_map(|n| tech.layer(n))
            .filter(|l| l.is_cut())
            .map(|l| self.layer_rc(l.number, corner).0)
            .collect();
        if cuts.is_empty() {
            0.0
        } else {
            cuts.iter().sum::<f64>() / cuts.len() as f64
        }
    }

    fn dir_table(&mut self, class: WireClass) -> &mut Vec<DirRc> {
        let count = self.corner_count;
        let table = match class {
            WireClass::Signal => &mut self.signal,
            WireClass::Clock => &mut self.clock,
        };
        if table.len() < count {
            table.resize(count, DirRc::default());
        }
        table
    }
    /// Set the horizontal wire RC of `class` at `corner`
    pub fn set_h_wire_rc(&mut self, class: WireClass, corner: usize, res: f64, cap: f64) {
        let table = self.dir_table(class);
        if corner >= table.len() {
            table.resize(corner + 1, DirRc::default());
        }
        table[corner].h_res = res;
        table[corner].h_cap = cap;
    }
    /// Set the vertical wire RC of `class` at `corner`
    pub fn set_v_wire_rc(&mut self, class: WireClass, corner: usize, res: f64, cap: f64) {
        let table = self.dir_table(class);
        if corner >= table.len() {
            table.resize(corner + 1, DirRc::default());
        }
        table[corner].v_res = res;
        table[corner].v_cap = cap;
    }
    /// Directional wire RC of `class` at `corner`. Zeroes if never configured.
    pub fn wire_rc(&self, class: WireClass, corner: usize) -> DirRc {
        let table = match class {
            WireClass::Signal => &self.signal,
            WireClass::Clock => &self.clock,
        };
        table.get(corner).copied().unwrap_or_default()
    }
    /// Scalar wire resistance of `class` at `corner`: the mean of horizontal and vertical
    pub fn wire_resistance(&self, class: WireClass, corner: usize) -> f64 {
        self.wire_rc(class, corner).res()
    }
    /// Scalar wire capacitance of `class` at `corner`: the mean of horizontal and vertical
    pub fn wire_capacitance(&self, class: WireClass, corner: usize) -> f64 {
        self.wire_rc(class, corner).cap()
    }
    /// Boolean indication of whether signal wire RC has been configured
    pub fn has_signal_rc(&self) -> bool {
        !self.signal.is_empty()
    }
}
