//!
//! # Network Builder
//!
//! Shared state for constructing one [ParasiticNetwork]:
//! resistor numbering, pi-segments, and attachment of pins to tree and route nodes.
//!

// Std-Lib
use std::collections::HashMap;

// Local imports
use crate::design::{Block, NetKey, PinKey, Tech, TechLayer};
use crate::utils::{ContextStack, ErrorContext, ErrorHelper};
use crate::{EstError, EstResult, NodeId, NodeIdx, ParasiticNetwork, WireRc, MIN_RESISTANCE};

/// Resistance of a wire, or the floor for a wire of no resistance
pub(crate) fn wire_res(res: f64) -> f64 {
    if res > 0.0 {
        res
    } else {
        MIN_RESISTANCE
    }
}

/// Width ratio of `net`'s non-default rule to the default width, on `layer` if given,
/// else on the rule's first layer. One for nets without a widening rule.
pub(crate) fn ndr_width_ratio(
    tech: &Tech,
    block: &Block,
    net: NetKey,
    layer: Option<usize>,
) -> f64 {
    let ndr = match block.net(net).and_then(|n| n.ndr).and_then(|k| tech.ndr(k)) {
        Some(ndr) => ndr,
        None => return 1.0,
    };
    let rule = match layer {
        Some(layer) => ndr.layer_rules.iter().find(|r| r.layer == layer),
        None => ndr.layer_rules.first(),
    };
    let rule = match rule {
        Some(r) => r,
        None => return 1.0,
    };
    match tech.layer(rule.layer) {
        Some(l) if l.width > 0 && rule.width > l.width => rule.width as f64 / l.width as f64,
        _ => 1.0,
    }
}

///
/// # Network Build
///
/// Collects one net's network at one corner.
/// Resistor ids run from one in creation order.
///
pub(crate) struct NetBuild<'a> {
    tech: &'a Tech,
    block: &'a Block,
    wire_rc: &'a WireRc,
    corner: usize,
    pub network: ParasiticNetwork,
    resistor_id: usize,
    /// Node each pin was first attached to
    connected_pins: HashMap<PinKey, NodeIdx>,
    avg_cut_res: Option<f64>,
    ctx: ContextStack,
}
impl<'a> NetBuild<'a> {
    pub fn new(
        tech: &'a Tech,
        block: &'a Block,
        wire_rc: &'a WireRc,
        net: NetKey,
        corner: usize,
    ) -> Self {
        let mut ctx = ContextStack::new();
        ctx.push(ErrorContext::Block(block.name.clone()));
        if let Some(n) = block.net(net) {
            ctx.push(ErrorContext::Net(n.name.clone()));
        }
        Self {
            tech,
            block,
            wire_rc,
            corner,
            network: ParasiticNetwork::new(net),
            resistor_id: 1,
            connected_pins: HashMap::new(),
            avg_cut_res: None,
            ctx,
        }
    }
    pub fn push(&mut self, ctx: ErrorContext) {
        self.ctx.push(ctx)
    }
    pub fn node(&mut self, id: NodeId) -> NodeIdx {
        self.network.ensure_node(id)
    }
    /// Add a resistor with the next sequential id
    pub fn resistor(&mut self, value: f64, n1: NodeIdx, n2: NodeIdx) {
        self.network.make_resistor(self.resistor_id, value, n1, n2);
        self.resistor_id += 1;
    }
    /// Add a pi-model wire: half of `cap` on each end, `res` between
    pub fn pi_segment(&mut self, n1: NodeIdx, n2: NodeIdx, res: f64, cap: f64) {
        self.network.incr_cap(n1, cap / 2.0);
        self.resistor(wire_res(res), n1, n2);
        self.network.incr_cap(n2, cap / 2.0);
    }
    fn average_cut_resistance(&mut self) -> f64 {
        match self.avg_cut_res {
            Some(r) => r,
            None => {
                let r = self.wire_rc.average_cut_resistance(self.tech, self.block, self.corner);
                self.avg_cut_res = Some(r);
                r
            }
        }
    }
    ///
    /// Connect each of `pins` to tree node `node`.
    ///
    /// A pin already attached to this node is skipped;
    /// one attached elsewhere is bridged with a minimum resistor.
    /// With a tree layer and per-layer RC configured, each pin gets a series via stack
    /// from its own layer up to `tree_layer`. Otherwise each pin gets a single resistor
    /// of the average cut resistance.
    ///
    pub fn connect_pins(
        &mut self,
        node: NodeIdx,
        pins: &[PinKey],
        tree_layer: Option<&TechLayer>,
    ) -> EstResult<()> {
        for pin in pins {
            if let Some(prior) = self.connected_pins.get(pin).copied() {
                if prior != node {
                    self.resistor(MIN_RESISTANCE, prior, node);
                }
                continue;
            }
            let pin_node = self.node(NodeId::Pin(*pin));
            self.connected_pins.insert(*pin, pin_node);
            match tree_layer {
                Some(tree_layer) if self.wire_rc.has_layer_rc() => {
                    self.via_stack(node, pin_node, *pin, tree_layer)?;
                }
                _ => {
                    let res = self.average_cut_resistance().max(MIN_RESISTANCE);
                    self.resistor(res, node, pin_node);
                }
            }
        }
        Ok(())
    }
    /// Series resistors through each cut layer between `pin`'s layer and `tree_layer`
    fn via_stack(
        &mut self,
        node: NodeIdx,
        pin_node: NodeIdx,
        pin: PinKey,
        tree_layer: &TechLayer,
    ) -> EstResult<()> {
        if !self.block.is_placed(pin) {
            return Err(EstError::UnplacedPin {
                pin,
                name: self.block.pin_name(pin),
            });
        }
        let pin_layer = match self.block.pin_layer(self.tech, pin) {
            Some(l) => l.number,
            None => {
                return Err(EstError::UnplacedPin {
                    pin,
                    name: self.block.pin_name(pin),
                })
            }
        };
        let (lo, hi) = (pin_layer.min(tree_layer.number), pin_layer.max(tree_layer.number));
        let cuts: Vec<usize> = (lo..hi)
            .filter_map(|n| self.tech.layer(n))
            .filter(|l| l.is_cut())
            .map(|l| l.number)
            .collect();
        if cuts.is_empty() {
            self.resistor(MIN_RESISTANCE, node, pin_node);
            return Ok(());
        }
        // Walk down from the tree node, through one intermediate node per cut
        let mut upper = node;
        for (idx, cut) in cuts.iter().rev().enumerate() {
            let lower = if idx + 1 == cuts.len() {
                pin_node
            } else {
                self.node(NodeId::Via { pin, layer: *cut })
            };
            let res = self.wire_rc.layer_rc(*cut, self.corner).0.max(MIN_RESISTANCE);
            self.resistor(res, upper, lower);
            upper = lower;
        }
        Ok(())
    }
}
impl ErrorHelper for NetBuild<'_> {
    type Error = EstError;
    fn err(&self, msg: impl Into<String>) -> EstError {
        EstError::Context {
            message: msg.into(),
            stack: self.ctx.snapshot(),
        }
    }
}
