//!
//! # Placement-Based Estimation
//!
//! Networks built from a Steiner tree over each net's placed pins,
//! with wire RC blended by each branch's horizontal and vertical extent.
//!

// Local imports
use crate::spef::reborrow;
use crate::build::{ndr_width_ratio, NetBuild};
use crate::design::{Block, NetKey, PinKey, Tech, TechLayer};
use crate::pad::is_pad_net;
use crate::utils::ErrorContext;
use crate::{
    dbu_to_meters, EstResult, Estimator, NodeId, ParasiticNetwork, SpefWriter, SteinerTree,
    WireClass, MIN_RESISTANCE,
};

impl Estimator {
    /// Estimate every net of `block` from placement, replacing all prior parasitics
    pub(crate) fn estimate_wire_parasitics(
        &mut self,
        tech: &Tech,
        block: &Block,
        spef: Option<&mut dyn SpefWriter>,
    ) -> EstResult<()> {
        if !self.wire_rc.has_signal_rc() {
            log::debug!(
                target: "estimate_parasitics",
                "No signal wire RC; skipping placement estimate"
            );
            return Ok(());
        }
        {
            let mut state = self.state.write()?;
            for p in state.parasitics.iter_mut() {
                p.clear();
            }
        }
        let nets: Vec<NetKey> = block.nets().map(|(k, _)| k).collect();
        let mut spef = spef;
        for net in nets {
            self.estimate_wire_parasitic(tech, block, net, reborrow(&mut spef))?;
        }
        self.state.write()?.invalid.clear();
        Ok(())
    }

    /// Estimate `net` from placement, as driven by its first driver.
    /// Nets without a driver lose any prior parasitics.
    pub(crate) fn estimate_wire_parasitic(
        &mut self,
        tech: &Tech,
        block: &Block,
        net: NetKey,
        spef: Option<&mut dyn SpefWriter>,
    ) -> EstResult<()> {
        match block.net_drivers(net).first() {
            Some(drvr) => self.estimate_wire_parasitic_from(tech, block, net, *drvr, spef),
            None => {
                self.state.write()?.discard(net);
                Ok(())
            }
        }
    }

    /// Estimate `net` from placement, as driven by `drvr`
    pub(crate) fn estimate_wire_parasitic_from(
        &mut self,
        tech: &Tech,
        block: &Block,
        net: NetKey,
        drvr: PinKey,
        spef: Option<&mut dyn SpefWriter>,
    ) -> EstResult<()> {
        self.state.write()?.discard(net);
        let n = match block.net(net) {
            Some(n) => n,
            None => return Ok(()),
        };
        // Supply and special nets are routed by other means
        if n.sig_type.is_supply() || n.special {
            return Ok(());
        }
        if is_pad_net(block, net) {
            self.make_pad_parasitic(block, net, spef)
        } else {
            self.estimate_wire_parasitic_steiner(tech, block, net, drvr, spef)
        }
    }

    fn estimate_wire_parasitic_steiner(
        &mut self,
        tech: &Tech,
        block: &Block,
        net: NetKey,
        drvr: PinKey,
        spef: Option<&mut dyn SpefWriter>,
    ) -> EstResult<()> {
        let tree = match self.make_steiner_tree(block, drvr) {
            Some(tree) => tree,
            None => return Ok(()),
        };
        if let Some(n) = block.net(net) {
            log::debug!(target: "estimate_parasitics", "Estimate wire {}", n.name);
        }
        let class = if self.router.is_non_leaf_clock(block, net) {
            WireClass::Clock
        } else {
            WireClass::Signal
        };
        let tree_layer = self.tree_layer(tech, class);
        let mut spef = spef;
        for corner in 0..self.corners.len() {
            if self.timing.is_ideal_clock(block, drvr, &self.corners[corner]) {
                continue;
            }
            let network = self.steiner_network(tech, block, net, &tree, class, tree_layer, corner)?;
            let keep = self.keep_networks;
            self.finish_network(block, network, Some(drvr), corner, reborrow(&mut spef), keep)?;
        }
        Ok(())
    }

    /// Build the network of `tree` at `corner`
    #[allow(clippy::too_many_arguments)]
    fn steiner_network(
        &self,
        tech: &Tech,
        block: &Block,
        net: NetKey,
        tree: &SteinerTree,
        class: WireClass,
        tree_layer: Option<&TechLayer>,
        corner: usize,
    ) -> EstResult<ParasiticNetwork> {
        let rc = self.wire_rc.wire_rc(class, corner);
        let ratio = ndr_width_ratio(tech, block, net, None);
        let mut b = NetBuild::new(tech, block, &self.wire_rc, net, corner);
        b.push(ErrorContext::Corner(self.corners[corner].name.clone()));
        b.push(ErrorContext::Steiner);

        for branch in tree.branches() {
            let n1 = b.node(NodeId::Steiner(branch.steiner_pt1));
            let n2 = b.node(NodeId::Steiner(branch.steiner_pt2));
            if branch.wire_length == 0 {
                b.resistor(MIN_RESISTANCE, n1, n2);
            } else {
                let len = branch.wire_length as f64;
                let dx = (branch.pt1.x - branch.pt2.x).abs() as f64 / len;
                let dy = (branch.pt1.y - branch.pt2.y).abs() as f64 / len;
                let length = dbu_to_meters(branch.wire_length, self.dbu_per_micron);
                let cap = length * rc.blend_cap(dx, dy);
                let res = length * rc.blend_res(dx, dy) / ratio;
                log::trace!(
                    target: "estimate_parasitics",
                    " pi {:?} l={} r={:.3e} c={:.3e} {:?}",
                    branch.pt1,
                    branch.wire_length,
                    res,
                    cap,
                    branch.pt2
                );
                b.pi_segment(n1, n2, res, cap);
            }
            b.connect_pins(n1, tree.pins(branch.steiner_pt1), tree_layer)?;
            b.connect_pins(n2, tree.pins(branch.steiner_pt2), tree_layer)?;
        }
        Ok(b.network)
    }
}

