//!
//! # Route-Based Estimation
//!
//! Networks built from global-route segments: one node per (x, y, routing level) grid point,
//! pi-model wires along same-layer segments, and cut resistance across vias.
//! Pins hang off the grid point of their routing-grid location, on their connection layer.
//!

// Local imports
use crate::spef::reborrow;
use crate::build::{ndr_width_ratio, NetBuild};
use crate::design::{Block, Database, NetKey, Tech};
use crate::estimator::db_parts;
use crate::utils::{warn_msg, ErrorContext, Tool, Unwrapper};
use crate::{
    dbu_to_meters, EstResult, Estimator, GRoute, GSegment, NodeId, NodeIdx, ParasiticNetwork,
    SpefWriter, MIN_RESISTANCE,
};

/// # Route Estimate Outcome
#[derive(Debug, Clone, PartialEq)]
pub enum RouteEstimate {
    /// Layer-assigned route: networks reduced and committed to the parasitics store
    Committed,
    /// Planar route: one network per corner, returned to the caller and not stored
    Partial(Vec<ParasiticNetwork>),
}

impl Estimator {
    ///
    /// Estimate `net` from the ad-hoc route `route`.
    ///
    /// Routes which have been through layer assignment are estimated in full and committed.
    /// Planar routes produce bare networks for the caller to inspect.
    ///
    pub fn estimate_global_route_parasitics(
        &mut self,
        db: &mut Database,
        net: NetKey,
        route: &GRoute,
    ) -> EstResult<RouteEstimate> {
        self.init_block(db)?;
        let (tech, block) = db_parts(db)?;
        match route.first() {
            Some(seg) if seg.is_3d_route() => {
                self.estimate_route_parasitics(tech, block, net, route, None)?;
                Ok(RouteEstimate::Committed)
            }
            _ => {
                let networks = (0..self.corners.len())
                    .map(|corner| self.route_network(tech, block, net, route, corner))
                    .collect::<EstResult<Vec<_>>>()?;
                Ok(RouteEstimate::Partial(networks))
            }
        }
    }

    /// Estimate every routed net, replacing all prior parasitics
    pub(crate) fn estimate_global_route_rc(
        &mut self,
        tech: &Tech,
        block: &Block,
        spef: Option<&mut dyn SpefWriter>,
    ) -> EstResult<()> {
        {
            let mut state = self.state.write()?;
            for p in state.parasitics.iter_mut() {
                p.clear();
            }
        }
        if !self.router.have_routes() {
            log::debug!(target: "estimate_parasitics", "No global routes");
            return Ok(());
        }
        let mut spef = spef;
        for net in self.router.routed_nets() {
            if block.net(net).is_none() {
                continue;
            }
            let route = match self.router.route(net) {
                Some(r) if !r.is_empty() => r.clone(),
                _ => continue,
            };
            self.estimate_route_parasitics(tech, block, net, &route, reborrow(&mut spef))?;
        }
        self.state.write()?.invalid.clear();
        Ok(())
    }

    /// Re-estimate `net` from its committed route, if it has one
    pub(crate) fn estimate_global_route_rc_net(
        &mut self,
        tech: &Tech,
        block: &Block,
        net: NetKey,
    ) -> EstResult<()> {
        let route = match self.router.route(net) {
            Some(r) if !r.is_empty() => r.clone(),
            _ => return Ok(()),
        };
        self.estimate_route_parasitics(tech, block, net, &route, None)
    }

    /// Build, reduce, and retain the networks of `net` from `route` in every corner
    fn estimate_route_parasitics(
        &mut self,
        tech: &Tech,
        block: &Block,
        net: NetKey,
        route: &GRoute,
        spef: Option<&mut dyn SpefWriter>,
    ) -> EstResult<()> {
        self.state.write()?.discard(net);
        let drvr = block.net_drivers(net).first().copied();
        let mut spef = spef;
        for corner in 0..self.corners.len() {
            let network = self.route_network(tech, block, net, route, corner)?;
            self.finish_network(block, network, drvr, corner, reborrow(&mut spef), true)?;
        }
        Ok(())
    }

    /// Total cut resistance between routing levels `level1` and `level2` at `corner`,
    /// for a single cut per via layer
    fn via_resistance(&self, tech: &Tech, level1: usize, level2: usize, corner: usize) -> f64 {
        let (lo, hi) = (level1.min(level2), level1.max(level2));
        let (lo, hi) = match (tech.find_routing_layer(lo), tech.find_routing_layer(hi)) {
            (Some(lo), Some(hi)) => (lo.number, hi.number),
            _ => return 0.0,
        };
        (lo..hi)
            .filter_map(|n| tech.layer(n))
            .filter(|l| l.is_cut())
            .map(|l| self.wire_rc.cut_resistance(l, corner))
            .sum()
    }

    /// Grid node for one end of `seg`, unless it sits below the router's minimum layer.
    /// Via ends always get nodes.
    fn route_node(&self, b: &mut NetBuild, seg: &GSegment, init: bool) -> Option<NodeIdx> {
        let (x, y, layer) = if init {
            (seg.init_x, seg.init_y, seg.init_layer)
        } else {
            (seg.final_x, seg.final_y, seg.final_layer)
        };
        if !seg.is_via() && layer < self.router.min_routing_layer() {
            log::debug!(
                target: "estimate_parasitics",
                "[EST-0027] Route point ({}, {}) on layer {} is below the minimum routing layer",
                x,
                y,
                layer
            );
            return None;
        }
        Some(b.node(NodeId::Grid { x, y, layer }))
    }

    /// Build the network of `net` from `route` at `corner`
    pub(crate) fn route_network(
        &self,
        tech: &Tech,
        block: &Block,
        net: NetKey,
        route: &GRoute,
        corner: usize,
    ) -> EstResult<ParasiticNetwork> {
        let dbu = self.dbu_per_micron;
        let net_name = block.net(net).map(|n| n.name.clone()).unwrap_or_default();
        let mut b = NetBuild::new(tech, block, &self.wire_rc, net, corner);
        if let Some(c) = self.corners.get(corner) {
            b.push(ErrorContext::Corner(c.name.clone()));
        }
        b.push(ErrorContext::Route);

        for seg in route.iter() {
            if seg.is_via() {
                let res = self.via_resistance(tech, seg.init_layer, seg.final_layer, corner);
                let n1 = self.route_node(&mut b, seg, true);
                let n2 = self.route_node(&mut b, seg, false);
                if let (Some(n1), Some(n2)) = (n1, n2) {
                    b.resistor(res.max(MIN_RESISTANCE), n1, n2);
                }
            } else if seg.init_layer == seg.final_layer {
                let layer = tech
                    .find_routing_layer(seg.init_layer)
                    .unwrapper(&b, format!("No routing layer at level {}", seg.init_layer))?;
                let (res, cap) = self.wire_rc.wire_layer_rc(layer, corner, dbu);
                let length = dbu_to_meters(seg.length(), dbu);
                let ratio = ndr_width_ratio(tech, block, net, Some(layer.number));
                let n1 = self.route_node(&mut b, seg, true);
                let n2 = self.route_node(&mut b, seg, false);
                if let (Some(n1), Some(n2)) = (n1, n2) {
                    b.pi_segment(n1, n2, res * length / ratio, cap * length);
                }
            } else {
                warn_msg!(
                    Tool::Est,
                    25,
                    "Non wire or via route found on net {} from ({}, {}, {}) to ({}, {}, {}).",
                    net_name,
                    seg.init_x,
                    seg.init_y,
                    seg.init_layer,
                    seg.final_x,
                    seg.final_y,
                    seg.final_layer
                );
            }
        }

        // Pins connect to the grid point on their connection layer if the route reaches it,
        // else through a via to the one below
        for loc in self.router.pin_grid_locations(tech, block, net) {
            let grid = |layer: usize| NodeId::Grid {
                x: loc.grid_pt.x,
                y: loc.grid_pt.y,
                layer,
            };
            let on_layer = b.network.find_node(&grid(loc.conn_layer));
            let below = loc
                .conn_layer
                .checked_sub(1)
                .and_then(|l| Some((b.network.find_node(&grid(l))?, l)));
            let (grid_node, level, via_res) = match (on_layer, below) {
                (Some(n), _) => (n, loc.conn_layer, 0.0),
                (None, Some((n, level))) => {
                    let via_res = self.via_resistance(tech, level, loc.conn_layer, corner);
                    (n, level, via_res)
                }
                (None, None) => {
                    warn_msg!(Tool::Est, 26, "Missing route to pin {}.", block.pin_name(loc.pin));
                    continue;
                }
            };
            let (res, cap) = match tech.find_routing_layer(level) {
                Some(layer) => self.wire_rc.wire_layer_rc(layer, corner, dbu),
                None => (0.0, 0.0),
            };
            let length = dbu_to_meters(loc.pt.manhattan(&loc.grid_pt), dbu);
            let pin_node = b.node(NodeId::Pin(loc.pin));
            b.pi_segment(grid_node, pin_node, res * length + via_res, cap * length);
        }
        Ok(b.network)
    }
}
