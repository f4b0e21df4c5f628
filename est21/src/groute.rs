//!
//! # Global Routes
//!
//! Route segments as produced by a global router,
//! and the [GlobalRouter] interface the estimator reads them through.
//! Segment layers are one-based routing levels.
//!

// Std-Lib
use std::collections::{BTreeMap, HashSet};

// Local imports
use crate::design::{Block, Int, NetKey, PinKey, Point, Tech};
use crate::EstResult;

/// # Global-Route Segment
///
/// A wire between two points on one layer, or a via between two layers at one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GSegment {
    pub init_x: Int,
    pub init_y: Int,
    pub init_layer: usize,
    pub final_x: Int,
    pub final_y: Int,
    pub final_layer: usize,
    /// Whether the segment's layers were assigned by layer assignment,
    /// rather than projected from a planar route
    pub is_3d: bool,
}
impl GSegment {
    /// Create a new layer-assigned segment
    pub fn new(
        init_x: Int,
        init_y: Int,
        init_layer: usize,
        final_x: Int,
        final_y: Int,
        final_layer: usize,
    ) -> Self {
        Self {
            init_x,
            init_y,
            init_layer,
            final_x,
            final_y,
            final_layer,
            is_3d: true,
        }
    }
    /// Create a segment of a planar route, prior to layer assignment
    pub fn planar(init_x: Int, init_y: Int, final_x: Int, final_y: Int, layer: usize) -> Self {
        Self {
            is_3d: false,
            ..Self::new(init_x, init_y, layer, final_x, final_y, layer)
        }
    }
    /// Boolean indication of a via: same planar location, differing layers
    pub fn is_via(&self) -> bool {
        self.init_x == self.final_x
            && self.init_y == self.final_y
            && self.init_layer != self.final_layer
    }
    /// Planar (Manhattan) length, in dbu
    pub fn length(&self) -> Int {
        self.init_pt().manhattan(&self.final_pt())
    }
    pub fn init_pt(&self) -> Point {
        Point::new(self.init_x, self.init_y)
    }
    pub fn final_pt(&self) -> Point {
        Point::new(self.final_x, self.final_y)
    }
    pub fn is_3d_route(&self) -> bool {
        self.is_3d
    }
}

/// An ordered list of route segments for one net
pub type GRoute = Vec<GSegment>;

/// # Pin Grid Location
///
/// Where a pin meets its net's route: the pin's own location `pt`,
/// the routing-grid point `grid_pt` it is connected to,
/// and the routing level `conn_layer` of that grid connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinGridLocation {
    pub pin: PinKey,
    pub pt: Point,
    pub grid_pt: Point,
    pub conn_layer: usize,
}

///
/// # Global Router Interface
///
/// Read access to committed routes, plus the incremental-update session
/// the estimator drives while design edits are in flight.
///
pub trait GlobalRouter {
    /// Boolean indication of whether any routes have been committed
    fn have_routes(&self) -> bool;
    /// Nets with committed routes, in a stable order
    fn routed_nets(&self) -> Vec<NetKey>;
    /// Committed route for `net`
    fn route(&self, net: NetKey) -> Option<&GRoute>;
    /// Where each placed pin of `net` meets the routing grid
    fn pin_grid_locations(&self, tech: &Tech, block: &Block, net: NetKey) -> Vec<PinGridLocation>;
    /// Lowest routing level used for signal routing
    fn min_routing_layer(&self) -> usize;
    /// Boolean indication of a clock net driving other clock buffers, rather than leaf registers
    fn is_non_leaf_clock(&self, block: &Block, net: NetKey) -> bool;
    /// Open an incremental-update session
    fn start_incremental(&mut self);
    /// Re-route `nets`, which have changed since the session began or was last updated
    fn update_routes(
        &mut self,
        tech: &Tech,
        block: &Block,
        nets: &[NetKey],
        save_guides: bool,
    ) -> EstResult<()>;
    /// Close the incremental-update session
    fn end_incremental(&mut self);
    fn set_verbose(&mut self, verbose: bool);
}

///
/// # Route Store
///
/// A [GlobalRouter] holding routes committed by some external router.
/// Pin grid locations are the centers of the routing-grid cells (g-cells) holding each pin.
/// "Re-routing" during incremental updates drops the routes of nets which no longer exist;
/// changed nets keep their prior route until a new one is committed.
///
#[derive(Debug, Clone)]
pub struct RouteStore {
    routes: BTreeMap<NetKey, GRoute>,
    /// G-cell edge length, in dbu
    pub gcell_size: Int,
    pub min_routing_layer: usize,
    /// Nets classified as non-leaf clocks
    pub clock_nets: HashSet<NetKey>,
    incremental: bool,
    verbose: bool,
    /// Number of incremental updates performed, across sessions
    pub updates: usize,
}
impl Default for RouteStore {
    fn default() -> Self {
        Self {
            routes: BTreeMap::new(),
            gcell_size: 1,
            min_routing_layer: 1,
            clock_nets: HashSet::new(),
            incremental: false,
            verbose: true,
            updates: 0,
        }
    }
}
impl RouteStore {
    /// Create a new and empty [RouteStore] with g-cells of `gcell_size` dbu
    pub fn new(gcell_size: Int) -> Self {
        Self {
            gcell_size: gcell_size.max(1),
            ..Default::default()
        }
    }
    /// Commit `route` for `net`, replacing any prior route
    pub fn set_route(&mut self, net: NetKey, route: GRoute) {
        self.routes.insert(net, route);
    }
    /// Remove the route of `net`
    pub fn remove_route(&mut self, net: NetKey) -> Option<GRoute> {
        self.routes.remove(&net)
    }
    /// Boolean indication of whether an incremental session is open
    pub fn is_incremental(&self) -> bool {
        self.incremental
    }
    /// Center of the g-cell holding `pt`
    pub fn grid_point(&self, pt: Point) -> Point {
        let g = self.gcell_size;
        let snap = |v: Int| v.div_euclid(g) * g + g / 2;
        Point::new(snap(pt.x), snap(pt.y))
    }
}
impl GlobalRouter for RouteStore {
    fn have_routes(&self) -> bool {
        !self.routes.is_empty()
    }
    fn routed_nets(&self) -> Vec<NetKey> {
        self.routes.keys().copied().collect()
    }
    fn route(&self, net: NetKey) -> Option<&GRoute> {
        self.routes.get(&net)
    }
    fn pin_grid_locations(&self, tech: &Tech, block: &Block, net: NetKey) -> Vec<PinGridLocation> {
        let net = match block.net(net) {
            Some(n) => n,
            None => return Vec::new(),
        };
        net.pins
            .iter()
            .filter_map(|pin| {
                let pt = block.pin_location(*pin)?;
                let conn_layer = block.pin_layer(tech, *pin)?.routing_level?;
                Some(PinGridLocation {
                    pin: *pin,
                    pt,
                    grid_pt: self.grid_point(pt),
                    conn_layer,
                })
            })
            .collect()
    }
    fn min_routing_layer(&self) -> usize {
        self.min_routing_layer
    }
    fn is_non_leaf_clock(&self, _block: &Block, net: NetKey) -> bool {
        self.clock_nets.contains(&net)
    }
    fn start_incremental(&mut self) {
        self.incremental = true;
    }
    fn update_routes(
        &mut self,
        _tech: &Tech,
        block: &Block,
        nets: &[NetKey],
        _save_guides: bool,
    ) -> EstResult<()> {
        for net in nets {
            if block.net(*net).is_none() {
                self.routes.remove(net);
            }
        }
        self.updates += 1;
        if self.verbose {
            log::info!("Updated routes of {} nets", nets.len());
        }
        Ok(())
    }
    fn end_incremental(&mut self) {
        self.incremental = false;
    }
    fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_kinds() {
        let via = GSegment::new(10, 10, 1, 10, 10, 2);
        assert!(via.is_via());
        assert_eq!(via.length(), 0);
        let wire = GSegment::new(0, 10, 2, 50, 10, 2);
        assert!(!wire.is_via());
        assert_eq!(wire.length(), 50);
        let planar = GSegment::planar(0, 0, 0, 30, 1);
        assert!(!planar.is_3d_route());
        assert!(wire.is_3d_route());
    }

    #[test]
    fn grid_points() {
        let store = RouteStore::new(100);
        assert_eq!(store.grid_point(Point::new(130, 0)), Point::new(150, 50));
        assert_eq!(store.grid_point(Point::new(-10, 199)), Point::new(-50, 150));
    }
}
