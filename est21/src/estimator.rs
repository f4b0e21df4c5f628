//!
//! # Estimator
//!
//! Owns the RC configuration, the parasitics store, and the set of nets
//! whose parasitics are stale. Design edits reach the stale set through
//! an [EstimatorCallback] registered on the [Block].
//!

// Std-Lib
use std::collections::BTreeSet;

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::build::ndr_width_ratio;
use crate::design::{
    Block, BlockCallback, Database, InstKey, Int, NetKey, PinKey, Point, Tech, TechLayer,
};
use crate::utils::{enumstr, warn_msg, EnumStr, Ptr, Tool};
use crate::{
    dbu_to_meters, steiner, Corner, ElmoreCalc, EstError, EstResult, GlobalRouter, MstBuilder,
    NodeId, ParasiticNetwork, Parasitics, ReducedParasitic, RouteStore, SpefWriter,
    SteinerBuilder, SteinerRenderer, SteinerTree, TimingEngine, WireClass, WireRc,
};

enumstr!(
    /// # Parasitics Source
    ///
    /// Where the current parasitics came from, and hence how stale nets are re-estimated.
    ParasiticsSrc {
        None: "none",
        Placement: "placement",
        GlobalRouting: "global_routing",
        DetailedRouting: "detailed_routing",
    }
);
impl Default for ParasiticsSrc {
    fn default() -> Self {
        Self::None
    }
}

/// Estimation state shared with the [Block] callback
#[derive(Debug, Default)]
pub(crate) struct EstState {
    pub src: ParasiticsSrc,
    /// Nets whose parasitics are stale, in key order
    pub invalid: BTreeSet<NetKey>,
    /// Indexed by corner
    pub parasitics: Vec<Parasitics>,
}
impl EstState {
    /// Mark `net` stale. Ignored while no parasitics have been estimated.
    pub fn invalidate(&mut self, block: &Block, net: NetKey) {
        if self.src == ParasiticsSrc::None {
            return;
        }
        if let Some(n) = block.net(net) {
            log::debug!(target: "parasitics", "Parasitics invalid {}", n.name);
            self.invalid.insert(net);
        }
    }
    /// Drop every corner's parasitics for `net`
    pub fn discard(&mut self, net: NetKey) {
        for p in self.parasitics.iter_mut() {
            p.erase_net(net);
        }
    }
    /// Forget `net` entirely, as when it is destroyed
    pub fn erase(&mut self, net: NetKey) {
        self.invalid.remove(&net);
        self.discard(net);
    }
    /// Parasitics store of `corner`, growing the per-corner list as needed
    pub fn corner_mut(&mut self, corner: usize) -> &mut Parasitics {
        if corner >= self.parasitics.len() {
            self.parasitics.resize_with(corner + 1, Parasitics::default);
        }
        &mut self.parasitics[corner]
    }
}

///
/// # Estimator Callback
///
/// Marks nets stale as the design is edited.
/// Instance edits mark every net on the instance.
///
pub struct EstimatorCallback {
    state: Ptr<EstState>,
}
impl EstimatorCallback {
    fn with_state(&self, f: impl FnOnce(&mut EstState)) {
        match self.state.write() {
            Ok(mut state) => f(&mut state),
            Err(_) => log::error!("Estimator state is busy; design edit not tracked"),
        }
    }
    fn invalidate_inst(&self, block: &Block, inst: InstKey) {
        self.with_state(|s| {
            for net in block.inst_nets(inst) {
                s.invalidate(block, net);
            }
        })
    }
}
impl BlockCallback for EstimatorCallback {
    fn inst_created(&mut self, block: &Block, inst: InstKey) {
        self.invalidate_inst(block, inst)
    }
    fn inst_moved(&mut self, block: &Block, inst: InstKey) {
        self.invalidate_inst(block, inst)
    }
    fn inst_master_swapped(&mut self, block: &Block, inst: InstKey) {
        self.invalidate_inst(block, inst)
    }
    fn net_created(&mut self, block: &Block, net: NetKey) {
        self.with_state(|s| s.invalidate(block, net))
    }
    fn net_destroyed(&mut self, _block: &Block, net: NetKey) {
        self.with_state(|s| s.erase(net))
    }
    fn pin_post_connect(&mut self, block: &Block, pin: PinKey) {
        if let Some(net) = block.pin(pin).and_then(|p| p.net) {
            self.with_state(|s| s.invalidate(block, net))
        }
    }
    fn pin_post_disconnect(&mut self, block: &Block, _pin: PinKey, net: NetKey) {
        self.with_state(|s| s.invalidate(block, net))
    }
}

/// Split `db` into its technology and block
pub(crate) fn db_parts(db: &Database) -> EstResult<(&Tech, &Block)> {
    let chip = db.chip.as_ref().ok_or(EstError::NoDesign)?;
    let block = chip.block.as_ref().ok_or(EstError::NoBlock)?;
    Ok((&db.tech, block))
}

///
/// # Parasitics Estimator
///
/// Collaborators are injected at construction:
/// a [SteinerBuilder] for placement-based estimates,
/// a [GlobalRouter] for route-based estimates and incremental re-routing,
/// and a [TimingEngine] which reduces each network and is told when delays go stale.
///
pub struct Estimator {
    pub(crate) state: Ptr<EstState>,
    pub(crate) corners: Vec<Corner>,
    pub(crate) wire_rc: WireRc,
    /// Routing-layer numbers for signal and clock trees, each kept sorted
    pub(crate) signal_layers: Vec<usize>,
    pub(crate) clk_layers: Vec<usize>,
    pub(crate) worst_corner: usize,
    pub(crate) keep_networks: bool,
    pub(crate) dbu_per_micron: u32,
    pub(crate) incremental: bool,
    pub(crate) steiner_builder: Box<dyn SteinerBuilder>,
    pub(crate) router: Box<dyn GlobalRouter>,
    pub(crate) timing: Box<dyn TimingEngine>,
    renderer: Option<Box<dyn SteinerRenderer>>,
}
impl Default for Estimator {
    /// Minimum-spanning Steiner trees, an empty [RouteStore], and Elmore delays
    fn default() -> Self {
        Self::new(
            Box::new(MstBuilder),
            Box::new(RouteStore::default()),
            Box::new(ElmoreCalc::default()),
        )
    }
}
impl Estimator {
    /// Create an [Estimator] with a single corner named "default"
    pub fn new(
        steiner_builder: Box<dyn SteinerBuilder>,
        router: Box<dyn GlobalRouter>,
        timing: Box<dyn TimingEngine>,
    ) -> Self {
        let state = EstState {
            parasitics: vec![Parasitics::default()],
            ..Default::default()
        };
        Self {
            state: Ptr::new(state),
            corners: vec![Corner::new("default", 0)],
            wire_rc: WireRc::new(0, 1),
            signal_layers: Vec::new(),
            clk_layers: Vec::new(),
            worst_corner: 0,
            keep_networks: true,
            dbu_per_micron: 1000,
            incremental: false,
            steiner_builder,
            router,
            timing,
            renderer: None,
        }
    }
    /// Replace the analysis corners.
    /// Clears all RC configuration, including the signal and clock tree layers, and all parasitics.
    pub fn set_corners(&mut self, names: &[&str]) -> EstResult<()> {
        if names.is_empty() {
            return EstError::fail("At least one corner is required");
        }
        self.corners = names.iter().enumerate().map(|(i, n)| Corner::new(*n, i)).collect();
        self.wire_rc = WireRc::new(0, names.len());
        self.signal_layers.clear();
        self.clk_layers.clear();
        let mut state = self.state.write()?;
        state.parasitics = vec![Parasitics::default(); names.len()];
        state.invalid.clear();
        self.worst_corner = 0;
        Ok(())
    }
    pub fn corners(&self) -> &[Corner] {
        &self.corners
    }
    pub fn find_corner(&self, name: &str) -> Option<&Corner> {
        self.corners.iter().find(|c| c.name == name)
    }
    /// Set the corner used for pin-to-pin resistance queries
    pub fn set_worst_corner(&mut self, corner: usize) -> EstResult<()> {
        if corner >= self.corners.len() {
            return EstError::fail(format!("Invalid corner index {}", corner));
        }
        self.worst_corner = corner;
        Ok(())
    }
    pub fn worst_corner(&self) -> usize {
        self.worst_corner
    }
    /// Whether placement-based estimates retain their full networks, or only the reduced models
    pub fn set_keep_networks(&mut self, keep: bool) {
        self.keep_networks = keep;
    }

    pub fn wire_rc(&self) -> &WireRc {
        &self.wire_rc
    }
    pub fn wire_rc_mut(&mut self) -> &mut WireRc {
        &mut self.wire_rc
    }
    /// Set per-unit-length RC of `layer` at `corner`. Cut layers take resistance per cut.
    pub fn set_layer_rc(&mut self, layer: &TechLayer, corner: usize, res: f64, cap: f64) {
        self.wire_rc.set_layer_rc(layer.number, corner, res, cap)
    }
    pub fn layer_rc(&self, layer: &TechLayer, corner: usize) -> (f64, f64) {
        self.wire_rc.layer_rc(layer.number, corner)
    }
    pub fn set_h_wire_signal_rc(&mut self, corner: usize, res: f64, cap: f64) {
        self.wire_rc.set_h_wire_rc(WireClass::Signal, corner, res, cap)
    }
    pub fn set_v_wire_signal_rc(&mut self, corner: usize, res: f64, cap: f64) {
        self.wire_rc.set_v_wire_rc(WireClass::Signal, corner, res, cap)
    }
    pub fn set_h_wire_clk_rc(&mut self, corner: usize, res: f64, cap: f64) {
        self.wire_rc.set_h_wire_rc(WireClass::Clock, corner, res, cap)
    }
    pub fn set_v_wire_clk_rc(&mut self, corner: usize, res: f64, cap: f64) {
        self.wire_rc.set_v_wire_rc(WireClass::Clock, corner, res, cap)
    }
    pub fn wire_signal_resistance(&self, corner: usize) -> f64 {
        self.wire_rc.wire_resistance(WireClass::Signal, corner)
    }
    pub fn wire_signal_capacitance(&self, corner: usize) -> f64 {
        self.wire_rc.wire_capacitance(WireClass::Signal, corner)
    }
    pub fn wire_clk_resistance(&self, corner: usize) -> f64 {
        self.wire_rc.wire_resistance(WireClass::Clock, corner)
    }
    pub fn wire_clk_capacitance(&self, corner: usize) -> f64 {
        self.wire_rc.wire_capacitance(WireClass::Clock, corner)
    }
    /// Add routing layer `layer` to those signal trees are estimated on
    pub fn add_signal_layer(&mut self, layer: &TechLayer) {
        insert_sorted(&mut self.signal_layers, layer.number)
    }
    /// Add routing layer `layer` to those clock trees are estimated on
    pub fn add_clk_layer(&mut self, layer: &TechLayer) {
        insert_sorted(&mut self.clk_layers, layer.number)
    }
    pub fn signal_layers(&self) -> &[usize] {
        &self.signal_layers
    }
    pub fn clk_layers(&self) -> &[usize] {
        &self.clk_layers
    }
    /// Layer Steiner trees of `class` are assumed to run on: the lowest configured
    pub(crate) fn tree_layer<'t>(&self, tech: &'t Tech, class: WireClass) -> Option<&'t TechLayer> {
        let layers = match class {
            WireClass::Signal => &self.signal_layers,
            WireClass::Clock => &self.clk_layers,
        };
        layers.first().and_then(|n| tech.layer(*n))
    }

    pub fn router(&self) -> &dyn GlobalRouter {
        self.router.as_ref()
    }
    pub fn router_mut(&mut self) -> &mut dyn GlobalRouter {
        self.router.as_mut()
    }
    pub fn timing(&self) -> &dyn TimingEngine {
        self.timing.as_ref()
    }
    pub fn timing_mut(&mut self) -> &mut dyn TimingEngine {
        self.timing.as_mut()
    }

    ///
    /// Attach to the loaded design.
    /// Records its database units, and registers our [EstimatorCallback]
    /// unless the block already has a callback owner.
    ///
    pub fn init_block(&mut self, db: &mut Database) -> EstResult<()> {
        if db.chip.is_none() {
            return Err(EstError::NoDesign);
        }
        let dbu = db.tech.dbu_per_micron;
        let block = db.block_mut().ok_or(EstError::NoBlock)?;
        self.dbu_per_micron = dbu;
        if !block.has_callback_owner() {
            let cb = EstimatorCallback {
                state: self.state.clone(),
            };
            block.add_callback_owner(Box::new(cb))?;
        }
        Ok(())
    }
    /// Convert a distance in dbu to meters, in the attached design's units
    pub fn dbu_to_meters(&self, dist: Int) -> f64 {
        dbu_to_meters(dist, self.dbu_per_micron)
    }

    /// Set the parasitics source, without estimating.
    /// Fails while incremental mode is enabled.
    pub fn set_parasitics_src(&mut self, src: ParasiticsSrc) -> EstResult<()> {
        if self.incremental {
            return Err(EstError::SourceLocked);
        }
        self.state.write()?.src = src;
        Ok(())
    }
    pub fn parasitics_src(&self) -> EstResult<ParasiticsSrc> {
        Ok(self.state.read()?.src)
    }
    /// Boolean indication of whether parasitics have been estimated from any source
    pub fn have_estimated_parasitics(&self) -> EstResult<bool> {
        Ok(self.state.read()?.src != ParasiticsSrc::None)
    }
    /// Boolean indication of whether no nets are awaiting re-estimation
    pub fn parasitics_valid(&self) -> EstResult<bool> {
        Ok(self.state.read()?.invalid.is_empty())
    }
    /// Nets awaiting re-estimation, in key order
    pub fn parasitics_invalid_nets(&self) -> EstResult<Vec<NetKey>> {
        Ok(self.state.read()?.invalid.iter().copied().collect())
    }
    /// Mark `net` as awaiting re-estimation. Ignored before any estimate has been made.
    pub fn parasitics_invalid(&mut self, block: &Block, net: NetKey) -> EstResult<()> {
        self.state.write()?.invalidate(block, net);
        Ok(())
    }
    /// Forget `net`: drop it from the stale set and drop its parasitics
    pub fn erase_parasitics(&mut self, net: NetKey) -> EstResult<()> {
        self.state.write()?.erase(net);
        Ok(())
    }
    /// Drop all parasitics in every corner
    pub fn clear_parasitics(&mut self) -> EstResult<()> {
        let mut state = self.state.write()?;
        for p in state.parasitics.iter_mut() {
            p.clear();
        }
        Ok(())
    }
    /// Copy of the retained network of `net` at `corner`
    pub fn parasitic_network(
        &self,
        net: NetKey,
        corner: usize,
    ) -> EstResult<Option<ParasiticNetwork>> {
        let state = self.state.read()?;
        Ok(state.parasitics.get(corner).and_then(|p| p.network(net)).cloned())
    }
    /// Copy of the reduced model driven by `drvr` at `corner`
    pub fn reduced_parasitic(
        &self,
        drvr: PinKey,
        corner: usize,
    ) -> EstResult<Option<ReducedParasitic>> {
        let state = self.state.read()?;
        Ok(state.parasitics.get(corner).and_then(|p| p.reduced(drvr)).cloned())
    }
    pub fn is_incremental_enabled(&self) -> bool {
        self.incremental
    }

    ///
    /// Estimate parasitics of every net from `src`.
    ///
    /// Placement estimates are skipped entirely when no signal wire RC is configured.
    /// Detailed-routing parasitics come from extraction elsewhere; we only record the source.
    /// Networks are also streamed to `spef`, if provided.
    ///
    pub fn estimate_parasitics(
        &mut self,
        db: &mut Database,
        src: ParasiticsSrc,
        spef: Option<&mut dyn SpefWriter>,
    ) -> EstResult<()> {
        self.init_block(db)?;
        let (tech, block) = db_parts(db)?;
        match src {
            ParasiticsSrc::Placement => self.estimate_wire_parasitics(tech, block, spef)?,
            ParasiticsSrc::GlobalRouting => self.estimate_global_route_rc(tech, block, spef)?,
            ParasiticsSrc::DetailedRouting | ParasiticsSrc::None => (),
        }
        self.state.write()?.src = src;
        Ok(())
    }
    ///
    /// Estimate parasitics if none exist yet, otherwise bring stale nets up to date.
    ///
    /// Fresh estimates come from global routing if the router has committed routes,
    /// and from placement if not.
    ///
    pub fn ensure_parasitics(&mut self, db: &mut Database) -> EstResult<()> {
        if !self.have_estimated_parasitics()? {
            let src = if self.router.have_routes() {
                ParasiticsSrc::GlobalRouting
            } else {
                ParasiticsSrc::Placement
            };
            return self.estimate_parasitics(db, src, None);
        }
        if self.incremental {
            return self.update_parasitics(db, false);
        }
        Ok(())
    }

    ///
    /// Re-estimate every stale net from the current source, then clear the stale set.
    ///
    /// Route-based sources first have the router update the stale nets' routes.
    /// The timing engine is told each stale net's delays are invalid.
    ///
    pub fn update_parasitics(&mut self, db: &Database, save_guides: bool) -> EstResult<()> {
        if !self.incremental {
            return Err(EstError::NotIncremental);
        }
        let (tech, block) = db_parts(db)?;
        let (src, invalid): (ParasiticsSrc, Vec<NetKey>) = {
            let state = self.state.read()?;
            (state.src, state.invalid.iter().copied().collect())
        };
        match src {
            ParasiticsSrc::Placement => {
                for net in invalid.iter() {
                    if let Some(n) = block.net(*net) {
                        log::debug!(target: "parasitics", "Update parasitics {}", n.name);
                        self.estimate_wire_parasitic(tech, block, *net, None)?;
                    }
                }
            }
            ParasiticsSrc::GlobalRouting | ParasiticsSrc::DetailedRouting => {
                self.router.update_routes(tech, block, &invalid, save_guides)?;
                for net in invalid.iter() {
                    if let Some(n) = block.net(*net) {
                        log::debug!(target: "parasitics", "Update parasitics {}", n.name);
                        self.estimate_global_route_rc_net(tech, block, *net)?;
                    }
                }
            }
            ParasiticsSrc::None => (),
        }
        if src != ParasiticsSrc::None {
            for net in invalid.iter() {
                if block.net(*net).is_some() {
                    self.timing.delays_invalid_from_fanin(block, *net);
                }
            }
        }
        self.state.write()?.invalid.clear();
        Ok(())
    }

    /// Make sure the net driven by `drvr` has current parasitics, re-estimating it alone if not
    pub fn ensure_wire_parasitic(&mut self, db: &Database, drvr: PinKey) -> EstResult<()> {
        let (tech, block) = db_parts(db)?;
        let net = match block.pin(drvr).and_then(|p| p.net) {
            Some(net) => net,
            None => return Ok(()),
        };
        let (src, stale) = {
            let state = self.state.read()?;
            let have = state
                .parasitics
                .first()
                .map(|p| p.reduced(drvr).is_some() || p.has_net(net))
                .unwrap_or(false);
            (state.src, state.invalid.contains(&net) || !have)
        };
        if !stale {
            return Ok(());
        }
        match src {
            ParasiticsSrc::Placement => {
                self.estimate_wire_parasitic_from(tech, block, net, drvr, None)?;
            }
            ParasiticsSrc::GlobalRouting => {
                self.router.update_routes(tech, block, &[net], false)?;
                self.estimate_global_route_rc_net(tech, block, net)?;
            }
            ParasiticsSrc::DetailedRouting | ParasiticsSrc::None => return Ok(()),
        }
        self.state.write()?.invalid.remove(&net);
        Ok(())
    }

    ///
    /// Store a single-segment network for `net` at `corner`: a wire of `wire_length` meters
    /// between `drvr` and `load`, using the scalar (direction-averaged) signal RC.
    ///
    pub fn make_wire_parasitic(
        &mut self,
        db: &Database,
        net: NetKey,
        drvr: PinKey,
        load: PinKey,
        wire_length: f64,
        corner: usize,
    ) -> EstResult<()> {
        let (tech, block) = db_parts(db)?;
        if corner >= self.corners.len() {
            return EstError::fail(format!("Invalid corner index {}", corner));
        }
        let ratio = ndr_width_ratio(tech, block, net, None);
        let res = wire_length * self.wire_rc.wire_resistance(WireClass::Signal, corner) / ratio;
        let cap = wire_length * self.wire_rc.wire_capacitance(WireClass::Signal, corner);

        let mut network = ParasiticNetwork::new(net);
        let n1 = network.ensure_node(NodeId::Pin(drvr));
        let n2 = network.ensure_node(NodeId::Pin(load));
        network.incr_cap(n1, cap / 2.0);
        network.make_resistor(1, res, n1, n2);
        network.incr_cap(n2, cap / 2.0);
        self.state.write()?.corner_mut(corner).set_network(network);
        Ok(())
    }

    ///
    /// Reduce and store a finished `network`, and stream it to `spef` if provided.
    /// The network itself is retained only if `keep`.
    ///
    pub(crate) fn finish_network(
        &mut self,
        block: &Block,
        network: ParasiticNetwork,
        drvr: Option<PinKey>,
        corner: usize,
        spef: Option<&mut dyn SpefWriter>,
        keep: bool,
    ) -> EstResult<()> {
        let corner_ref = self
            .corners
            .get(corner)
            .ok_or_else(|| EstError::msg(format!("Invalid corner index {}", corner)))?;
        if let Some(spef) = spef {
            spef.write_net(block, corner_ref, network.net, &network)?;
        }
        let reduced = match drvr {
            Some(drvr) => self.timing.reduce_parasitic(block, &network, drvr, corner_ref),
            None => None,
        };
        let mut state = self.state.write()?;
        let parasitics = state.corner_mut(corner);
        if let Some(reduced) = reduced {
            parasitics.set_reduced(reduced);
        }
        if keep {
            parasitics.set_network(network);
        }
        Ok(())
    }

    /// Build a Steiner tree over the pins of `drvr`'s net
    pub fn make_steiner_tree(&mut self, block: &Block, drvr: PinKey) -> Option<SteinerTree> {
        steiner::make_steiner_tree(self.steiner_builder.as_mut(), block, drvr)
    }
    /// Build a pinless Steiner tree from a driver location and its sinks
    pub fn make_steiner_tree_from_locations(
        &mut self,
        drvr_loc: Point,
        sinks: &[Point],
    ) -> Option<SteinerTree> {
        steiner::make_steiner_tree_from_locations(self.steiner_builder.as_mut(), drvr_loc, sinks)
    }
    /// Install the display hook used by [Estimator::highlight_steiner].
    /// Only the first renderer is kept.
    pub fn init_steiner_renderer(&mut self, renderer: Box<dyn SteinerRenderer>) {
        if self.renderer.is_some() {
            warn_msg!(Tool::Est, 4, "Steiner renderer already initialized.");
            return;
        }
        self.renderer = Some(renderer);
    }
    /// Highlight the Steiner tree of `drvr`'s net, or clear the highlight if `drvr` is `None`.
    /// Does nothing without a renderer.
    pub fn highlight_steiner(&mut self, block: &Block, drvr: Option<PinKey>) {
        if self.renderer.is_none() {
            return;
        }
        let tree = drvr.and_then(|d| self.make_steiner_tree(block, d));
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.highlight(tree.as_ref());
        }
    }
    /// Average cut resistance across the block's routable layers at `corner`
    pub fn compute_average_cut_resistance(&self, db: &Database, corner: usize) -> EstResult<f64> {
        let (tech, block) = db_parts(db)?;
        Ok(self.wire_rc.average_cut_resistance(tech, block, corner))
    }
}

fn insert_sorted(list: &mut Vec<usize>, val: usize) {
    if let Err(pos) = list.binary_search(&val) {
        list.insert(pos, val);
    }
}
