//!
//! # est21 unit tests
//!

use std::cell::RefCell;
use std::collections::HashSet;
use std::io::Write;
use std::rc::Rc;

use super::*;
use crate::design::{
    Block, Chip, Database, Dir, InstKey, MTerm, Master, MasterType, NdrLayerRule, NetKey,
    NonDefaultRule, PinDirection, PinKey, Point, SigType, Tech, TechLayer,
};
use crate::utils::{ErrorContext, SerdeFile, SerializationFormat};

/// Relative closeness, for values which pass through floating-point unit conversions
fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * b.abs().max(1e-300)
}

/// Create a [Tech] used by a number of tests:
/// `met1` (0), `via1` (1), `met2` (2), `via2` (3), `met3` (4)
pub fn tech() -> Tech {
    let mut tech = Tech::new(1000);
    tech.add_layer(TechLayer::routing("met1", Dir::Horiz, 140, 0.125, 1e-4, 5e-5));
    tech.add_layer(TechLayer::cut("via1", 4.5));
    tech.add_layer(TechLayer::routing("met2", Dir::Vert, 140, 0.125, 1e-4, 5e-5));
    tech.add_layer(TechLayer::cut("via2", 3.4));
    tech.add_layer(TechLayer::routing("met3", Dir::Horiz, 300, 0.047, 8e-5, 4e-5));
    tech
}

/// Two buffers, `u1/Z` driving `u2/A` on net `n1`, one millimeter apart vertically
struct Design {
    db: Database,
    u2: InstKey,
    net: NetKey,
    drvr: PinKey,
    load: PinKey,
}
fn design() -> EstResult<Design> {
    let mut block = Block::new("top");
    let buf = block.add_master(
        Master::new("BUF", MasterType::Core)
            .mterm(MTerm::new("A", PinDirection::Input, 0, Point::new(0, 0)))
            .mterm(MTerm::new("Z", PinDirection::Output, 0, Point::new(0, 0))),
    );
    let u1 = block.create_inst("u1", buf)?;
    let u2 = block.create_inst("u2", buf)?;
    let net = block.create_net("n1");
    let drvr = block.find_iterm(u1, "Z").unwrap();
    let load = block.find_iterm(u2, "A").unwrap();
    block.connect(drvr, net)?;
    block.connect(load, net)?;
    block.place_inst(u1, Point::new(0, 0))?;
    block.place_inst(u2, Point::new(0, 1_000_000))?;
    Ok(Design {
        db: Database::with_block(tech(), block),
        u2,
        net,
        drvr,
        load,
    })
}

/// Estimator with 200 ohm/m and 2e-16 F/m signal wires in both directions
fn estimator() -> Estimator {
    let mut est = Estimator::default();
    est.set_h_wire_signal_rc(0, 200.0, 2e-16);
    est.set_v_wire_signal_rc(0, 200.0, 2e-16);
    est
}

/// Estimator reading global routes from `router`, with intrinsic layer RC
fn routed(router: RouteStore) -> Estimator {
    Estimator::new(
        Box::new(MstBuilder),
        Box::new(router),
        Box::new(ElmoreCalc::default()),
    )
}

/// [TimingEngine] which records delay invalidations where tests can see them
#[derive(Default)]
struct Recorder {
    calc: ElmoreCalc,
    invalidated: Rc<RefCell<Vec<NetKey>>>,
}
impl TimingEngine for Recorder {
    fn is_ideal_clock(&self, block: &Block, drvr: PinKey, corner: &Corner) -> bool {
        self.calc.is_ideal_clock(block, drvr, corner)
    }
    fn reduce_parasitic(
        &mut self,
        block: &Block,
        network: &ParasiticNetwork,
        drvr: PinKey,
        corner: &Corner,
    ) -> Option<ReducedParasitic> {
        self.calc.reduce_parasitic(block, network, drvr, corner)
    }
    fn delays_invalid_from_fanin(&mut self, _block: &Block, net: NetKey) {
        self.invalidated.borrow_mut().push(net);
    }
}

/// Resistance of the wire resistor (the first) in `net`'s network at `corner`
fn wire_res(est: &Estimator, net: NetKey, corner: usize) -> EstResult<f64> {
    let nw = est.parasitic_network(net, corner)?.unwrap();
    Ok(nw.resistors()[0].value)
}

#[test]
fn two_pin_net_from_placement() -> EstResult<()> {
    let mut d = design()?;
    let mut est = estimator();
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    assert_eq!(est.parasitics_src()?, ParasiticsSrc::Placement);
    assert!(est.parasitics_valid()?);

    let nw = est.parasitic_network(d.net, 0)?.unwrap();
    let ids: Vec<usize> = nw.resistors().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    let wire = &nw.resistors()[0];
    assert!(close(wire.value, 0.2));
    assert!(close(nw.node(wire.n1).unwrap().cap, 1e-19));
    assert!(close(nw.node(wire.n2).unwrap().cap, 1e-19));
    // No layer table, so pins hang off the tree by minimum resistors
    for r in nw.resistors()[1..].iter() {
        assert_eq!(r.value, MIN_RESISTANCE);
    }
    assert!(close(nw.total_cap(), 2e-19));

    let block = d.db.block().unwrap();
    let r = est.pin_resistance(block, d.net, d.drvr, d.load)?.unwrap();
    assert!(close(r, 0.202));

    let reduced = est.reduced_parasitic(d.drvr, 0)?.unwrap();
    assert!(close(reduced.total_cap, 2e-19));
    assert!(close(reduced.elmore(d.load).unwrap(), 2.02e-20));
    Ok(())
}

#[test]
fn estimates_are_idempotent() -> EstResult<()> {
    let mut d = design()?;
    let mut est = estimator();
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    let first = est.parasitic_network(d.net, 0)?;
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    assert_eq!(est.parasitic_network(d.net, 0)?, first);
    Ok(())
}

#[test]
fn placement_needs_signal_rc() -> EstResult<()> {
    let mut d = design()?;
    let mut est = Estimator::default();
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    assert!(est.parasitic_network(d.net, 0)?.is_none());
    Ok(())
}

#[test]
fn special_nets_are_skipped() -> EstResult<()> {
    let mut d = design()?;
    d.db.block_mut().unwrap().net_mut(d.net).unwrap().special = true;
    let mut est = estimator();
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    assert!(est.parasitic_network(d.net, 0)?.is_none());
    assert!(est.reduced_parasitic(d.drvr, 0)?.is_none());
    Ok(())
}

/// Give `d`'s net a rule doubling the width of layer number `layer`
fn double_width(d: &mut Design, layer: usize) {
    let ndr = d.db.tech.add_ndr(NonDefaultRule {
        name: "2w".into(),
        layer_rules: vec![NdrLayerRule { layer, width: 280 }],
    });
    d.db.block_mut().unwrap().net_mut(d.net).unwrap().ndr = Some(ndr);
}

#[test]
fn wide_rules_lower_steiner_resistance() -> EstResult<()> {
    let mut d = design()?;
    double_width(&mut d, 0);
    let mut est = estimator();
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    assert!(close(wire_res(&est, d.net, 0)?, 0.1));
    // Capacitance is unchanged
    let nw = est.parasitic_network(d.net, 0)?.unwrap();
    assert!(close(nw.total_cap(), 2e-19));
    Ok(())
}

#[test]
fn unplaced_pin_layers_are_fatal() -> EstResult<()> {
    let mut d = design()?;
    {
        let block = d.db.block_mut().unwrap();
        let out = block.create_bterm("out", PinDirection::Output);
        // A layer number the technology does not have
        block.place_bterm(out, Point::new(0, 500_000), 99)?;
        block.connect(out, d.net)?;
    }
    let mut est = estimator();
    let tech = tech();
    est.set_layer_rc(tech.layer_named("via1").unwrap(), 0, 4.0, 0.0);
    est.set_layer_rc(tech.layer_named("via2").unwrap(), 0, 3.0, 0.0);
    est.add_signal_layer(tech.layer_named("met3").unwrap());
    let err = est
        .estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)
        .unwrap_err();
    assert!(matches!(err, EstError::UnplacedPin { .. }));
    Ok(())
}

#[test]
fn supply_nets_are_skipped() -> EstResult<()> {
    let mut d = design()?;
    d.db.block_mut().unwrap().net_mut(d.net).unwrap().sig_type = SigType::Power;
    let mut est = estimator();
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    assert!(est.parasitic_network(d.net, 0)?.is_none());
    Ok(())
}

#[test]
fn ideal_clocks_are_skipped() -> EstResult<()> {
    let mut d = design()?;
    let timing = ElmoreCalc {
        ideal_clocks: [d.net].into_iter().collect::<HashSet<_>>(),
        ..Default::default()
    };
    let mut est = Estimator::new(
        Box::new(MstBuilder),
        Box::new(RouteStore::default()),
        Box::new(timing),
    );
    est.set_v_wire_signal_rc(0, 200.0, 2e-16);
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    assert!(est.parasitic_network(d.net, 0)?.is_none());
    assert!(est.reduced_parasitic(d.drvr, 0)?.is_none());
    Ok(())
}

#[test]
fn clock_nets_use_clock_rc() -> EstResult<()> {
    let mut d = design()?;
    let mut router = RouteStore::default();
    router.clock_nets.insert(d.net);
    let mut est = routed(router);
    est.set_v_wire_signal_rc(0, 200.0, 2e-16);
    est.set_v_wire_clk_rc(0, 100.0, 1e-16);
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    assert!(close(wire_res(&est, d.net, 0)?, 0.1));
    Ok(())
}

#[test]
fn corners_are_independent() -> EstResult<()> {
    let mut d = design()?;
    let mut est = Estimator::default();
    est.set_corners(&["fast", "slow"])?;
    est.set_v_wire_signal_rc(0, 200.0, 2e-16);
    est.set_v_wire_signal_rc(1, 400.0, 4e-16);
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    assert!(close(wire_res(&est, d.net, 0)?, 0.2));
    assert!(close(wire_res(&est, d.net, 1)?, 0.4));
    assert_eq!(est.find_corner("slow").unwrap().index, 1);

    let block = d.db.block().unwrap();
    est.set_worst_corner(1)?;
    let r = est.pin_resistance(block, d.net, d.drvr, d.load)?.unwrap();
    assert!(close(r, 0.402));
    assert!(est.set_worst_corner(2).is_err());
    Ok(())
}

#[test]
fn pins_attach_through_via_stacks() -> EstResult<()> {
    let mut d = design()?;
    let mut est = estimator();
    let tech = tech();
    est.set_layer_rc(tech.layer_named("via1").unwrap(), 0, 4.0, 0.0);
    est.set_layer_rc(tech.layer_named("via2").unwrap(), 0, 3.0, 0.0);
    est.add_signal_layer(tech.layer_named("met3").unwrap());
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;

    let nw = est.parasitic_network(d.net, 0)?.unwrap();
    assert!(nw.find_node(&NodeId::Via { pin: d.drvr, layer: 3 }).is_some());
    assert!(nw.find_node(&NodeId::Via { pin: d.drvr, layer: 1 }).is_none());
    let block = d.db.block().unwrap();
    let r = est.pin_resistance(block, d.net, d.drvr, d.load)?.unwrap();
    assert!(close(r, 0.2 + 2.0 * (4.0 + 3.0)));

    // Trees on the pins' own layer need no vias
    let mut est = estimator();
    est.set_layer_rc(tech.layer_named("via1").unwrap(), 0, 4.0, 0.0);
    est.add_signal_layer(tech.layer_named("met1").unwrap());
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    let block = d.db.block().unwrap();
    let r = est.pin_resistance(block, d.net, d.drvr, d.load)?.unwrap();
    assert!(close(r, 0.2 + 2.0 * MIN_RESISTANCE));
    Ok(())
}

#[test]
fn pad_nets_get_a_single_resistor() -> EstResult<()> {
    let mut d = design()?;
    let (net, io) = {
        let block = d.db.block_mut().unwrap();
        let pad = block.add_master(Master::new("PADIO", MasterType::PadInout).mterm(MTerm::new(
            "PAD",
            PinDirection::Inout,
            0,
            Point::new(0, 0),
        )));
        let pad1 = block.create_inst("pad1", pad)?;
        let io = block.create_bterm("io", PinDirection::Input);
        let net = block.create_net("io");
        block.connect(io, net)?;
        block.connect(block.find_iterm(pad1, "PAD").unwrap(), net)?;
        (net, io)
    };
    let mut est = estimator();
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    let nw = est.parasitic_network(net, 0)?.unwrap();
    assert_eq!(nw.nodes().len(), 2);
    assert_eq!(nw.resistors().len(), 1);
    assert_eq!(nw.resistors()[0].id, 1);
    assert_eq!(nw.resistors()[0].value, MIN_RESISTANCE);
    assert_eq!(nw.total_cap(), 0.0);
    assert!(est.reduced_parasitic(io, 0)?.is_some());
    Ok(())
}

#[test]
fn make_wire_parasitic_uses_mean_rc() -> EstResult<()> {
    let d = design()?;
    let mut est = Estimator::default();
    est.set_h_wire_signal_rc(0, 100.0, 1e-16);
    est.set_v_wire_signal_rc(0, 300.0, 3e-16);
    est.make_wire_parasitic(&d.db, d.net, d.drvr, d.load, 1e-3, 0)?;
    let nw = est.parasitic_network(d.net, 0)?.unwrap();
    assert_eq!(nw.resistors().len(), 1);
    assert!(close(nw.resistors()[0].value, 0.2));
    assert!(close(nw.total_cap(), 2e-19));
    assert!(est.make_wire_parasitic(&d.db, d.net, d.drvr, d.load, 1e-3, 3).is_err());
    Ok(())
}

#[test]
fn path_resistance_reports_loops() -> EstResult<()> {
    let d = design()?;
    let block = d.db.block().unwrap();
    let mut nw = ParasiticNetwork::new(d.net);
    let p = nw.ensure_node(NodeId::Pin(d.drvr));
    let a = nw.ensure_node(NodeId::Steiner(0));
    let b = nw.ensure_node(NodeId::Steiner(1));
    let c = nw.ensure_node(NodeId::Steiner(2));
    let q = nw.ensure_node(NodeId::Pin(d.load));
    nw.make_resistor(1, 1.0, p, a);
    nw.make_resistor(2, 1.0, a, b);
    nw.make_resistor(3, 1.0, b, c);
    nw.make_resistor(4, 1.0, c, a);
    nw.make_resistor(5, 1.0, c, q);
    let err = path_resistance(block, &nw, &NodeId::Pin(d.drvr), &NodeId::Pin(d.load)).unwrap_err();
    assert_eq!(err.code(), Some(165));
    assert!(format!("{:?}", err).contains("n1"));

    let missing = NodeId::Grid { x: 0, y: 0, layer: 1 };
    assert!(path_resistance(block, &nw, &NodeId::Pin(d.drvr), &missing)?.is_none());
    Ok(())
}

#[test]
fn incremental_updates_follow_edits() -> EstResult<()> {
    let mut d = design()?;
    let timing = Recorder::default();
    let invalidated = timing.invalidated.clone();
    let mut est = Estimator::new(
        Box::new(MstBuilder),
        Box::new(RouteStore::default()),
        Box::new(timing),
    );
    est.set_v_wire_signal_rc(0, 200.0, 2e-16);
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    {
        let mut guard = IncrementalParasiticsGuard::new(&mut est, &mut d.db)?;
        assert!(guard.estimator().is_incremental_enabled());
        guard.block_mut()?.place_inst(d.u2, Point::new(0, 2_000_000))?;
        assert_eq!(guard.estimator().parasitics_invalid_nets()?, vec![d.net]);
        guard.update()?;
        assert!(guard.estimator().parasitics_valid()?);
        assert!(close(wire_res(guard.estimator(), d.net, 0)?, 0.4));

        // Dropped edits are picked up at teardown
        guard.block_mut()?.place_inst(d.u2, Point::new(0, 3_000_000))?;
        guard.finish()?;
    }
    assert!(!est.is_incremental_enabled());
    assert!(est.parasitics_valid()?);
    assert!(close(wire_res(&est, d.net, 0)?, 0.6));
    assert_eq!(*invalidated.borrow(), vec![d.net, d.net]);

    // Edits outside a guard go unnoticed
    d.db.block_mut().unwrap().place_inst(d.u2, Point::new(0, 0))?;
    assert!(est.parasitics_valid()?);
    Ok(())
}

#[test]
fn destroyed_nets_are_forgotten() -> EstResult<()> {
    let mut d = design()?;
    let mut est = estimator();
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    let mut guard = IncrementalParasiticsGuard::new(&mut est, &mut d.db)?;
    let block = guard.block_mut()?;
    let n2 = block.create_net("n2");
    block.destroy_net(d.net)?;
    let est = guard.estimator();
    assert_eq!(est.parasitics_invalid_nets()?, vec![n2]);
    assert!(est.parasitic_network(d.net, 0)?.is_none());
    assert!(est.reduced_parasitic(d.drvr, 0)?.is_none());
    guard.finish()
}

#[test]
fn nested_guards_leave_incremental_mode_alone() -> EstResult<()> {
    let mut d = design()?;
    let mut est = estimator();
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    let mut guard = IncrementalParasiticsGuard::new(&mut est, &mut d.db)?;
    {
        let mut inner = guard.nested()?;
        inner.block_mut()?.place_inst(d.u2, Point::new(0, 2_000_000))?;
        inner.finish()?;
    }
    assert!(guard.estimator().is_incremental_enabled());
    assert!(!guard.estimator().parasitics_valid()?);
    guard.finish()?;
    assert!(!est.is_incremental_enabled());
    assert!(est.parasitics_valid()?);
    Ok(())
}

#[test]
fn state_errors() -> EstResult<()> {
    let mut est = estimator();
    let mut db = Database::new(tech());
    let err = est.estimate_parasitics(&mut db, ParasiticsSrc::Placement, None).unwrap_err();
    assert_eq!(err.code(), Some(162));
    db.chip = Some(Chip::default());
    let err = est.estimate_parasitics(&mut db, ParasiticsSrc::Placement, None).unwrap_err();
    assert_eq!(err.code(), Some(163));

    let mut d = design()?;
    assert_eq!(est.update_parasitics(&d.db, false).unwrap_err().code(), Some(109));

    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    {
        let mut guard = IncrementalParasiticsGuard::new(&mut est, &mut d.db)?;
        let err = guard
            .estimator_mut()
            .set_parasitics_src(ParasiticsSrc::GlobalRouting)
            .unwrap_err();
        assert_eq!(err.code(), Some(108));
    }
    let block = d.db.block().unwrap();
    est.parasitics_invalid(block, d.net)?;
    let err = IncrementalParasiticsGuard::new(&mut est, &mut d.db).err().map(|e| e.code());
    assert_eq!(err, Some(Some(104)));
    Ok(())
}

#[test]
fn ensure_wire_parasitic_rebuilds_stale_nets() -> EstResult<()> {
    let mut d = design()?;
    let mut est = estimator();
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, None)?;
    let block = d.db.block().unwrap();
    est.parasitics_invalid(block, d.net)?;
    est.erase_parasitics(d.net)?;
    assert!(est.parasitics_valid()?);
    assert!(est.parasitic_network(d.net, 0)?.is_none());
    est.parasitics_invalid(block, d.net)?;
    est.ensure_wire_parasitic(&d.db, d.drvr)?;
    assert!(est.parasitics_valid()?);
    assert!(close(wire_res(&est, d.net, 0)?, 0.2));
    Ok(())
}

#[test]
fn ensure_parasitics_estimates_once() -> EstResult<()> {
    let mut d = design()?;
    let mut est = estimator();
    assert!(!est.have_estimated_parasitics()?);
    est.ensure_parasitics(&mut d.db)?;
    assert!(est.have_estimated_parasitics()?);
    assert!(est.parasitic_network(d.net, 0)?.is_some());
    assert_eq!(est.parasitics_src()?, ParasiticsSrc::Placement);
    est.clear_parasitics()?;
    est.ensure_parasitics(&mut d.db)?;
    assert!(est.parasitic_network(d.net, 0)?.is_none());
    Ok(())
}

#[test]
fn ensure_parasitics_prefers_global_routes() -> EstResult<()> {
    let mut d = design()?;
    let mut router = RouteStore::new(100);
    router.set_route(d.net, route());
    let mut est = routed(router);
    est.set_v_wire_signal_rc(0, 200.0, 2e-16);
    est.ensure_parasitics(&mut d.db)?;
    assert_eq!(est.parasitics_src()?, ParasiticsSrc::GlobalRouting);
    let nw = est.parasitic_network(d.net, 0)?.unwrap();
    assert!(nw.find_node(&NodeId::Grid { x: 50, y: 50, layer: 1 }).is_some());
    Ok(())
}

/// Route for [design]'s net on `met2`, with vias down to `met1` at each end, on 100dbu g-cells
fn route() -> GRoute {
    vec![
        GSegment::new(50, 50, 1, 50, 50, 2),
        GSegment::new(50, 50, 2, 50, 1_000_050, 2),
        GSegment::new(50, 1_000_050, 2, 50, 1_000_050, 1),
    ]
}

#[test]
fn global_route_networks() -> EstResult<()> {
    let mut d = design()?;
    let mut router = RouteStore::new(100);
    router.set_route(d.net, route());
    let mut est = routed(router);
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::GlobalRouting, None)?;

    let nw = est.parasitic_network(d.net, 0)?.unwrap();
    // Intrinsic met1 and met2 RC: 0.125 ohm/sq over 0.14um
    let per_meter = 1e6 * 0.125 / 0.14;
    let pin_wire = per_meter * 1e-7;

    // Pins connect on their own level, met1, without a via
    let on_layer = NodeId::Grid { x: 50, y: 50, layer: 1 };
    let pin = nw.find_node(&NodeId::Pin(d.drvr)).unwrap();
    let grid = nw.find_node(&on_layer).unwrap();
    let stubs: Vec<f64> = nw.incident(pin).map(|(_, r)| r.value).collect();
    assert_eq!(stubs.len(), 1);
    assert!(nw.incident(pin).all(|(_, r)| r.other(pin) == Some(grid)));
    assert!(close(stubs[0], pin_wire));

    // Pin wire and via at each end of the met2 run
    let expected = 2.0 * (pin_wire + 4.5) + per_meter * 1e-3;
    let block = d.db.block().unwrap();
    let r = est.pin_resistance(block, d.net, d.drvr, d.load)?.unwrap();
    assert!(close(r, expected));
    assert!(est.reduced_parasitic(d.drvr, 0)?.is_some());
    Ok(())
}

#[test]
fn wide_rules_lower_route_resistance() -> EstResult<()> {
    let mut d = design()?;
    // Widened on met2 only: the pin wires on met1 keep their resistance
    double_width(&mut d, 2);
    let mut router = RouteStore::new(100);
    router.set_route(d.net, route());
    let mut est = routed(router);
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::GlobalRouting, None)?;

    let per_meter = 1e6 * 0.125 / 0.14;
    let expected = 2.0 * (per_meter * 1e-7 + 4.5) + per_meter * 1e-3 / 2.0;
    let block = d.db.block().unwrap();
    let r = est.pin_resistance(block, d.net, d.drvr, d.load)?.unwrap();
    assert!(close(r, expected));
    Ok(())
}

#[test]
fn route_pins_fall_back_one_layer() -> EstResult<()> {
    let mut d = design()?;
    // A met2 port over the load, where the route only reaches met1
    let out = {
        let block = d.db.block_mut().unwrap();
        let out = block.create_bterm("out", PinDirection::Output);
        block.place_bterm(out, Point::new(0, 1_000_000), 2)?;
        block.connect(out, d.net)?;
        out
    };
    let mut router = RouteStore::new(100);
    router.set_route(d.net, vec![GSegment::new(50, 50, 1, 50, 1_000_050, 1)]);
    let mut est = routed(router);
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::GlobalRouting, None)?;

    let nw = est.parasitic_network(d.net, 0)?.unwrap();
    assert!(nw.find_node(&NodeId::Grid { x: 50, y: 1_000_050, layer: 2 }).is_none());
    let grid = nw.find_node(&NodeId::Grid { x: 50, y: 1_000_050, layer: 1 }).unwrap();
    let pin = nw.find_node(&NodeId::Pin(out)).unwrap();
    let stubs: Vec<_> = nw.incident(pin).collect();
    assert_eq!(stubs.len(), 1);
    assert_eq!(stubs[0].1.other(pin), Some(grid));
    // met1 pin wire plus the via1 cut up to the port's layer
    let per_meter = 1e6 * 0.125 / 0.14;
    assert!(close(stubs[0].1.value, per_meter * 1e-7 + 4.5));

    // Loads on the route's own layer attach without a via
    let load = nw.find_node(&NodeId::Pin(d.load)).unwrap();
    let (_, r) = nw.incident(load).next().unwrap();
    assert!(close(r.value, per_meter * 1e-7));
    Ok(())
}

#[test]
fn global_route_gaps_are_skipped() -> EstResult<()> {
    let mut d = design()?;
    let mut router = RouteStore::new(100);
    router.set_route(
        d.net,
        vec![
            GSegment::new(50, 50, 1, 50, 50, 2),
            // Neither a via nor a wire
            GSegment::new(50, 50, 2, 150, 150, 3),
        ],
    );
    let mut est = routed(router);
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::GlobalRouting, None)?;
    let nw = est.parasitic_network(d.net, 0)?.unwrap();
    assert!(nw.find_node(&NodeId::Pin(d.drvr)).is_some());
    assert!(nw.find_node(&NodeId::Pin(d.load)).is_none());
    assert_eq!(nw.resistors().len(), 2);
    Ok(())
}

#[test]
fn planar_routes_are_partial() -> EstResult<()> {
    let mut d = design()?;
    // Unit g-cells: pins sit on their own grid points
    let mut est = Estimator::default();
    let route = vec![GSegment::planar(0, 0, 0, 1_000_000, 1)];
    match est.estimate_global_route_parasitics(&mut d.db, d.net, &route)? {
        RouteEstimate::Partial(networks) => {
            assert_eq!(networks.len(), 1);
            assert!(networks[0].find_node(&NodeId::Pin(d.load)).is_some());
        }
        RouteEstimate::Committed => panic!("planar route committed"),
    }
    assert!(est.parasitic_network(d.net, 0)?.is_none());

    let route = vec![GSegment::new(0, 0, 1, 0, 1_000_000, 1)];
    let committed = est.estimate_global_route_parasitics(&mut d.db, d.net, &route)?;
    assert_eq!(committed, RouteEstimate::Committed);
    assert!(est.parasitic_network(d.net, 0)?.is_some());
    Ok(())
}

#[test]
fn incremental_global_routes() -> EstResult<()> {
    let mut d = design()?;
    let mut router = RouteStore::new(100);
    router.set_route(d.net, route());
    let mut est = routed(router);
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::GlobalRouting, None)?;
    let before = est.parasitic_network(d.net, 0)?;
    {
        let mut guard = IncrementalParasiticsGuard::new(&mut est, &mut d.db)?;
        guard.block_mut()?.place_inst(d.u2, Point::new(0, 1_000_010))?;
        guard.update()?;
        assert!(guard.estimator().parasitics_valid()?);
    }
    // The store keeps the committed route; only the pin stub changes
    let after = est.parasitic_network(d.net, 0)?;
    assert!(after.is_some());
    assert_ne!(before, after);
    assert!(est.router().have_routes());
    Ok(())
}

#[test]
fn average_cut_resistance() -> EstResult<()> {
    let mut d = design()?;
    let mut est = estimator();
    assert_eq!(est.compute_average_cut_resistance(&d.db, 0)?, 0.0);
    let tech = tech();
    est.set_layer_rc(tech.layer_named("via1").unwrap(), 0, 4.0, 0.0);
    est.set_layer_rc(tech.layer_named("via2").unwrap(), 0, 3.0, 0.0);
    // Three routing levels: the default maximum is level one, spanning no cuts
    assert_eq!(est.compute_average_cut_resistance(&d.db, 0)?, 0.0);
    d.db.block_mut().unwrap().max_routing_layer = Some(3);
    assert_eq!(est.compute_average_cut_resistance(&d.db, 0)?, 3.5);
    Ok(())
}

/// Clonable in-memory SPEF destination
#[derive(Clone, Default)]
struct SharedBuf(Rc<RefCell<Vec<u8>>>);
impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn spef_output() -> EstResult<()> {
    let mut d = design()?;
    let mut est = estimator();
    let buf = SharedBuf::default();
    let mut spef = SpefTextWriter::new().stream(0, Box::new(buf.clone()));
    let sink = Some(&mut spef as &mut dyn SpefWriter);
    est.estimate_parasitics(&mut d.db, ParasiticsSrc::Placement, sink)?;
    spef.flush()?;
    let text = String::from_utf8(buf.0.borrow().clone()).unwrap();
    assert!(text.starts_with("*SPEF"));
    assert!(text.contains("*DESIGN \"top\""));
    assert!(text.contains("*D_NET n1 0.000200"));
    assert!(text.contains("*I u1:Z O"));
    assert!(text.contains("*I u2:A I"));
    assert!(text.contains("*RES"));
    assert_eq!(text.matches("*END").count(), 1);
    Ok(())
}

#[derive(Default)]
struct Highlights(Rc<RefCell<Vec<Option<usize>>>>);
impl SteinerRenderer for Highlights {
    fn highlight(&mut self, tree: Option<&SteinerTree>) {
        self.0.borrow_mut().push(tree.map(|t| t.pin_count()));
    }
}

#[test]
fn steiner_highlights() -> EstResult<()> {
    let d = design()?;
    let block = d.db.block().unwrap();
    let mut est = Estimator::default();
    // Without a renderer this does nothing
    est.highlight_steiner(block, Some(d.drvr));
    let highlights = Highlights::default();
    let seen = highlights.0.clone();
    est.init_steiner_renderer(Box::new(highlights));
    // A second renderer is refused, and the first keeps drawing
    let late = Highlights::default();
    let late_seen = late.0.clone();
    est.init_steiner_renderer(Box::new(late));
    est.highlight_steiner(block, Some(d.drvr));
    est.highlight_steiner(block, None);
    assert_eq!(*seen.borrow(), vec![Some(2), None]);
    assert!(late_seen.borrow().is_empty());

    let tree = est.make_steiner_tree(block, d.drvr).unwrap();
    assert_eq!(tree.length(), 1_000_000);
    assert_eq!(tree.drvr_pin(), Some(d.drvr));
    Ok(())
}

fn config() -> RcConfig {
    let slow = DirRc {
        h_res: 200.0,
        h_cap: 2e-16,
        v_res: 200.0,
        v_cap: 2e-16,
    };
    RcConfigBuilder::default()
        .corners(vec![CornerRcBuilder::default()
            .name("slow")
            .signal(slow)
            .layers(vec![LayerRc {
                layer: "via1".into(),
                res: 4.0,
                cap: 0.0,
            }])
            .build()
            .unwrap()])
        .signal_layers(vec![String::from("met3")])
        .worst_corner("slow")
        .build()
        .unwrap()
}

#[test]
fn config_applies() -> EstResult<()> {
    let tech = tech();
    let mut est = Estimator::default();
    config().apply(&mut est, &tech)?;
    assert_eq!(est.corners().len(), 1);
    assert_eq!(est.corners()[0].name, "slow");
    assert_eq!(est.layer_rc(tech.layer_named("via1").unwrap(), 0), (4.0, 0.0));
    assert_eq!(est.signal_layers(), &[4]);
    assert_eq!(est.wire_signal_resistance(0), 200.0);
    assert_eq!(est.worst_corner(), 0);

    // Applying again replaces the tree layers, rather than adding to them
    est.add_clk_layer(tech.layer_named("met2").unwrap());
    config().apply(&mut est, &tech)?;
    assert_eq!(est.signal_layers(), &[4]);
    assert!(est.clk_layers().is_empty());

    let mut bad = config();
    bad.corners[0].layers[0].layer = "met9".into();
    match bad.apply(&mut est, &tech) {
        Err(EstError::Context { message, stack }) => {
            assert_eq!(message, "Unknown layer met9");
            assert_eq!(
                stack,
                vec![
                    ErrorContext::Config,
                    ErrorContext::Corner("slow".into()),
                    ErrorContext::Layer("met9".into())
                ]
            );
        }
        _ => panic!("expected a context error"),
    }
    let mut bad = config();
    bad.signal_layers = vec!["via1".into()];
    assert!(bad.apply(&mut est, &tech).is_err());
    Ok(())
}

#[test]
fn config_files() -> EstResult<()> {
    let cfg = config();
    let file = tempfile::NamedTempFile::new()?;
    cfg.save(SerializationFormat::Yaml, file.path())?;
    assert_eq!(RcConfig::open(file.path(), SerializationFormat::Yaml)?, cfg);
    cfg.save(SerializationFormat::Json, file.path())?;
    assert_eq!(RcConfig::open(file.path(), SerializationFormat::Json)?, cfg);
    // Format from the file extension
    let named = tempfile::Builder::new().suffix(".yml").tempfile()?;
    cfg.save(SerializationFormat::Yaml, named.path())?;
    assert_eq!(RcConfig::open_any(named.path())?, cfg);
    assert!(RcConfig::open_any(file.path()).is_err());

    let parsed: RcConfig = SerializationFormat::Yaml.from_str(
        r#"
        corners:
          - name: typ
            signal: { h_res: 100.0, h_cap: 1.0e-16, v_res: 120.0, v_cap: 1.2e-16 }
        clock_layers: [met2]
        "#,
    )?;
    assert!(parsed.keep_networks);
    assert_eq!(parsed.corners[0].signal.unwrap().v_res, 120.0);
    assert!(parsed.corners[0].layers.is_empty());
    assert_eq!(parsed.clock_layers, vec!["met2".to_string()]);
    Ok(())
}
