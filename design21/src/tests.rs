//!
//! # design21 unit tests
//!

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::utils::EnumStr;

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

/// Create a [Block] with a buffer master
fn block_with_buf() -> (Block, MasterKey) {
    let mut block = Block::new("top");
    let buf = block.add_master(
        Master::new("BUF", MasterType::Core)
            .mterm(MTerm::new("A", PinDirection::Input, 0, Point::new(0, 0)))
            .mterm(MTerm::new("Z", PinDirection::Output, 0, Point::new(100, 0))),
    );
    (block, buf)
}

#[test]
fn test_tech_layers() {
    let tech = tech();
    assert_eq!(tech.layer_count(), 5);
    assert_eq!(tech.routing_layer_count(), 3);
    let m2 = tech.find_routing_layer(2).unwrap();
    assert_eq!(m2.name, "met2");
    assert_eq!(m2.number, 2);
    assert!(tech.layer(3).unwrap().is_cut());
    assert_eq!(tech.layer_named("met3").unwrap().routing_level, Some(3));
    assert!(tech.find_routing_layer(4).is_none());
}

#[test]
fn test_master_types() {
    assert!(MasterType::PadInput.is_pad());
    assert!(MasterType::CoverBump.is_pad());
    assert!(!MasterType::Cover.is_pad());
    assert!(!MasterType::CoreSpacer.is_pad());
    assert_eq!(MasterType::from_str("PAD_POWER"), Some(MasterType::PadPower));
    let pads = MasterType::all().iter().filter(|t| t.is_pad()).count();
    assert_eq!(pads, 8);
}

#[test]
fn test_connectivity() -> DesignResult<()> {
    let tech = tech();
    let (mut block, buf) = block_with_buf();
    let u1 = block.create_inst("u1", buf)?;
    let net = block.create_net("n1");
    let z = block.find_iterm(u1, "Z").unwrap();
    block.connect(z, net)?;
    let port = block.create_bterm("out", PinDirection::Output);
    block.connect(port, net)?;

    assert_eq!(block.net(net).unwrap().pins.len(), 2);
    assert_eq!(block.net_drivers(net), vec![z]);
    assert_eq!(block.pin_name(z), "u1/Z");
    assert!(block.is_top_level_port(port));
    assert!(!block.is_placed(z));

    block.place_inst(u1, Point::new(1000, 2000))?;
    assert_eq!(block.pin_location(z), Some(Point::new(1100, 2000)));
    assert_eq!(block.pin_layer(&tech, z).unwrap().name, "met1");

    assert!(block.pin_layer(&tech, port).is_none());
    block.place_bterm(port, Point::new(0, 0), 2)?;
    assert_eq!(block.pin_layer(&tech, port).unwrap().name, "met2");

    block.disconnect(z)?;
    assert_eq!(block.net(net).unwrap().pins, vec![port]);
    assert_eq!(block.inst_nets(u1), vec![]);
    Ok(())
}

/// Callback recording the events it observes
struct Recorder(Rc<RefCell<Vec<String>>>);
impl BlockCallback for Recorder {
    fn inst_created(&mut self, block: &Block, inst: InstKey) {
        let name = block.inst(inst).unwrap().name.clone();
        self.0.borrow_mut().push(format!("inst {}", name));
    }
    fn net_created(&mut self, block: &Block, net: NetKey) {
        let name = block.net(net).unwrap().name.clone();
        self.0.borrow_mut().push(format!("net {}", name));
    }
    fn net_destroyed(&mut self, block: &Block, net: NetKey) {
        let name = block.net(net).unwrap().name.clone();
        self.0.borrow_mut().push(format!("destroy {}", name));
    }
    fn pin_post_connect(&mut self, block: &Block, pin: PinKey) {
        self.0.borrow_mut().push(format!("connect {}", block.pin_name(pin)));
    }
    fn pin_post_disconnect(&mut self, block: &Block, pin: PinKey, net: NetKey) {
        let name = block.net(net).unwrap().name.clone();
        self.0
            .borrow_mut()
            .push(format!("disconnect {} {}", block.pin_name(pin), name));
    }
}

#[test]
fn test_callbacks() -> DesignResult<()> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let (mut block, buf) = block_with_buf();
    block.add_callback_owner(Box::new(Recorder(events.clone())))?;
    assert!(block.has_callback_owner());

    // A second owner is refused
    let second = block.add_callback_owner(Box::new(Recorder(events.clone())));
    assert!(matches!(second, Err(DesignError::CallbackOwned)));

    let u1 = block.create_inst("u1", buf)?;
    let net = block.create_net("n1");
    let a = block.find_iterm(u1, "A").unwrap();
    block.connect(a, net)?;
    block.destroy_net(net)?;
    assert!(block.net(net).is_none());
    assert!(block.pin(a).unwrap().net.is_none());

    assert_eq!(
        *events.borrow(),
        vec![
            "inst u1",
            "net n1",
            "connect u1/A",
            "disconnect u1/A n1",
            "destroy n1"
        ]
    );

    // Nothing is recorded once the owner is removed
    assert!(block.remove_callback_owner().is_some());
    block.create_net("n2");
    assert_eq!(events.borrow().len(), 5);
    Ok(())
}

#[test]
fn test_swap_master() -> DesignResult<()> {
    let (mut block, buf) = block_with_buf();
    let buf2 = block.add_master(
        Master::new("BUF_X2", MasterType::Core)
            .mterm(MTerm::new("A", PinDirection::Input, 0, Point::new(0, 0)))
            .mterm(MTerm::new("Z", PinDirection::Output, 0, Point::new(200, 0))),
    );
    let inv = block.add_master(
        Master::new("INV", MasterType::Core)
            .mterm(MTerm::new("I", PinDirection::Input, 0, Point::new(0, 0))),
    );
    let u1 = block.create_inst("u1", buf)?;
    block.swap_master(u1, buf2)?;
    assert_eq!(block.inst_master(u1).unwrap().name, "BUF_X2");
    assert!(block.swap_master(u1, inv).is_err());
    Ok(())
}
