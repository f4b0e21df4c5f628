//!
//! # Block
//!
//! The flat netlist of a design: instances of [Master]s, their terminals,
//! top-level ports, and the nets connecting them.
//! All connectivity edits go through [Block] methods, which notify the registered [BlockCallback].
//!

// Crates.io
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

// Local imports
use crate::utils::{enumstr, EnumStr};
use crate::{
    BlockCallback, DesignError, DesignResult, InstKey, Master, MasterKey, NdrKey, NetKey,
    PinDirection, PinKey, Point, Tech, TechLayer,
};

enumstr!(
    /// # Net Signal Types
    SigType {
        Signal: "SIGNAL",
        Clock: "CLOCK",
        Power: "POWER",
        Ground: "GROUND",
        Analog: "ANALOG",
        Reset: "RESET",
        Scan: "SCAN",
        Tieoff: "TIEOFF",
    }
);
impl SigType {
    /// Boolean indication of a supply net
    pub fn is_supply(&self) -> bool {
        matches!(self, Self::Power | Self::Ground)
    }
}
impl Default for SigType {
    fn default() -> Self {
        Self::Signal
    }
}

/// # Instance
#[derive(Debug, Clone)]
pub struct Inst {
    pub name: String,
    pub master: MasterKey,
    /// Placed origin. `None` while unplaced.
    pub location: Option<Point>,
    /// Instance terminals, in the order of the master's terminals
    pub iterms: Vec<PinKey>,
}

/// # Pin Kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinKind {
    /// Terminal of an instance, referring to its master's `mterm`-th terminal
    ITerm { inst: InstKey, mterm: usize },
    /// Top-level port, with its placed location and layer number
    BTerm {
        location: Option<Point>,
        layer: Option<usize>,
    },
}

/// # Pin
#[derive(Debug, Clone)]
pub struct Pin {
    pub name: String,
    pub kind: PinKind,
    pub direction: PinDirection,
    pub net: Option<NetKey>,
}

/// # Net
#[derive(Debug, Clone, Default)]
pub struct Net {
    pub name: String,
    pub sig_type: SigType,
    /// Special (pre-routed) nets are never estimated
    pub special: bool,
    pub ndr: Option<NdrKey>,
    pub pins: Vec<PinKey>,
}

/// # Block
#[derive(Default)]
pub struct Block {
    pub name: String,
    /// Lowest routing level available for signal routing
    pub min_routing_layer: usize,
    /// Highest routing level available for signal routing, if set
    pub max_routing_layer: Option<usize>,
    masters: SlotMap<MasterKey, Master>,
    insts: SlotMap<InstKey, Inst>,
    nets: SlotMap<NetKey, Net>,
    pins: SlotMap<PinKey, Pin>,
    callback: Option<Box<dyn BlockCallback>>,
}
impl Block {
    /// Create a new and empty [Block]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_routing_layer: 1,
            ..Default::default()
        }
    }

    // Callback owner registration

    /// Register `cb` as the single owner of our mutation callbacks.
    /// Fails if another owner is registered.
    pub fn add_callback_owner(&mut self, cb: Box<dyn BlockCallback>) -> DesignResult<()> {
        if self.callback.is_some() {
            return Err(DesignError::CallbackOwned);
        }
        self.callback = Some(cb);
        Ok(())
    }
    /// Remove and return the registered callback owner, if any
    pub fn remove_callback_owner(&mut self) -> Option<Box<dyn BlockCallback>> {
        self.callback.take()
    }
    /// Boolean indication of whether a callback owner is registered
    pub fn has_callback_owner(&self) -> bool {
        self.callback.is_some()
    }
    /// Invoke the registered callback, if any.
    /// The callback is taken out for the duration, so it may read the rest of `self`.
    fn notify(&mut self, f: impl FnOnce(&mut dyn BlockCallback, &Block)) {
        if let Some(mut cb) = self.callback.take() {
            f(cb.as_mut(), self);
            self.callback = Some(cb);
        }
    }

    // Masters & instances

    /// Add a [Master]
    pub fn add_master(&mut self, master: Master) -> MasterKey {
        self.masters.insert(master)
    }
    /// Get a reference to the [Master] at `key`
    pub fn master(&self, key: MasterKey) -> Option<&Master> {
        self.masters.get(key)
    }
    /// Create an unplaced instance of `master`, along with its terminals
    pub fn create_inst(
        &mut self,
        name: impl Into<String>,
        master: MasterKey,
    ) -> DesignResult<InstKey> {
        let mterms: Vec<PinDirection> = self
            .masters
            .get(master)
            .ok_or_else(|| DesignError::stale("master"))?
            .mterms
            .iter()
            .map(|m| m.direction)
            .collect();
        let name = name.into();
        let inst = self.insts.insert(Inst {
            name,
            master,
            location: None,
            iterms: Vec::with_capacity(mterms.len()),
        });
        for (idx, direction) in mterms.into_iter().enumerate() {
            let pin = self.pins.insert(Pin {
                name: String::new(),
                kind: PinKind::ITerm { inst, mterm: idx },
                direction,
                net: None,
            });
            self.insts[inst].iterms.push(pin);
        }
        self.notify(|cb, block| cb.inst_created(block, inst));
        Ok(inst)
    }
    /// Place (or move) instance `inst` with its origin at `loc`
    pub fn place_inst(&mut self, inst: InstKey, loc: Point) -> DesignResult<()> {
        self.insts
            .get_mut(inst)
            .ok_or_else(|| DesignError::stale("instance"))?
            .location = Some(loc);
        self.notify(|cb, block| cb.inst_moved(block, inst));
        Ok(())
    }
    /// Swap the master of `inst` for `master`,
    /// which must have terminals of the same names in the same order.
    pub fn swap_master(&mut self, inst: InstKey, master: MasterKey) -> DesignResult<()> {
        let old = self.inst(inst).ok_or_else(|| DesignError::stale("instance"))?.master;
        let old = self.master(old).ok_or_else(|| DesignError::stale("master"))?;
        let new = self.master(master).ok_or_else(|| DesignError::stale("master"))?;
        let compatible = old.mterms.len() == new.mterms.len()
            && old.mterms.iter().zip(new.mterms.iter()).all(|(a, b)| a.name == b.name);
        if !compatible {
            return DesignError::fail(format!(
                "Cannot swap master {} for non-equivalent {}",
                old.name, new.name
            ));
        }
        self.insts[inst].master = master;
        self.notify(|cb, block| cb.inst_master_swapped(block, inst));
        Ok(())
    }
    /// Get a reference to the [Inst] at `key`
    pub fn inst(&self, key: InstKey) -> Option<&Inst> {
        self.insts.get(key)
    }
    /// Find an instance by name
    pub fn find_inst(&self, name: &str) -> Option<InstKey> {
        self.insts.iter().find(|(_, i)| i.name == name).map(|(k, _)| k)
    }
    /// Iterate over all instances
    pub fn insts(&self) -> impl Iterator<Item = (InstKey, &Inst)> {
        self.insts.iter()
    }
    /// Get the [Master] of instance `inst`
    pub fn inst_master(&self, inst: InstKey) -> Option<&Master> {
        self.inst(inst).and_then(|i| self.master(i.master))
    }
    /// Nets connected to any terminal of `inst`, without duplicates
    pub fn inst_nets(&self, inst: InstKey) -> Vec<NetKey> {
        let mut nets = Vec::new();
        if let Some(inst) = self.inst(inst) {
            for pin in inst.iterms.iter() {
                if let Some(net) = self.pin(*pin).and_then(|p| p.net) {
                    if !nets.contains(&net) {
                        nets.push(net);
                    }
                }
            }
        }
        nets
    }
    /// Find the terminal of `inst` named `mterm`
    pub fn find_iterm(&self, inst: InstKey, mterm: &str) -> Option<PinKey> {
        let idx = self.inst_master(inst)?.mterm_index(mterm)?;
        self.inst(inst)?.iterms.get(idx).copied()
    }

    // Nets

    /// Create a new and unconnected signal net
    pub fn create_net(&mut self, name: impl Into<String>) -> NetKey {
        let net = self.nets.insert(Net {
            name: name.into(),
            ..Default::default()
        });
        self.notify(|cb, block| cb.net_created(block, net));
        net
    }
    /// Destroy `net`, first disconnecting all of its pins
    pub fn destroy_net(&mut self, net: NetKey) -> DesignResult<()> {
        let pins = self
            .nets
            .get(net)
            .ok_or_else(|| DesignError::stale("net"))?
            .pins
            .clone();
        for pin in pins {
            self.disconnect(pin)?;
        }
        self.notify(|cb, block| cb.net_destroyed(block, net));
        self.nets.remove(net);
        Ok(())
    }
    /// Get a reference to the [Net] at `key`
    pub fn net(&self, key: NetKey) -> Option<&Net> {
        self.nets.get(key)
    }
    /// Get a mutable reference to the [Net] at `key`, for attribute edits.
    /// Connectivity is edited via [Block::connect] and [Block::disconnect].
    pub fn net_mut(&mut self, key: NetKey) -> Option<&mut Net> {
        self.nets.get_mut(key)
    }
    /// Find a net by name
    pub fn find_net(&self, name: &str) -> Option<NetKey> {
        self.nets.iter().find(|(_, n)| n.name == name).map(|(k, _)| k)
    }
    /// Iterate over all nets
    pub fn nets(&self) -> impl Iterator<Item = (NetKey, &Net)> {
        self.nets.iter()
    }
    /// Driving pins of `net`: instance outputs, and top-level inputs
    pub fn net_drivers(&self, net: NetKey) -> Vec<PinKey> {
        let net = match self.net(net) {
            Some(n) => n,
            None => return Vec::new(),
        };
        net.pins
            .iter()
            .copied()
            .filter(|key| match self.pin(*key) {
                Some(pin) => match (pin.kind, pin.direction) {
                    (_, PinDirection::Inout) => true,
                    (PinKind::ITerm { .. }, PinDirection::Output) => true,
                    (PinKind::BTerm { .. }, PinDirection::Input) => true,
                    _ => false,
                },
                None => false,
            })
            .collect()
    }

    // Pins

    /// Create an unplaced and unconnected top-level port
    pub fn create_bterm(&mut self, name: impl Into<String>, direction: PinDirection) -> PinKey {
        self.pins.insert(Pin {
            name: name.into(),
            kind: PinKind::BTerm {
                location: None,
                layer: None,
            },
            direction,
            net: None,
        })
    }
    /// Place top-level port `pin` at `loc` on layer number `layer`
    pub fn place_bterm(&mut self, pin: PinKey, loc: Point, layer: usize) -> DesignResult<()> {
        let pin = self.pins.get_mut(pin).ok_or_else(|| DesignError::stale("pin"))?;
        match pin.kind {
            PinKind::BTerm { .. } => {
                pin.kind = PinKind::BTerm {
                    location: Some(loc),
                    layer: Some(layer),
                };
                Ok(())
            }
            PinKind::ITerm { .. } => DesignError::fail("Cannot place an instance terminal"),
        }
    }
    /// Connect `pin` to `net`, disconnecting it from any prior net
    pub fn connect(&mut self, pin: PinKey, net: NetKey) -> DesignResult<()> {
        if !self.nets.contains_key(net) {
            return Err(DesignError::stale("net"));
        }
        let prior = self.pins.get(pin).ok_or_else(|| DesignError::stale("pin"))?.net;
        if prior == Some(net) {
            return Ok(());
        }
        if prior.is_some() {
            self.disconnect(pin)?;
        }
        self.pins[pin].net = Some(net);
        self.nets[net].pins.push(pin);
        self.notify(|cb, block| cb.pin_post_connect(block, pin));
        Ok(())
    }
    /// Disconnect `pin` from its net. No-op if unconnected.
    pub fn disconnect(&mut self, pin: PinKey) -> DesignResult<()> {
        let p = self.pins.get_mut(pin).ok_or_else(|| DesignError::stale("pin"))?;
        let net = match p.net.take() {
            Some(n) => n,
            None => return Ok(()),
        };
        if let Some(n) = self.nets.get_mut(net) {
            n.pins.retain(|p| *p != pin);
        }
        self.notify(|cb, block| cb.pin_post_disconnect(block, pin, net));
        Ok(())
    }
    /// Get a reference to the [Pin] at `key`
    pub fn pin(&self, key: PinKey) -> Option<&Pin> {
        self.pins.get(key)
    }
    /// Boolean indication of whether `pin` is a top-level port
    pub fn is_top_level_port(&self, pin: PinKey) -> bool {
        matches!(self.pin(pin).map(|p| p.kind), Some(PinKind::BTerm { .. }))
    }
    /// Instance owning `pin`, if it is an instance terminal
    pub fn pin_inst(&self, pin: PinKey) -> Option<InstKey> {
        match self.pin(pin)?.kind {
            PinKind::ITerm { inst, .. } => Some(inst),
            PinKind::BTerm { .. } => None,
        }
    }
    /// Full path name of `pin`: `inst/term` for instance terminals, the port name otherwise
    pub fn pin_name(&self, pin: PinKey) -> String {
        let p = match self.pin(pin) {
            Some(p) => p,
            None => return String::from("<stale>"),
        };
        match p.kind {
            PinKind::BTerm { .. } => p.name.clone(),
            PinKind::ITerm { inst, mterm } => {
                let iname = self.inst(inst).map(|i| i.name.as_str()).unwrap_or("<stale>");
                let mname = self
                    .inst_master(inst)
                    .and_then(|m| m.mterms.get(mterm))
                    .map(|m| m.name.as_str())
                    .unwrap_or("<stale>");
                format!("{}/{}", iname, mname)
            }
        }
    }
    /// Location of `pin`, if placed
    pub fn pin_location(&self, pin: PinKey) -> Option<Point> {
        match self.pin(pin)?.kind {
            PinKind::BTerm { location, .. } => location,
            PinKind::ITerm { inst, mterm } => {
                let origin = self.inst(inst)?.location?;
                let offset = self.inst_master(inst)?.mterms.get(mterm)?.offset;
                Some(origin + offset)
            }
        }
    }
    /// Boolean indication of whether `pin` has a placed location
    pub fn is_placed(&self, pin: PinKey) -> bool {
        self.pin_location(pin).is_some()
    }
    /// The layer `pin` connects on: for instance terminals the lowest routing layer
    /// of its geometry, for top-level ports the layer of its placed shape.
    /// `None` for unplaced ports.
    pub fn pin_layer<'t>(&self, tech: &'t Tech, pin: PinKey) -> Option<&'t TechLayer> {
        match self.pin(pin)?.kind {
            PinKind::BTerm { layer, .. } => tech.layer(layer?),
            PinKind::ITerm { inst, mterm } => {
                let mterm = self.inst_master(inst)?.mterms.get(mterm)?;
                let layers = mterm.layers.iter().filter_map(|l| tech.layer(*l));
                let lowest_routing = layers
                    .clone()
                    .filter(|l| l.routing_level.is_some())
                    .min_by_key(|l| l.routing_level);
                lowest_routing.or_else(|| layers.min_by_key(|l| l.number))
            }
        }
    }
}
