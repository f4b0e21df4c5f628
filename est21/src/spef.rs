//!
//! # SPEF Output
//!
//! Estimated networks may be streamed to a [SpefWriter] as they are built, one net per corner.
//! [SpefTextWriter] writes Standard Parasitic Exchange Format text, one stream per corner.
//!

// Std-Lib
use std::collections::{HashMap, HashSet};
use std::io::Write;

// Local imports
use crate::design::{Block, NetKey, PinDirection, PinKind};
use crate::{Corner, EstResult, NodeId, ParasiticNetwork};

/// # SPEF Sink
pub trait SpefWriter {
    /// Write `network`, the parasitics of `net` at `corner`
    fn write_net(
        &mut self,
        block: &Block,
        corner: &Corner,
        net: NetKey,
        network: &ParasiticNetwork,
    ) -> EstResult<()>;
}

/// Reborrow an optional sink for one call, leaving `spef` usable afterward
pub(crate) fn reborrow<'s>(
    spef: &'s mut Option<&mut dyn SpefWriter>,
) -> Option<&'s mut dyn SpefWriter> {
    spef.as_mut().map(|s| &mut **s as &mut dyn SpefWriter)
}

///
/// # SPEF Text Writer
///
/// Capacitance is written in femtofarads and resistance in ohms.
/// Nets for corners without a stream are skipped.
///
pub struct SpefTextWriter {
    streams: HashMap<usize, Box<dyn Write>>,
    headers: HashSet<usize>,
}
impl SpefTextWriter {
    /// Create a writer with no streams
    pub fn new() -> Self {
        Self {
            streams: HashMap::new(),
            headers: HashSet::new(),
        }
    }
    /// Add the destination for corner `corner`, builder-style
    pub fn stream(mut self, corner: usize, dest: Box<dyn Write>) -> Self {
        self.streams.insert(corner, dest);
        self
    }
    /// Flush all streams
    pub fn flush(&mut self) -> EstResult<()> {
        for s in self.streams.values_mut() {
            s.flush()?;
        }
        Ok(())
    }

    fn write_header(out: &mut dyn Write, block: &Block, corner: &Corner) -> EstResult<()> {
        writeln!(out, "*SPEF \"IEEE 1481-1998\"")?;
        writeln!(out, "*DESIGN \"{}\"", block.name)?;
        writeln!(out, "*PROGRAM \"est21\"")?;
        writeln!(out, "*VERSION \"{}\"", env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "*DESIGN_FLOW \"CORNER {}\"", corner.name)?;
        writeln!(out, "*DIVIDER /")?;
        writeln!(out, "*DELIMITER :")?;
        writeln!(out, "*BUS_DELIMITER [ ]")?;
        writeln!(out, "*T_UNIT 1 NS")?;
        writeln!(out, "*C_UNIT 1 FF")?;
        writeln!(out, "*R_UNIT 1 OHM")?;
        writeln!(out, "*L_UNIT 1 HENRY")?;
        writeln!(out)?;
        Ok(())
    }
}
impl Default for SpefTextWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// SPEF name of node `id` of `net_name`
fn node_name(block: &Block, net_name: &str, id: &NodeId, idx: usize) -> String {
    match id {
        NodeId::Pin(pin) => block.pin_name(*pin).replacen('/', ":", 1),
        _ => format!("{}:{}", net_name, idx + 1),
    }
}

impl SpefWriter for SpefTextWriter {
    fn write_net(
        &mut self,
        block: &Block,
        corner: &Corner,
        net: NetKey,
        network: &ParasiticNetwork,
    ) -> EstResult<()> {
        let out = match self.streams.get_mut(&corner.index) {
            Some(s) => s,
            None => return Ok(()),
        };
        if self.headers.insert(corner.index) {
            Self::write_header(out.as_mut(), block, corner)?;
        }
        let net_name = block.net(net).map(|n| n.name.clone()).unwrap_or_default();
        let ff = 1e15;
        writeln!(out, "*D_NET {} {:.6}", net_name, network.total_cap() * ff)?;

        writeln!(out, "*CONN")?;
        for pin in network.pins() {
            let p = match block.pin(pin) {
                Some(p) => p,
                None => continue,
            };
            let dir = match p.direction {
                PinDirection::Input => "I",
                PinDirection::Output => "O",
                PinDirection::Inout | PinDirection::Feedthru => "B",
            };
            let kind = match p.kind {
                PinKind::BTerm { .. } => "*P",
                PinKind::ITerm { .. } => "*I",
            };
            let name = node_name(block, &net_name, &NodeId::Pin(pin), 0);
            writeln!(out, "{} {} {}", kind, name, dir)?;
        }

        writeln!(out, "*CAP")?;
        let caps = network.nodes().iter().enumerate().filter(|(_, n)| n.cap > 0.0);
        for (count, (idx, node)) in caps.enumerate() {
            let name = node_name(block, &net_name, &node.id, idx);
            writeln!(out, "{} {} {:.6}", count + 1, name, node.cap * ff)?;
        }

        writeln!(out, "*RES")?;
        for (count, res) in network.resistors().iter().enumerate() {
            let n1 = network.node(res.n1).map(|n| node_name(block, &net_name, &n.id, res.n1));
            let n2 = network.node(res.n2).map(|n| node_name(block, &net_name, &n.id, res.n2));
            if let (Some(n1), Some(n2)) = (n1, n2) {
                writeln!(out, "{} {} {} {:.6}", count + 1, n1, n2, res.value)?;
            }
        }
        writeln!(out, "*END")?;
        writeln!(out)?;
        Ok(())
    }
}
