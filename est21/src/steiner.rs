//!
//! # Steiner Trees
//!
//! [SteinerTree] adapts a rectilinear tree in the "flute" branch format:
//! a list of points, each naming its neighbor towards the root,
//! the first `deg` of which are the tree's pins.
//! Tree construction is delegated to a [SteinerBuilder];
//! [MstBuilder] is a simple reference implementation.
//!

// Std-Lib
use std::collections::HashMap;

// Local imports
use crate::design::{Block, Int, NetKey, PinKey, Point};

/// Index of a point in a [SteinerTree]
pub type SteinerPt = usize;

/// # Flute-Format Branch
///
/// A tree point at (`x`, `y`), and the index `n` of its neighbor towards the root.
/// The root names itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Branch {
    pub x: Int,
    pub y: Int,
    pub n: usize,
}

/// # Flute-Format Tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FluteTree {
    /// Number of pins, i.e. leading entries of `branch`
    pub deg: usize,
    /// Total wire length
    pub length: Int,
    pub branch: Vec<Branch>,
}

/// # Steiner Tree Builder
///
/// Builds a rectilinear tree over the points (`x[i]`, `y[i]`), rooted at `drvr_idx`.
/// The first `x.len()` entries of the result must be the input points, in input order.
pub trait SteinerBuilder {
    fn make_steiner_tree(
        &mut self,
        net: Option<NetKey>,
        x: &[Int],
        y: &[Int],
        drvr_idx: usize,
    ) -> FluteTree;
}

///
/// # Rectilinear Minimum-Spanning-Tree Builder
///
/// Prim's algorithm over Manhattan distance, from the driver.
/// Each diagonal tree edge gets an L-shaped corner point,
/// so every branch is horizontal or vertical.
///
#[derive(Debug, Clone, Copy, Default)]
pub struct MstBuilder;

impl SteinerBuilder for MstBuilder {
    fn make_steiner_tree(
        &mut self,
        _net: Option<NetKey>,
        x: &[Int],
        y: &[Int],
        drvr_idx: usize,
    ) -> FluteTree {
        let deg = x.len().min(y.len());
        let pts: Vec<Point> = (0..deg).map(|i| Point::new(x[i], y[i])).collect();
        let mut branch: Vec<Branch> = pts
            .iter()
            .enumerate()
            .map(|(i, p)| Branch { x: p.x, y: p.y, n: i })
            .collect();
        if deg == 0 {
            return FluteTree::default();
        }
        let root = drvr_idx.min(deg - 1);

        // Prim: `best[i]` is the (distance, tree-neighbor) of out-of-tree point `i`
        let mut in_tree = vec![false; deg];
        let mut best: Vec<(Int, usize)> =
            pts.iter().map(|p| (p.manhattan(&pts[root]), root)).collect();
        in_tree[root] = true;
        let mut length = 0;
        for _ in 1..deg {
            let next = (0..deg)
                .filter(|i| !in_tree[*i])
                .min_by_key(|i| (best[*i].0, *i));
            let next = match next {
                Some(n) => n,
                None => break,
            };
            in_tree[next] = true;
            let (dist, parent) = best[next];
            length += dist;
            let (p, q) = (pts[next], pts[parent]);
            if p.x != q.x && p.y != q.y {
                // Corner point, horizontal from `p` then vertical to `q`
                let corner = branch.len();
                branch.push(Branch { x: q.x, y: p.y, n: parent });
                branch[next].n = corner;
            } else {
                branch[next].n = parent;
            }
            for i in 0..deg {
                if !in_tree[i] {
                    let d = pts[i].manhattan(&p);
                    if d < best[i].0 {
                        best[i] = (d, next);
                    }
                }
            }
        }
        FluteTree { deg, length, branch }
    }
}

/// A pin, or a bare location, and where it sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinLoc {
    pub pin: Option<PinKey>,
    pub loc: Point,
}

/// # Steiner Branch
///
/// A tree edge between two points, with its rectilinear length in dbu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteinerBranch {
    pub pt1: Point,
    pub steiner_pt1: SteinerPt,
    pub pt2: Point,
    pub steiner_pt2: SteinerPt,
    pub wire_length: Int,
}

///
/// # Steiner Tree
///
/// A [FluteTree] plus the mapping from its points back to the pins at their locations.
/// Several pins may share a location;
/// each is attached to the first tree point at that location only.
///
#[derive(Debug, Clone)]
pub struct SteinerTree {
    drvr_pin: Option<PinKey>,
    drvr_loc: Point,
    pinlocs: Vec<PinLoc>,
    tree: FluteTree,
    /// Pins attached to each tree point
    pt_pins: Vec<Vec<PinKey>>,
}
impl SteinerTree {
    /// Number of pins (and bare locations) the tree was built over
    pub fn pin_count(&self) -> usize {
        self.pinlocs.len()
    }
    /// The pins and bare locations, sorted by location
    pub fn pinlocs(&self) -> &[PinLoc] {
        &self.pinlocs
    }
    /// Driver pin, if built from one
    pub fn drvr_pin(&self) -> Option<PinKey> {
        self.drvr_pin
    }
    /// Number of tree points, pins first
    pub fn point_count(&self) -> usize {
        self.tree.branch.len()
    }
    /// Location of point `pt`
    pub fn location(&self, pt: SteinerPt) -> Option<Point> {
        self.tree.branch.get(pt).map(|b| Point::new(b.x, b.y))
    }
    /// Total wire length, in dbu
    pub fn length(&self) -> Int {
        self.tree.length
    }
    /// Pins attached to point `pt`
    pub fn pins(&self, pt: SteinerPt) -> &[PinKey] {
        self.pt_pins.get(pt).map(|p| p.as_slice()).unwrap_or(&[])
    }
    /// Tree edges: each point paired with its neighbor towards the root,
    /// skipping the root's self-reference
    pub fn branches(&self) -> Vec<SteinerBranch> {
        self.tree
            .branch
            .iter()
            .enumerate()
            .filter(|(i, b)| b.n != *i && b.n < self.tree.branch.len())
            .map(|(i, b)| {
                let n = &self.tree.branch[b.n];
                let pt1 = Point::new(b.x, b.y);
                let pt2 = Point::new(n.x, n.y);
                SteinerBranch {
                    pt1,
                    steiner_pt1: i,
                    pt2,
                    steiner_pt2: b.n,
                    wire_length: pt1.manhattan(&pt2),
                }
            })
            .collect()
    }
    /// Number of [SteinerTree::branches]
    pub fn branch_count(&self) -> usize {
        self.branches().len()
    }
    /// The tree point at the driver location
    pub fn drvr_pt(&self) -> Option<SteinerPt> {
        self.tree
            .branch
            .iter()
            .take(self.tree.deg)
            .position(|b| b.x == self.drvr_loc.x && b.y == self.drvr_loc.y)
    }
    /// Top of the tree for load estimation: the driver point
    pub fn top(&self) -> Option<SteinerPt> {
        self.drvr_pt()
    }
    /// Points whose neighbor towards the root is `pt`
    pub fn children(&self, pt: SteinerPt) -> Vec<SteinerPt> {
        self.tree
            .branch
            .iter()
            .enumerate()
            .filter(|(i, b)| b.n == pt && *i != pt)
            .map(|(i, _)| i)
            .collect()
    }
    /// Wire length along the tree between points `from` and `to`, in dbu
    pub fn distance(&self, from: SteinerPt, to: SteinerPt) -> Option<Int> {
        // Distances from `from` to each of its ancestors, then walk up from `to` until one is met
        let mut up = HashMap::new();
        let mut pt = from;
        let mut dist = 0;
        loop {
            up.insert(pt, dist);
            let b = self.tree.branch.get(pt)?;
            if b.n == pt || up.contains_key(&b.n) {
                break;
            }
            dist += self.location(pt)?.manhattan(&self.location(b.n)?);
            pt = b.n;
        }
        let mut pt = to;
        let mut dist = 0;
        let mut steps = 0;
        loop {
            if let Some(d) = up.get(&pt) {
                return Some(d + dist);
            }
            let b = self.tree.branch.get(pt)?;
            if b.n == pt || steps > self.tree.branch.len() {
                return None;
            }
            dist += self.location(pt)?.manhattan(&self.location(b.n)?);
            pt = b.n;
            steps += 1;
        }
    }

    /// Create from a built tree and its (sorted) pin locations
    fn from_flute(
        drvr_pin: Option<PinKey>,
        drvr_loc: Point,
        pinlocs: Vec<PinLoc>,
        tree: FluteTree,
    ) -> Self {
        let mut loc_pins: HashMap<Point, Vec<PinKey>> = HashMap::new();
        for pl in pinlocs.iter() {
            if let Some(pin) = pl.pin {
                loc_pins.entry(pl.loc).or_default().push(pin);
            }
        }
        let mut pt_pins = vec![Vec::new(); tree.branch.len()];
        for (i, b) in tree.branch.iter().take(tree.deg).enumerate() {
            if let Some(pins) = loc_pins.remove(&Point::new(b.x, b.y)) {
                pt_pins[i] = pins;
            }
        }
        Self {
            drvr_pin,
            drvr_loc,
            pinlocs,
            tree,
            pt_pins,
        }
    }
}

/// Sort pin locations by x, then y
fn sort_pinlocs(pinlocs: &mut [PinLoc]) {
    pinlocs.sort_by(|a, b| (a.loc.x, a.loc.y).cmp(&(b.loc.x, b.loc.y)));
}

/// Build a [SteinerTree] over the pins of `drvr`'s net.
/// Returns `None` if the net has fewer than two pins, or any pin is unplaced.
pub fn make_steiner_tree(
    builder: &mut dyn SteinerBuilder,
    block: &Block,
    drvr: PinKey,
) -> Option<SteinerTree> {
    let net_key = block.pin(drvr)?.net?;
    let net = block.net(net_key)?;
    log::debug!(target: "steiner", "Net {}", net.name);

    let mut pinlocs = Vec::with_capacity(net.pins.len());
    for pin in net.pins.iter() {
        match block.pin_location(*pin) {
            Some(loc) => pinlocs.push(PinLoc { pin: Some(*pin), loc }),
            None => return None,
        }
    }
    if pinlocs.len() < 2 {
        return None;
    }
    // Connection order is not deterministic across edits, so sort by location
    sort_pinlocs(&mut pinlocs);
    let drvr_idx = pinlocs.iter().position(|pl| pl.pin == Some(drvr)).unwrap_or(0);
    let drvr_loc = pinlocs[drvr_idx].loc;
    let x: Vec<Int> = pinlocs.iter().map(|pl| pl.loc.x).collect();
    let y: Vec<Int> = pinlocs.iter().map(|pl| pl.loc.y).collect();
    for pl in pinlocs.iter() {
        if let Some(pin) = pl.pin {
            log::trace!(target: "steiner", " {} ({} {})", block.pin_name(pin), pl.loc.x, pl.loc.y);
        }
    }
    let tree = builder.make_steiner_tree(Some(net_key), &x, &y, drvr_idx);
    Some(SteinerTree::from_flute(Some(drvr), drvr_loc, pinlocs, tree))
}

/// Build a pinless [SteinerTree] from a driver location and sink locations.
/// Returns `None` if there are no sinks.
pub fn make_steiner_tree_from_locations(
    builder: &mut dyn SteinerBuilder,
    drvr_loc: Point,
    sinks: &[Point],
) -> Option<SteinerTree> {
    if sinks.is_empty() {
        return None;
    }
    let mut pinlocs: Vec<PinLoc> =
        sinks.iter().map(|loc| PinLoc { pin: None, loc: *loc }).collect();
    sort_pinlocs(&mut pinlocs);
    // Driver goes last
    let drvr_idx = pinlocs.len();
    pinlocs.push(PinLoc {
        pin: None,
        loc: drvr_loc,
    });
    let x: Vec<Int> = pinlocs.iter().map(|pl| pl.loc.x).collect();
    let y: Vec<Int> = pinlocs.iter().map(|pl| pl.loc.y).collect();
    let tree = builder.make_steiner_tree(None, &x, &y, drvr_idx);
    Some(SteinerTree::from_flute(None, drvr_loc, pinlocs, tree))
}

/// # Steiner Tree Renderer
///
/// Display hook for highlighting a tree. `None` clears any highlight.
pub trait SteinerRenderer {
    fn highlight(&mut self, tree: Option<&SteinerTree>);
}
