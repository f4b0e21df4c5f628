//!
//! # Cell Masters
//!

// Crates.io
use serde::{Deserialize, Serialize};

// Local imports
use crate::utils::{enumstr, EnumStr};
use crate::Point;

enumstr!(
    /// # Master Types
    ///
    /// The LEF macro classes and sub-types, flattened.
    MasterType {
        Core: "CORE",
        CoreAntennaCell: "CORE_ANTENNACELL",
        CoreFeedthru: "CORE_FEEDTHRU",
        CoreTieHigh: "CORE_TIEHIGH",
        CoreTieLow: "CORE_TIELOW",
        CoreSpacer: "CORE_SPACER",
        CoreWelltap: "CORE_WELLTAP",
        Block: "BLOCK",
        BlockBlackbox: "BLOCK_BLACKBOX",
        BlockSoft: "BLOCK_SOFT",
        Endcap: "ENDCAP",
        EndcapPre: "ENDCAP_PRE",
        EndcapPost: "ENDCAP_POST",
        EndcapTopLeft: "ENDCAP_TOPLEFT",
        EndcapTopRight: "ENDCAP_TOPRIGHT",
        EndcapBottomLeft: "ENDCAP_BOTTOMLEFT",
        EndcapBottomRight: "ENDCAP_BOTTOMRIGHT",
        EndcapLef58BottomEdge: "ENDCAP_LEF58_BOTTOMEDGE",
        EndcapLef58TopEdge: "ENDCAP_LEF58_TOPEDGE",
        EndcapLef58RightEdge: "ENDCAP_LEF58_RIGHTEDGE",
        EndcapLef58LeftEdge: "ENDCAP_LEF58_LEFTEDGE",
        EndcapLef58RightBottomEdge: "ENDCAP_LEF58_RIGHTBOTTOMEDGE",
        EndcapLef58LeftBottomEdge: "ENDCAP_LEF58_LEFTBOTTOMEDGE",
        EndcapLef58RightTopEdge: "ENDCAP_LEF58_RIGHTTOPEDGE",
        EndcapLef58LeftTopEdge: "ENDCAP_LEF58_LEFTTOPEDGE",
        EndcapLef58RightBottomCorner: "ENDCAP_LEF58_RIGHTBOTTOMCORNER",
        EndcapLef58LeftBottomCorner: "ENDCAP_LEF58_LEFTBOTTOMCORNER",
        EndcapLef58RightTopCorner: "ENDCAP_LEF58_RIGHTTOPCORNER",
        EndcapLef58LeftTopCorner: "ENDCAP_LEF58_LEFTTOPCORNER",
        Cover: "COVER",
        CoverBump: "COVER_BUMP",
        Ring: "RING",
        Pad: "PAD",
        PadAreaIo: "PAD_AREAIO",
        PadInput: "PAD_INPUT",
        PadOutput: "PAD_OUTPUT",
        PadInout: "PAD_INOUT",
        PadPower: "PAD_POWER",
        PadSpacer: "PAD_SPACER",
    }
);
impl MasterType {
    /// Boolean indication of whether this is an I/O pad or bump type.
    /// Matched exhaustively, so that new types must be classified here.
    pub fn is_pad(&self) -> bool {
        use MasterType::*;
        match self {
            Core | CoreAntennaCell | CoreFeedthru | CoreTieHigh | CoreTieLow | CoreSpacer
            | CoreWelltap | Block | BlockBlackbox | BlockSoft | Endcap | EndcapPre
            | EndcapPost | EndcapTopLeft | EndcapTopRight | EndcapBottomLeft
            | EndcapBottomRight | EndcapLef58BottomEdge | EndcapLef58TopEdge
            | EndcapLef58RightEdge | EndcapLef58LeftEdge | EndcapLef58RightBottomEdge
            | EndcapLef58LeftBottomEdge | EndcapLef58RightTopEdge | EndcapLef58LeftTopEdge
            | EndcapLef58RightBottomCorner | EndcapLef58LeftBottomCorner
            | EndcapLef58RightTopCorner | EndcapLef58LeftTopCorner | Cover | Ring => false,
            CoverBump | Pad | PadAreaIo | PadInput | PadOutput | PadInout | PadPower
            | PadSpacer => true,
        }
    }
}
impl Default for MasterType {
    fn default() -> Self {
        Self::Core
    }
}

enumstr!(
    /// # Pin Directions
    PinDirection {
        Input: "INPUT",
        Output: "OUTPUT",
        Inout: "INOUT",
        Feedthru: "FEEDTHRU",
    }
);

/// # Master Terminal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MTerm {
    pub name: String,
    pub direction: PinDirection,
    /// Numbers of the layers carrying pin geometry
    pub layers: Vec<usize>,
    /// Pin access location, relative to the instance origin
    pub offset: Point,
}
impl MTerm {
    /// Create a new [MTerm]
    pub fn new(
        name: impl Into<String>,
        direction: PinDirection,
        layer: usize,
        offset: Point,
    ) -> Self {
        Self {
            name: name.into(),
            direction,
            layers: vec![layer],
            offset,
        }
    }
}

/// # Cell Master
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Master {
    pub name: String,
    pub master_type: MasterType,
    pub mterms: Vec<MTerm>,
}
impl Master {
    /// Create a new [Master] with no terminals
    pub fn new(name: impl Into<String>, master_type: MasterType) -> Self {
        Self {
            name: name.into(),
            master_type,
            mterms: Vec::new(),
        }
    }
    /// Add a terminal, builder-style
    pub fn mterm(mut self, mterm: MTerm) -> Self {
        self.mterms.push(mterm);
        self
    }
    /// Find the index of the terminal named `name`
    pub fn mterm_index(&self, name: &str) -> Option<usize> {
        self.mterms.iter().position(|m| m.name == name)
    }
}
