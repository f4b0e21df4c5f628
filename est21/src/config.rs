//!
//! # RC Configuration Files
//!
//! Corners, wire RC, and tree layers in one serializable document,
//! loadable from JSON, YAML, or TOML via [SerdeFile]:
//!
//! ```yaml
//! corners:
//!   - name: slow
//!     signal: { h_res: 200.0, h_cap: 2.0e-16, v_res: 200.0, v_cap: 2.0e-16 }
//!     layers:
//!       - { layer: met2, res: 180.0, cap: 1.8e-16 }
//! signal_layers: [met2]
//! ```
//!

// Crates.io
use derive_builder::Builder;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Local imports
use crate::design::{Tech, TechLayer};
use crate::utils::{ContextStack, ErrorContext, ErrorHelper, SerdeFile};
use crate::{DirRc, EstError, EstResult, Estimator, WireClass};

/// # Per-Layer RC Entry
///
/// Routing layers take ohm/m and F/m. Cut layers take ohms per cut, and ignore `cap`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LayerRc {
    pub layer: String,
    pub res: f64,
    #[serde(default)]
    pub cap: f64,
}

/// # Corner RC
#[derive(Debug, Clone, Default, Builder, PartialEq, Serialize, Deserialize, JsonSchema)]
#[builder(pattern = "owned", setter(into))]
pub struct CornerRc {
    pub name: String,
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<DirRc>,
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock: Option<DirRc>,
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<LayerRc>,
}

///
/// # RC Configuration
///
/// Applying a configuration replaces the estimator's corners,
/// and with them all prior RC settings and parasitics.
///
#[derive(Debug, Clone, Default, Builder, PartialEq, Serialize, Deserialize, JsonSchema)]
#[builder(pattern = "owned", setter(into))]
pub struct RcConfig {
    pub corners: Vec<CornerRc>,
    /// Layer names for signal Steiner trees
    #[builder(default)]
    #[serde(default)]
    pub signal_layers: Vec<String>,
    /// Layer names for clock Steiner trees
    #[builder(default)]
    #[serde(default)]
    pub clock_layers: Vec<String>,
    /// Corner name for pin-to-pin resistance queries. Defaults to the first.
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worst_corner: Option<String>,
    #[builder(default = "true")]
    #[serde(default = "default_keep_networks")]
    pub keep_networks: bool,
}
fn default_keep_networks() -> bool {
    true
}
impl SerdeFile for RcConfig {}

impl RcConfig {
    /// Configure `est` for designs in `tech`
    pub fn apply(&self, est: &mut Estimator, tech: &Tech) -> EstResult<()> {
        ConfigApplier::new(tech).apply(self, est)
    }
}

/// Resolves layer and corner names, reporting failures with the entry being applied
struct ConfigApplier<'t> {
    tech: &'t Tech,
    ctx: ContextStack,
}
impl<'t> ConfigApplier<'t> {
    fn new(tech: &'t Tech) -> Self {
        let mut ctx = ContextStack::new();
        ctx.push(ErrorContext::Config);
        Self { tech, ctx }
    }
    fn apply(&mut self, cfg: &RcConfig, est: &mut Estimator) -> EstResult<()> {
        let names: Vec<&str> = cfg.corners.iter().map(|c| c.name.as_str()).collect();
        est.set_corners(&names)?;

        for (idx, corner) in cfg.corners.iter().enumerate() {
            self.ctx.push(ErrorContext::Corner(corner.name.clone()));
            if let Some(rc) = corner.signal {
                set_dir_rc(est, WireClass::Signal, idx, rc);
            }
            if let Some(rc) = corner.clock {
                set_dir_rc(est, WireClass::Clock, idx, rc);
            }
            for entry in corner.layers.iter() {
                self.ctx.push(ErrorContext::Layer(entry.layer.clone()));
                let tech = self.tech;
                let msg = format!("Unknown layer {}", entry.layer);
                let layer = self.unwrap(tech.layer_named(&entry.layer), msg)?;
                est.set_layer_rc(layer, idx, entry.res, entry.cap);
                self.ctx.pop();
            }
            self.ctx.pop();
        }
        for name in cfg.signal_layers.iter() {
            let layer = self.routing_layer(name)?;
            est.add_signal_layer(layer);
        }
        for name in cfg.clock_layers.iter() {
            let layer = self.routing_layer(name)?;
            est.add_clk_layer(layer);
        }
        if let Some(name) = &cfg.worst_corner {
            let idx = self.unwrap(
                cfg.corners.iter().position(|c| &c.name == name),
                format!("Unknown corner {}", name),
            )?;
            est.set_worst_corner(idx)?;
        }
        est.set_keep_networks(cfg.keep_networks);
        Ok(())
    }
    fn routing_layer(&self, name: &str) -> EstResult<&'t TechLayer> {
        let tech = self.tech;
        let layer = self.unwrap(tech.layer_named(name), format!("Unknown layer {}", name))?;
        self.assert(layer.is_routing(), format!("Layer {} is not a routing layer", name))?;
        Ok(layer)
    }
}
impl ErrorHelper for ConfigApplier<'_> {
    type Error = EstError;
    fn err(&self, msg: impl Into<String>) -> EstError {
        EstError::Context {
            message: msg.into(),
            stack: self.ctx.snapshot(),
        }
    }
}

fn set_dir_rc(est: &mut Estimator, class: WireClass, corner: usize, rc: DirRc) {
    let wire_rc = est.wire_rc_mut();
    wire_rc.set_h_wire_rc(class, corner, rc.h_res, rc.h_cap);
    wire_rc.set_v_wire_rc(class, corner, rc.v_res, rc.v_cap);
}
