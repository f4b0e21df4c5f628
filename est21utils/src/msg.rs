//!
//! # Numbered Diagnostic Messages
//!
//! Warnings and errors reported to users carry a tool prefix and a stable numeric id,
//! e.g. `[WARNING EST-0026] Missing route to pin u1/A.`,
//! so that scripts and regressions can match on them.
//! Messages are emitted through the [log] facade.
//!

/// Reporting tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Parasitics estimation
    Est,
}
impl Tool {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Est => "EST",
        }
    }
}

/// # Message Id
///
/// A (tool, number) pair. Numbers are stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MsgId(pub Tool, pub u32);
impl std::fmt::Display for MsgId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}-{:04}", self.0.prefix(), self.1)
    }
}

/// Format a warning with its numbered prefix
pub fn warning_text(id: MsgId, msg: &str) -> String {
    format!("[WARNING {}] {}", id, msg)
}
/// Format an error with its numbered prefix
pub fn error_text(id: MsgId, msg: &str) -> String {
    format!("[ERROR {}] {}", id, msg)
}

/// Emit a numbered warning through [log::warn].
///
/// ```rust
/// use est21utils::{warn_msg, Tool};
/// warn_msg!(Tool::Est, 26, "Missing route to pin {}.", "u1/A");
/// ```
#[macro_export]
macro_rules! warn_msg {
    ($tool:expr, $id:expr, $($arg:tt)+) => {
        $crate::log::warn!(
            "{}",
            $crate::msg::warning_text($crate::msg::MsgId($tool, $id), &format!($($arg)+))
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting() {
        assert_eq!(MsgId(Tool::Est, 26).to_string(), "EST-0026");
        assert_eq!(
            warning_text(MsgId(Tool::Est, 4), "Steiner renderer already initialized."),
            "[WARNING EST-0004] Steiner renderer already initialized."
        );
        assert_eq!(error_text(MsgId(Tool::Est, 165), "x"), "[ERROR EST-0165] x");
    }
}
