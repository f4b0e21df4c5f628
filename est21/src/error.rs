//!
//! # Estimation Result and Error Types
//!

// Local Imports
use crate::design::{DesignError, NetKey, PinKey};
use crate::utils::{self, error_text, ErrorContext, MsgId, Tool};

/// # [EstError] Result Type
pub type EstResult<T> = Result<T, EstError>;

///
/// # Estimation Error Enumeration
///
/// Variants with a numeric [EstError::code] are the fatal conditions reported to users,
/// formatted as `[ERROR EST-0162] ...`.
///
pub enum EstError {
    /// No loaded design
    NoDesign,
    /// Loaded design has no block
    NoBlock,
    /// Incremental mode enabled while nets are already pending re-estimation
    InconsistentState,
    /// Parasitics source changed while incremental mode is enabled
    SourceLocked,
    /// Batch update requested with incremental mode disabled
    NotIncremental,
    /// Pin with no placed location, where its layer is required
    UnplacedPin { pin: PinKey, name: String },
    /// Conductive loop found in a parasitic network
    Loop { net: NetKey, name: String },
    /// Errors from the design database
    Design(DesignError),
    /// Error with a message and the context stack in which it occurred
    Context {
        message: String,
        stack: Vec<ErrorContext>,
    },
    /// Conflicting borrow of shared estimator state
    PtrBorrow,
    /// Boxed External Errors
    Boxed(Box<dyn std::error::Error + Send + Sync>),
    /// Uncategorized Error, with String Message
    Str(String),
}
impl EstError {
    /// Create a [EstError::Str] from anything String-convertible
    pub fn msg(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }
    /// Create an error-variant [Result] of our [EstError::Str] variant
    /// from anything String-convertible
    pub fn fail<T>(s: impl Into<String>) -> Result<T, Self> {
        Err(Self::msg(s))
    }
    /// Numeric message code, for the user-facing fatal conditions
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::NoDesign => Some(162),
            Self::NoBlock => Some(163),
            Self::InconsistentState => Some(104),
            Self::SourceLocked => Some(108),
            Self::NotIncremental => Some(109),
            Self::UnplacedPin { .. } => Some(164),
            Self::Loop { .. } => Some(165),
            _ => None,
        }
    }
    /// User-facing message text
    fn text(&self) -> String {
        match self {
            Self::NoDesign => "Database does not have a loaded design".into(),
            Self::NoBlock => "Database has no block".into(),
            Self::InconsistentState => "inconsistent parasitics state".into(),
            Self::SourceLocked => {
                "cannot change parasitics source while incremental parasitics enabled".into()
            }
            Self::NotIncremental => {
                "update_parasitics() called with incremental parasitics disabled".into()
            }
            Self::UnplacedPin { name, .. } => format!("Pin {} has no placed iterm or bterm.", name),
            Self::Loop { name, .. } => format!("Loop found in parasitic network of net {}", name),
            _ => String::new(),
        }
    }
}
impl std::fmt::Debug for EstError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if let Some(code) = self.code() {
            return write!(f, "{}", error_text(MsgId(Tool::Est, code), &self.text()));
        }
        match self {
            EstError::Design(err) => err.fmt(f),
            EstError::Context { message, stack } => {
                write!(f, "Estimation Error: \n - {} \n - {:?}", message, stack)
            }
            EstError::PtrBorrow => write!(f, "Conflicting borrow of estimator state"),
            EstError::Boxed(err) => err.fmt(f),
            EstError::Str(err) => err.fmt(f),
            _ => write!(f, "{}", self.text()),
        }
    }
}
impl std::fmt::Display for EstError {
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for EstError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Boxed(e) => Some(&**e),
            Self::Design(e) => Some(e),
            _ => None,
        }
    }
}
impl From<DesignError> for EstError {
    fn from(e: DesignError) -> Self {
        Self::Design(e)
    }
}
impl From<String> for EstError {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<&str> for EstError {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<utils::ser::Error> for EstError {
    fn from(e: utils::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<std::io::Error> for EstError {
    fn from(e: std::io::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<std::cell::BorrowError> for EstError {
    fn from(_e: std::cell::BorrowError) -> Self {
        Self::PtrBorrow
    }
}
impl From<std::cell::BorrowMutError> for EstError {
    fn from(_e: std::cell::BorrowMutError) -> Self {
        Self::PtrBorrow
    }
}
