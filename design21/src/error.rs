//!
//! # Design Result and Error Types
//!

// Local Imports
use crate::utils::{self, ErrorContext};

/// # [DesignError] Result Type
pub type DesignResult<T> = Result<T, DesignError>;

///
/// # Design Error Enumeration
///
pub enum DesignError {
    /// Reference to an object which is not (or no longer) in the database
    Stale {
        message: String,
        stack: Vec<ErrorContext>,
    },
    /// A second owner attempted to register for block callbacks
    CallbackOwned,
    /// Boxed External Errors
    Boxed(Box<dyn std::error::Error + Send + Sync>),
    /// Uncategorized Error, with String Message
    Str(String),
}
impl DesignError {
    /// Create a [DesignError::Str] from anything String-convertible
    pub fn msg(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }
    /// Create an error-variant [Result] of our [DesignError::Str] variant
    /// from anything String-convertible
    pub fn fail<T>(s: impl Into<String>) -> Result<T, Self> {
        Err(Self::msg(s))
    }
    /// Create a [DesignError::Stale] for a missing object
    pub fn stale(message: impl Into<String>) -> Self {
        Self::Stale {
            message: message.into(),
            stack: Vec::new(),
        }
    }
}
impl std::fmt::Debug for DesignError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DesignError::Stale { message, stack } => {
                write!(f, "Stale Reference: \n - {} \n - {:?}", message, stack)
            }
            DesignError::CallbackOwned => {
                write!(f, "Block callbacks already have an owner")
            }
            DesignError::Boxed(err) => err.fmt(f),
            DesignError::Str(err) => err.fmt(f),
        }
    }
}
impl std::fmt::Display for DesignError {
    /// Delegates to the [Debug] implementation
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}
impl std::error::Error for DesignError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Boxed(e) => Some(&**e),
            _ => None,
        }
    }
}
impl From<String> for DesignError {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}
impl From<&str> for DesignError {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}
impl From<utils::ser::Error> for DesignError {
    fn from(e: utils::ser::Error) -> Self {
        Self::Boxed(Box::new(e))
    }
}
impl From<std::num::TryFromIntError> for DesignError {
    fn from(e: std::num::TryFromIntError) -> Self {
        Self::Boxed(Box::new(e))
    }
}
