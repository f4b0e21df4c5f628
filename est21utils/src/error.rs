//!
//! # est21 Error-Helper Utilities
//!
//! ```rust
//! use est21utils::error::{ErrorHelper, Unwrapper};
//!
//! /// Example implementer of [`ErrorHelper`], which reports the net it is working on.
//! struct NetWalker {
//!     net: String,
//! }
//! impl ErrorHelper for NetWalker {
//!     type Error = String;
//!
//!     fn err(&self, msg: impl Into<String>) -> Self::Error {
//!         format!("Net {}: {}", self.net, msg.into())
//!     }
//! }
//! impl NetWalker {
//!     fn walk(&self) -> Result<i32, String> {
//!         let drvr = Some(5).unwrapper(self, "no driver")?;
//!         self.assert(drvr > 0, "driver index must be positive")?;
//!         Ok(drvr)
//!     }
//! }
//! assert_eq!(NetWalker { net: "clk".into() }.walk(), Ok(5));
//! ```
//!

///
/// # ErrorHelper
///
/// Helper trait for the estimation tree-walkers.
/// Each implementer generally carries some context worth reporting upon failure,
/// e.g. the net and corner being built, which it injects in the required `err` method.
/// Remaining methods are default-implemented in terms of `err`.
///
pub trait ErrorHelper {
    type Error;

    /// Create and return a [Self::Error] value.
    fn err(&self, msg: impl Into<String>) -> Self::Error;
    /// Return failure
    fn fail<T>(&self, msg: impl Into<String>) -> Result<T, Self::Error> {
        Err(self.err(msg))
    }
    /// Unwrap the [Option] `opt` if it is [Some], and return our error if not.
    fn unwrap<T>(&self, opt: Option<T>, msg: impl Into<String>) -> Result<T, Self::Error> {
        match opt {
            Some(val) => Ok(val),
            None => self.fail(msg),
        }
    }
    /// Unwrap the [Result] `res`, replacing any error with our own.
    fn ok<T, E>(&self, res: Result<T, E>, msg: impl Into<String>) -> Result<T, Self::Error> {
        match res {
            Ok(val) => Ok(val),
            Err(_) => self.fail(msg),
        }
    }
    /// Assert a boolean condition. Returns through `self.fail` if it is not satisfied.
    fn assert(&self, b: bool, msg: impl Into<String>) -> Result<(), Self::Error> {
        match b {
            true => Ok(()),
            false => self.fail(msg),
        }
    }
}

///
/// # Unwrapper
///
/// Post-fix application of an [`ErrorHelper`] to [`Option`]s and [`Result`]s:
///
/// ```rust
/// use est21utils::error::{ErrorHelper, Unwrapper};
///
/// fn first_layer(h: &impl ErrorHelper<Error = String>, layers: &[u32]) -> Result<u32, String> {
///     layers.first().copied().unwrapper(h, "no layers")
/// }
/// ```
///
/// Not intended for implementation by new types;
/// import it and use it on the standard library types.
///
pub trait Unwrapper {
    type Ok;
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<Self::Ok, H::Error>
    where
        H: ErrorHelper;
}

impl<T> Unwrapper for Option<T> {
    type Ok = T;
    fn unwrapper<H>(self, helper: &H, msg: impl Into<String>) -> Result<Self::Ok, H::Error>
    where
        H: ErrorHelper,
    {
        helper.unwrap(self, msg)
    }
}

impl<T, E> Unwrapper for Result<T, E> {
    type Ok = T;
    fn unwrapper<H>(
        self,
        helper: &H,
        msg: impl Into<String>,
    ) -> Result<<Self as Unwrapper>::Ok, H::Error>
    where
        H: ErrorHelper,
    {
        helper.ok(self, msg)
    }
}
