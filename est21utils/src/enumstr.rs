//!
//! # Enum-String Mapping Module
//!
//! Defines the [enumstr] macro and paired [EnumStr] trait,
//! mapping fieldless enums to and from the keyword strings
//! used by design databases and configuration files,
//! e.g. master types (`PAD_INPUT`), layer types (`CUT`) and parasitics sources (`placement`).
//!
//! Example:
//!
//! ```rs
//! use est21utils::enumstr;
//!
//! enumstr!(
//! /// # Net Signal Types
//! SigType {
//!     Signal: "SIGNAL",
//!     Clock: "CLOCK",
//!  }
//! );
//! ```
//!

///
/// # String-Enumeration Trait
///
/// * `to_str(&self) -> &'static str` converts the enum to its keyword.
/// * `from_str(&str) -> Option<Self>` does the opposite.
/// * `all()` lists every variant, in declaration order.
///
pub trait EnumStr: Sized + Copy + 'static {
    fn to_str(&self) -> &'static str;
    fn from_str(txt: &str) -> Option<Self>;
    fn all() -> &'static [Self];
    /// Case-insensitive variant of `from_str`
    fn from_str_nocase(txt: &str) -> Option<Self> {
        Self::all()
            .iter()
            .find(|v| v.to_str().eq_ignore_ascii_case(txt))
            .copied()
    }
}

///
/// # Enum-String Pairing Macro
///
/// Creates an `enum` whose variants are fieldless, each paired with a keyword,
/// and implements [EnumStr] and [std::fmt::Display] (writing the keyword).
/// Derives the common traits, including `serde::{Serialize,Deserialize}`,
/// which must therefore be in scope at the invocation site.
///
#[macro_export]
macro_rules! enumstr {
    (   $(#[$meta: meta])*
        $enum_name: ident {
        $( $variant: ident : $strval: literal ),* $(,)?
    }) => {
        $(#[$meta])*
        #[allow(dead_code)]
        #[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
        pub enum $enum_name {
            $( #[doc=$strval]
                $variant ),*
        }
        impl EnumStr for $enum_name {
            fn to_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $strval),*,
                }
            }
            fn from_str(txt: &str) -> Option<Self> {
                match txt {
                    $( $strval => Some(Self::$variant)),*,
                    _ => None,
                }
            }
            fn all() -> &'static [Self] {
                &[ $( Self::$variant ),* ]
            }
        }
        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", self.to_str())
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    enumstr!(
        /// # Net Signal Types
        SigType {
            Signal: "SIGNAL",
            Clock: "CLOCK",
            Power: "POWER",
        }
    );

    #[test]
    fn test_enumstr() {
        assert_eq!(SigType::Clock.to_str(), "CLOCK");
        assert_eq!(SigType::from_str("POWER"), Some(SigType::Power));
        assert_eq!(SigType::from_str("power"), None);
        assert_eq!(SigType::from_str_nocase("power"), Some(SigType::Power));
        assert_eq!(SigType::all().len(), 3);
        assert_eq!(format!("{}", SigType::Signal), "SIGNAL");
    }
}
