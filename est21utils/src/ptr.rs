//!
//! # Shared-Pointer Types
//!

// Std-lib
use std::cell::{BorrowError, BorrowMutError, Ref, RefCell, RefMut};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

// Crates.io
use by_address::ByAddress;

///
/// # Ptr
///
/// Shared, reference-counted pointer to state which more than one party mutates,
/// e.g. the dirty-net set written by database callbacks and drained by the estimator.
///
/// Estimation runs on a single control thread, so [Ptr] wraps an [Rc]<[RefCell]>
/// rather than any kind of lock. Access is checked at run-time:
/// `read` and `write` return an error rather than panicking
/// when a conflicting borrow is outstanding, so callers can use the question-mark operator:
///
/// ```text
/// let state = ptr.read()?;
/// state.some_function();
/// ```
///
/// Guards generally need a dedicated `let` binding,
/// lest they be dropped mid-expression:
/// ```text
/// let t = &ptr.read()?.field;  // Fails, guard dropped immediately
/// ```
///
/// [Ptr] compares and hashes *by address* via [ByAddress],
/// so two pointers are equal only if they share the same allocation.
///
#[derive(Debug, Default)]
pub struct Ptr<T>(ByAddress<Rc<RefCell<T>>>);

impl<T> Ptr<T> {
    /// Pointer Constructor
    pub fn new(i: T) -> Self {
        Self(ByAddress(Rc::new(RefCell::new(i))))
    }
    /// Borrow the pointee immutably
    pub fn read(&self) -> Result<Ref<'_, T>, BorrowError> {
        self.0.try_borrow()
    }
    /// Borrow the pointee mutably
    pub fn write(&self) -> Result<RefMut<'_, T>, BorrowMutError> {
        self.0.try_borrow_mut()
    }
    /// Number of [Ptr]s sharing our pointee
    pub fn count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}
impl<T> From<T> for Ptr<T> {
    fn from(t: T) -> Self {
        Self::new(t)
    }
}
// Derived implementations would demand `T: Clone` and friends; pointer identity is all we need.
impl<T> Clone for Ptr<T> {
    fn clone(&self) -> Self {
        Self(ByAddress::clone(&self.0))
    }
}
impl<T> PartialEq for Ptr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}
impl<T> Eq for Ptr<T> {}
impl<T> Hash for Ptr<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}
