//! The sendability discipline.
//!
//! Every value that crosses a concurrency-domain boundary goes through a
//! [`Sendable`] bound: the future given to `spawn`, the value a task returns,
//! the closure handed to an actor and the reply it produces, and every child
//! added to a task group. A value qualifies when it is one of:
//!
//! - a plain value built only from sendable parts (`Send + 'static`),
//! - a reference whose mutable state is owned by an actor ([`Actor<S>`] is
//!   `Send + Sync` whenever `S: Send`),
//! - a value the author wrapped in [`UncheckedSendable`], taking responsibility.
//!
//! A violation is rejected at compile time, before anything is scheduled:
//!
//! ```compile_fail
//! use std::rc::Rc;
//!
//! let rt = weft::RuntimeBuilder::new().worker_threads(1).build().unwrap();
//! let shared = Rc::new(5);
//! rt.spawn(weft::task::Priority::Normal, async move { Ok(*shared) });
//! ```
//!
//! ```compile_fail
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let counter = weft::actor::Actor::new(0u32);
//! let local = Rc::new(RefCell::new(0u32));
//! let _ = counter.call(move |n| *local.borrow_mut() += *n);
//! ```
//!
//! ```compile_fail
//! fn needs_sendable<T: weft::sendable::Sendable>(_: T) {}
//! needs_sendable(std::rc::Rc::new(1));
//! ```
//!
//! [`Actor<S>`]: crate::actor::Actor

use std::fmt;
use std::ops::{Deref, DerefMut};

/// A value that may move across concurrency domains.
///
/// Implemented for every `Send + 'static` type; never implement it by hand.
/// Wrap a value in [`UncheckedSendable`] to opt out of the check.
pub trait Sendable: Send + 'static {}

impl<T: Send + 'static> Sendable for T {}

/// Compile-time assertion that `T` is [`Sendable`].
pub const fn assert_sendable<T: Sendable>() {}

/// An explicit, author-asserted override of the sendability check.
///
/// The wrapper is `Send` regardless of `T`. Only construct it when the wrapped
/// value is provably never observed from two domains at the same time.
pub struct UncheckedSendable<T> {
    value: T,
}

// Safety: the constructor is `unsafe`; the author guarantees exclusive access.
unsafe impl<T> Send for UncheckedSendable<T> {}

impl<T> UncheckedSendable<T> {
    /// Wraps `value`.
    ///
    /// # Safety
    ///
    /// The caller guarantees that no other domain can reach the state behind
    /// `value` while the wrapper (or anything taken out of it) is alive on
    /// the receiving side.
    pub unsafe fn new(value: T) -> Self {
        Self { value }
    }

    /// Returns the wrapped value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for UncheckedSendable<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> DerefMut for UncheckedSendable<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T> fmt::Debug for UncheckedSendable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UncheckedSendable").finish_non_exhaustive()
    }
}

const _: () = {
    assert_sendable::<crate::actor::Actor<Vec<u8>>>();
    assert_sendable::<UncheckedSendable<std::rc::Rc<u8>>>();
};
