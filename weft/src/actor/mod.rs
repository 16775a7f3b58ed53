//! Actors: state that is only ever touched by one handler at a time.
//!
//! An [`Actor<S>`] owns a value of type `S` and a FIFO mailbox. The state is
//! never exposed directly: the only way to reach it is to hand the actor a
//! closure, with [`call`](Actor::call) when a reply is wanted or
//! [`send`](Actor::send) when it is not. Handlers run on the runtime's worker
//! threads, one after the other, in mailbox order.
//!
//! Handlers are synchronous. A handler that needs to wait for something
//! should return and let the caller await it, then issue a follow-up call.
//! Keeping the state consistent between two calls of the same logical
//! operation is the caller's business: other messages may be handled in
//! between.

mod cell;
mod reply;

pub use reply::ActorCall;

use self::cell::ActorCell;
use crate::error::{ActorError, panic_message};
use crate::runtime::context;
use crate::runtime::task::Priority;
use crate::sendable::Sendable;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u64);

impl ActorId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric value of the id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor-{}", self.0)
    }
}

/// A cloneable reference to an actor owning a value of type `S`.
///
/// All clones address the same mailbox. An `Actor<S>` can be moved into
/// tasks and other actors' handlers freely: it is [`Sendable`] whenever `S`
/// is `Send`.
///
/// # Examples
///
/// ```rust,ignore
/// let counter = Actor::new(0u64);
///
/// counter.send(|n| *n += 1);
/// let now = counter.call(|n| { *n += 1; *n }).await?;
/// assert_eq!(now, 2);
/// ```
pub struct Actor<S> {
    cell: Arc<ActorCell<S>>,
}

impl<S: Send + 'static> Actor<S> {
    /// Creates an actor owning `state`. Its mailbox is drained in the
    /// [`Normal`](Priority::Normal) band.
    ///
    /// Creating an actor does not require a runtime; handing it work does.
    pub fn new(state: S) -> Self {
        Self::with_priority(state, Priority::Normal)
    }

    /// Creates an actor whose mailbox is drained in the given priority band.
    pub fn with_priority(state: S, priority: Priority) -> Self {
        let cell = Arc::new(ActorCell::new(state, priority));

        tracing::trace!(actor = %cell.id, ?priority, "actor created");

        Self { cell }
    }

    /// Queues `handler` and returns a future resolving to its return value.
    ///
    /// The message enters the mailbox before this method returns, so calls
    /// made one after the other by the same caller are handled in that order
    /// even if their replies are awaited later, or never.
    ///
    /// The reply is an error if:
    /// - the handler panics ([`ActorError::HandlerPanicked`]); the actor
    ///   keeps handling its other messages,
    /// - the call is made from inside one of this actor's own handlers
    ///   ([`ActorError::Reentrant`]); operate on the `&mut S` already in
    ///   hand instead,
    /// - there is no runtime on the calling thread ([`ActorError::NoRuntime`]),
    /// - the runtime shut down before the message was handled
    ///   ([`ActorError::Dropped`]).
    pub fn call<F, R>(&self, handler: F) -> ActorCall<R>
    where
        F: FnOnce(&mut S) -> R + Sendable,
        R: Sendable,
    {
        if context::current_actor() == Some(self.cell.id) {
            tracing::warn!(actor = %self.cell.id, "reentrant actor call rejected");
            return ActorCall::rejected(ActorError::Reentrant);
        }

        let Some(scheduler) = context::current_scheduler() else {
            return ActorCall::rejected(ActorError::NoRuntime);
        };

        let (sender, call) = reply::channel();
        let id = self.cell.id;

        self.cell.enqueue(
            &scheduler,
            Box::new(move |state: &mut S| {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(state)))
                    .map_err(|payload| {
                        let message = panic_message(payload.as_ref());
                        tracing::debug!(actor = %id, %message, "actor handler panicked");
                        ActorError::HandlerPanicked(message)
                    });

                sender.send(outcome);
            }),
        );

        call
    }

    /// Queues `handler` without waiting for it.
    ///
    /// A panic inside the handler is logged and otherwise ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::NoRuntime`] outside of a runtime. Sending to the
    /// actor whose handler is currently running is allowed: the message is
    /// handled after the current one.
    pub fn send<F>(&self, handler: F) -> Result<(), ActorError>
    where
        F: FnOnce(&mut S) + Sendable,
    {
        let scheduler = context::current_scheduler().ok_or(ActorError::NoRuntime)?;
        let id = self.cell.id;

        self.cell.enqueue(
            &scheduler,
            Box::new(move |state: &mut S| {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(state))) {
                    tracing::error!(
                        actor = %id,
                        message = %panic_message(payload.as_ref()),
                        "actor handler panicked with nobody awaiting it"
                    );
                }
            }),
        );

        Ok(())
    }

    /// Number of messages waiting in the mailbox.
    ///
    /// The message currently being handled is not counted.
    pub fn pending(&self) -> usize {
        self.cell.pending()
    }
}

impl<S> Actor<S> {
    /// Returns the actor's identifier.
    pub fn id(&self) -> ActorId {
        self.cell.id
    }
}

impl<S> Clone for Actor<S> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<S> fmt::Debug for Actor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor").field("id", &self.cell.id).finish()
    }
}
