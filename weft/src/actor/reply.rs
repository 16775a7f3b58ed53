use crate::error::ActorError;

use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

/// One-shot slot the handler's reply is written to.
struct ReplySlot<R> {
    state: Mutex<ReplyState<R>>,
}

struct ReplyState<R> {
    outcome: Option<Result<R, ActorError>>,
    waker: Option<Waker>,
}

/// Creates a connected sender/call pair.
pub(crate) fn channel<R>() -> (ReplySender<R>, ActorCall<R>) {
    let slot = Arc::new(ReplySlot {
        state: Mutex::new(ReplyState {
            outcome: None,
            waker: None,
        }),
    });

    (
        ReplySender {
            slot: Some(slot.clone()),
        },
        ActorCall {
            inner: Inner::Waiting(slot),
        },
    )
}

/// Writing half, moved into the mailbox job.
///
/// Dropping it without sending delivers [`ActorError::Dropped`].
pub(crate) struct ReplySender<R> {
    slot: Option<Arc<ReplySlot<R>>>,
}

impl<R> ReplySender<R> {
    pub(crate) fn send(mut self, outcome: Result<R, ActorError>) {
        if let Some(slot) = self.slot.take() {
            slot.fulfil(outcome);
        }
    }
}

impl<R> Drop for ReplySender<R> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            slot.fulfil(Err(ActorError::Dropped));
        }
    }
}

impl<R> ReplySlot<R> {
    fn fulfil(&self, outcome: Result<R, ActorError>) {
        let waker = {
            let mut state = self.state.lock();
            state.outcome = Some(outcome);
            state.waker.take()
        };

        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// The pending reply of an [`Actor::call`](super::Actor::call).
///
/// The message is already in the actor's mailbox when this value is
/// returned; awaiting it only waits for the reply. Dropping it does not
/// withdraw the message.
#[must_use = "the reply of an actor call is lost unless it is awaited"]
pub struct ActorCall<R> {
    inner: Inner<R>,
}

enum Inner<R> {
    Waiting(Arc<ReplySlot<R>>),
    Rejected(Option<ActorError>),
}

impl<R> ActorCall<R> {
    /// A call that failed before reaching the mailbox.
    pub(crate) fn rejected(error: ActorError) -> Self {
        Self {
            inner: Inner::Rejected(Some(error)),
        }
    }
}

impl<R> Future for ActorCall<R> {
    type Output = Result<R, ActorError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // `ActorCall` holds no self-references.
        let this = self.get_mut();

        match &mut this.inner {
            Inner::Rejected(error) => Poll::Ready(Err(error
                .take()
                .expect("actor call polled after completion"))),
            Inner::Waiting(slot) => {
                let mut state = slot.state.lock();

                match state.outcome.take() {
                    Some(outcome) => Poll::Ready(outcome),
                    None => {
                        state.waker = Some(cx.waker().clone());
                        Poll::Pending
                    }
                }
            }
        }
    }
}

impl<R> fmt::Debug for ActorCall<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = match &self.inner {
            Inner::Waiting(slot) => slot.state.lock().outcome.is_none(),
            Inner::Rejected(_) => false,
        };

        f.debug_struct("ActorCall").field("pending", &pending).finish()
    }
}
