use crate::runtime::task::Task;
use crate::sendable::Sendable;

use std::mem;
use std::sync::Arc;
use std::task::{RawWaker, RawWakerVTable, Waker};

/// Returns the `RawWakerVTable` for a task of type `T`.
///
/// # Safety
///
/// All functions in the vtable must uphold the invariants required
/// by [`RawWaker`], in particular:
/// - reference counts must be correctly managed,
/// - the task must remain valid for the lifetime of the waker.
fn vtable<T: Sendable>() -> &'static RawWakerVTable {
    &RawWakerVTable::new(
        clone_raw::<T>,
        wake_raw::<T>,
        wake_by_ref_raw::<T>,
        drop_raw::<T>,
    )
}

/// Creates the resumption callback of a task.
///
/// Waking the returned waker resumes the task: a suspended task goes back to
/// its run-queue band, a running one is flagged to be re-queued. The pointer
/// stored inside the `RawWaker` originates from `Arc::into_raw`.
pub(crate) fn make_waker<T: Sendable>(task: Arc<Task<T>>) -> Waker {
    unsafe {
        Waker::from_raw(RawWaker::new(
            Arc::into_raw(task) as *const (),
            vtable::<T>(),
        ))
    }
}

fn clone_raw<T: Sendable>(ptr: *const ()) -> RawWaker {
    let arc = unsafe { Arc::<Task<T>>::from_raw(ptr as *const Task<T>) };
    let cloned = arc.clone();
    mem::forget(arc);

    RawWaker::new(Arc::into_raw(cloned) as *const (), vtable::<T>())
}

/// Consumes the waker and resumes the task.
fn wake_raw<T: Sendable>(ptr: *const ()) {
    let arc = unsafe { Arc::<Task<T>>::from_raw(ptr as *const Task<T>) };
    arc.resume();
}

/// Resumes the task, keeping the waker's own reference alive.
fn wake_by_ref_raw<T: Sendable>(ptr: *const ()) {
    let arc = unsafe { Arc::<Task<T>>::from_raw(ptr as *const Task<T>) };
    arc.clone().resume();
    mem::forget(arc);
}

fn drop_raw<T: Sendable>(ptr: *const ()) {
    unsafe { Arc::<Task<T>>::from_raw(ptr as *const Task<T>) };
}
