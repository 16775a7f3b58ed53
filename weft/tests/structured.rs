use weft::error::TaskError;
use weft::task::{self, TaskState};
use weft::{RuntimeBuilder, yield_now};

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[test]
fn parent_reports_after_its_children() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let child_done = Arc::new(AtomicBool::new(false));
    let (flag, probe) = (child_done.clone(), child_done.clone());

    let seen_when_parent_finished = rt.block_on(async move {
        let parent = task::spawn(async move {
            // Handle dropped right away: the child is still structured.
            let _ = task::spawn(async move {
                for _ in 0..20 {
                    yield_now().await;
                }
                flag.store(true, Ordering::SeqCst);
                Ok(())
            });
            Ok(())
        });

        parent.await.unwrap();
        probe.load(Ordering::SeqCst)
    });

    assert!(seen_when_parent_finished);
}

#[test]
fn block_on_waits_for_structured_children() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let child_done = Arc::new(AtomicBool::new(false));
    let flag = child_done.clone();

    rt.block_on(async move {
        let _ = task::spawn(async move {
            for _ in 0..20 {
                yield_now().await;
            }
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
    });

    assert!(child_done.load(Ordering::SeqCst));
}

#[test]
fn failing_body_cancels_its_subtree() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let observed = Arc::new(AtomicUsize::new(0));
    let observed_in = observed.clone();

    let outcome = rt.block_on(async move {
        let parent = task::spawn(async move {
            for _ in 0..2 {
                let observed = observed_in.clone();
                let _ = task::spawn(async move {
                    while !task::is_cancelled() {
                        yield_now().await;
                    }
                    observed.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(TaskError::Cancelled)
                });
            }

            yield_now().await;
            Err::<(), _>(TaskError::failed(io::Error::other("parent gave up")))
        });

        parent.await
    });

    assert_eq!(outcome.unwrap_err().to_string(), "task failed: parent gave up");
    assert_eq!(observed.load(Ordering::SeqCst), 2);
}

#[test]
fn panicking_body_is_reported_as_failed() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    rt.block_on(async {
        let handle = task::spawn(async {
            if task::current_id().is_some() {
                panic!("kaboom");
            }
            Ok(0u8)
        });

        while !handle.is_finished() {
            yield_now().await;
        }

        assert_eq!(handle.state(), TaskState::Failed);
        match handle.await {
            Err(TaskError::Panicked(message)) => assert_eq!(message, "kaboom"),
            other => panic!("unexpected outcome {other:?}"),
        }
    });
}
