mod common;

use weft::error::TaskError;
use weft::task::{self, TaskHandle, TaskState};
use weft::{RuntimeBuilder, yield_now};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Spins until the current task is cancelled, counting the observation.
async fn run_until_cancelled(observed: Arc<AtomicUsize>) -> Result<(), TaskError> {
    loop {
        if task::is_cancelled() {
            observed.fetch_add(1, Ordering::SeqCst);
            return Err(TaskError::Cancelled);
        }
        yield_now().await;
    }
}

#[test]
fn cancellation_reaches_every_descendant() {
    common::init_tracing();
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let observed = Arc::new(AtomicUsize::new(0));
    let observed_clone = observed.clone();

    let parent_outcome = rt.block_on(async move {
        let observed = observed_clone;

        let parent = task::spawn(async move {
            let children: Vec<_> = (0..3)
                .map(|_| {
                    let observed = observed.clone();
                    task::spawn(async move {
                        let grandchild = task::spawn(run_until_cancelled(observed.clone()));
                        run_until_cancelled(observed).await?;
                        grandchild.await
                    })
                })
                .collect();

            for child in children {
                child.await?;
            }
            Ok(())
        });

        for _ in 0..10 {
            yield_now().await;
        }

        task::cancel(&parent);
        assert!(parent.is_cancelled());

        parent.await
    });

    assert!(matches!(parent_outcome, Err(TaskError::Cancelled)));
    assert_eq!(observed.load(Ordering::SeqCst), 6);
}

#[test]
fn detached_task_survives_parent_cancellation() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    let (parent_outcome, detached_outcome) = rt.block_on(async {
        let slot: Arc<Mutex<Option<TaskHandle<u32>>>> = Arc::new(Mutex::new(None));
        let parent_slot = slot.clone();

        let parent = task::spawn(async move {
            let detached = task::spawn_detached(async {
                let mut steps = 0;
                while steps < 50 {
                    task::check_cancellation()?;
                    steps += 1;
                    yield_now().await;
                }
                Ok(steps)
            });

            *parent_slot.lock().unwrap() = Some(detached);

            loop {
                task::check_cancellation()?;
                yield_now().await;
            }
        });

        while slot.lock().unwrap().is_none() {
            yield_now().await;
        }

        parent.cancel();
        let parent_outcome: Result<(), TaskError> = parent.await;

        let detached = slot.lock().unwrap().take().unwrap();
        assert!(!detached.is_cancelled());

        (parent_outcome, detached.await)
    });

    assert!(matches!(parent_outcome, Err(TaskError::Cancelled)));
    assert_eq!(detached_outcome.unwrap(), 50);
}

#[test]
fn cancellation_is_cooperative_and_sticky() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    rt.block_on(async {
        let stubborn = task::spawn(async {
            while !task::is_cancelled() {
                yield_now().await;
            }

            // Keeps running after noticing, and the flag stays set.
            let late_child = task::spawn(async { Ok(task::is_cancelled()) });
            let child_saw_it = late_child.await?;

            yield_now().await;
            Ok((child_saw_it, task::is_cancelled()))
        });

        yield_now().await;
        stubborn.cancel();

        let (child_saw_it, still_cancelled) = stubborn.await.unwrap();
        assert!(child_saw_it, "a child attached after cancellation starts cancelled");
        assert!(still_cancelled);
    });
}

#[test]
fn check_cancellation_ends_the_task_cancelled() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    rt.block_on(async {
        let handle: TaskHandle<()> = task::spawn(async {
            loop {
                task::check_cancellation()?;
                yield_now().await;
            }
        });

        yield_now().await;
        handle.cancel();

        while !handle.is_finished() {
            yield_now().await;
        }

        assert_eq!(handle.state(), TaskState::Cancelled);
        assert!(handle.await.unwrap_err().is_cancelled());
    });
}

#[test]
fn checks_outside_a_task_never_fail() {
    assert!(!task::is_cancelled());
    assert!(task::check_cancellation().is_ok());
}
