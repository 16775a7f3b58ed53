mod common;

use weft::actor::Actor;
use weft::error::{ActorError, TaskError};
use weft::task::{self, TaskGroup};
use weft::{RuntimeBuilder, yield_now};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

#[test]
fn single_sender_calls_run_in_order() {
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();

    let log = rt.block_on(async {
        let actor = Actor::new(Vec::new());

        let calls: Vec<_> = (0..100).map(|i| actor.call(move |log| log.push(i))).collect();

        for call in calls {
            call.await.unwrap();
        }

        actor.call(|log| log.clone()).await.unwrap()
    });

    assert_eq!(log, (0..100).collect::<Vec<_>>());
}

#[test]
fn concurrent_increments_are_not_lost() {
    common::init_tracing();
    let rt = RuntimeBuilder::new().worker_threads(4).build().unwrap();

    let total = rt.block_on(async {
        let counter = Actor::new(0u64);
        let mut group = TaskGroup::new();

        for _ in 0..10 {
            let counter = counter.clone();
            group.add_task(async move {
                for _ in 0..100 {
                    counter.call(|n| *n += 1).await.map_err(TaskError::failed)?;
                }
                Ok(())
            });
        }

        group.await_all().await.unwrap();
        counter.call(|n| *n).await.unwrap()
    });

    assert_eq!(total, 1000);
}

#[test]
fn at_most_one_handler_runs_at_a_time() {
    let rt = RuntimeBuilder::new()
        .worker_threads(4)
        .actor_batch(3)
        .build()
        .unwrap();

    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let (running_in, peak_in) = (running.clone(), peak.clone());

    rt.block_on(async move {
        let actor = Actor::new(0usize);
        let mut group = TaskGroup::new();

        for _ in 0..8 {
            let actor = actor.clone();
            let running = running_in.clone();
            let peak = peak_in.clone();

            group.add_task(async move {
                for _ in 0..50 {
                    let running = running.clone();
                    let peak = peak.clone();

                    actor
                        .call(move |handled| {
                            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                            peak.fetch_max(now, Ordering::SeqCst);
                            thread::yield_now();
                            *handled += 1;
                            running.fetch_sub(1, Ordering::SeqCst);
                        })
                        .await
                        .map_err(TaskError::failed)?;

                    yield_now().await;
                }
                Ok(())
            });
        }

        group.await_all().await.unwrap();
        assert_eq!(actor.call(|handled| *handled).await.unwrap(), 400);
    });

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(running.load(Ordering::SeqCst), 0);
}

#[test]
fn panicking_handler_only_fails_its_caller() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    rt.block_on(async {
        let actor = Actor::new(String::from("intact"));

        let failed = actor
            .call(|_: &mut String| -> usize { panic!("handler blew up") })
            .await;
        assert_eq!(
            failed,
            Err(ActorError::HandlerPanicked("handler blew up".to_string()))
        );

        actor.send(|s| s.push('!')).unwrap();
        actor.send(|_| panic!("nobody is listening")).unwrap();

        assert_eq!(actor.call(|s| s.clone()).await.unwrap(), "intact!");
    });
}

#[test]
fn calling_the_same_actor_from_its_handler_is_rejected() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    rt.block_on(async {
        let actor = Actor::new(1u32);
        let inner = actor.clone();

        let nested = actor.call(move |_| inner.call(|n| *n)).await.unwrap();
        assert_eq!(nested.await, Err(ActorError::Reentrant));

        // Sends to itself are queued behind the running handler.
        let again = actor.clone();
        actor
            .call(move |n| {
                *n = 10;
                again.send(|n| *n += 1).unwrap();
            })
            .await
            .unwrap();

        assert_eq!(actor.call(|n| *n).await.unwrap(), 11);
    });
}

#[test]
fn other_actors_can_be_called_from_a_handler() {
    let rt = RuntimeBuilder::new().worker_threads(2).build().unwrap();

    rt.block_on(async {
        let ledger = Actor::new(Vec::<u32>::new());
        let front = Actor::new(0u32);

        let ledger_in = ledger.clone();
        let pending = front
            .call(move |n| {
                *n += 7;
                let n = *n;
                ledger_in.call(move |entries| entries.push(n))
            })
            .await
            .unwrap();

        pending.await.unwrap();
        assert_eq!(ledger.call(|entries| entries.clone()).await.unwrap(), [7]);
    });
}

#[weft::test(worker_threads = 1)]
async fn pending_counts_queued_messages() {
    let actor = Actor::new(0u8);
    assert_eq!(actor.pending(), 0);

    for _ in 0..3 {
        actor.send(|n| *n += 1).unwrap();
    }

    // The only worker is busy with this task, so nothing has drained yet.
    assert_eq!(actor.pending(), 3);

    assert_eq!(actor.call(|n| *n).await.unwrap(), 3);
    assert_eq!(actor.pending(), 0);
}

#[test]
fn calls_outside_a_runtime_are_rejected() {
    let actor = Actor::new(());

    assert_eq!(actor.send(|_| {}), Err(ActorError::NoRuntime));

    let call = actor.call(|_| 5);

    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();
    assert_eq!(rt.block_on(call), Err(ActorError::NoRuntime));
}

#[test]
fn messages_left_at_shutdown_resolve_as_dropped() {
    let rt = RuntimeBuilder::new()
        .worker_threads(2)
        .actor_batch(1)
        .build()
        .unwrap();

    let (started_tx, started_rx) = std::sync::mpsc::channel();
    let actor = Actor::new(0u32);

    let queued = {
        let actor = actor.clone();
        let handle = rt.spawn(task::Priority::Normal, async move {
            actor.send(move |_| {
                started_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(200));
            })
            .map_err(TaskError::failed)?;

            Ok(actor.call(|n| *n))
        });

        rt.block_on(handle).unwrap()
    };

    started_rx.recv().unwrap();
    drop(rt);

    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();
    assert_eq!(rt.block_on(queued), Err(ActorError::Dropped));
}
