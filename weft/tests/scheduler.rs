mod common;

use weft::RuntimeBuilder;
use weft::task::{self, Priority};
use weft::yield_now;

use std::sync::{Arc, Mutex};

#[test]
fn higher_bands_run_first() {
    common::init_tracing();
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let order = rt.block_on(async {
        let order = Arc::new(Mutex::new(Vec::new()));

        let plan = [
            (Priority::Low, "L1"),
            (Priority::Low, "L2"),
            (Priority::Normal, "N1"),
            (Priority::High, "H1"),
            (Priority::High, "H2"),
        ];

        let handles: Vec<_> = plan
            .into_iter()
            .map(|(priority, label)| {
                let order = order.clone();
                task::spawn_with_priority(priority, async move {
                    order.lock().unwrap().push(label);
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        Arc::try_unwrap(order).unwrap().into_inner().unwrap()
    });

    assert_eq!(order, ["H1", "H2", "N1", "L1", "L2"]);
}

#[test]
fn yield_now_goes_to_the_back_of_the_band() {
    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    let trace = rt.block_on(async {
        let trace = Arc::new(Mutex::new(Vec::new()));

        let handles: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|name| {
                let trace = trace.clone();
                task::spawn(async move {
                    for step in 0..3 {
                        trace.lock().unwrap().push(format!("{name}{step}"));
                        yield_now().await;
                    }
                    Ok(())
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        let trace = trace.lock().unwrap().clone();
        trace
    });

    assert_eq!(trace, ["a0", "b0", "a1", "b1", "a2", "b2"]);
}

#[test]
fn pure_function_round_trip() {
    let rt = RuntimeBuilder::new().worker_threads(3).build().unwrap();

    for priority in [Priority::Low, Priority::Normal, Priority::High] {
        let handle = rt.spawn(priority, async { Ok((1..=10u64).product::<u64>()) });
        assert_eq!(rt.block_on(handle).unwrap(), 3_628_800);
    }
}

#[test]
fn task_ids_and_states_are_observable() {
    assert_eq!(task::current_id(), None);

    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    rt.block_on(async {
        let handle = task::spawn(async { Ok(task::current_id()) });

        assert_eq!(handle.state(), task::TaskState::Ready);
        assert!(!handle.is_finished());

        yield_now().await;

        assert!(handle.is_finished());
        assert_eq!(handle.state(), task::TaskState::Completed);

        let id = handle.id();
        assert_eq!(handle.await.unwrap(), Some(id));
    });
}
