//! Runs alone in its binary: it installs a global subscriber.

use weft::RuntimeBuilder;
use weft::error::TaskError;
use weft::task::Priority;

use tracing_subscriber::filter::LevelFilter;

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn contains(&self, needle: &str) -> bool {
        String::from_utf8_lossy(&self.0.lock().unwrap()).contains(needle)
    }
}

#[test]
fn unobserved_failures_are_logged() {
    let captured = Captured::default();
    let writer = captured.clone();

    tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(LevelFilter::INFO)
        .with_ansi(false)
        .init();

    let rt = RuntimeBuilder::new().worker_threads(1).build().unwrap();

    // Dropped before the task runs: reported by the worker on completion.
    drop(rt.spawn(Priority::Normal, async {
        Err::<(), _>(TaskError::failed(io::Error::other("first orphan")))
    }));

    // Dropped after the task failed: reported by the dropping thread.
    let late = rt.spawn(Priority::Normal, async {
        Err::<(), _>(TaskError::failed(io::Error::other("second orphan")))
    });
    while !late.is_finished() {
        thread::yield_now();
    }
    drop(late);

    // Read and awaited: never reported.
    let observed = rt.spawn(Priority::Normal, async {
        Err::<(), _>(TaskError::failed(io::Error::other("seen by its awaiter")))
    });
    assert!(rt.block_on(observed).is_err());

    let deadline = Instant::now() + Duration::from_secs(5);
    while !(captured.contains("first orphan") && captured.contains("second orphan")) {
        assert!(Instant::now() < deadline, "unobserved failures were not logged");
        thread::sleep(Duration::from_millis(10));
    }

    drop(rt);

    assert!(captured.contains("task failed and nobody awaited it"));
    assert!(!captured.contains("seen by its awaiter"));
}
