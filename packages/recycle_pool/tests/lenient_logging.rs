//! Tests that lenient pools report contract violations through `tracing` instead of failing.
//!
//! Each test installs a thread-local subscriber that writes formatted events into a buffer, so
//! the tests do not interfere with each other.

use std::io;
use std::sync::{Arc, Mutex};

use recycle_pool::{CallbackRegistry, Entry, Pool, PoolConfig, Strictness, create_pool};

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber that captures everything logged at warning level or above.
fn capture_warnings<R>(f: impl FnOnce() -> R) -> (R, String) {
    let logs = CapturedLogs::default();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer({
            let logs = logs.clone();
            move || logs.clone()
        })
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);

    (result, logs.contents())
}

#[test]
fn lenient_release_of_stranger_is_logged() {
    let mut pool = Pool::<u32>::builder()
        .name("numbers")
        .strictness(Strictness::Lenient)
        .build();

    let (result, logs) = capture_warnings(|| pool.release(Entry::new(1)));

    result.unwrap();
    assert!(logs.contains("WARN"), "{logs}");
    assert!(logs.contains("does not belong"), "{logs}");
    assert!(logs.contains("numbers"), "{logs}");
    assert_eq!(pool.available(), 1);
}

#[test]
fn strict_release_of_stranger_is_not_logged() {
    let mut pool = Pool::<u32>::new();

    let (result, logs) = capture_warnings(|| pool.release(Entry::new(1)));

    result.unwrap_err();
    assert!(logs.is_empty(), "{logs}");
}

#[test]
fn lenient_unresolved_hook_is_logged() {
    let mut config = PoolConfig::default();
    config.on_reset = Some("nope".to_string());
    config.strictness = Strictness::Lenient;

    let callbacks = CallbackRegistry::<u32>::new();

    let (result, logs) = capture_warnings(|| create_pool(&config, &callbacks));

    result.unwrap();
    assert!(logs.contains("on_reset"), "{logs}");
    assert!(logs.contains("nope"), "{logs}");
}

#[test]
fn lenient_release_of_borrowed_entry_is_logged() {
    let mut pool = Pool::<u32>::builder()
        .on_release(|value| *value = 0)
        .strictness(Strictness::Lenient)
        .build();

    let entry = pool.reserve();
    let alias = entry.clone();
    let guard = alias.borrow();

    let (result, logs) = capture_warnings(|| pool.release(entry.clone()));

    result.unwrap();
    assert!(logs.contains("borrowed elsewhere"), "{logs}");

    drop(guard);
    assert!(!pool.is_available(&entry));
}
