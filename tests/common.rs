//! Shared test fixtures for the dispatcher integration tests.

use async_trait::async_trait;
use fairdispatch::Handler;
use std::sync::{Arc, Mutex};

/// Records every `(source, message)` pair it is handed, in arrival order,
/// and can be scripted to fail the next call for a given source exactly
/// once.
///
/// Cheaply `Clone`: all state lives behind an `Arc`, so a test can hand one
/// clone to the dispatcher and keep another for assertions.
#[derive(Default, Clone)]
pub struct RecordingHandler {
    calls: Arc<Mutex<Vec<(String, String)>>>,
    fail_next_for: Arc<Mutex<Option<String>>>,
}

impl RecordingHandler {
    pub fn fail_next_for(&self, source: &str) {
        *self.fail_next_for.lock().unwrap() = Some(source.to_string());
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Handler<String, String> for RecordingHandler {
    type Error = String;

    async fn handle(&self, source: String, message: String) -> Result<(), Self::Error> {
        self.calls.lock().unwrap().push((source.clone(), message));
        let mut fail_next = self.fail_next_for.lock().unwrap();
        if fail_next.as_deref() == Some(source.as_str()) {
            *fail_next = None;
            return Err(format!("{source} handler failed"));
        }
        Ok(())
    }
}

/// Enables `log` output for a test run (opt-in; most tests don't need it).
#[allow(dead_code)]
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
