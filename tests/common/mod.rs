//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::{collections::HashMap, sync::Mutex, time::Duration};

use async_trait::async_trait;
use openapi_deref::{
    reference::ExternalReference, Component, Components, DerefError, ExternalLoader,
};
use serde_json::Value as JsonValue;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

#[allow(dead_code)]
#[derive(Clone, Default)]
struct StubEntry {
    value: JsonValue,
    components: Components,
    delay: Duration,
    failure: Option<DerefError>,
}

/// In-memory loader keyed by the reference string (`uri#fragment`).
///
/// Each entry can be delayed to shuffle completion order, or made to fail.
#[allow(dead_code)]
#[derive(Default)]
pub struct StubLoader {
    entries: HashMap<String, StubEntry>,
    started: Mutex<Vec<String>>,
    finished: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl StubLoader {
    pub fn new() -> Self {
        init_logging();
        Self::default()
    }

    pub fn serve(self, reference: &str, value: JsonValue) -> Self {
        self.serve_with(reference, value, Components::new())
    }

    /// Serve `value` together with components discovered while loading it.
    pub fn serve_with(mut self, reference: &str, value: JsonValue, components: Components) -> Self {
        let entry = self.entries.entry(reference.to_string()).or_default();
        entry.value = value;
        entry.components = components;
        self
    }

    pub fn delayed(mut self, reference: &str, millis: u64) -> Self {
        self.entries.entry(reference.to_string()).or_default().delay =
            Duration::from_millis(millis);
        self
    }

    pub fn failing(mut self, reference: &str, error: DerefError) -> Self {
        self.entries.entry(reference.to_string()).or_default().failure = Some(error);
        self
    }

    /// References in the order their loads were issued.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// References in the order their loads completed.
    pub fn finished(&self) -> Vec<String> {
        self.finished.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExternalLoader for StubLoader {
    async fn load<T: Component>(
        &self,
        reference: &ExternalReference,
    ) -> Result<(T, Components), DerefError> {
        let id = reference.to_string();
        self.started.lock().unwrap().push(id.clone());
        let entry = self
            .entries
            .get(&id)
            .cloned()
            .ok_or_else(|| DerefError::NotFound(id.clone()))?;
        tokio::time::sleep(entry.delay).await;
        self.finished.lock().unwrap().push(id);
        if let Some(failure) = entry.failure {
            return Err(failure);
        }
        let value: T = serde_json::from_value(entry.value)?;
        Ok((value, entry.components))
    }
}
