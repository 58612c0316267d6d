/// Test helpers and fixtures for the integration tests
///
/// `MockStore` stands in for the remote store: it records every request and answers
/// from a closure, so tests can script paginated, partial or failing responses.
pub mod fixtures;

pub use dynamo_mapper::{Error, Operation, Payload, StoreClient};
pub use fixtures::*;
pub use serde_json::{Value as Json, json};

use std::sync::{Arc, Mutex};
use tokio::sync::Barrier;

/// Scripted response: operation, request payload and 0-based call index
pub type Handler = dyn Fn(Operation, &Json, usize) -> Result<Json, Error> + Send + Sync;

/// In-memory store that records requests and answers from a closure
pub struct MockStore {
    calls: Mutex<Vec<(Operation, Json)>>,
    handler: Box<Handler>,
    barrier: Option<Barrier>,
}

impl MockStore {
    /// Store answering every request with `handler`
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(Operation, &Json, usize) -> Result<Json, Error> + Send + Sync + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            handler: Box::new(handler),
            barrier: None,
        }
    }

    /// Store answering every request with `response`
    #[allow(dead_code)]
    pub fn always(response: Json) -> Self {
        Self::new(move |_, _, _| Ok(response.clone()))
    }

    /// Hold every request until `parties` requests are in flight together
    #[allow(dead_code)]
    pub fn with_barrier(mut self, parties: usize) -> Self {
        self.barrier = Some(Barrier::new(parties));
        self
    }

    /// Every request received so far, in arrival order
    pub fn calls(&self) -> Vec<(Operation, Json)> {
        self.calls.lock().unwrap().clone()
    }

    /// Payloads of the requests for `operation`
    #[allow(dead_code)]
    pub fn payloads(&self, operation: Operation) -> Vec<Json> {
        self.calls()
            .into_iter()
            .filter(|(op, _)| *op == operation)
            .map(|(_, payload)| payload)
            .collect()
    }
}

impl StoreClient for MockStore {
    async fn request(&self, operation: Operation, payload: Payload) -> Result<Payload, Error> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((operation, payload.clone()));
            calls.len() - 1
        };

        if let Some(barrier) = &self.barrier {
            let _ = barrier.wait().await;
        }

        (self.handler)(operation, &payload, index)
    }
}

/// Shared handle so tests can inspect the calls after handing the store to a table
pub fn shared(store: MockStore) -> Arc<MockStore> {
    Arc::new(store)
}
