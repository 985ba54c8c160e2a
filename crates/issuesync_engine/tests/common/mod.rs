//! Shared collaborators for engine integration tests.

#![allow(dead_code)]

use issuesync_engine::{
    FetchResult, Page, PageFetcher, PageRequest, RawIssue, RecordTransformer, TransformFailure,
    TransformOutput,
};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, Sender};

/// A well-formed issue node.
pub fn issue_node(id: &str, identifier: &str, priority: i64) -> RawIssue {
    RawIssue(json!({
        "id": id,
        "identifier": identifier,
        "title": format!("Issue {identifier}"),
        "priority": priority,
        "updatedAt": "2024-05-01T12:00:00Z",
        "state": { "name": "In Progress" },
        "labels": { "nodes": [] }
    }))
}

/// A node that the issue transformer rejects (no title).
pub fn broken_node(id: &str, identifier: &str) -> RawIssue {
    RawIssue(json!({
        "id": id,
        "identifier": identifier,
        "updatedAt": "2024-05-01T12:00:00Z",
        "state": { "name": "Todo" }
    }))
}

/// A failure entry for a record id.
pub fn failure(record_id: &str) -> TransformFailure {
    TransformFailure::new(record_id, None, "rejected")
}

/// Returns canned transform outputs, one per run, ignoring the records.
pub struct ScriptedTransformer {
    outputs: Mutex<VecDeque<TransformOutput<u32>>>,
}

impl ScriptedTransformer {
    pub fn new() -> Self {
        Self {
            outputs: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push(&self, items: Vec<u32>, failures: Vec<TransformFailure>) {
        self.outputs
            .lock()
            .push_back(TransformOutput::new(items, failures));
    }
}

impl RecordTransformer for ScriptedTransformer {
    type Record = u32;
    type Item = u32;

    fn transform_all(&self, _records: Vec<u32>) -> TransformOutput<u32> {
        self.outputs.lock().pop_front().unwrap_or_default()
    }
}

/// Accepts every record as-is.
pub struct PassThrough;

impl RecordTransformer for PassThrough {
    type Record = u32;
    type Item = u32;

    fn transform_all(&self, records: Vec<u32>) -> TransformOutput<u32> {
        TransformOutput::new(records, Vec::new())
    }
}

/// A fetcher whose first call blocks until the test releases it.
///
/// Signals `started` when the blocked call begins. Later calls return
/// immediately.
pub struct GatedFetcher {
    records: Vec<u32>,
    started: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
    calls: Mutex<usize>,
}

impl GatedFetcher {
    pub fn new(records: Vec<u32>, started: Sender<()>, release: Receiver<()>) -> Self {
        Self {
            records,
            started: Mutex::new(started),
            release: Mutex::new(release),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl PageFetcher for GatedFetcher {
    type Record = u32;

    fn fetch_page(&self, _collection_id: &str, _request: &PageRequest) -> FetchResult<Page<u32>> {
        let first = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls == 1
        };
        if first {
            self.started.lock().send(()).unwrap();
            self.release.lock().recv().unwrap();
        }
        Ok(Page::last(self.records.clone()))
    }
}
