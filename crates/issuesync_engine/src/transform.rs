//! Record transformation seam.

use serde::{Deserialize, Serialize};

/// One record that could not be turned into an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformFailure {
    /// Remote identifier of the record.
    pub record_id: String,
    /// Human-facing key of the record (e.g. `ENG-42`), when it could be read.
    pub identifier: Option<String>,
    /// Why the record was rejected.
    pub error: String,
}

impl TransformFailure {
    /// Creates a new failure entry.
    pub fn new(
        record_id: impl Into<String>,
        identifier: Option<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            identifier,
            error: error.into(),
        }
    }
}

/// Output of one batch transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput<I> {
    /// Records that transformed successfully, in input order.
    pub items: Vec<I>,
    /// Records that did not.
    pub failures: Vec<TransformFailure>,
}

impl<I> TransformOutput<I> {
    /// Creates a new output.
    pub fn new(items: Vec<I>, failures: Vec<TransformFailure>) -> Self {
        Self { items, failures }
    }
}

impl<I> Default for TransformOutput<I> {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

/// Converts raw remote records into cacheable items.
///
/// Called once per run with the complete record set. Must not fail as a
/// whole: a bad record becomes a [`TransformFailure`] and the rest of the
/// batch carries on.
pub trait RecordTransformer: Send + Sync {
    /// Raw record type consumed.
    type Record;
    /// Item type produced.
    type Item;

    /// Transforms every record.
    fn transform_all(&self, records: Vec<Self::Record>) -> TransformOutput<Self::Item>;
}

/// Pure reordering applied to successful items before they are cached.
pub type ItemOrder<I> = Box<dyn Fn(Vec<I>) -> Vec<I> + Send + Sync>;
