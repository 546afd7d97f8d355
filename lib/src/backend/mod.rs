//! Contract with the ordered key-value engine.
//!
//! Keys are strings compared byte-wise; values are opaque bytes. Quad rows
//! carry empty values, scope rows carry JSON.

pub mod memory;

use std::ops::Bound;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::Result;

pub use memory::MemoryBackend;

pub type Entry = (String, Vec<u8>);

/// Parameters of a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOptions {
    pub lower: Bound<String>,
    pub upper: Bound<String>,
    pub reverse: bool,
    pub limit: Option<usize>,
}

impl RangeOptions {
    pub fn new(lower: Bound<String>, upper: Bound<String>) -> Self {
        RangeOptions {
            lower,
            upper,
            reverse: false,
            limit: None,
        }
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

/// Open scan over the engine.
///
/// `next_page` returns an owned future so a caller can hold one page in hand
/// while the next one is in flight. An empty page means the scan is over.
pub trait RangeCursor: Send {
    fn next_page(&mut self, max: usize) -> BoxFuture<'static, Result<Vec<Entry>>>;
    /// Releases engine resources. Must tolerate repeated calls.
    fn close(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: String, value: Vec<u8> },
    Del { key: String },
}

/// Operations committed together by [`Backend::write`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Put {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn del(&mut self, key: impl Into<String>) {
        self.ops.push(BatchOp::Del { key: key.into() });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    fn iterator(&self, opts: RangeOptions) -> Box<dyn RangeCursor>;

    /// Commits every operation of `batch` or none of them.
    async fn write(&self, batch: WriteBatch) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Estimated number of entries in the range, when the engine can tell.
    async fn approximate_size(&self, _lower: &Bound<String>, _upper: &Bound<String>) -> Result<Option<u64>> {
        Ok(None)
    }
}
