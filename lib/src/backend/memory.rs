use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures::future::{self, BoxFuture, FutureExt};

use crate::backend::{Backend, BatchOp, Entry, RangeCursor, RangeOptions, WriteBatch};
use crate::error::{Result, StoreError};

type Tree = BTreeMap<String, Vec<u8>>;

/// Ordered in-memory engine backed by a `BTreeMap`. Cheap to clone; clones
/// share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    tree: Arc<RwLock<Tree>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tree.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Upstream("memory backend lock poisoned".to_string())
}

fn borrowed(b: &Bound<String>) -> Bound<&str> {
    match b {
        Bound::Included(s) => Bound::Included(s.as_str()),
        Bound::Excluded(s) => Bound::Excluded(s.as_str()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// `BTreeMap::range` panics on inverted ranges; those are simply empty.
fn is_empty_range(lower: Bound<&str>, upper: Bound<&str>) -> bool {
    match (lower, upper) {
        (Bound::Included(a), Bound::Included(b)) => a > b,
        (Bound::Included(a), Bound::Excluded(b))
        | (Bound::Excluded(a), Bound::Included(b))
        | (Bound::Excluded(a), Bound::Excluded(b)) => a >= b,
        _ => false,
    }
}

fn collect_range(
    tree: &Tree,
    lower: Bound<&str>,
    upper: Bound<&str>,
    reverse: bool,
    max: usize,
) -> Vec<Entry> {
    if is_empty_range(lower, upper) {
        return Vec::new();
    }
    let range = tree.range::<str, _>((lower, upper));
    let clone = |(k, v): (&String, &Vec<u8>)| (k.clone(), v.clone());
    if reverse {
        range.rev().take(max).map(clone).collect()
    } else {
        range.take(max).map(clone).collect()
    }
}

struct MemoryCursor {
    tree: Arc<RwLock<Tree>>,
    opts: RangeOptions,
    /// Last key handed out; the next page resumes strictly after it.
    last: Option<String>,
    remaining: Option<usize>,
    closed: bool,
}

impl MemoryCursor {
    fn page(&mut self, max: usize) -> Result<Vec<Entry>> {
        if self.closed {
            return Ok(Vec::new());
        }
        let max = self.remaining.map_or(max, |r| r.min(max));
        if max == 0 {
            return Ok(Vec::new());
        }
        let tree = self.tree.read().map_err(|_| poisoned())?;
        let resume = self.last.as_deref().map(Bound::Excluded);
        let (lower, upper) = match (self.opts.reverse, resume) {
            (false, Some(r)) => (r, borrowed(&self.opts.upper)),
            (true, Some(r)) => (borrowed(&self.opts.lower), r),
            (_, None) => (borrowed(&self.opts.lower), borrowed(&self.opts.upper)),
        };
        let page = collect_range(&tree, lower, upper, self.opts.reverse, max);
        drop(tree);
        if let Some((k, _)) = page.last() {
            self.last = Some(k.clone());
        }
        if let Some(r) = self.remaining.as_mut() {
            *r -= page.len();
        }
        Ok(page)
    }
}

impl RangeCursor for MemoryCursor {
    fn next_page(&mut self, max: usize) -> BoxFuture<'static, Result<Vec<Entry>>> {
        future::ready(self.page(max)).boxed()
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn iterator(&self, opts: RangeOptions) -> Box<dyn RangeCursor> {
        Box::new(MemoryCursor {
            tree: self.tree.clone(),
            remaining: opts.limit,
            opts,
            last: None,
            closed: false,
        })
    }

    async fn write(&self, batch: WriteBatch) -> Result<()> {
        let mut tree = self.tree.write().map_err(|_| poisoned())?;
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => {
                    tree.insert(key, value);
                }
                BatchOp::Del { key } => {
                    tree.remove(&key);
                }
            }
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let tree = self.tree.read().map_err(|_| poisoned())?;
        Ok(tree.get(key).cloned())
    }

    async fn approximate_size(&self, lower: &Bound<String>, upper: &Bound<String>) -> Result<Option<u64>> {
        let tree = self.tree.read().map_err(|_| poisoned())?;
        let (lower, upper) = (borrowed(lower), borrowed(upper));
        if is_empty_range(lower, upper) {
            return Ok(Some(0));
        }
        Ok(Some(tree.range::<str, _>((lower, upper)).count() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(keys: &[&str]) -> MemoryBackend {
        let backend = MemoryBackend::new();
        let mut batch = WriteBatch::new();
        for k in keys {
            batch.put(*k, Vec::<u8>::new());
        }
        backend.write(batch).await.unwrap();
        backend
    }

    async fn drain(cursor: &mut Box<dyn RangeCursor>, page: usize) -> Vec<String> {
        let mut out = Vec::new();
        loop {
            let entries = cursor.next_page(page).await.unwrap();
            if entries.is_empty() {
                return out;
            }
            out.extend(entries.into_iter().map(|(k, _)| k));
        }
    }

    #[tokio::test]
    async fn pages_through_a_range_in_both_directions() {
        let backend = seeded(&["a", "b", "c", "d", "e"]).await;
        let opts = RangeOptions::new(Bound::Included("b".into()), Bound::Excluded("e".into()));
        let mut fwd = backend.iterator(opts.clone());
        assert_eq!(drain(&mut fwd, 2).await, ["b", "c", "d"]);
        let mut rev = backend.iterator(opts.reverse(true));
        assert_eq!(drain(&mut rev, 2).await, ["d", "c", "b"]);
    }

    #[tokio::test]
    async fn honors_limit_and_close() {
        let backend = seeded(&["a", "b", "c"]).await;
        let opts = RangeOptions::new(Bound::Unbounded, Bound::Unbounded).limit(Some(2));
        let mut cursor = backend.iterator(opts);
        assert_eq!(drain(&mut cursor, 1).await, ["a", "b"]);

        let mut cursor = backend.iterator(RangeOptions::new(Bound::Unbounded, Bound::Unbounded));
        cursor.close();
        assert!(cursor.next_page(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inverted_range_is_empty() {
        let backend = seeded(&["a", "b"]).await;
        let opts = RangeOptions::new(Bound::Excluded("b".into()), Bound::Excluded("a".into()));
        let mut cursor = backend.iterator(opts);
        assert!(drain(&mut cursor, 4).await.is_empty());
        let size = backend
            .approximate_size(&Bound::Excluded("b".into()), &Bound::Excluded("b".into()))
            .await
            .unwrap();
        assert_eq!(size, Some(0));
    }

    #[tokio::test]
    async fn batches_apply_puts_and_deletes() {
        let backend = seeded(&["a", "b"]).await;
        let mut batch = WriteBatch::new();
        batch.del("a");
        batch.put("c", b"v".to_vec());
        backend.write(batch).await.unwrap();
        assert_eq!(backend.get("a").await.unwrap(), None);
        assert_eq!(backend.get("c").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(backend.len(), 2);
    }
}
