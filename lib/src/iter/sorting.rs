use std::collections::btree_map;
use std::collections::BTreeMap;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{Stream, StreamExt};

use crate::error::Result;
use crate::iter::{Pipeline, StageEvent, StageState};

/// Buffers the whole upstream in memory and re-emits it ordered by a string
/// digest. Equal digests come out in arrival order when ascending and in
/// reverse arrival order when descending.
pub struct SortingStream<S: Pipeline, T, D> {
    upstream: Option<S>,
    digest: D,
    buffer: BTreeMap<(String, u64), T>,
    seq: u64,
    sorted: Option<btree_map::IntoIter<(String, u64), T>>,
    reverse: bool,
    remaining: Option<usize>,
    state: StageState,
}

impl<S, T, D> SortingStream<S, T, D>
where
    S: Pipeline<Item = Result<T>>,
    D: FnMut(&T) -> Result<String>,
{
    pub fn new(upstream: S, digest: D, reverse: bool, limit: Option<usize>) -> Self {
        SortingStream {
            upstream: Some(upstream),
            digest,
            buffer: BTreeMap::new(),
            seq: 0,
            sorted: None,
            reverse,
            remaining: limit,
            state: StageState::Idle,
        }
    }

    fn release(&mut self) {
        self.buffer.clear();
        self.sorted = None;
        if let Some(mut upstream) = self.upstream.take() {
            upstream.close();
        }
    }

    fn fail(&mut self, e: crate::error::StoreError) -> Poll<Option<Result<T>>> {
        self.state = self.state.on(StageEvent::Fail);
        self.release();
        Poll::Ready(Some(Err(e)))
    }

    fn end(&mut self) -> Poll<Option<Result<T>>> {
        self.state = self.state.on(StageEvent::End);
        self.release();
        Poll::Ready(None)
    }
}

// Never pin-projected.
impl<S: Pipeline, T, D> Unpin for SortingStream<S, T, D> {}

impl<S, T, D> Stream for SortingStream<S, T, D>
where
    S: Pipeline<Item = Result<T>>,
    D: FnMut(&T) -> Result<String>,
{
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.state.is_terminal() {
            return Poll::Ready(None);
        }
        while this.sorted.is_none() {
            let Some(upstream) = this.upstream.as_mut() else {
                return this.end();
            };
            match upstream.poll_next_unpin(cx) {
                Poll::Pending => {
                    this.state = this.state.on(StageEvent::Load);
                    return Poll::Pending;
                }
                Poll::Ready(Some(Ok(item))) => {
                    let key = match (this.digest)(&item) {
                        Ok(key) => key,
                        Err(e) => return this.fail(e),
                    };
                    this.buffer.insert((key, this.seq), item);
                    this.seq += 1;
                }
                Poll::Ready(Some(Err(e))) => return this.fail(e),
                Poll::Ready(None) => {
                    if let Some(mut upstream) = this.upstream.take() {
                        upstream.close();
                    }
                    this.sorted = Some(std::mem::take(&mut this.buffer).into_iter());
                    this.state = this.state.on(StageEvent::Loaded);
                }
            }
        }
        if this.remaining == Some(0) {
            return this.end();
        }
        let next = match this.sorted.as_mut() {
            Some(sorted) if this.reverse => sorted.next_back(),
            Some(sorted) => sorted.next(),
            None => None,
        };
        match next {
            Some((_, item)) => {
                if let Some(r) = this.remaining.as_mut() {
                    *r -= 1;
                }
                Poll::Ready(Some(Ok(item)))
            }
            None => this.end(),
        }
    }
}

impl<S, T, D> Pipeline for SortingStream<S, T, D>
where
    S: Pipeline<Item = Result<T>>,
    T: Send,
    D: FnMut(&T) -> Result<String> + Send,
{
    fn close(&mut self) {
        self.release();
        self.state = self.state.on(StageEvent::Close);
    }

    fn state(&self) -> StageState {
        self.state
    }
}

impl<S: Pipeline, T, D> Drop for SortingStream<S, T, D> {
    fn drop(&mut self) {
        if let Some(mut upstream) = self.upstream.take() {
            upstream.close();
        }
    }
}
