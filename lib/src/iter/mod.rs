//! Pull-based streaming pipeline between the engine and the caller.
//!
//! Every stage is a [`futures::Stream`] of `Result` items that can also be
//! closed explicitly. Closing (or dropping) a stage releases everything it
//! holds upstream exactly once.

pub mod consume;
pub mod filter;
pub mod flatten;
pub mod paged;
pub mod sorting;
pub mod state;

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{Stream, StreamExt};

pub use consume::{collect, consume_in_batches, consume_one_by_one};
pub use filter::Filter;
pub use flatten::Flatten;
pub use paged::PagedScan;
pub use sorting::SortingStream;
pub use state::{StageEvent, StageState};

pub trait Pipeline: Stream + Unpin + Send {
    /// Stops the stage and releases upstream resources. Idempotent.
    fn close(&mut self);

    fn state(&self) -> StageState;
}

impl<P: Pipeline + ?Sized> Pipeline for Box<P> {
    fn close(&mut self) {
        (**self).close()
    }

    fn state(&self) -> StageState {
        (**self).state()
    }
}

/// Adapts any stream into a closable [`Pipeline`] stage.
pub struct Wrapped<S> {
    inner: Option<S>,
    state: StageState,
}

pub fn wrap<S>(stream: S) -> Wrapped<S>
where
    S: Stream + Unpin + Send,
{
    Wrapped {
        inner: Some(stream),
        state: StageState::Idle,
    }
}

/// Stage over an in-memory list.
pub fn from_iter<T: Send>(items: Vec<T>) -> Wrapped<futures::stream::Iter<std::vec::IntoIter<T>>> {
    wrap(futures::stream::iter(items))
}

impl<S> Stream for Wrapped<S>
where
    S: Stream + Unpin + Send,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<S::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };
        match inner.poll_next_unpin(cx) {
            Poll::Ready(Some(item)) => {
                this.state = this.state.on(StageEvent::Loaded);
                Poll::Ready(Some(item))
            }
            Poll::Ready(None) => {
                this.state = this.state.on(StageEvent::End);
                this.inner = None;
                Poll::Ready(None)
            }
            Poll::Pending => {
                this.state = this.state.on(StageEvent::Load);
                Poll::Pending
            }
        }
    }
}

impl<S> Pipeline for Wrapped<S>
where
    S: Stream + Unpin + Send,
{
    fn close(&mut self) {
        self.inner = None;
        self.state = self.state.on(StageEvent::Close);
    }

    fn state(&self) -> StageState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wrapped_stream_ends_and_closes() {
        let mut s = from_iter(vec![1, 2]);
        assert_eq!(s.next().await, Some(1));
        assert_eq!(s.state(), StageState::Readable);
        assert_eq!(s.next().await, Some(2));
        assert_eq!(s.next().await, None);
        assert_eq!(s.state(), StageState::Ended);
        s.close();
        assert_eq!(s.state(), StageState::Closed);
        assert_eq!(s.next().await, None);
    }
}
