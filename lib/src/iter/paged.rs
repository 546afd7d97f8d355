use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::Stream;

use crate::backend::{Entry, RangeCursor};
use crate::error::Result;
use crate::iter::{Pipeline, StageEvent, StageState};

/// Pages of raw entries pulled from an engine cursor.
///
/// As soon as a page is handed downstream the fetch of the following page is
/// started, so at most two pages (one in hand, one in flight) are buffered.
pub struct PagedScan {
    cursor: Option<Box<dyn RangeCursor>>,
    page_size: usize,
    in_flight: Option<BoxFuture<'static, Result<Vec<Entry>>>>,
    /// Prefetch that completed while the previous page was being delivered.
    prefetched: Option<Result<Vec<Entry>>>,
    state: StageState,
}

impl PagedScan {
    pub fn new(cursor: Box<dyn RangeCursor>, page_size: usize) -> Self {
        PagedScan {
            cursor: Some(cursor),
            page_size: page_size.max(1),
            in_flight: None,
            prefetched: None,
            state: StageState::Idle,
        }
    }

    fn fetch(&mut self) -> Option<BoxFuture<'static, Result<Vec<Entry>>>> {
        let size = self.page_size;
        self.cursor.as_mut().map(|c| c.next_page(size))
    }

    fn release(&mut self) {
        self.in_flight = None;
        self.prefetched = None;
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
    }

    fn deliver(&mut self, page: Result<Vec<Entry>>, cx: &mut Context<'_>) -> Poll<Option<Result<Vec<Entry>>>> {
        match page {
            Ok(entries) if entries.is_empty() => {
                self.state = self.state.on(StageEvent::End);
                self.release();
                Poll::Ready(None)
            }
            Ok(entries) => {
                self.state = self.state.on(StageEvent::Loaded);
                if let Some(mut next) = self.fetch() {
                    match next.poll_unpin(cx) {
                        Poll::Ready(r) => self.prefetched = Some(r),
                        Poll::Pending => self.in_flight = Some(next),
                    }
                }
                Poll::Ready(Some(Ok(entries)))
            }
            Err(e) => {
                self.state = self.state.on(StageEvent::Fail);
                self.release();
                Poll::Ready(Some(Err(e)))
            }
        }
    }
}

impl Stream for PagedScan {
    type Item = Result<Vec<Entry>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.state.is_terminal() {
            return Poll::Ready(None);
        }
        if let Some(ready) = this.prefetched.take() {
            return this.deliver(ready, cx);
        }
        if this.in_flight.is_none() {
            this.in_flight = this.fetch();
            this.state = this.state.on(StageEvent::Load);
        }
        let Some(fut) = this.in_flight.as_mut() else {
            this.state = this.state.on(StageEvent::End);
            return Poll::Ready(None);
        };
        match fut.poll_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(page) => {
                this.in_flight = None;
                this.deliver(page, cx)
            }
        }
    }
}

impl Pipeline for PagedScan {
    fn close(&mut self) {
        self.release();
        self.state = self.state.on(StageEvent::Close);
    }

    fn state(&self) -> StageState {
        self.state
    }
}

impl Drop for PagedScan {
    fn drop(&mut self) {
        self.release();
    }
}
