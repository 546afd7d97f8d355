use std::collections::VecDeque;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{Stream, StreamExt};

use crate::error::Result;
use crate::iter::{Pipeline, StageEvent, StageState};

/// Turns a stage of pages into a stage of single items, mapping each one.
pub struct Flatten<S: Pipeline, I, T, F> {
    upstream: Option<S>,
    buffer: VecDeque<I>,
    mapper: F,
    state: StageState,
    _out: PhantomData<fn() -> T>,
}

impl<S, I, T, F> Flatten<S, I, T, F>
where
    S: Pipeline<Item = Result<Vec<I>>>,
    F: FnMut(I) -> Result<T>,
{
    pub fn new(upstream: S, mapper: F) -> Self {
        Flatten {
            upstream: Some(upstream),
            buffer: VecDeque::new(),
            mapper,
            state: StageState::Idle,
            _out: PhantomData,
        }
    }

    fn release(&mut self) {
        self.buffer.clear();
        if let Some(mut upstream) = self.upstream.take() {
            upstream.close();
        }
    }
}

// Never pin-projected.
impl<S: Pipeline, I, T, F> Unpin for Flatten<S, I, T, F> {}

impl<S, I, T, F> Stream for Flatten<S, I, T, F>
where
    S: Pipeline<Item = Result<Vec<I>>>,
    F: FnMut(I) -> Result<T>,
{
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.state.is_terminal() {
                return Poll::Ready(None);
            }
            if let Some(item) = this.buffer.pop_front() {
                return match (this.mapper)(item) {
                    Ok(out) => Poll::Ready(Some(Ok(out))),
                    Err(e) => {
                        this.state = this.state.on(StageEvent::Fail);
                        this.release();
                        Poll::Ready(Some(Err(e)))
                    }
                };
            }
            let Some(upstream) = this.upstream.as_mut() else {
                this.state = this.state.on(StageEvent::End);
                return Poll::Ready(None);
            };
            match upstream.poll_next_unpin(cx) {
                Poll::Pending => {
                    this.state = this.state.on(StageEvent::Load);
                    return Poll::Pending;
                }
                Poll::Ready(Some(Ok(page))) => {
                    this.buffer.extend(page);
                    this.state = this.state.on(StageEvent::Loaded);
                }
                Poll::Ready(Some(Err(e))) => {
                    this.state = this.state.on(StageEvent::Fail);
                    this.release();
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    this.state = this.state.on(StageEvent::End);
                    this.release();
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl<S, I, T, F> Pipeline for Flatten<S, I, T, F>
where
    S: Pipeline<Item = Result<Vec<I>>>,
    I: Send,
    T: Send,
    F: FnMut(I) -> Result<T> + Send,
{
    fn close(&mut self) {
        self.release();
        self.state = self.state.on(StageEvent::Close);
    }

    fn state(&self) -> StageState {
        self.state
    }
}

impl<S: Pipeline, I, T, F> Drop for Flatten<S, I, T, F> {
    fn drop(&mut self) {
        if let Some(mut upstream) = self.upstream.take() {
            upstream.close();
        }
    }
}
