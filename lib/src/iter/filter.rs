use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{Stream, StreamExt};

use crate::error::Result;
use crate::iter::{Pipeline, StageEvent, StageState};

/// Drops items rejected by a fallible predicate. A predicate error ends the
/// stage like an upstream error.
pub struct Filter<S: Pipeline, F> {
    upstream: Option<S>,
    keep: F,
    state: StageState,
}

impl<S, T, F> Filter<S, F>
where
    S: Pipeline<Item = Result<T>>,
    F: FnMut(&T) -> Result<bool>,
{
    pub fn new(upstream: S, keep: F) -> Self {
        Filter {
            upstream: Some(upstream),
            keep,
            state: StageState::Idle,
        }
    }
}

impl<S: Pipeline, F> Filter<S, F> {
    fn release(&mut self) {
        if let Some(mut upstream) = self.upstream.take() {
            upstream.close();
        }
    }
}

impl<S: Pipeline, F> Unpin for Filter<S, F> {}

impl<S, T, F> Stream for Filter<S, F>
where
    S: Pipeline<Item = Result<T>>,
    F: FnMut(&T) -> Result<bool>,
{
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.state.is_terminal() {
                return Poll::Ready(None);
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
                Poll::Ready(Some(Ok(item))) => match (this.keep)(&item) {
                    Ok(true) => {
                        this.state = this.state.on(StageEvent::Loaded);
                        return Poll::Ready(Some(Ok(item)));
                    }
                    Ok(false) => continue,
                    Err(e) => {
                        this.state = this.state.on(StageEvent::Fail);
                        this.release();
                        return Poll::Ready(Some(Err(e)));
                    }
                },
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

impl<S, T, F> Pipeline for Filter<S, F>
where
    S: Pipeline<Item = Result<T>>,
    T: Send,
    F: FnMut(&T) -> Result<bool> + Send,
{
    fn close(&mut self) {
        self.release();
        self.state = self.state.on(StageEvent::Close);
    }

    fn state(&self) -> StageState {
        self.state
    }
}

impl<S: Pipeline, F> Drop for Filter<S, F> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::iter::from_iter;

    #[tokio::test]
    async fn keeps_matching_items_in_order() {
        let source = from_iter((1..=10).map(Ok).collect::<Vec<Result<i32>>>());
        let evens = Filter::new(source, |n: &i32| Ok(n % 2 == 0));
        let out: Vec<i32> = evens.map(|r| r.unwrap()).collect().await;
        assert_eq!(out, [2, 4, 6, 8, 10]);
    }

    #[tokio::test]
    async fn predicate_error_ends_the_stage() {
        let source = from_iter((1..=5).map(Ok).collect::<Vec<Result<i32>>>());
        let mut stage = Filter::new(source, |n: &i32| {
            if *n == 3 {
                Err(StoreError::Codec("bad".into()))
            } else {
                Ok(true)
            }
        });
        assert_eq!(stage.next().await.unwrap().unwrap(), 1);
        assert_eq!(stage.next().await.unwrap().unwrap(), 2);
        assert!(stage.next().await.unwrap().is_err());
        assert!(stage.next().await.is_none());
        assert_eq!(stage.state(), StageState::Errored);
    }
}
