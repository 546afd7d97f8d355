//! Drivers that pull a pipeline to completion through an async callback.
//!
//! The next item (or batch) is only pulled once the previous callback has
//! settled. The source is closed on every exit path.

use std::future::Future;

use futures::future;
use futures::stream::StreamExt;

use crate::error::{Result, StoreError};
use crate::iter::Pipeline;

pub async fn consume_one_by_one<P, T, F, Fut>(mut source: P, mut on_item: F) -> Result<()>
where
    P: Pipeline<Item = Result<T>>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let outcome = async {
        while let Some(item) = source.next().await {
            on_item(item?).await?;
        }
        Ok::<(), StoreError>(())
    }
    .await;
    source.close();
    outcome
}

/// Groups items into batches of `batch_size` (the last one may be shorter)
/// and hands each batch to `on_batch`.
pub async fn consume_in_batches<P, T, F, Fut>(
    mut source: P,
    batch_size: usize,
    mut on_batch: F,
) -> Result<()>
where
    P: Pipeline<Item = Result<T>>,
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let batch_size = batch_size.max(1);
    let outcome = async {
        let mut batch = Vec::with_capacity(batch_size);
        while let Some(item) = source.next().await {
            batch.push(item?);
            if batch.len() == batch_size {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                on_batch(full).await?;
            }
        }
        if !batch.is_empty() {
            on_batch(batch).await?;
        }
        Ok::<(), StoreError>(())
    }
    .await;
    source.close();
    outcome
}

/// Drains a pipeline into a vector.
pub async fn collect<P, T>(source: P) -> Result<Vec<T>>
where
    P: Pipeline<Item = Result<T>>,
{
    let mut items = Vec::new();
    consume_one_by_one(source, |item| {
        items.push(item);
        future::ready(Ok(()))
    })
    .await?;
    Ok(items)
}
