mod common;

use common::*;
use quadkv::iter::from_iter;
use quadkv::{
    Backend, DelOpts, GetOpts, Pattern, PutOpts, Quad, Quadstore, Result, StreamOpts, Term,
};

fn numbered(n: usize) -> Vec<Quad> {
    (0..n)
        .map(|i| quad!("ex://s", "ex://p", int(&i.to_string()), "ex://g"))
        .collect()
}

async fn all(store: &Quadstore) -> Vec<Quad> {
    store.get(&Pattern::new(), GetOpts::default()).await.unwrap().items
}

fn source(quads: &[Quad]) -> impl quadkv::Pipeline<Item = Result<Quad>> {
    from_iter(quads.iter().cloned().map(Ok).collect())
}

#[tokio::test]
async fn put_is_idempotent() {
    let (backend, store) = memory_store();
    let q = quad!("ex://a", "ex://b", Term::literal("c"));
    store.put(&q, PutOpts::default()).await.unwrap();
    store.put(&q, PutOpts::default()).await.unwrap();
    assert_eq!(all(&store).await, vec![q]);
    assert_eq!(backend.len(), store.catalog().len());
}

#[tokio::test]
async fn multi_put_writes_everything() {
    let (_, store) = memory_store();
    let quads = numbered(12);
    store.multi_put(&quads, PutOpts::default()).await.unwrap();
    same_quads(all(&store).await, quads);
}

#[tokio::test]
async fn del_removes_every_index_entry() {
    let (backend, store) = memory_store();
    let quads = numbered(3);
    store.multi_put(&quads, PutOpts::default()).await.unwrap();
    store.del(&quads[1], DelOpts::default()).await.unwrap();
    same_quads(all(&store).await, vec![quads[0].clone(), quads[2].clone()]);
    assert_eq!(backend.len(), 2 * store.catalog().len());

    store.multi_del(&quads, DelOpts::default()).await.unwrap();
    assert!(backend.is_empty());
}

#[tokio::test]
async fn deleting_an_absent_quad_is_a_no_op() {
    let (_, store) = memory_store();
    let quads = numbered(2);
    store.put(&quads[0], PutOpts::default()).await.unwrap();
    store.del(&quads[1], DelOpts::default()).await.unwrap();
    assert_eq!(all(&store).await, vec![quads[0].clone()]);
}

#[tokio::test]
async fn patch_swaps_quads() {
    let (_, store) = memory_store();
    let quads = numbered(4);
    store.multi_put(&quads[..2], PutOpts::default()).await.unwrap();

    store
        .patch(&quads[0], &quads[2], DelOpts::default())
        .await
        .unwrap();
    same_quads(all(&store).await, vec![quads[1].clone(), quads[2].clone()]);

    store
        .multi_patch(&quads[1..3], &quads[3..], DelOpts::default())
        .await
        .unwrap();
    assert_eq!(all(&store).await, vec![quads[3].clone()]);
}

#[tokio::test]
async fn pre_write_hooks_commit_with_the_batch() {
    let (backend, store) = memory_store();
    let quads = numbered(4);

    store
        .put(&quads[0], PutOpts::default().pre_write(|b| {
            b.put("meta/put", b"1".to_vec());
            Ok(())
        }))
        .await
        .unwrap();
    store
        .multi_put(
            &quads[1..],
            PutOpts::default().pre_write(|b| {
                b.put("meta/multi_put", b"2".to_vec());
                Ok(())
            }),
        )
        .await
        .unwrap();
    store
        .del(&quads[0], DelOpts::default().pre_write(|b| {
            b.del("meta/put");
            Ok(())
        }))
        .await
        .unwrap();
    store
        .multi_del(
            &quads[1..2],
            DelOpts::default().pre_write(|b| {
                b.put("meta/multi_del", Vec::<u8>::new());
                Ok(())
            }),
        )
        .await
        .unwrap();
    store
        .patch(
            &quads[2],
            &quads[0],
            DelOpts::default().pre_write(|b| {
                b.put("meta/patch", Vec::<u8>::new());
                Ok(())
            }),
        )
        .await
        .unwrap();
    store
        .multi_patch(
            &quads[3..],
            &quads[1..2],
            DelOpts::default().pre_write(|b| {
                b.put("meta/multi_patch", Vec::<u8>::new());
                Ok(())
            }),
        )
        .await
        .unwrap();

    assert_eq!(backend.get("meta/put").await.unwrap(), None);
    assert_eq!(backend.get("meta/multi_put").await.unwrap(), Some(b"2".to_vec()));
    for key in ["meta/multi_del", "meta/patch", "meta/multi_patch"] {
        assert!(backend.get(key).await.unwrap().is_some(), "{key}");
    }
    same_quads(all(&store).await, vec![quads[0].clone(), quads[1].clone()]);
}

#[tokio::test]
async fn failing_pre_write_aborts_the_whole_batch() {
    let (backend, store) = memory_store();
    let result = store
        .multi_put(
            &numbered(3),
            PutOpts::default().pre_write(|_| {
                Err(quadkv::StoreError::Batch("rejected".to_string()))
            }),
        )
        .await;
    assert!(result.is_err());
    assert!(backend.is_empty());
}

#[tokio::test]
async fn put_stream_handles_any_batch_size() {
    let quads = numbered(10);
    for batch_size in [1, 10, 5, 3, 64] {
        let (_, store) = memory_store();
        store
            .put_stream(source(&quads), StreamOpts::default().batch_size(batch_size))
            .await
            .unwrap();
        same_quads(all(&store).await, quads.clone());
    }
}

#[tokio::test]
async fn put_stream_of_nothing_writes_nothing() {
    let (backend, store) = memory_store();
    store
        .put_stream(source(&[]), StreamOpts::default())
        .await
        .unwrap();
    assert!(backend.is_empty());
}

#[tokio::test]
async fn put_stream_stops_at_the_first_error() {
    let (_, store) = memory_store();
    let quads = numbered(4);
    let items: Vec<Result<Quad>> = vec![
        Ok(quads[0].clone()),
        Ok(quads[1].clone()),
        Err(quadkv::StoreError::Upstream("source failed".to_string())),
        Ok(quads[2].clone()),
    ];
    let err = store
        .put_stream(from_iter(items), StreamOpts::default().batch_size(1))
        .await
        .unwrap_err();
    assert!(matches!(err, quadkv::StoreError::Upstream(_)));
    // Batches committed before the failure stay committed.
    same_quads(all(&store).await, quads[..2].to_vec());
}

#[tokio::test]
async fn del_stream_removes_streamed_quads() {
    let (_, store) = memory_store();
    let quads = numbered(9);
    store.multi_put(&quads, PutOpts::default()).await.unwrap();
    store
        .del_stream(source(&quads[..6]), StreamOpts::default().batch_size(4))
        .await
        .unwrap();
    same_quads(all(&store).await, quads[6..].to_vec());
}

#[tokio::test]
async fn remove_matches_deletes_only_matching_quads() {
    let (backend, store) = memory_store();
    let keep = quad!("ex://other", "ex://p", Term::literal("x"), "ex://g");
    store.multi_put(&numbered(25), PutOpts::default()).await.unwrap();
    store.put(&keep, PutOpts::default()).await.unwrap();

    store
        .remove_matches(&Pattern::new().subject(nn("ex://s")), StreamOpts::default().batch_size(7))
        .await
        .unwrap();
    assert_eq!(all(&store).await, vec![keep]);
    assert_eq!(backend.len(), store.catalog().len());
}
