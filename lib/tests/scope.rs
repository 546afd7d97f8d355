mod common;

use common::*;
use quadkv::iter::from_iter;
use quadkv::{GetOpts, Pattern, PutOpts, Quad, Result, StreamOpts, Term};

fn with_blank(label: &str) -> Quad {
    Quad::new(
        Term::blank_node(label),
        nn("ex://p"),
        Term::literal("o"),
        Term::DefaultGraph,
    )
}

#[tokio::test]
async fn reloaded_scope_remembers_generated_labels() {
    let (_, store) = memory_store();
    let mut scope = store.init_scope();
    store
        .put(&with_blank("bo"), PutOpts::default().scope(&mut scope))
        .await
        .unwrap();
    let generated = scope.mapped("bo").unwrap().to_string();

    let stored = store.get(&Pattern::new(), GetOpts::default()).await.unwrap();
    assert_eq!(stored.items[0].subject, Term::blank_node(generated.clone()));

    let reloaded = store.load_scope(&scope.id).await.unwrap();
    assert_eq!(reloaded.mapped("bo"), Some(generated.as_str()));
}

#[tokio::test]
async fn scopes_do_not_leak_into_each_other() {
    let (_, store) = memory_store();
    let mut first = store.init_scope();
    let mut second = store.init_scope();
    assert_ne!(first.id, second.id);

    store
        .put(&with_blank("b0"), PutOpts::default().scope(&mut first))
        .await
        .unwrap();
    store
        .put(&with_blank("b0"), PutOpts::default().scope(&mut second))
        .await
        .unwrap();
    assert_ne!(first.mapped("b0"), second.mapped("b0"));

    let stored = store.get(&Pattern::new(), GetOpts::default()).await.unwrap();
    assert_eq!(stored.items.len(), 2);

    let reloaded = store.load_scope(&first.id).await.unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.mapped("b0"), first.mapped("b0"));
}

#[tokio::test]
async fn reused_scope_keeps_labels_stable_across_writes() {
    let (_, store) = memory_store();
    let mut scope = store.init_scope();
    store
        .multi_put(&[with_blank("x"), with_blank("y")], PutOpts::default().scope(&mut scope))
        .await
        .unwrap();

    let mut reloaded = store.load_scope(&scope.id).await.unwrap();
    store
        .put(&with_blank("x"), PutOpts::default().scope(&mut reloaded))
        .await
        .unwrap();
    assert_eq!(reloaded.len(), 2);

    let stored = store.get(&Pattern::new(), GetOpts::default()).await.unwrap();
    assert_eq!(stored.items.len(), 2);
}

#[tokio::test]
async fn put_stream_relabels_through_the_scope() {
    let (_, store) = memory_store();
    let mut scope = store.init_scope();
    let items: Vec<Result<Quad>> = vec![Ok(with_blank("a")), Ok(with_blank("b")), Ok(with_blank("a"))];
    store
        .put_stream(from_iter(items), StreamOpts::default().batch_size(2).scope(&mut scope))
        .await
        .unwrap();

    assert_eq!(scope.len(), 2);
    let stored = store.get(&Pattern::new(), GetOpts::default()).await.unwrap();
    assert_eq!(stored.items.len(), 2);
    assert!(stored.items.iter().all(|q| q.subject != Term::blank_node("a")));
}

#[tokio::test]
async fn named_nodes_and_literals_pass_through_untouched() {
    let (_, store) = memory_store();
    let mut scope = store.init_scope();
    let q = quad!("ex://s", "ex://p", Term::literal("o"), "ex://g");
    store
        .put(&q, PutOpts::default().scope(&mut scope))
        .await
        .unwrap();
    assert!(scope.is_empty());
    let stored = store.get(&Pattern::new(), GetOpts::default()).await.unwrap();
    assert_eq!(stored.items, vec![q]);
}

#[tokio::test]
async fn deleting_scopes_removes_their_rows_only() {
    let (backend, store) = memory_store();
    let mut first = store.init_scope();
    let mut second = store.init_scope();
    store
        .put(&with_blank("b"), PutOpts::default().scope(&mut first))
        .await
        .unwrap();
    store
        .put(&with_blank("b"), PutOpts::default().scope(&mut second))
        .await
        .unwrap();
    let quads_only = 2 * store.catalog().len();
    assert_eq!(backend.len(), quads_only + 2);

    store.delete_scope(&first.id).await.unwrap();
    assert!(store.load_scope(&first.id).await.unwrap().is_empty());
    assert_eq!(store.load_scope(&second.id).await.unwrap().len(), 1);

    store.delete_all_scopes().await.unwrap();
    assert!(store.load_scope(&second.id).await.unwrap().is_empty());
    assert_eq!(backend.len(), quads_only);
}
