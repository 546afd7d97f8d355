#![allow(dead_code)]

use std::sync::Arc;

use quadkv::consts::{XSD_DECIMAL, XSD_DOUBLE, XSD_INTEGER};
use quadkv::{MemoryBackend, Quad, Quadstore, StoreConfig, Term};

// Builds a quad from IRIs. The three-argument form lands in the default graph.
#[macro_export]
macro_rules! quad {
    ($s:expr, $p:expr, $o:expr) => {
        quadkv::Quad::new(
            quadkv::Term::named_node($s),
            quadkv::Term::named_node($p),
            $o,
            quadkv::Term::DefaultGraph,
        )
    };
    ($s:expr, $p:expr, $o:expr, $g:expr) => {
        quadkv::Quad::new(
            quadkv::Term::named_node($s),
            quadkv::Term::named_node($p),
            $o,
            quadkv::Term::named_node($g),
        )
    };
}

pub fn nn(iri: &str) -> Term {
    Term::named_node(iri)
}

pub fn int(v: &str) -> Term {
    Term::typed_literal(v, XSD_INTEGER)
}

pub fn decimal(v: &str) -> Term {
    Term::typed_literal(v, XSD_DECIMAL)
}

pub fn double(v: &str) -> Term {
    Term::typed_literal(v, XSD_DOUBLE)
}

pub fn memory_store() -> (MemoryBackend, Quadstore) {
    store_with(StoreConfig::default())
}

pub fn store_with(config: StoreConfig) -> (MemoryBackend, Quadstore) {
    let backend = MemoryBackend::new();
    let store = Quadstore::open(Arc::new(backend.clone()), config).unwrap();
    (backend, store)
}

/// Order-insensitive comparison of quad lists.
pub fn same_quads(mut left: Vec<Quad>, mut right: Vec<Quad>) {
    let key = |q: &Quad| q.to_string();
    left.sort_by_key(key);
    right.sort_by_key(key);
    assert_eq!(left, right);
}
