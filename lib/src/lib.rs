//! RDF quad store over an ordered key-value engine.
//!
//! Every quad is written once per index of a catalog of slot permutations
//! (`SPOG`, `OGSP`, ...), encoded so that byte-wise key order matches term
//! order. A partial pattern is answered with a single range scan over the
//! first index whose ordering starts with the pattern's bound slots.
//!
//! ```
//! use std::sync::Arc;
//! use quadkv::{GetOpts, MemoryBackend, Pattern, PutOpts, Quad, Quadstore, StoreConfig, Term};
//!
//! # tokio_test_block(async {
//! let store = Quadstore::open(Arc::new(MemoryBackend::new()), StoreConfig::default()).unwrap();
//! let q = Quad::new(
//!     Term::named_node("http://ex.org/s"),
//!     Term::named_node("http://ex.org/p"),
//!     Term::literal("o"),
//!     Term::DefaultGraph,
//! );
//! store.put(&q, PutOpts::default()).await.unwrap();
//! let found = store
//!     .get(&Pattern::new().subject(Term::named_node("http://ex.org/s")), GetOpts::default())
//!     .await
//!     .unwrap();
//! assert_eq!(found.items, vec![q]);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod backend;
pub mod codec;
pub mod config;
pub mod consts;
pub mod error;
pub mod index;
pub mod iter;
pub mod options;
pub mod pattern;
pub mod planner;
pub mod prefixes;
pub mod scope;
pub mod store;
pub mod term;
pub mod util;

pub use backend::{Backend, MemoryBackend, RangeCursor, RangeOptions, WriteBatch};
pub use config::{StoreConfig, StoreConfigBuilder};
pub use error::{Result, StoreError};
pub use index::Index;
pub use iter::Pipeline;
pub use options::{DelOpts, Direction, GetOpts, PatchOpts, PutOpts, StreamOpts};
pub use pattern::{ObjectMatch, Pattern, Range};
pub use prefixes::{NoPrefixes, PrefixMap, Prefixes};
pub use scope::Scope;
pub use store::{QuadArrayResult, QuadStream, QuadStreamResult, Quadstore, SizeEstimate};
pub use term::{Literal, Quad, Term, TermName};
