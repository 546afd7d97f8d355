//! Blank node relabeling that survives across write sessions.
//!
//! A scope maps blank node labels seen in incoming quads to fresh random
//! labels, so that independently parsed documents never collide on `_:b0`.
//! Each mapping is persisted as a row `SCOPE/<id>/<original>` whose value is
//! the JSON array `["<original>", "<generated>"]`, staged into the same batch
//! as the quads that introduced it.

use std::collections::HashMap;
use std::ops::Bound;

use log::{debug, info};

use crate::backend::{Backend, RangeOptions, WriteBatch};
use crate::codec::BOUNDARY;
use crate::error::Result;
use crate::iter::{collect, Flatten, PagedScan};
use crate::term::{Quad, Term};
use crate::util::uid;

const SCOPE_ROOT: &str = "SCOPE/";

fn key_range(scope_id: Option<&str>) -> RangeOptions {
    let lower = match scope_id {
        Some(id) => format!("{}{}/", SCOPE_ROOT, id),
        None => SCOPE_ROOT.to_string(),
    };
    let upper = format!("{}{}", lower, BOUNDARY);
    RangeOptions::new(Bound::Included(lower), Bound::Included(upper))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub id: String,
    blank_nodes: HashMap<String, String>,
}

impl Scope {
    /// New scope with a random id and no mappings.
    pub fn init() -> Self {
        Scope {
            id: uid(),
            blank_nodes: HashMap::new(),
        }
    }

    /// Rebuilds a scope from its persisted rows.
    pub async fn load(backend: &dyn Backend, scope_id: &str, page_size: usize) -> Result<Self> {
        let scan = PagedScan::new(backend.iterator(key_range(Some(scope_id))), page_size);
        let rows = Flatten::new(scan, |(_, value): (String, Vec<u8>)| {
            Ok(serde_json::from_slice::<(String, String)>(&value)?)
        });
        let blank_nodes: HashMap<String, String> = collect(rows).await?.into_iter().collect();
        debug!("loaded scope {} with {} mapping(s)", scope_id, blank_nodes.len());
        Ok(Scope {
            id: scope_id.to_string(),
            blank_nodes,
        })
    }

    /// Deletes the rows of one scope, or of every scope when `scope_id` is
    /// `None`, in a single batch.
    pub async fn delete(backend: &dyn Backend, scope_id: Option<&str>, page_size: usize) -> Result<()> {
        let scan = PagedScan::new(backend.iterator(key_range(scope_id)), page_size);
        let keys = Flatten::new(scan, |(key, _): (String, Vec<u8>)| Ok(key));
        let mut batch = WriteBatch::new();
        for key in collect(keys).await? {
            batch.del(key);
        }
        info!(
            "deleting {} scope row(s) for {}",
            batch.len(),
            scope_id.unwrap_or("all scopes")
        );
        backend.write(batch).await
    }

    pub fn len(&self) -> usize {
        self.blank_nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blank_nodes.is_empty()
    }

    /// Generated label for `original`, if one was assigned.
    pub fn mapped(&self, original: &str) -> Option<&str> {
        self.blank_nodes.get(original).map(String::as_str)
    }

    fn relabel(&mut self, term: &Term, batch: &mut WriteBatch) -> Result<Term> {
        let Term::BlankNode(original) = term else {
            return Ok(term.clone());
        };
        if let Some(generated) = self.blank_nodes.get(original) {
            return Ok(Term::BlankNode(generated.clone()));
        }
        let generated = uid();
        let row = serde_json::to_vec(&(original, &generated))?;
        batch.put(format!("{}{}/{}", SCOPE_ROOT, self.id, original), row);
        self.blank_nodes.insert(original.clone(), generated.clone());
        Ok(Term::BlankNode(generated))
    }

    /// Relabels the blank nodes in subject, object and graph position. New
    /// mappings are staged into `batch`.
    pub fn parse_quad(&mut self, quad: &Quad, batch: &mut WriteBatch) -> Result<Quad> {
        Ok(Quad::new(
            self.relabel(&quad.subject, batch)?,
            quad.predicate.clone(),
            self.relabel(&quad.object, batch)?,
            self.relabel(&quad.graph, batch)?,
        ))
    }
}
