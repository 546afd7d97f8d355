//! The quad store: writes quads into every index of the catalog and answers
//! pattern queries from the best-fitting one.

use std::sync::Arc;

use futures::StreamExt;
use log::{debug, info};

use crate::backend::{Backend, RangeOptions, WriteBatch};
use crate::codec::{QuadReader, QuadWriter};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::index::Index;
use crate::iter::{
    collect, consume_in_batches, wrap, Filter, Flatten, PagedScan, Pipeline, SortingStream,
};
use crate::options::{DelOpts, GetOpts, PatchOpts, PreWrite, PutOpts, StreamOpts};
use crate::pattern::{ObjectMatch, Pattern};
use crate::planner::{select_index, QuadFilter};
use crate::prefixes::Prefixes;
use crate::scope::Scope;
use crate::term::{Quad, Term, TermName};

/// Stream of decoded quads.
pub type QuadStream = Box<dyn Pipeline<Item = Result<Quad>>>;

/// Result of [`Quadstore::get_stream`].
pub struct QuadStreamResult {
    /// Order in which quads are emitted.
    pub order: Vec<TermName>,
    /// Ordering of the index that served the query.
    pub index: Vec<TermName>,
    pub resorted: bool,
    pub iterator: QuadStream,
}

/// Result of [`Quadstore::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuadArrayResult {
    pub items: Vec<Quad>,
    pub order: Vec<TermName>,
    pub index: Vec<TermName>,
    pub resorted: bool,
}

/// Estimated number of quads matching a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeEstimate {
    /// The engine cannot estimate range sizes.
    Infinite,
    /// Engine estimate, never below 1.
    Approximate(u64),
}

pub struct Quadstore {
    backend: Arc<dyn Backend>,
    catalog: Vec<Index>,
    prefixes: Arc<dyn Prefixes>,
    config: StoreConfig,
}

impl Quadstore {
    /// Opens a store over `backend`, validating the configured catalog.
    pub fn open(backend: Arc<dyn Backend>, config: StoreConfig) -> Result<Self> {
        let catalog = config.catalog()?;
        let prefixes: Arc<dyn Prefixes> = Arc::new(config.prefix_map());
        info!(
            "opened quad store with indexes [{}]",
            catalog.iter().map(|i| i.name()).collect::<Vec<_>>().join(", ")
        );
        Ok(Quadstore {
            backend,
            catalog,
            prefixes,
            config,
        })
    }

    /// Replaces the configured prefix table with a custom implementation.
    pub fn with_prefixes(mut self, prefixes: Arc<dyn Prefixes>) -> Self {
        self.prefixes = prefixes;
        self
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn catalog(&self) -> &[Index] {
        &self.catalog
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn prefixes(&self) -> &dyn Prefixes {
        &*self.prefixes
    }

    fn stage_put(&self, quad: &Quad, batch: &mut WriteBatch) -> Result<()> {
        let writer = QuadWriter::ingest(quad, &*self.prefixes)?;
        for index in &self.catalog {
            batch.put(writer.write(&index.prefix, &index.terms)?, Vec::<u8>::new());
        }
        Ok(())
    }

    fn stage_del(&self, quad: &Quad, batch: &mut WriteBatch) -> Result<()> {
        let writer = QuadWriter::ingest(quad, &*self.prefixes)?;
        for index in &self.catalog {
            batch.del(writer.write(&index.prefix, &index.terms)?);
        }
        Ok(())
    }

    async fn commit(&self, mut batch: WriteBatch, pre_write: Option<PreWrite<'_>>) -> Result<()> {
        if let Some(f) = pre_write {
            f(&mut batch)?;
        }
        debug!("committing batch of {} operation(s)", batch.len());
        self.backend.write(batch).await
    }

    fn stage_scoped_puts(
        &self,
        quads: &[Quad],
        mut scope: Option<&mut Scope>,
        batch: &mut WriteBatch,
    ) -> Result<()> {
        for quad in quads {
            match scope.as_deref_mut() {
                Some(scope) => {
                    let relabeled = scope.parse_quad(quad, batch)?;
                    self.stage_put(&relabeled, batch)?;
                }
                None => self.stage_put(quad, batch)?,
            }
        }
        Ok(())
    }

    pub async fn put(&self, quad: &Quad, opts: PutOpts<'_>) -> Result<()> {
        self.multi_put(std::slice::from_ref(quad), opts).await
    }

    /// Writes all `quads` in one atomic batch.
    pub async fn multi_put(&self, quads: &[Quad], opts: PutOpts<'_>) -> Result<()> {
        let mut batch = WriteBatch::new();
        self.stage_scoped_puts(quads, opts.scope, &mut batch)?;
        self.commit(batch, opts.pre_write).await
    }

    pub async fn del(&self, quad: &Quad, opts: DelOpts<'_>) -> Result<()> {
        self.multi_del(std::slice::from_ref(quad), opts).await
    }

    pub async fn multi_del(&self, quads: &[Quad], opts: DelOpts<'_>) -> Result<()> {
        let mut batch = WriteBatch::new();
        for quad in quads {
            self.stage_del(quad, &mut batch)?;
        }
        self.commit(batch, opts.pre_write).await
    }

    /// Replaces `old` with `new` atomically.
    pub async fn patch(&self, old: &Quad, new: &Quad, opts: PatchOpts<'_>) -> Result<()> {
        self.multi_patch(std::slice::from_ref(old), std::slice::from_ref(new), opts)
            .await
    }

    /// Deletes every quad of `old` and writes every quad of `new` in one
    /// atomic batch.
    pub async fn multi_patch(&self, old: &[Quad], new: &[Quad], opts: PatchOpts<'_>) -> Result<()> {
        let mut batch = WriteBatch::new();
        for quad in old {
            self.stage_del(quad, &mut batch)?;
        }
        for quad in new {
            self.stage_put(quad, &mut batch)?;
        }
        self.commit(batch, opts.pre_write).await
    }

    /// Streams the quads matching `pattern`.
    ///
    /// When no index yields the requested order, the whole match set is
    /// buffered and sorted in memory, and the result is flagged `resorted`.
    /// When no index has the bound slots as a key prefix, a wider range is
    /// scanned and non-matching quads are dropped before sorting.
    pub fn get_stream(&self, pattern: &Pattern, opts: GetOpts) -> Result<QuadStreamResult> {
        let plan = select_index(pattern, &self.catalog, &*self.prefixes, opts.order.as_deref())?;
        let filter = plan
            .query
            .filtered
            .then(|| QuadFilter::new(pattern, &*self.prefixes))
            .transpose()?;
        let reverse = opts.direction.is_reverse();
        let page_size = opts.max_buffer_size.unwrap_or(self.config.max_buffer_size);

        let mut range = RangeOptions::new(plan.query.lower.clone(), plan.query.upper.clone());
        if !plan.resorted {
            range = range.reverse(reverse);
            if !plan.query.filtered {
                range = range.limit(opts.limit);
            }
        }
        let scan = PagedScan::new(self.backend.iterator(range), page_size);

        let index = plan.query.index.clone();
        let prefixes = self.prefixes.clone();
        let decoded = Flatten::new(scan, move |(key, _): (String, Vec<u8>)| {
            QuadReader::read(&key, index.prefix.len(), &index.terms, &*prefixes)
        });
        let quads: QuadStream = if let Some(filter) = filter {
            let prefixes = self.prefixes.clone();
            let kept = Filter::new(decoded, move |q: &Quad| filter.matches(q, &*prefixes));
            match opts.limit {
                // Counted after filtering.
                Some(n) if !plan.resorted => Box::new(wrap(kept.take(n))),
                _ => Box::new(kept),
            }
        } else {
            Box::new(decoded)
        };

        let iterator: QuadStream = if plan.resorted {
            let order = plan.order.clone();
            let prefixes = self.prefixes.clone();
            let digest = move |q: &Quad| -> Result<String> {
                QuadWriter::ingest(q, &*prefixes)?.write("", &order)
            };
            Box::new(SortingStream::new(quads, digest, reverse, opts.limit))
        } else {
            quads
        };
        Ok(QuadStreamResult {
            order: plan.order,
            index: plan.query.index.terms.to_vec(),
            resorted: plan.resorted,
            iterator,
        })
    }

    /// Collects the quads matching `pattern`.
    pub async fn get(&self, pattern: &Pattern, opts: GetOpts) -> Result<QuadArrayResult> {
        let QuadStreamResult {
            order,
            index,
            resorted,
            iterator,
        } = self.get_stream(pattern, opts)?;
        let items = collect(iterator).await?;
        Ok(QuadArrayResult {
            items,
            order,
            index,
            resorted,
        })
    }

    /// Streams quads matching the given terms; `None` leaves a slot unbound.
    pub fn match_quads(
        &self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
        graph: Option<&Term>,
    ) -> Result<QuadStream> {
        let pattern = Pattern {
            subject: subject.cloned(),
            predicate: predicate.cloned(),
            object: object.cloned().map(ObjectMatch::Term),
            graph: graph.cloned(),
        };
        Ok(self.get_stream(&pattern, GetOpts::default())?.iterator)
    }

    /// Estimated number of quads matching `pattern`.
    pub async fn get_approximate_size(&self, pattern: &Pattern, opts: &GetOpts) -> Result<SizeEstimate> {
        let plan = select_index(pattern, &self.catalog, &*self.prefixes, opts.order.as_deref())?;
        let size = self
            .backend
            .approximate_size(&plan.query.lower, &plan.query.upper)
            .await?;
        Ok(match size {
            Some(n) => SizeEstimate::Approximate(n.max(1)),
            None => SizeEstimate::Infinite,
        })
    }

    /// Writes quads from `source` in batches of `batch_size`. Each batch is
    /// atomic; the whole stream is not.
    pub async fn put_stream<P>(&self, source: P, opts: StreamOpts<'_>) -> Result<()>
    where
        P: Pipeline<Item = Result<Quad>>,
    {
        let batch_size = opts.batch_size.unwrap_or(self.config.batch_size);
        let mut scope = opts.scope;
        let mut written = 0usize;
        consume_in_batches(source, batch_size, |quads| {
            let mut batch = WriteBatch::new();
            let staged = self.stage_scoped_puts(&quads, scope.as_deref_mut(), &mut batch);
            written += quads.len();
            async move {
                staged?;
                self.backend.write(batch).await
            }
        })
        .await?;
        debug!("put_stream wrote {} quad(s)", written);
        Ok(())
    }

    /// Deletes quads from `source` in batches of `batch_size`.
    pub async fn del_stream<P>(&self, source: P, opts: StreamOpts<'_>) -> Result<()>
    where
        P: Pipeline<Item = Result<Quad>>,
    {
        let batch_size = opts.batch_size.unwrap_or(self.config.batch_size);
        consume_in_batches(source, batch_size, |quads| {
            let mut batch = WriteBatch::new();
            let staged = quads.iter().try_for_each(|q| self.stage_del(q, &mut batch));
            async move {
                staged?;
                self.backend.write(batch).await
            }
        })
        .await
    }

    /// Deletes every quad matching `pattern`.
    pub async fn remove_matches(&self, pattern: &Pattern, opts: StreamOpts<'_>) -> Result<()> {
        let matches = self.get_stream(pattern, GetOpts::default())?.iterator;
        self.del_stream(matches, opts).await
    }

    pub fn init_scope(&self) -> Scope {
        Scope::init()
    }

    pub async fn load_scope(&self, scope_id: &str) -> Result<Scope> {
        Scope::load(&*self.backend, scope_id, self.config.max_buffer_size).await
    }

    pub async fn delete_scope(&self, scope_id: &str) -> Result<()> {
        Scope::delete(&*self.backend, Some(scope_id), self.config.max_buffer_size).await
    }

    pub async fn delete_all_scopes(&self) -> Result<()> {
        Scope::delete(&*self.backend, None, self.config.max_buffer_size).await
    }
}
