use std::fs::File;
use std::io::BufReader;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{debug, info};
use oxigraph::io::{RdfFormat, RdfParser};
use quadkv::iter::{consume_one_by_one, from_iter};
use quadkv::planner::select_index;
use quadkv::{
    Backend, Direction, GetOpts, MemoryBackend, ObjectMatch, Pattern, Quad, Quadstore, Range, StoreConfig,
    StreamOpts, Term, TermName,
};

#[derive(Debug, Parser)]
#[command(name = "quadkv")]
#[command(about = "Load RDF into an in-memory quadkv store, query it and inspect its keys")]
#[command(arg_required_else_help = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Verbose mode - sets the RUST_LOG level to info, defaults to warning level
    #[clap(long, short, action, default_value = "false", global = true)]
    verbose: bool,
    /// Debug mode - sets the RUST_LOG level to debug, defaults to warning level
    #[clap(long, action, default_value = "false", global = true)]
    debug: bool,
    /// JSON store configuration (index catalog, page and batch sizes, prefixes)
    #[clap(long, short, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct PatternArgs {
    /// Subject term, e.g. `<http://ex.org/s>` or `_:b0`. Bare IRIs are accepted.
    #[clap(long, short)]
    subject: Option<String>,
    /// Predicate term
    #[clap(long, short)]
    predicate: Option<String>,
    /// Object term
    #[clap(long, short, conflicts_with_all = ["gt", "gte", "lt", "lte"])]
    object: Option<String>,
    /// Graph term; `default` selects the default graph
    #[clap(long, short)]
    graph: Option<String>,
    /// Object strictly greater than this literal
    #[clap(long, conflicts_with = "gte")]
    gt: Option<String>,
    /// Object greater than or equal to this literal
    #[clap(long)]
    gte: Option<String>,
    /// Object strictly less than this literal
    #[clap(long, conflicts_with = "lte")]
    lt: Option<String>,
    /// Object less than or equal to this literal
    #[clap(long)]
    lte: Option<String>,
    /// Requested order as slot initials, e.g. `PO`
    #[clap(long)]
    order: Option<String>,
    /// Maximum number of quads to return
    #[clap(long, short)]
    limit: Option<usize>,
    /// Return quads in reverse order
    #[clap(long, action, default_value = "false")]
    reverse: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Load RDF files and report how many quads and keys were written
    Load {
        /// Files to load; the format is taken from the extension
        files: Vec<PathBuf>,
        /// Quads per committed batch
        #[clap(long, short)]
        batch_size: Option<usize>,
    },
    /// Load RDF files and print the quads matching a pattern as N-Quads
    Query {
        #[command(flatten)]
        pattern: PatternArgs,
        files: Vec<PathBuf>,
    },
    /// Show which index and key range would serve a pattern
    Explain {
        #[command(flatten)]
        pattern: PatternArgs,
        /// Print the plan as JSON
        #[clap(long, action, default_value = "false")]
        json: bool,
    },
    /// Load RDF files and dump the physical keys of one index
    Keys {
        files: Vec<PathBuf>,
        /// Index name, e.g. `SPOG`; defaults to the first index of the catalog
        #[clap(long, short)]
        index: Option<String>,
    },
}

fn infer_rdf_format(file: &Path) -> RdfFormat {
    let ext = file
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("nq" | "nquads") => RdfFormat::NQuads,
        Some("trig") => RdfFormat::TriG,
        Some("nt" | "ntriples") => RdfFormat::NTriples,
        Some("rdf" | "xml" | "rdfxml") => RdfFormat::RdfXml,
        Some("n3") => RdfFormat::N3,
        _ => RdfFormat::Turtle,
    }
}

fn read_file(file: &Path) -> Result<Vec<quadkv::Result<Quad>>> {
    debug!("Reading file: {}", file.display());
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("cannot open {}", file.display()))?,
    );
    let parser = RdfParser::from_format(infer_rdf_format(file)).for_reader(reader);
    let mut quads = Vec::new();
    for quad in parser {
        let quad = quad.with_context(|| format!("cannot parse {}", file.display()))?;
        quads.push(Ok(Quad::from(quad)));
    }
    Ok(quads)
}

/// Parses a term written in N-Triples syntax. A bare IRI is read as a named
/// node and `default` as the default graph.
fn parse_term(s: &str) -> Result<Term> {
    let s = s.trim();
    if s == "default" {
        return Ok(Term::DefaultGraph);
    }
    if !s.starts_with(['<', '_', '"']) {
        return Ok(Term::named_node(s));
    }
    let term = oxigraph::model::Term::from_str(s).map_err(|e| anyhow!("invalid term {s}: {e}"))?;
    Ok(Term::from(term))
}

fn parse_order(s: &str) -> Result<Vec<TermName>> {
    s.chars()
        .map(|c| {
            TermName::from_initial(c.to_ascii_uppercase())
                .ok_or_else(|| anyhow!("unknown slot '{c}' in order {s}"))
        })
        .collect()
}

impl PatternArgs {
    fn pattern(&self) -> Result<Pattern> {
        let term = |s: &Option<String>| s.as_deref().map(parse_term).transpose();
        let mut pattern = Pattern {
            subject: term(&self.subject)?,
            predicate: term(&self.predicate)?,
            object: term(&self.object)?.map(ObjectMatch::Term),
            graph: term(&self.graph)?,
        };
        let mut range = Range::new();
        if let Some(t) = term(&self.gt)? {
            range = range.gt(t);
        }
        if let Some(t) = term(&self.gte)? {
            range = range.gte(t);
        }
        if let Some(t) = term(&self.lt)? {
            range = range.lt(t);
        }
        if let Some(t) = term(&self.lte)? {
            range = range.lte(t);
        }
        if range != Range::new() {
            pattern.object = Some(ObjectMatch::Range(range));
        }
        Ok(pattern)
    }

    fn opts(&self) -> Result<GetOpts> {
        let mut opts = GetOpts::default().direction(Direction::from(self.reverse));
        if let Some(order) = &self.order {
            opts = opts.order(parse_order(order)?);
        }
        if let Some(limit) = self.limit {
            opts = opts.limit(limit);
        }
        Ok(opts)
    }
}

fn order_name(order: &[TermName]) -> String {
    order.iter().map(|n| n.initial()).collect()
}

fn bound_string(bound: &Bound<String>) -> String {
    match bound {
        Bound::Included(k) => format!("[{}", k.escape_debug()),
        Bound::Excluded(k) => format!("({}", k.escape_debug()),
        Bound::Unbounded => "unbounded".to_string(),
    }
}

async fn load_files(store: &Quadstore, files: &[PathBuf], batch_size: Option<usize>) -> Result<usize> {
    let mut total = 0;
    for file in files {
        let quads = read_file(file)?;
        let count = quads.len();
        let mut opts = StreamOpts::default();
        if let Some(size) = batch_size {
            opts = opts.batch_size(size);
        }
        store
            .put_stream(from_iter(quads), opts)
            .await
            .with_context(|| format!("cannot store {}", file.display()))?;
        info!("Loaded {} quads from {}", count, file.display());
        total += count;
    }
    Ok(total)
}

async fn run(cmd: Cli) -> Result<()> {
    let config = match &cmd.config {
        Some(path) => StoreConfig::from_file(path)
            .with_context(|| format!("cannot read config {}", path.display()))?,
        None => StoreConfig::default(),
    };
    let backend = MemoryBackend::new();
    let store = Quadstore::open(Arc::new(backend.clone()), config)?;

    match cmd.command {
        Commands::Load { files, batch_size } => {
            let total = load_files(&store, &files, batch_size).await?;
            println!(
                "Loaded {} quads into {} indexes ({} keys)",
                total,
                store.catalog().len(),
                backend.len()
            );
        }
        Commands::Query { pattern, files } => {
            load_files(&store, &files, None).await?;
            let result = store.get_stream(&pattern.pattern()?, pattern.opts()?)?;
            info!(
                "Served by index {} in order {}{}",
                order_name(&result.index),
                order_name(&result.order),
                if result.resorted { " (resorted)" } else { "" }
            );
            consume_one_by_one(result.iterator, |quad| {
                println!("{quad}");
                std::future::ready(Ok(()))
            })
            .await?;
        }
        Commands::Explain { pattern, json } => {
            let opts = pattern.opts()?;
            let plan = select_index(
                &pattern.pattern()?,
                store.catalog(),
                store.prefixes(),
                opts.order.as_deref(),
            )?;
            if json {
                let value = serde_json::json!({
                    "index": plan.query.index.name(),
                    "order": plan.order,
                    "resorted": plan.resorted,
                    "filtered": plan.query.filtered,
                    "lower": bound_string(&plan.query.lower),
                    "upper": bound_string(&plan.query.upper),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("index:    {}", plan.query.index.name());
                println!("order:    {}", order_name(&plan.order));
                println!("resorted: {}", plan.resorted);
                println!("filtered: {}", plan.query.filtered);
                println!("lower:    {}", bound_string(&plan.query.lower));
                println!("upper:    {}", bound_string(&plan.query.upper));
            }
        }
        Commands::Keys { files, index } => {
            load_files(&store, &files, None).await?;
            let index = match index {
                Some(name) => store
                    .catalog()
                    .iter()
                    .find(|i| i.name().eq_ignore_ascii_case(&name))
                    .ok_or_else(|| anyhow!("index {name} is not in the catalog"))?,
                None => store
                    .catalog()
                    .first()
                    .ok_or_else(|| anyhow!("the catalog is empty"))?,
            };
            let prefix = index.prefix.clone();
            let range = quadkv::RangeOptions::new(
                Bound::Included(prefix.clone()),
                Bound::Included(format!("{}{}", prefix, quadkv::codec::BOUNDARY)),
            );
            let scan = quadkv::iter::PagedScan::new(store.backend().iterator(range), store.config().max_buffer_size);
            consume_one_by_one(scan, |page| {
                for (key, _) in page {
                    println!("{}", key.escape_debug());
                }
                std::future::ready(Ok(()))
            })
            .await?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cmd = Cli::parse();

    let log_level = if cmd.verbose { "info" } else { "warn" };
    let log_level = if cmd.debug { "debug" } else { log_level };
    std::env::set_var("RUST_LOG", log_level);
    env_logger::init();

    let rt = tokio::runtime::Builder::new_current_thread().build()?;
    rt.block_on(run(cmd))
}
