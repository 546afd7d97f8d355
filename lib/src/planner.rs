//! Turns a pattern into a key range over one index of the catalog.

use std::ops::{Bound, RangeBounds};

use log::{debug, warn};

use crate::codec::{write_term, SerializedTerm, BOUNDARY, SEP};
use crate::error::{Result, StoreError};
use crate::index::Index;
use crate::pattern::{ObjectMatch, Pattern, Range, SlotMatch};
use crate::prefixes::Prefixes;
use crate::term::{Quad, Term, TermName};

/// Key range over a single index that yields the quads matching a pattern,
/// or a superset of them when `filtered` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    pub index: Index,
    pub lower: Bound<String>,
    pub upper: Bound<String>,
    /// Order in which the scan yields quads: the index slots that are not
    /// pinned by equality.
    pub order: Vec<TermName>,
    /// Bound slots covered by the key range.
    pub matched: usize,
    /// The range is wider than the pattern and results need [`QuadFilter`].
    pub filtered: bool,
}

/// Outcome of index selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub query: IndexQuery,
    /// Order the caller will observe.
    pub order: Vec<TermName>,
    /// True when the scan order does not satisfy the requested order and
    /// results must be sorted in memory.
    pub resorted: bool,
}

fn region(base: &str, term: &SerializedTerm) -> String {
    let mut s = String::with_capacity(base.len() + 1 + term.value.len());
    s.push_str(base);
    s.push(term.tag);
    s.push_str(term.sort_region());
    s
}

fn range_bounds(
    base: &str,
    range: &Range,
    prefixes: &dyn Prefixes,
) -> Result<(Bound<String>, Bound<String>)> {
    let lower = range
        .lower
        .as_ref()
        .map(|b| Ok::<_, StoreError>((write_term(&b.value, prefixes)?, b.inclusive)))
        .transpose()?;
    let upper = range
        .upper
        .as_ref()
        .map(|b| Ok::<_, StoreError>((write_term(&b.value, prefixes)?, b.inclusive)))
        .transpose()?;

    let lo = match (&lower, &upper) {
        (Some((t, true)), _) => Bound::Included(region(base, t)),
        (Some((t, false)), _) => Bound::Excluded(region(base, t) + SEP + BOUNDARY),
        (None, Some((t, _))) => Bound::Included(format!("{}{}", base, t.tag)),
        (None, None) => Bound::Included(base.to_string()),
    };
    let hi = match (&upper, &lower) {
        (Some((t, true)), _) => Bound::Included(region(base, t) + SEP + BOUNDARY),
        (Some((t, false)), _) => Bound::Excluded(region(base, t)),
        (None, Some((t, _))) => Bound::Included(format!("{}{}{}", base, t.tag, BOUNDARY)),
        (None, None) => Bound::Included(base.to_string() + BOUNDARY),
    };
    Ok((lo, hi))
}

fn scan_query(pattern: &Pattern, index: &Index, prefixes: &dyn Prefixes) -> Result<IndexQuery> {
    let mut base = index.prefix.clone();
    let mut matched = 0;
    let mut pinned = 0;
    let mut ranged = None;
    for name in index.terms {
        match pattern.slot(name) {
            None => break,
            Some(SlotMatch::Exact(term)) => {
                let t = write_term(term, prefixes)?;
                base.push(t.tag);
                base.push_str(&t.value);
                base.push_str(SEP);
                matched += 1;
                pinned += 1;
            }
            Some(SlotMatch::Range(range)) => {
                ranged = Some(range);
                matched += 1;
                break;
            }
        }
    }
    let (lower, upper) = match ranged {
        Some(range) => range_bounds(&base, range, prefixes)?,
        None => (
            Bound::Included(base.clone()),
            Bound::Included(base + BOUNDARY),
        ),
    };
    Ok(IndexQuery {
        index: index.clone(),
        lower,
        upper,
        order: index.terms[pinned..].to_vec(),
        matched,
        filtered: matched != pattern.bound_count(),
    })
}

/// Computes the scan range for `pattern` on `index`, or `None` when the
/// pattern's bound slots are not a leading prefix of the index ordering.
pub fn write_pattern(
    pattern: &Pattern,
    index: &Index,
    prefixes: &dyn Prefixes,
) -> Result<Option<IndexQuery>> {
    let query = scan_query(pattern, index, prefixes)?;
    Ok((!query.filtered).then_some(query))
}

/// Best index for `pattern`, ignoring order: the first one that serves it
/// exactly, otherwise the one whose key prefix covers the most bound slots.
pub fn find_index(
    pattern: &Pattern,
    catalog: &[Index],
    prefixes: &dyn Prefixes,
) -> Result<IndexQuery> {
    let mut best: Option<IndexQuery> = None;
    for index in catalog {
        let query = scan_query(pattern, index, prefixes)?;
        if !query.filtered {
            return Ok(query);
        }
        if best.as_ref().map_or(true, |b| query.matched > b.matched) {
            best = Some(query);
        }
    }
    best.ok_or_else(|| StoreError::Configuration("the index catalog is empty".to_string()))
}

/// Picks the first index that serves `pattern` in the requested `order`,
/// falling back to the best serving index flagged for an in-memory resort.
/// When no index has the bound slots as a key prefix, the plan scans a wider
/// range and is flagged `filtered`.
pub fn select_index(
    pattern: &Pattern,
    catalog: &[Index],
    prefixes: &dyn Prefixes,
    order: Option<&[TermName]>,
) -> Result<Plan> {
    for index in catalog {
        if let Some(query) = write_pattern(pattern, index, prefixes)? {
            let satisfied = order.map_or(true, |o| query.order.starts_with(o));
            if satisfied {
                debug!("pattern served by index {} in scan order", index);
                let order = order.map_or_else(|| query.order.clone(), <[TermName]>::to_vec);
                return Ok(Plan {
                    query,
                    order,
                    resorted: false,
                });
            }
        }
    }
    let query = find_index(pattern, catalog, prefixes)?;
    if query.filtered {
        warn!(
            "no index has the {} bound slot(s) as a key prefix; filtering a scan of index {} in memory",
            pattern.bound_count(),
            query.index
        );
    }
    let resorted = order.map_or(false, |o| !query.order.starts_with(o));
    if resorted {
        warn!(
            "no index yields order {:?}; sorting results from index {} in memory",
            order.unwrap_or_default(),
            query.index
        );
    }
    let order = order.map_or_else(|| query.order.clone(), <[TermName]>::to_vec);
    Ok(Plan {
        query,
        order,
        resorted,
    })
}

/// In-memory check of a decoded quad against every bound slot of a pattern.
/// Object ranges compare encoded terms exactly as a key range scan would.
#[derive(Debug, Clone)]
pub struct QuadFilter {
    pattern: Pattern,
    range: Option<(Bound<String>, Bound<String>)>,
}

impl QuadFilter {
    pub fn new(pattern: &Pattern, prefixes: &dyn Prefixes) -> Result<Self> {
        let range = match &pattern.object {
            Some(ObjectMatch::Range(range)) => Some(range_bounds("", range, prefixes)?),
            _ => None,
        };
        Ok(QuadFilter {
            pattern: pattern.clone(),
            range,
        })
    }

    pub fn matches(&self, quad: &Quad, prefixes: &dyn Prefixes) -> Result<bool> {
        let exact = |bound: &Option<Term>, term: &Term| bound.as_ref().map_or(true, |b| b == term);
        if !(exact(&self.pattern.subject, &quad.subject)
            && exact(&self.pattern.predicate, &quad.predicate)
            && exact(&self.pattern.graph, &quad.graph))
        {
            return Ok(false);
        }
        match (&self.pattern.object, &self.range) {
            (Some(ObjectMatch::Term(t)), _) => Ok(*t == quad.object),
            (Some(ObjectMatch::Range(_)), Some((lower, upper))) => {
                let t = write_term(&quad.object, prefixes)?;
                let mut encoded = String::with_capacity(t.value.len() + 1 + SEP.len());
                encoded.push(t.tag);
                encoded.push_str(&t.value);
                encoded.push_str(SEP);
                Ok((lower.as_ref(), upper.as_ref()).contains(&encoded))
            }
            _ => Ok(true),
        }
    }
}
