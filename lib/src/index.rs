//! Physical index permutations.

use std::collections::HashSet;
use std::fmt;

use crate::codec::SEP;
use crate::error::{Result, StoreError};
use crate::term::TermName;

/// One physical ordering of the four quad slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Index {
    pub terms: [TermName; 4],
    /// Key prefix: slot initials followed by the separator.
    pub prefix: String,
}

impl Index {
    pub fn new(terms: [TermName; 4]) -> Result<Self> {
        let distinct: HashSet<_> = terms.iter().collect();
        if distinct.len() != 4 {
            return Err(StoreError::Configuration(format!(
                "index {:?} is not a permutation of subject, predicate, object, graph",
                terms
            )));
        }
        let name: String = terms.iter().map(|t| t.initial()).collect();
        Ok(Index {
            terms,
            prefix: name + SEP,
        })
    }

    /// Parses an ordering from slot initials, e.g. `"GSPO"`.
    pub fn from_initials(initials: &str) -> Result<Self> {
        let names = initials
            .chars()
            .map(|c| {
                TermName::from_initial(c).ok_or_else(|| {
                    StoreError::Configuration(format!("unknown slot initial {:?} in {:?}", c, initials))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Index::try_from(names.as_slice())
    }

    /// Slot initials, e.g. `SPOG`.
    pub fn name(&self) -> &str {
        &self.prefix[..self.prefix.len() - SEP.len()]
    }
}

impl TryFrom<&[TermName]> for Index {
    type Error = StoreError;

    fn try_from(names: &[TermName]) -> Result<Self> {
        let terms: [TermName; 4] = names.try_into().map_err(|_| {
            StoreError::Configuration(format!("index {:?} must name exactly four slots", names))
        })?;
        Index::new(terms)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Initials of the default catalog. Together these serve all 16 subsets of
/// bound slots with a key-prefix scan.
pub const DEFAULT_INDEXES: [&str; 6] = ["SPOG", "OGSP", "GSPO", "SOPG", "POGS", "GPOS"];

pub fn default_catalog() -> Vec<Index> {
    DEFAULT_INDEXES
        .iter()
        .filter_map(|s| Index::from_initials(s).ok())
        .collect()
}

/// Builds a catalog, rejecting an empty list, malformed entries and
/// duplicate orderings.
pub fn build_catalog(orderings: &[Vec<TermName>]) -> Result<Vec<Index>> {
    if orderings.is_empty() {
        return Err(StoreError::Configuration("the index catalog is empty".to_string()));
    }
    let mut seen = HashSet::new();
    let mut catalog = Vec::with_capacity(orderings.len());
    for names in orderings {
        let index = Index::try_from(names.as_slice())?;
        if !seen.insert(index.prefix.clone()) {
            return Err(StoreError::Configuration(format!("duplicate index {}", index)));
        }
        catalog.push(index);
    }
    Ok(catalog)
}
