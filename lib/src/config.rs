//! Store configuration: index catalog, scan page size, bulk batch size and
//! IRI prefixes. Loadable from a JSON file.

use std::collections::BTreeMap;
use std::io::{BufReader, Write};
use std::path::Path;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::{build_catalog, Index, DEFAULT_INDEXES};
use crate::prefixes::PrefixMap;
use crate::term::TermName;

fn default_indexes() -> Vec<Vec<TermName>> {
    DEFAULT_INDEXES
        .iter()
        .map(|s| s.chars().filter_map(TermName::from_initial).collect())
        .collect()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Builder)]
#[builder(default, setter(into))]
#[serde(default)]
pub struct StoreConfig {
    /// Index catalog in priority order; each entry is a permutation of the
    /// four slots.
    pub indexes: Vec<Vec<TermName>>,
    /// Entries fetched per engine page.
    pub max_buffer_size: usize,
    /// Quads per committed batch in stream writes.
    pub batch_size: usize,
    /// Prefix to namespace table used to compact IRIs in keys.
    pub prefixes: BTreeMap<String, String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            indexes: default_indexes(),
            max_buffer_size: 256,
            batch_size: 100,
            prefixes: BTreeMap::new(),
        }
    }
}

impl StoreConfig {
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    pub fn from_file(file: &Path) -> Result<Self> {
        let file = std::fs::File::open(file)?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn save_to_file(&self, file: &Path) -> Result<()> {
        let config_str = serde_json::to_string_pretty(&self)?;
        let mut file = std::fs::File::create(file)?;
        file.write_all(config_str.as_bytes())?;
        Ok(())
    }

    /// Validated catalog.
    pub fn catalog(&self) -> Result<Vec<Index>> {
        build_catalog(&self.indexes)
    }

    pub fn prefix_map(&self) -> PrefixMap {
        PrefixMap::from(self.prefixes.clone())
    }
}
