//! IRI compaction applied to named nodes before they are written into keys.
//! Literal datatypes are stored in full.

use std::collections::BTreeMap;

/// Leads an IRI stored verbatim by [`PrefixMap`].
pub const RAW_MARKER: char = '<';

/// Bidirectional IRI shortening. `expand_term(compact_iri(x)) == x` must
/// hold for every IRI the store sees.
pub trait Prefixes: Send + Sync {
    fn compact_iri(&self, iri: &str) -> String;
    fn expand_term(&self, term: &str) -> String;
}

/// Identity mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrefixes;

impl Prefixes for NoPrefixes {
    fn compact_iri(&self, iri: &str) -> String {
        iri.to_string()
    }

    fn expand_term(&self, term: &str) -> String {
        term.to_string()
    }
}

/// Table of `prefix -> namespace` pairs. Compaction picks the longest
/// matching namespace; expansion only rewrites terms whose prefix is known.
///
/// An IRI left uncompacted that would read back as a compacted form (its
/// scheme is a configured prefix, e.g. `urn:x` next to a `urn` prefix) is
/// stored behind a [`RAW_MARKER`], which cannot start a valid IRI.
#[derive(Debug, Clone, Default)]
pub struct PrefixMap {
    by_prefix: BTreeMap<String, String>,
}

impl PrefixMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.insert(prefix, namespace);
        self
    }

    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.by_prefix.insert(prefix.into(), namespace.into());
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }
}

impl From<BTreeMap<String, String>> for PrefixMap {
    fn from(by_prefix: BTreeMap<String, String>) -> Self {
        PrefixMap { by_prefix }
    }
}

impl Prefixes for PrefixMap {
    fn compact_iri(&self, iri: &str) -> String {
        let best = self
            .by_prefix
            .iter()
            .filter(|(_, ns)| !ns.is_empty() && iri.starts_with(ns.as_str()))
            .max_by_key(|(_, ns)| ns.len());
        if let Some((prefix, ns)) = best {
            return format!("{}:{}", prefix, &iri[ns.len()..]);
        }
        let ambiguous = iri.starts_with(RAW_MARKER)
            || iri
                .split_once(':')
                .map_or(false, |(scheme, _)| self.by_prefix.contains_key(scheme));
        if ambiguous {
            format!("{}{}", RAW_MARKER, iri)
        } else {
            iri.to_string()
        }
    }

    fn expand_term(&self, term: &str) -> String {
        if let Some(raw) = term.strip_prefix(RAW_MARKER) {
            return raw.to_string();
        }
        if let Some((prefix, local)) = term.split_once(':') {
            if let Some(ns) = self.by_prefix.get(prefix) {
                return format!("{}{}", ns, local);
            }
        }
        term.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_prefers_longest_namespace() {
        let map = PrefixMap::new()
            .with("ex", "http://example.org/")
            .with("exv", "http://example.org/vocab#");
        assert_eq!(map.compact_iri("http://example.org/vocab#name"), "exv:name");
        assert_eq!(map.compact_iri("http://example.org/alice"), "ex:alice");
        assert_eq!(map.compact_iri("urn:x"), "urn:x");
    }

    #[test]
    fn expand_inverts_compact() {
        let map = PrefixMap::new().with("ex", "http://example.org/");
        for iri in ["http://example.org/a", "http://other.org/b", "urn:isbn:1"] {
            assert_eq!(map.expand_term(&map.compact_iri(iri)), iri);
        }
    }

    #[test]
    fn iris_shaped_like_compact_forms_survive() {
        let map = PrefixMap::new()
            .with("urn", "http://example.org/urn/")
            .with("ex", "http://example.org/");
        assert_eq!(map.compact_iri("urn:isbn:1"), "<urn:isbn:1");
        assert_eq!(map.compact_iri("http://example.org/urn/isbn:1"), "urn:isbn:1");
        for iri in [
            "urn:isbn:1",
            "http://example.org/urn/isbn:1",
            "ex:thing",
            "<odd",
            "mailto:someone@example.org",
        ] {
            assert_eq!(map.expand_term(&map.compact_iri(iri)), iri);
        }
    }
}
