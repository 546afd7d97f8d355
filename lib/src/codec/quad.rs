use crate::codec::{
    decode_length, encode_length, read_term, slice, write_term, ReadingState, SerializedTerm,
    LENGTH_WIDTH, SEP,
};
use crate::error::{Result, StoreError};
use crate::prefixes::Prefixes;
use crate::term::{Quad, TermName};

fn slot(name: TermName) -> usize {
    match name {
        TermName::Subject => 0,
        TermName::Predicate => 1,
        TermName::Object => 2,
        TermName::Graph => 3,
    }
}

/// A quad whose four terms have been encoded once, ready to be written
/// under any number of index orderings.
#[derive(Debug, Clone)]
pub struct QuadWriter {
    terms: [SerializedTerm; 4],
}

impl QuadWriter {
    pub fn ingest(quad: &Quad, prefixes: &dyn Prefixes) -> Result<Self> {
        Ok(QuadWriter {
            terms: [
                write_term(&quad.subject, prefixes)?,
                write_term(&quad.predicate, prefixes)?,
                write_term(&quad.object, prefixes)?,
                write_term(&quad.graph, prefixes)?,
            ],
        })
    }

    pub fn term(&self, name: TermName) -> &SerializedTerm {
        &self.terms[slot(name)]
    }

    /// Emits `prefix` followed by the terms named in `order`. Any subset of
    /// slots is accepted; partial orders are used to build sort digests.
    pub fn write(&self, prefix: &str, order: &[TermName]) -> Result<String> {
        let mut key = String::with_capacity(
            prefix.len()
                + order
                    .iter()
                    .map(|n| self.term(*n).value.len() + 8)
                    .sum::<usize>(),
        );
        let mut lengths = String::new();
        key.push_str(prefix);
        for name in order {
            let t = self.term(*name);
            key.push(t.tag);
            key.push_str(&t.value);
            key.push_str(SEP);
            lengths.push_str(&t.lengths);
        }
        key.push_str(&lengths);
        key.push_str(&encode_length(lengths.len())?);
        Ok(key)
    }
}

/// Decodes full physical keys back into quads.
pub struct QuadReader;

impl QuadReader {
    pub fn read(
        key: &str,
        prefix_len: usize,
        order: &[TermName],
        prefixes: &dyn Prefixes,
    ) -> Result<Quad> {
        if order.len() != 4 {
            return Err(StoreError::codec(format!(
                "cannot decode a quad from a {}-term ordering",
                order.len()
            )));
        }
        let trailer_at = key
            .len()
            .checked_sub(LENGTH_WIDTH)
            .ok_or_else(|| StoreError::codec("key shorter than its length trailer"))?;
        let lengths_len = decode_length(slice(key, trailer_at, LENGTH_WIDTH)?)?;
        let lengths_offset = trailer_at
            .checked_sub(lengths_len)
            .ok_or_else(|| StoreError::codec("length block overruns the key"))?;
        let mut state = ReadingState {
            key_offset: prefix_len,
            lengths_offset,
        };
        let mut terms = [None, None, None, None];
        for name in order {
            terms[slot(*name)] = Some(read_term(key, &mut state, prefixes)?);
        }
        if state.key_offset != lengths_offset || state.lengths_offset != trailer_at {
            return Err(StoreError::codec("trailing bytes after the last term"));
        }
        match terms {
            [Some(subject), Some(predicate), Some(object), Some(graph)] => {
                Ok(Quad::new(subject, predicate, object, graph))
            }
            _ => Err(StoreError::codec("ordering does not name every quad slot")),
        }
    }
}
