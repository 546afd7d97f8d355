use crate::codec::{
    decode_length, encode_length, fpstring, slice, tags, ReadingState, SerializedTerm,
    DEFAULT_GRAPH_BODY, LENGTH_WIDTH, SEP,
};
use crate::consts::{is_numeric_datatype, RDF_LANG_STRING, XSD_DATE_TIME, XSD_STRING};
use crate::error::{Result, StoreError};
use crate::prefixes::Prefixes;
use crate::term::{Literal, Term};

/// Encodes one term. Named nodes are compacted through `prefixes`.
pub fn write_term(term: &Term, prefixes: &dyn Prefixes) -> Result<SerializedTerm> {
    match term {
        Term::NamedNode(iri) => {
            let value = prefixes.compact_iri(iri);
            Ok(SerializedTerm {
                tag: tags::NAMED_NODE,
                lengths: encode_length(value.len())?,
                value,
            })
        }
        Term::BlankNode(label) => Ok(SerializedTerm {
            tag: tags::BLANK_NODE,
            lengths: encode_length(label.len())?,
            value: label.clone(),
        }),
        Term::DefaultGraph => Ok(SerializedTerm {
            tag: tags::DEFAULT_GRAPH,
            lengths: String::new(),
            value: DEFAULT_GRAPH_BODY.to_string(),
        }),
        Term::Literal(lit) => write_literal(lit),
    }
}

fn write_literal(lit: &Literal) -> Result<SerializedTerm> {
    if let Some(lang) = &lit.language {
        return Ok(SerializedTerm {
            tag: tags::LANG_LITERAL,
            lengths: encode_length(lit.value.len())? + &encode_length(lang.len())?,
            value: [lang.as_str(), SEP, lit.value.as_str()].concat(),
        });
    }
    let dt = lit.datatype.as_str();
    if dt == XSD_STRING {
        return Ok(SerializedTerm {
            tag: tags::STRING_LITERAL,
            lengths: encode_length(lit.value.len())?,
            value: lit.value.clone(),
        });
    }
    let encoded = if is_numeric_datatype(dt) {
        Some((tags::NUMERIC_LITERAL, fpstring::encode_numeric(&lit.value)))
    } else if dt == XSD_DATE_TIME {
        Some((tags::DATE_TIME_LITERAL, fpstring::encode_date_time(&lit.value)))
    } else {
        None
    };
    match encoded {
        Some((tag, enc)) => Ok(SerializedTerm {
            tag,
            lengths: encode_length(lit.value.len())?
                + &encode_length(dt.len())?
                + &encode_length(enc.len())?,
            value: [enc.as_str(), SEP, dt, SEP, lit.value.as_str()].concat(),
        }),
        None => Ok(SerializedTerm {
            tag: tags::GENERIC_LITERAL,
            lengths: encode_length(lit.value.len())? + &encode_length(dt.len())?,
            value: [dt, SEP, lit.value.as_str()].concat(),
        }),
    }
}

fn next_length(key: &str, state: &mut ReadingState) -> Result<usize> {
    let len = decode_length(slice(key, state.lengths_offset, LENGTH_WIDTH)?)?;
    state.lengths_offset += LENGTH_WIDTH;
    Ok(len)
}

/// Reads `len` bytes at the key offset, advancing past them.
fn take<'k>(key: &'k str, state: &mut ReadingState, len: usize) -> Result<&'k str> {
    let s = slice(key, state.key_offset, len)?;
    state.key_offset += len;
    Ok(s)
}

fn skip_sep(key: &str, state: &mut ReadingState) -> Result<()> {
    if take(key, state, SEP.len())? != SEP {
        return Err(StoreError::codec(format!(
            "expected separator at byte {}",
            state.key_offset - SEP.len()
        )));
    }
    Ok(())
}

/// Decodes the term starting at `state.key_offset`, whose headers start at
/// `state.lengths_offset`. Leaves the key offset just past the term's
/// trailing separator.
pub fn read_term(key: &str, state: &mut ReadingState, prefixes: &dyn Prefixes) -> Result<Term> {
    let tag = slice(key, state.key_offset, 1)?
        .chars()
        .next()
        .ok_or_else(|| StoreError::codec("missing term tag"))?;
    state.key_offset += 1;
    let term = match tag {
        tags::NAMED_NODE => {
            let len = next_length(key, state)?;
            Term::NamedNode(prefixes.expand_term(take(key, state, len)?))
        }
        tags::BLANK_NODE => {
            let len = next_length(key, state)?;
            Term::BlankNode(take(key, state, len)?.to_string())
        }
        tags::STRING_LITERAL => {
            let len = next_length(key, state)?;
            Term::typed_literal(take(key, state, len)?, XSD_STRING)
        }
        tags::GENERIC_LITERAL => {
            let value_len = next_length(key, state)?;
            let dt_len = next_length(key, state)?;
            let dt = take(key, state, dt_len)?;
            skip_sep(key, state)?;
            Term::typed_literal(take(key, state, value_len)?, dt)
        }
        tags::LANG_LITERAL => {
            let value_len = next_length(key, state)?;
            let lang_len = next_length(key, state)?;
            let lang = take(key, state, lang_len)?;
            skip_sep(key, state)?;
            let value = take(key, state, value_len)?;
            Term::Literal(Literal {
                value: value.to_string(),
                datatype: RDF_LANG_STRING.to_string(),
                language: Some(lang.to_string()),
            })
        }
        tags::NUMERIC_LITERAL | tags::DATE_TIME_LITERAL => {
            let value_len = next_length(key, state)?;
            let dt_len = next_length(key, state)?;
            let enc_len = next_length(key, state)?;
            take(key, state, enc_len)?;
            skip_sep(key, state)?;
            let dt = take(key, state, dt_len)?;
            skip_sep(key, state)?;
            Term::typed_literal(take(key, state, value_len)?, dt)
        }
        tags::DEFAULT_GRAPH => {
            take(key, state, DEFAULT_GRAPH_BODY.len())?;
            Term::DefaultGraph
        }
        other => {
            return Err(StoreError::codec(format!("unexpected term tag {:?}", other)));
        }
    };
    skip_sep(key, state)?;
    Ok(term)
}
