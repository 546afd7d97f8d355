//! RDF terms and quads as plain values.
//!
//! [`Term`] is a closed enum: the codec dispatches on it exhaustively, so a
//! new variant cannot be added without teaching the codec about it.
//!
//! ```
//! use quadkv::{Quad, Term};
//!
//! let q = Quad::new(
//!     Term::named_node("http://example.org/Alice"),
//!     Term::named_node("http://xmlns.com/foaf/0.1/name"),
//!     Term::literal("Alice"),
//!     Term::DefaultGraph,
//! );
//! assert_eq!(
//!     q.to_string(),
//!     "<http://example.org/Alice> <http://xmlns.com/foaf/0.1/name> \"Alice\" ."
//! );
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{RDF_LANG_STRING, XSD_STRING};

/// RDF literal. The datatype is always present: `xsd:string` for plain
/// literals and `rdf:langString` for language-tagged ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal {
    pub value: String,
    pub datatype: String,
    pub language: Option<String>,
}

/// RDF term.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// IRI node.
    NamedNode(String),
    /// Blank node label, without the `_:` prefix.
    BlankNode(String),
    Literal(Literal),
    /// Marker for the default graph; only meaningful in the graph slot.
    DefaultGraph,
}

impl Term {
    pub fn named_node(iri: impl Into<String>) -> Self {
        Term::NamedNode(iri.into())
    }

    pub fn blank_node(label: impl Into<String>) -> Self {
        Term::BlankNode(label.into())
    }

    /// Simple literal (`xsd:string`).
    pub fn literal(value: impl Into<String>) -> Self {
        Term::typed_literal(value, XSD_STRING)
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            datatype: datatype.into(),
            language: None,
        })
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            datatype: RDF_LANG_STRING.to_string(),
            language: Some(language.into()),
        })
    }

    /// Lexical value: IRI, blank node label, literal value, or `""` for the
    /// default graph.
    pub fn value(&self) -> &str {
        match self {
            Term::NamedNode(iri) => iri,
            Term::BlankNode(label) => label,
            Term::Literal(lit) => &lit.value,
            Term::DefaultGraph => "",
        }
    }

    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            c => write!(f, "{}", c)?,
        }
    }
    Ok(())
}

/// N-Quads rendering. The default graph renders as an empty string.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::NamedNode(iri) => write!(f, "<{}>", iri),
            Term::BlankNode(label) => write!(f, "_:{}", label),
            Term::Literal(lit) => {
                f.write_str("\"")?;
                write_escaped(f, &lit.value)?;
                f.write_str("\"")?;
                match &lit.language {
                    Some(lang) => write!(f, "@{}", lang),
                    None if lit.datatype == XSD_STRING => Ok(()),
                    None => write!(f, "^^<{}>", lit.datatype),
                }
            }
            Term::DefaultGraph => Ok(()),
        }
    }
}

/// Names of the four quad slots. Index catalogs are permutations of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermName {
    Subject,
    Predicate,
    Object,
    Graph,
}

impl TermName {
    pub const ALL: [TermName; 4] = [
        TermName::Subject,
        TermName::Predicate,
        TermName::Object,
        TermName::Graph,
    ];

    /// Upper-case initial used when deriving index prefixes (`SPOG`, ...).
    pub fn initial(self) -> char {
        match self {
            TermName::Subject => 'S',
            TermName::Predicate => 'P',
            TermName::Object => 'O',
            TermName::Graph => 'G',
        }
    }

    pub fn from_initial(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'S' => Some(TermName::Subject),
            'P' => Some(TermName::Predicate),
            'O' => Some(TermName::Object),
            'G' => Some(TermName::Graph),
            _ => None,
        }
    }
}

impl fmt::Display for TermName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TermName::Subject => "subject",
            TermName::Predicate => "predicate",
            TermName::Object => "object",
            TermName::Graph => "graph",
        };
        f.write_str(s)
    }
}

/// RDF statement (subject, predicate, object, graph).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quad {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
    pub graph: Term,
}

impl Quad {
    pub fn new(subject: Term, predicate: Term, object: Term, graph: Term) -> Self {
        Quad {
            subject,
            predicate,
            object,
            graph,
        }
    }

    pub fn get(&self, name: TermName) -> &Term {
        match name {
            TermName::Subject => &self.subject,
            TermName::Predicate => &self.predicate,
            TermName::Object => &self.object,
            TermName::Graph => &self.graph,
        }
    }
}

impl fmt::Display for Quad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)?;
        if self.graph != Term::DefaultGraph {
            write!(f, " {}", self.graph)?;
        }
        f.write_str(" .")
    }
}

#[cfg(feature = "oxigraph")]
mod ox {
    use super::{Literal, Quad, Term};
    use crate::consts::RDF_LANG_STRING;
    use crate::error::{Result, StoreError};
    use oxigraph::model as ox;

    impl From<ox::Literal> for Literal {
        fn from(l: ox::Literal) -> Self {
            match l.language() {
                Some(lang) => Literal {
                    value: l.value().to_string(),
                    datatype: RDF_LANG_STRING.to_string(),
                    language: Some(lang.to_string()),
                },
                None => Literal {
                    value: l.value().to_string(),
                    datatype: l.datatype().as_str().to_string(),
                    language: None,
                },
            }
        }
    }

    impl From<ox::Term> for Term {
        fn from(t: ox::Term) -> Self {
            match t {
                ox::Term::NamedNode(n) => Term::NamedNode(n.into_string()),
                ox::Term::BlankNode(b) => Term::BlankNode(b.into_string()),
                ox::Term::Literal(l) => Term::Literal(l.into()),
            }
        }
    }

    impl From<ox::NamedOrBlankNode> for Term {
        fn from(t: ox::NamedOrBlankNode) -> Self {
            match t {
                ox::NamedOrBlankNode::NamedNode(n) => Term::NamedNode(n.into_string()),
                ox::NamedOrBlankNode::BlankNode(b) => Term::BlankNode(b.into_string()),
            }
        }
    }

    impl From<ox::GraphName> for Term {
        fn from(g: ox::GraphName) -> Self {
            match g {
                ox::GraphName::NamedNode(n) => Term::NamedNode(n.into_string()),
                ox::GraphName::BlankNode(b) => Term::BlankNode(b.into_string()),
                ox::GraphName::DefaultGraph => Term::DefaultGraph,
            }
        }
    }

    impl From<ox::Quad> for Quad {
        fn from(q: ox::Quad) -> Self {
            Quad::new(
                q.subject.into(),
                Term::NamedNode(q.predicate.into_string()),
                q.object.into(),
                q.graph_name.into(),
            )
        }
    }

    fn named(iri: &str) -> Result<ox::NamedNode> {
        ox::NamedNode::new(iri).map_err(|e| StoreError::codec(format!("invalid IRI <{}>: {}", iri, e)))
    }

    fn blank(label: &str) -> Result<ox::BlankNode> {
        ox::BlankNode::new(label)
            .map_err(|e| StoreError::codec(format!("invalid blank node _:{}: {}", label, e)))
    }

    impl TryFrom<&Term> for ox::Term {
        type Error = StoreError;

        fn try_from(t: &Term) -> Result<Self> {
            Ok(match t {
                Term::NamedNode(iri) => named(iri)?.into(),
                Term::BlankNode(label) => blank(label)?.into(),
                Term::Literal(lit) => match &lit.language {
                    Some(lang) => ox::Literal::new_language_tagged_literal(&lit.value, lang)
                        .map_err(|e| StoreError::codec(format!("invalid language tag: {}", e)))?
                        .into(),
                    None => ox::Literal::new_typed_literal(&lit.value, named(&lit.datatype)?).into(),
                },
                Term::DefaultGraph => {
                    return Err(StoreError::codec("default graph is not an RDF term"))
                }
            })
        }
    }

    impl TryFrom<&Quad> for ox::Quad {
        type Error = StoreError;

        fn try_from(q: &Quad) -> Result<Self> {
            let subject: ox::NamedOrBlankNode = match &q.subject {
                Term::NamedNode(iri) => named(iri)?.into(),
                Term::BlankNode(label) => blank(label)?.into(),
                other => return Err(StoreError::codec(format!("invalid subject {}", other))),
            };
            let predicate = match &q.predicate {
                Term::NamedNode(iri) => named(iri)?,
                other => return Err(StoreError::codec(format!("invalid predicate {}", other))),
            };
            let object = ox::Term::try_from(&q.object)?;
            let graph_name = match &q.graph {
                Term::NamedNode(iri) => ox::GraphName::NamedNode(named(iri)?),
                Term::BlankNode(label) => ox::GraphName::BlankNode(blank(label)?),
                Term::DefaultGraph => ox::GraphName::DefaultGraph,
                other => return Err(StoreError::codec(format!("invalid graph {}", other))),
            };
            Ok(ox::Quad::new(subject, predicate, object, graph_name))
        }
    }
}
