//! Partial quad patterns.

use crate::term::{Quad, Term, TermName};

/// One end of a [`Range`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeBound {
    pub value: Term,
    pub inclusive: bool,
}

/// Interval over object values. Either end may be open.
///
/// Bounds compare in storage order: numerics and date-times by value,
/// everything else by its lexical form within the same term kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Range {
    pub lower: Option<RangeBound>,
    pub upper: Option<RangeBound>,
}

impl Range {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gt(mut self, value: Term) -> Self {
        self.lower = Some(RangeBound {
            value,
            inclusive: false,
        });
        self
    }

    pub fn gte(mut self, value: Term) -> Self {
        self.lower = Some(RangeBound {
            value,
            inclusive: true,
        });
        self
    }

    pub fn lt(mut self, value: Term) -> Self {
        self.upper = Some(RangeBound {
            value,
            inclusive: false,
        });
        self
    }

    pub fn lte(mut self, value: Term) -> Self {
        self.upper = Some(RangeBound {
            value,
            inclusive: true,
        });
        self
    }
}

/// What the object slot of a pattern matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectMatch {
    Term(Term),
    Range(Range),
}

impl From<Term> for ObjectMatch {
    fn from(t: Term) -> Self {
        ObjectMatch::Term(t)
    }
}

impl From<Range> for ObjectMatch {
    fn from(r: Range) -> Self {
        ObjectMatch::Range(r)
    }
}

/// Borrowed view of a single bound slot.
#[derive(Debug, Clone, Copy)]
pub enum SlotMatch<'a> {
    Exact(&'a Term),
    Range(&'a Range),
}

/// Zero to four bound slots; unbound slots match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    pub subject: Option<Term>,
    pub predicate: Option<Term>,
    pub object: Option<ObjectMatch>,
    pub graph: Option<Term>,
}

impl Pattern {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subject(mut self, t: Term) -> Self {
        self.subject = Some(t);
        self
    }

    pub fn predicate(mut self, t: Term) -> Self {
        self.predicate = Some(t);
        self
    }

    pub fn object(mut self, m: impl Into<ObjectMatch>) -> Self {
        self.object = Some(m.into());
        self
    }

    pub fn graph(mut self, t: Term) -> Self {
        self.graph = Some(t);
        self
    }

    /// Pattern that matches exactly `quad`.
    pub fn from_quad(quad: &Quad) -> Self {
        Pattern {
            subject: Some(quad.subject.clone()),
            predicate: Some(quad.predicate.clone()),
            object: Some(ObjectMatch::Term(quad.object.clone())),
            graph: Some(quad.graph.clone()),
        }
    }

    pub fn slot(&self, name: TermName) -> Option<SlotMatch<'_>> {
        match name {
            TermName::Subject => self.subject.as_ref().map(SlotMatch::Exact),
            TermName::Predicate => self.predicate.as_ref().map(SlotMatch::Exact),
            TermName::Object => self.object.as_ref().map(|m| match m {
                ObjectMatch::Term(t) => SlotMatch::Exact(t),
                ObjectMatch::Range(r) => SlotMatch::Range(r),
            }),
            TermName::Graph => self.graph.as_ref().map(SlotMatch::Exact),
        }
    }

    pub fn bound_count(&self) -> usize {
        TermName::ALL
            .iter()
            .filter(|n| self.slot(**n).is_some())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_bound_slots() {
        assert_eq!(Pattern::new().bound_count(), 0);
        let p = Pattern::new()
            .subject(Term::named_node("s"))
            .object(Range::new().gt(Term::literal("a")));
        assert_eq!(p.bound_count(), 2);
        assert!(matches!(p.slot(TermName::Object), Some(SlotMatch::Range(_))));
        assert!(p.slot(TermName::Graph).is_none());
    }
}
