//! Per-call option types. Enums replace boolean flag parameters.

use crate::backend::WriteBatch;
use crate::error::Result;
use crate::scope::Scope;
use crate::term::TermName;

/// Direction in which matching quads are returned.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    pub fn is_reverse(self) -> bool {
        matches!(self, Direction::Reverse)
    }
}

impl From<bool> for Direction {
    /// `true` means reverse.
    fn from(value: bool) -> Self {
        if value {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }
}

impl From<Direction> for bool {
    fn from(value: Direction) -> Self {
        value.is_reverse()
    }
}

/// Hook that stages extra operations into the batch of a write, so they
/// commit atomically with the quads.
pub type PreWrite<'a> = Box<dyn FnOnce(&mut WriteBatch) -> Result<()> + Send + 'a>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetOpts {
    pub limit: Option<usize>,
    /// Requested sort order, as a sequence of slots.
    pub order: Option<Vec<TermName>>,
    pub direction: Direction,
    /// Page size of the underlying scan; the store default when `None`.
    pub max_buffer_size: Option<usize>,
}

impl GetOpts {
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: impl Into<Vec<TermName>>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn direction(mut self, direction: impl Into<Direction>) -> Self {
        self.direction = direction.into();
        self
    }

    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = Some(size);
        self
    }
}

#[derive(Default)]
pub struct PutOpts<'a> {
    /// Relabel blank nodes through this scope, persisting new mappings.
    pub scope: Option<&'a mut Scope>,
    pub pre_write: Option<PreWrite<'a>>,
}

impl<'a> PutOpts<'a> {
    pub fn scope(mut self, scope: &'a mut Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn pre_write(mut self, f: impl FnOnce(&mut WriteBatch) -> Result<()> + Send + 'a) -> Self {
        self.pre_write = Some(Box::new(f));
        self
    }
}

#[derive(Default)]
pub struct DelOpts<'a> {
    pub pre_write: Option<PreWrite<'a>>,
}

impl<'a> DelOpts<'a> {
    pub fn pre_write(mut self, f: impl FnOnce(&mut WriteBatch) -> Result<()> + Send + 'a) -> Self {
        self.pre_write = Some(Box::new(f));
        self
    }
}

pub type PatchOpts<'a> = DelOpts<'a>;

/// Options for chunked bulk writes (`put_stream`, `del_stream`,
/// `remove_matches`).
#[derive(Default)]
pub struct StreamOpts<'a> {
    /// Quads per committed batch; the store default when `None`.
    pub batch_size: Option<usize>,
    /// Only honored by `put_stream`.
    pub scope: Option<&'a mut Scope>,
}

impl<'a> StreamOpts<'a> {
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    pub fn scope(mut self, scope: &'a mut Scope) -> Self {
        self.scope = Some(scope);
        self
    }
}
