//! Stable handles into the graph arena.

use std::fmt;

fn to_u32(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("graph arena exceeded u32::MAX {what}"))
}

/// Handle of a value node in a [`Graph`](crate::Graph).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct ValueId(u32);

impl ValueId {
    pub(crate) fn from_len(len: usize) -> Self {
        ValueId(to_u32(len, "values"))
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueId({})", self.0)
    }
}

/// Handle of a generator node in a [`Graph`](crate::Graph).
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct GeneratorId(u32);

impl GeneratorId {
    pub(crate) fn from_len(len: usize) -> Self {
        GeneratorId(to_u32(len, "generators"))
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for GeneratorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GeneratorId({})", self.0)
    }
}

/// Either kind of graph node, for neighbor queries.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeRef {
    Value(ValueId),
    Generator(GeneratorId),
}
