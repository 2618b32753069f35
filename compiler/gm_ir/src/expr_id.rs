//! Expression IDs for the flat expression arena.

use std::fmt;

/// Index into an [`ExprArena`](crate::ExprArena).
///
/// Expressions refer to their children by `ExprId` rather than `Box<Expr>`,
/// so a statement list is one contiguous allocation.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct ExprId(u32);

impl ExprId {
    pub(crate) const fn from_raw(raw: u32) -> Self {
        ExprId(raw)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}
