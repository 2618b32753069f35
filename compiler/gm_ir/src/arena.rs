//! Flat expression arena.

use smallvec::SmallVec;

use crate::{BinaryOp, CallArgs, ExprId, ExprKind, UnaryOp};

/// Arena of expression nodes.
///
/// Front ends allocate children before parents, so every `ExprId` stored in a
/// node is smaller than the node's own id.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    exprs: Vec<ExprKind>,
}

fn to_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("expression arena exceeded u32::MAX nodes"))
}

impl ExprArena {
    pub fn new() -> Self {
        ExprArena { exprs: Vec::new() }
    }

    /// Allocate an expression, returning its ID.
    pub fn alloc(&mut self, kind: ExprKind) -> ExprId {
        let id = ExprId::from_raw(to_u32(self.exprs.len()));
        self.exprs.push(kind);
        id
    }

    /// Get an expression by ID.
    #[inline]
    pub fn get(&self, id: ExprId) -> &ExprKind {
        &self.exprs[id.index()]
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    // Construction helpers for front ends and tests

    pub fn literal(&mut self, text: &str) -> ExprId {
        self.alloc(ExprKind::Literal(text.into()))
    }

    pub fn ident(&mut self, name: &str) -> ExprId {
        self.alloc(ExprKind::Ident(name.into()))
    }

    pub fn binary(&mut self, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        self.alloc(ExprKind::Binary { op, left, right })
    }

    pub fn unary(&mut self, op: UnaryOp, operand: ExprId) -> ExprId {
        self.alloc(ExprKind::Unary { op, operand })
    }

    pub fn array(&mut self, elements: impl IntoIterator<Item = ExprId>) -> ExprId {
        self.alloc(ExprKind::Array(elements.into_iter().collect()))
    }

    pub fn index(&mut self, target: ExprId, indices: impl IntoIterator<Item = ExprId>) -> ExprId {
        self.alloc(ExprKind::Index {
            target,
            indices: indices.into_iter().collect(),
        })
    }

    /// `name(a=..., b=...)`
    pub fn call_named<'n>(
        &mut self,
        name: &str,
        args: impl IntoIterator<Item = (&'n str, ExprId)>,
    ) -> ExprId {
        let args = named_args(args);
        self.alloc(ExprKind::Call {
            name: name.into(),
            args,
        })
    }

    /// `name(a, b, ...)`
    pub fn call(&mut self, name: &str, args: impl IntoIterator<Item = ExprId>) -> ExprId {
        self.alloc(ExprKind::Call {
            name: name.into(),
            args: CallArgs::Positional(args.into_iter().collect()),
        })
    }
}

/// Collect `(name, expr)` pairs into named call arguments.
pub(crate) fn named_args<'n>(args: impl IntoIterator<Item = (&'n str, ExprId)>) -> CallArgs {
    CallArgs::Named(
        args.into_iter()
            .map(|(name, expr)| (Box::<str>::from(name), expr))
            .collect::<SmallVec<_>>(),
    )
}
