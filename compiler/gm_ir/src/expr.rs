//! Expression nodes.

use smallvec::SmallVec;

use crate::{BinaryOp, ExprId, UnaryOp};

/// Expression node stored in an [`ExprArena`](crate::ExprArena).
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// Raw literal token (`5`, `2.0`, `true`, `"taxa"`).
    ///
    /// The interpreter decides the literal's type: integer, then float, then
    /// boolean, then string.
    Literal(Box<str>),
    /// Reference to a previously declared id.
    Ident(Box<str>),
    Binary {
        op: BinaryOp,
        left: ExprId,
        right: ExprId,
    },
    Unary {
        op: UnaryOp,
        operand: ExprId,
    },
    /// Array literal `[a, b, ...]`; nested literals form 2-D arrays.
    Array(Vec<ExprId>),
    /// `target[i]` or `target[i, j, ...]`.
    Index {
        target: ExprId,
        indices: Vec<ExprId>,
    },
    /// Generator invocation `name(args)`.
    Call {
        name: Box<str>,
        args: CallArgs,
    },
}

/// Arguments of a call: either all named or all positional.
#[derive(Clone, Debug, PartialEq)]
pub enum CallArgs {
    Named(SmallVec<[(Box<str>, ExprId); 4]>),
    Positional(SmallVec<[ExprId; 4]>),
}

impl CallArgs {
    /// Zero positional arguments.
    pub fn none() -> Self {
        CallArgs::Positional(SmallVec::new())
    }

    pub fn len(&self) -> usize {
        match self {
            CallArgs::Named(args) => args.len(),
            CallArgs::Positional(args) => args.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
