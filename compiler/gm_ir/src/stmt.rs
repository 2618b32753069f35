//! Statements and scope-tagged statement lists.

use std::fmt;

use crate::arena::named_args;
use crate::{CallArgs, ExprArena, ExprId};

/// Which of the two declaration scopes a statement targets.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ScopeKind {
    /// Fixed / observed quantities. Stochastic declarations are rejected here.
    Data,
    /// The generative model.
    Model,
}

impl ScopeKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ScopeKind::Data => "data",
            ScopeKind::Model => "model",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    /// `target = value;`
    Assign { target: Box<str>, value: ExprId },
    /// `target ~ distribution(args);`
    Draw {
        target: Box<str>,
        distribution: Box<str>,
        args: CallArgs,
    },
    /// `target[range] = value;`
    ///
    /// Each range entry is a single index, an integer array or an `a:b` range.
    IndexedAssign {
        target: Box<str>,
        range: Vec<ExprId>,
        value: ExprId,
    },
    /// `remove(target);`
    Remove { target: Box<str> },
}

impl Statement {
    pub fn assign(target: &str, value: ExprId) -> Self {
        Statement::Assign {
            target: target.into(),
            value,
        }
    }

    pub fn draw<'n>(
        target: &str,
        distribution: &str,
        args: impl IntoIterator<Item = (&'n str, ExprId)>,
    ) -> Self {
        Statement::Draw {
            target: target.into(),
            distribution: distribution.into(),
            args: named_args(args),
        }
    }

    pub fn indexed(target: &str, range: impl IntoIterator<Item = ExprId>, value: ExprId) -> Self {
        Statement::IndexedAssign {
            target: target.into(),
            range: range.into_iter().collect(),
            value,
        }
    }

    pub fn remove(target: &str) -> Self {
        Statement::Remove {
            target: target.into(),
        }
    }

    /// The id this statement declares, updates or removes.
    pub fn target(&self) -> &str {
        match self {
            Statement::Assign { target, .. }
            | Statement::Draw { target, .. }
            | Statement::IndexedAssign { target, .. }
            | Statement::Remove { target } => target,
        }
    }
}

/// A statement together with the scope it is evaluated in.
#[derive(Clone, Debug, PartialEq)]
pub struct TaggedStatement {
    pub scope: ScopeKind,
    pub statement: Statement,
}

/// The statement source: an expression arena and the statements over it.
#[derive(Clone, Debug, Default)]
pub struct StatementList {
    arena: ExprArena,
    statements: Vec<TaggedStatement>,
}

impl StatementList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arena(&self) -> &ExprArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ExprArena {
        &mut self.arena
    }

    pub fn push(&mut self, scope: ScopeKind, statement: Statement) {
        self.statements.push(TaggedStatement { scope, statement });
    }

    /// Append a data-scope statement.
    pub fn data(&mut self, statement: Statement) {
        self.push(ScopeKind::Data, statement);
    }

    /// Append a model-scope statement.
    pub fn model(&mut self, statement: Statement) {
        self.push(ScopeKind::Model, statement);
    }

    pub fn statements(&self) -> &[TaggedStatement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
