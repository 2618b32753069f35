//! GM IR - statement and expression tree for the gm interpreter.
//!
//! The interpreter does not parse source text. An external front end hands it
//! a [`StatementList`]: a flat [`ExprArena`] plus scope-tagged [`Statement`]s
//! whose expressions are [`ExprId`] indices into that arena.
//!
//! # Statement Forms
//!
//! - `id = expr;` ([`Statement::Assign`])
//! - `id ~ Dist(...);` ([`Statement::Draw`])
//! - `id[range] = expr;` ([`Statement::IndexedAssign`])
//! - `remove(id);` ([`Statement::Remove`])

mod arena;
mod expr;
mod expr_id;
mod operators;
mod stmt;

pub use arena::ExprArena;
pub use expr::{CallArgs, ExprKind};
pub use expr_id::ExprId;
pub use operators::{BinaryOp, UnaryOp};
pub use stmt::{ScopeKind, Statement, StatementList, TaggedStatement};
