//! Expected value shapes of declared generator parameters.

use std::fmt;

use crate::datum::DatumType;

/// The shape a parameter expects its bound datum to have.
///
/// Checked when the generator is invoked, not when the parameter is bound.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Shape {
    Any,
    Int,
    Float,
    /// Int or Float.
    Number,
    Bool,
    Str,
    /// A number, or an array (of any depth) of numbers.
    Numeric,
    Array(&'static Shape),
}

impl Shape {
    pub fn accepts(self, ty: &DatumType) -> bool {
        match (self, ty) {
            (Shape::Any, _)
            | (Shape::Int, DatumType::Int)
            | (Shape::Float, DatumType::Float)
            | (Shape::Number, DatumType::Int | DatumType::Float)
            | (Shape::Bool, DatumType::Bool)
            | (Shape::Str, DatumType::Str) => true,
            (Shape::Numeric, DatumType::Array(elem)) => Shape::Numeric.accepts(elem),
            (Shape::Numeric, ty) => ty.is_numeric(),
            (Shape::Array(elem), DatumType::Array(ty)) => elem.accepts(ty),
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Any => f.write_str("Any"),
            Shape::Int => f.write_str("Int"),
            Shape::Float => f.write_str("Float"),
            Shape::Number => f.write_str("Number"),
            Shape::Bool => f.write_str("Bool"),
            Shape::Str => f.write_str("String"),
            Shape::Numeric => f.write_str("Numeric"),
            Shape::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}
