//! Operator functions.
//!
//! Every binary or unary expression becomes a function node wrapping one of
//! the definitions below. Evaluation is direct enum dispatch over the operand
//! data; arrays are handled elementwise, with a scalar operand broadcast
//! against an array one.

use std::cmp::Ordering;

use gm_ir::{BinaryOp, UnaryOp};
use rand::RngCore;

use crate::datum::{ArrayDatum, Datum, MAX_ARRAY_LEN};
use crate::errors::{arithmetic, invalid_index, shape_mismatch, ModelResult};
use crate::generator::{GeneratorDef, GeneratorKind, ParamArgs, ParamSpec, Signature};
use crate::shape::Shape;
use crate::ModelError;

#[cold]
fn unsupported(op: &str, left: &Datum, right: &Datum) -> ModelError {
    arithmetic(
        op,
        format!(
            "unsupported operands {} and {}",
            left.datum_type(),
            right.datum_type()
        ),
    )
}

#[inline]
fn checked_int(result: Option<i64>, op: BinaryOp) -> ModelResult<Datum> {
    result
        .map(Datum::Int)
        .ok_or_else(|| arithmetic(op.as_symbol(), "integer overflow"))
}

/// Evaluate a binary operator on two data.
pub fn evaluate_binary(left: &Datum, right: &Datum, op: BinaryOp) -> ModelResult<Datum> {
    match (left, right) {
        (Datum::Int(a), Datum::Int(b)) => eval_int_binary(*a, *b, op),
        (Datum::Float(a), Datum::Float(b)) => eval_float_binary(*a, *b, op),
        (Datum::Int(a), Datum::Float(b)) => eval_float_binary(*a as f64, *b, op),
        (Datum::Float(a), Datum::Int(b)) => eval_float_binary(*a, *b as f64, op),
        (Datum::Bool(a), Datum::Bool(b)) => eval_bool_binary(*a, *b, op),
        (Datum::Str(a), Datum::Str(b)) => eval_string_binary(a, b, op),
        (Datum::Array(a), Datum::Array(b)) => eval_array_binary(a, b, op),
        (Datum::Array(a), scalar) => elementwise(a, op.as_symbol(), |x| evaluate_binary(x, scalar, op)),
        (scalar, Datum::Array(b)) => elementwise(b, op.as_symbol(), |x| evaluate_binary(scalar, x, op)),
        _ => Err(unsupported(op.as_symbol(), left, right)),
    }
}

fn eval_int_binary(a: i64, b: i64, op: BinaryOp) -> ModelResult<Datum> {
    match op {
        BinaryOp::Add => checked_int(a.checked_add(b), op),
        BinaryOp::Sub => checked_int(a.checked_sub(b), op),
        BinaryOp::Mul => checked_int(a.checked_mul(b), op),
        BinaryOp::Div => {
            if b == 0 {
                Err(arithmetic(op.as_symbol(), "division by zero"))
            } else {
                Ok(Datum::Float(a as f64 / b as f64))
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                Err(arithmetic(op.as_symbol(), "modulo by zero"))
            } else {
                checked_int(a.checked_rem(b), op)
            }
        }
        BinaryOp::Pow => Ok(Datum::Float((a as f64).powf(b as f64))),
        BinaryOp::Eq => Ok(Datum::Bool(a == b)),
        BinaryOp::NotEq => Ok(Datum::Bool(a != b)),
        BinaryOp::Lt => Ok(Datum::Bool(a < b)),
        BinaryOp::LtEq => Ok(Datum::Bool(a <= b)),
        BinaryOp::Gt => Ok(Datum::Bool(a > b)),
        BinaryOp::GtEq => Ok(Datum::Bool(a >= b)),
        BinaryOp::BitAnd => Ok(Datum::Int(a & b)),
        BinaryOp::BitOr => Ok(Datum::Int(a | b)),
        BinaryOp::Range => inclusive_range(a, b),
        BinaryOp::And | BinaryOp::Or => Err(unsupported(op.as_symbol(), &Datum::Int(a), &Datum::Int(b))),
    }
}

/// `a:b`, counting down when `b < a`.
pub fn inclusive_range(a: i64, b: i64) -> ModelResult<Datum> {
    if a.abs_diff(b) >= MAX_ARRAY_LEN as u64 {
        return Err(invalid_index(b, format!("{a}:{b} (longer than {MAX_ARRAY_LEN})")));
    }
    Ok(if a <= b {
        Datum::int_array(a..=b)
    } else {
        Datum::int_array((b..=a).rev())
    })
}

fn eval_float_binary(a: f64, b: f64, op: BinaryOp) -> ModelResult<Datum> {
    let ordering = a.partial_cmp(&b);
    match op {
        BinaryOp::Add => Ok(Datum::Float(a + b)),
        BinaryOp::Sub => Ok(Datum::Float(a - b)),
        BinaryOp::Mul => Ok(Datum::Float(a * b)),
        BinaryOp::Div => Ok(Datum::Float(a / b)),
        BinaryOp::Mod => Ok(Datum::Float(a % b)),
        BinaryOp::Pow => Ok(Datum::Float(a.powf(b))),
        BinaryOp::Eq => Ok(Datum::Bool(ordering == Some(Ordering::Equal))),
        BinaryOp::NotEq => Ok(Datum::Bool(ordering != Some(Ordering::Equal))),
        BinaryOp::Lt => Ok(Datum::Bool(ordering == Some(Ordering::Less))),
        BinaryOp::LtEq => Ok(Datum::Bool(matches!(
            ordering,
            Some(Ordering::Less | Ordering::Equal)
        ))),
        BinaryOp::Gt => Ok(Datum::Bool(ordering == Some(Ordering::Greater))),
        BinaryOp::GtEq => Ok(Datum::Bool(matches!(
            ordering,
            Some(Ordering::Greater | Ordering::Equal)
        ))),
        BinaryOp::And | BinaryOp::Or | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::Range => Err(
            unsupported(op.as_symbol(), &Datum::Float(a), &Datum::Float(b)),
        ),
    }
}

fn eval_bool_binary(a: bool, b: bool, op: BinaryOp) -> ModelResult<Datum> {
    match op {
        BinaryOp::And | BinaryOp::BitAnd => Ok(Datum::Bool(a & b)),
        BinaryOp::Or | BinaryOp::BitOr => Ok(Datum::Bool(a | b)),
        BinaryOp::Eq => Ok(Datum::Bool(a == b)),
        BinaryOp::NotEq => Ok(Datum::Bool(a != b)),
        _ => Err(unsupported(op.as_symbol(), &Datum::Bool(a), &Datum::Bool(b))),
    }
}

fn eval_string_binary(a: &str, b: &str, op: BinaryOp) -> ModelResult<Datum> {
    match op {
        BinaryOp::Add => Ok(Datum::Str(format!("{a}{b}"))),
        BinaryOp::Eq => Ok(Datum::Bool(a == b)),
        BinaryOp::NotEq => Ok(Datum::Bool(a != b)),
        BinaryOp::Lt => Ok(Datum::Bool(a < b)),
        BinaryOp::LtEq => Ok(Datum::Bool(a <= b)),
        BinaryOp::Gt => Ok(Datum::Bool(a > b)),
        BinaryOp::GtEq => Ok(Datum::Bool(a >= b)),
        _ => Err(unsupported(
            op.as_symbol(),
            &Datum::Str(a.to_string()),
            &Datum::Str(b.to_string()),
        )),
    }
}

fn eval_array_binary(a: &ArrayDatum, b: &ArrayDatum, op: BinaryOp) -> ModelResult<Datum> {
    if a.len() != b.len() {
        return Err(shape_mismatch(
            format!("operator {}", op.as_symbol()),
            format!("{} elements", a.len()),
            format!("{} elements", b.len()),
        ));
    }
    let context = op.as_symbol();
    let left = a.set_items(context)?;
    let right = b.set_items(context)?;
    let items = left
        .into_iter()
        .zip(right)
        .map(|(x, y)| evaluate_binary(x, y, op))
        .collect::<ModelResult<Vec<_>>>()?;
    Ok(Datum::Array(ArrayDatum::from_elements(items)?))
}

fn elementwise(
    array: &ArrayDatum,
    context: &str,
    f: impl Fn(&Datum) -> ModelResult<Datum>,
) -> ModelResult<Datum> {
    let items = array
        .set_items(context)?
        .into_iter()
        .map(f)
        .collect::<ModelResult<Vec<_>>>()?;
    Ok(Datum::Array(ArrayDatum::from_elements(items)?))
}

/// Evaluate a unary operator.
pub fn evaluate_unary(value: &Datum, op: UnaryOp) -> ModelResult<Datum> {
    match (value, op) {
        (Datum::Int(n), UnaryOp::Neg) => n
            .checked_neg()
            .map(Datum::Int)
            .ok_or_else(|| arithmetic(op.as_symbol(), "integer overflow")),
        (Datum::Float(x), UnaryOp::Neg) => Ok(Datum::Float(-x)),
        (Datum::Bool(b), UnaryOp::Not) => Ok(Datum::Bool(!b)),
        (Datum::Array(a), _) => elementwise(a, op.as_symbol(), |x| evaluate_unary(x, op)),
        _ => Err(arithmetic(
            op.as_symbol(),
            format!("unsupported operand {}", value.datum_type()),
        )),
    }
}

static BINARY_SIGS: [Signature; 1] = [Signature {
    params: &[
        ParamSpec::required("left", Shape::Any, "left operand"),
        ParamSpec::required("right", Shape::Any, "right operand"),
    ],
}];

static UNARY_SIGS: [Signature; 1] = [Signature {
    params: &[ParamSpec::required("operand", Shape::Any, "operand")],
}];

/// Function node for one binary operator.
#[derive(Copy, Clone, Debug)]
pub struct BinaryOperator {
    op: BinaryOp,
}

impl BinaryOperator {
    pub fn op(&self) -> BinaryOp {
        self.op
    }
}

impl GeneratorDef for BinaryOperator {
    fn name(&self) -> &'static str {
        self.op.as_symbol()
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Function
    }

    fn signatures(&self) -> &'static [Signature] {
        &BINARY_SIGS
    }

    fn generate(&self, args: &ParamArgs<'_>, _rng: &mut dyn RngCore) -> ModelResult<Datum> {
        evaluate_binary(args.require("left")?, args.require("right")?, self.op)
    }
}

/// Function node for one unary operator.
#[derive(Copy, Clone, Debug)]
pub struct UnaryOperator {
    op: UnaryOp,
}

impl GeneratorDef for UnaryOperator {
    fn name(&self) -> &'static str {
        self.op.as_symbol()
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Function
    }

    fn signatures(&self) -> &'static [Signature] {
        &UNARY_SIGS
    }

    fn generate(&self, args: &ParamArgs<'_>, _rng: &mut dyn RngCore) -> ModelResult<Datum> {
        evaluate_unary(args.require("operand")?, self.op)
    }
}

/// Indexed like `BinaryOp::ALL`, which follows declaration order.
static BINARY_OPERATORS: [BinaryOperator; BinaryOp::ALL.len()] = {
    let mut out = [BinaryOperator { op: BinaryOp::Add }; BinaryOp::ALL.len()];
    let mut i = 0;
    while i < out.len() {
        out[i] = BinaryOperator {
            op: BinaryOp::ALL[i],
        };
        i += 1;
    }
    out
};

static NEG: UnaryOperator = UnaryOperator { op: UnaryOp::Neg };
static NOT: UnaryOperator = UnaryOperator { op: UnaryOp::Not };

/// The function definition behind a binary operator.
pub fn binary_operator(op: BinaryOp) -> &'static BinaryOperator {
    &BINARY_OPERATORS[op as usize]
}

/// The function definition behind a unary operator.
pub fn unary_operator(op: UnaryOp) -> &'static UnaryOperator {
    match op {
        UnaryOp::Neg => &NEG,
        UnaryOp::Not => &NOT,
    }
}
