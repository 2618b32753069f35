//! Single-argument math functions, applied elementwise over arrays.

use rand::RngCore;
use statrs::function::erf::{erf, erf_inv};
use statrs::function::gamma::ln_gamma;

use crate::datum::{ArrayDatum, Datum};
use crate::errors::{shape_mismatch, ModelResult};
use crate::generator::{GeneratorDef, GeneratorKind, ParamArgs, ParamSpec, Signature};
use crate::shape::Shape;

static UNARY_X: [Signature; 1] = [Signature {
    params: &[ParamSpec::required("x", Shape::Numeric, "the argument")],
}];

/// A real function of one real argument.
pub struct MathFunction {
    name: &'static str,
    f: fn(f64) -> f64,
    /// Results are whole numbers and are returned as `Int`.
    integral: bool,
}

impl MathFunction {
    fn apply(&self, value: &Datum) -> ModelResult<Datum> {
        match value {
            Datum::Array(array) => {
                let items = array
                    .set_items(self.name)?
                    .into_iter()
                    .map(|item| self.apply(item))
                    .collect::<ModelResult<Vec<_>>>()?;
                Ok(Datum::Array(ArrayDatum::from_elements(items)?))
            }
            other => {
                let x = other
                    .as_f64()
                    .ok_or_else(|| shape_mismatch(self.name, Shape::Numeric, other.datum_type()))?;
                let y = (self.f)(x);
                Ok(if self.integral {
                    Datum::Int(y as i64)
                } else {
                    Datum::Float(y)
                })
            }
        }
    }
}

impl GeneratorDef for MathFunction {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Function
    }

    fn signatures(&self) -> &'static [Signature] {
        &UNARY_X
    }

    fn generate(&self, args: &ParamArgs<'_>, _rng: &mut dyn RngCore) -> ModelResult<Datum> {
        self.apply(args.require("x")?)
    }
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Complementary log-log link.
fn c_log_log(p: f64) -> f64 {
    (-(-p).ln_1p()).ln()
}

fn log_fact(x: f64) -> f64 {
    ln_gamma(x + 1.0)
}

/// Standard normal CDF.
fn phi(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

/// Standard normal quantile; the inverse of [`phi`].
fn probit(p: f64) -> f64 {
    std::f64::consts::SQRT_2 * erf_inv(2.0 * p - 1.0)
}

/// Heaviside step: 1 for positive input, 0 otherwise.
fn step(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

const fn real(name: &'static str, f: fn(f64) -> f64) -> MathFunction {
    MathFunction {
        name,
        f,
        integral: false,
    }
}

const fn whole(name: &'static str, f: fn(f64) -> f64) -> MathFunction {
    MathFunction {
        name,
        f,
        integral: true,
    }
}

pub static MATH_FUNCTIONS: [MathFunction; 31] = [
    real("abs", f64::abs),
    real("exp", f64::exp),
    real("log", f64::ln),
    real("log10", f64::log10),
    real("log1p", f64::ln_1p),
    real("expm1", f64::exp_m1),
    real("sqrt", f64::sqrt),
    real("cbrt", f64::cbrt),
    real("sin", f64::sin),
    real("cos", f64::cos),
    real("tan", f64::tan),
    real("asin", f64::asin),
    real("acos", f64::acos),
    real("atan", f64::atan),
    real("sinh", f64::sinh),
    real("cosh", f64::cosh),
    real("tanh", f64::tanh),
    real("asinh", f64::asinh),
    real("acosh", f64::acosh),
    real("atanh", f64::atanh),
    whole("floor", f64::floor),
    whole("ceil", f64::ceil),
    whole("round", f64::round),
    real("signum", f64::signum),
    real("logit", logit),
    real("cLogLog", c_log_log),
    real("logGamma", ln_gamma),
    real("logFact", log_fact),
    real("phi", phi),
    real("probit", probit),
    real("step", step),
];
