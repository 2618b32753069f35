//! Generator definitions: the declared parameter schema and the behavior
//! behind a generator name.
//!
//! Built-in generators are zero-sized statics implementing [`GeneratorDef`];
//! graph nodes hold `&'static dyn GeneratorDef` handles to them.

use std::fmt;

use rand::RngCore;
use smallvec::SmallVec;

use crate::datum::{ArrayDatum, Datum};
use crate::errors::{shape_mismatch, ModelResult};
use crate::shape::Shape;

/// The two generator variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    /// Pure: identical inputs give identical output.
    Function,
    /// Stochastic: draws a random variable.
    Distribution,
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeneratorKind::Function => "function",
            GeneratorKind::Distribution => "distribution",
        })
    }
}

/// One declared parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub optional: bool,
    pub shape: Shape,
    pub description: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, shape: Shape, description: &'static str) -> Self {
        ParamSpec {
            name,
            optional: false,
            shape,
            description,
        }
    }

    pub const fn optional(name: &'static str, shape: Shape, description: &'static str) -> Self {
        ParamSpec {
            name,
            optional: true,
            shape,
            description,
        }
    }
}

/// One constructor form: an ordered parameter list.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Signature {
    pub params: &'static [ParamSpec],
}

impl Signature {
    pub const fn new(params: &'static [ParamSpec]) -> Self {
        Signature { params }
    }

    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn required(&self) -> impl Iterator<Item = &'static ParamSpec> {
        self.params.iter().filter(|p| !p.optional)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", p.name, p.shape)?;
            if p.optional {
                f.write_str("?")?;
            }
        }
        Ok(())
    }
}

/// Behavior behind a registered generator name.
///
/// Implementations are stateless; everything a call needs arrives through
/// [`ParamArgs`].
pub trait GeneratorDef: Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> GeneratorKind;

    /// Constructor forms, tried in order by the resolver.
    ///
    /// Generators built directly by the interpreter (operators, array
    /// construction, element extraction) may declare none.
    fn signatures(&self) -> &'static [Signature];

    fn description(&self) -> &'static str {
        ""
    }

    /// Produce an output from bound parameter data.
    fn generate(&self, args: &ParamArgs<'_>, rng: &mut dyn RngCore) -> ModelResult<Datum>;

    /// Log density of `value` under the bound parameters, for distributions
    /// that define one.
    fn log_density(&self, _args: &ParamArgs<'_>, _value: &Datum) -> ModelResult<Option<f64>> {
        Ok(None)
    }
}

/// Parameter data handed to [`GeneratorDef::generate`], in binding order.
///
/// An absent optional parameter appears with `None`.
pub struct ParamArgs<'a> {
    generator: &'static str,
    args: SmallVec<[(&'a str, Option<&'a Datum>); 4]>,
}

impl<'a> ParamArgs<'a> {
    pub fn new(
        generator: &'static str,
        args: impl IntoIterator<Item = (&'a str, Option<&'a Datum>)>,
    ) -> Self {
        ParamArgs {
            generator,
            args: args.into_iter().collect(),
        }
    }

    pub fn generator(&self) -> &'static str {
        self.generator
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Bound data in binding order; absent entries are skipped.
    pub fn values(&self) -> impl Iterator<Item = &'a Datum> + '_ {
        self.args.iter().filter_map(|(_, d)| *d)
    }

    pub fn get(&self, name: &str) -> Option<&'a Datum> {
        self.args
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, d)| *d)
    }

    pub fn require(&self, name: &str) -> ModelResult<&'a Datum> {
        self.get(name)
            .ok_or_else(|| shape_mismatch(self.context(name), "a bound value", "absent"))
    }

    pub fn f64(&self, name: &str) -> ModelResult<f64> {
        let datum = self.require(name)?;
        datum
            .as_f64()
            .ok_or_else(|| shape_mismatch(self.context(name), Shape::Number, datum.datum_type()))
    }

    pub fn opt_f64(&self, name: &str) -> ModelResult<Option<f64>> {
        match self.get(name) {
            None => Ok(None),
            Some(_) => self.f64(name).map(Some),
        }
    }

    pub fn i64(&self, name: &str) -> ModelResult<i64> {
        let datum = self.require(name)?;
        datum
            .as_i64()
            .ok_or_else(|| shape_mismatch(self.context(name), Shape::Int, datum.datum_type()))
    }

    pub fn opt_i64(&self, name: &str) -> ModelResult<Option<i64>> {
        match self.get(name) {
            None => Ok(None),
            Some(_) => self.i64(name).map(Some),
        }
    }

    pub fn array(&self, name: &str) -> ModelResult<&'a ArrayDatum> {
        let datum = self.require(name)?;
        datum.as_array().ok_or_else(|| {
            shape_mismatch(self.context(name), Shape::Array(&Shape::Any), datum.datum_type())
        })
    }

    pub fn f64_array(&self, name: &str) -> ModelResult<Vec<f64>> {
        let datum = self.require(name)?;
        datum.to_f64_vec().ok_or_else(|| {
            shape_mismatch(self.context(name), Shape::Array(&Shape::Number), datum.datum_type())
        })
    }

    fn context(&self, name: &str) -> String {
        format!("{}.{name}", self.generator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_display_marks_optionals() {
        static PARAMS: [ParamSpec; 2] = [
            ParamSpec::required("lambda", Shape::Number, "mean"),
            ParamSpec::optional("offset", Shape::Int, "shift"),
        ];
        let sig = Signature::new(&PARAMS);
        assert_eq!(sig.to_string(), "lambda: Number, offset: Int?");
        assert_eq!(sig.required().count(), 1);
        assert!(sig.param("offset").is_some_and(|p| p.optional));
    }

    #[test]
    fn param_args_accessors() {
        let rate = Datum::Float(2.0);
        let n = Datum::Int(3);
        let args = ParamArgs::new("Test", [("rate", Some(&rate)), ("n", Some(&n)), ("max", None)]);
        assert_eq!(args.f64("rate").unwrap(), 2.0);
        assert_eq!(args.f64("n").unwrap(), 3.0);
        assert_eq!(args.opt_i64("max").unwrap(), None);
        assert_eq!(args.values().count(), 2);
        let err = args.i64("rate").unwrap_err();
        assert_eq!(
            err.to_string(),
            "shape mismatch in Test.rate: expected Int, found Float"
        );
    }
}
