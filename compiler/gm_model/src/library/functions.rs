//! Deterministic functions: identity, array construction and element
//! extraction used by the interpreter, plus registered utilities.

use rand::RngCore;

use crate::datum::{ArrayDatum, Datum, DatumType, MAX_ARRAY_LEN};
use crate::errors::{arithmetic, invalid_index, shape_mismatch, ModelResult};
use crate::generator::{GeneratorDef, GeneratorKind, ParamArgs, ParamSpec, Signature};
use crate::library::operators::inclusive_range;
use crate::shape::Shape;

/// A deterministic function given by a plain `fn`.
pub struct Function {
    name: &'static str,
    description: &'static str,
    signatures: &'static [Signature],
    apply: fn(&ParamArgs<'_>) -> ModelResult<Datum>,
}

impl GeneratorDef for Function {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> GeneratorKind {
        GeneratorKind::Function
    }

    fn signatures(&self) -> &'static [Signature] {
        self.signatures
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn generate(&self, args: &ParamArgs<'_>, _rng: &mut dyn RngCore) -> ModelResult<Datum> {
        (self.apply)(args)
    }
}

fn to_index(index: i64, context: &str) -> ModelResult<usize> {
    usize::try_from(index).map_err(|_| invalid_index(index, context))
}

fn element(array: &ArrayDatum, index: i64, context: &str) -> ModelResult<Datum> {
    let i = to_index(index, context)?;
    if i >= array.len() {
        return Err(invalid_index(index, format!("{context} (length {})", array.len())));
    }
    array
        .get(i)
        .cloned()
        .ok_or_else(|| shape_mismatch(format!("{context}[{i}]"), array.elem(), "unset entry"))
}

pub static IDENTITY: Function = Function {
    name: "identity",
    description: "Returns its argument unchanged.",
    signatures: &[Signature {
        params: &[ParamSpec::required("x", Shape::Any, "the value to copy")],
    }],
    apply: |args| args.require("x").cloned(),
};

/// Builds an array from every bound parameter, in binding order.
///
/// Instantiated by the interpreter for array literals with non-constant
/// elements; parameters are named `0`, `1`, ...
pub static ARRAY: Function = Function {
    name: "array",
    description: "Constructs an array from its elements.",
    signatures: &[],
    apply: |args| {
        let items = args.values().cloned().collect();
        Ok(Datum::Array(ArrayDatum::from_elements(items)?))
    },
};

pub static ELEMENT_AT: Function = Function {
    name: "elementAt",
    description: "Extracts one element of an array.",
    signatures: &[Signature {
        params: &[
            ParamSpec::required("index", Shape::Int, "the position"),
            ParamSpec::required("array", Shape::Array(&Shape::Any), "the source array"),
        ],
    }],
    apply: |args| element(args.array("array")?, args.i64("index")?, "elementAt"),
};

pub static ELEMENTS_AT: Function = Function {
    name: "elementsAt",
    description: "Extracts the elements of an array at the given positions.",
    signatures: &[Signature {
        params: &[
            ParamSpec::required("indices", Shape::Array(&Shape::Int), "the positions"),
            ParamSpec::required("array", Shape::Array(&Shape::Any), "the source array"),
        ],
    }],
    apply: |args| {
        let array = args.array("array")?;
        let indices = args.require("indices")?.to_i64_vec().ok_or_else(|| {
            shape_mismatch("elementsAt.indices", Shape::Array(&Shape::Int), "unset entry")
        })?;
        let items = indices
            .into_iter()
            .map(|i| element(array, i, "elementsAt"))
            .collect::<ModelResult<Vec<_>>>()?;
        Ok(Datum::Array(ArrayDatum::new(array.elem().clone(), items)))
    },
};

pub static RANGE: Function = Function {
    name: "range",
    description: "The integers from `from` to `to` inclusive.",
    signatures: &[Signature {
        params: &[
            ParamSpec::required("from", Shape::Int, "first value"),
            ParamSpec::required("to", Shape::Int, "last value"),
        ],
    }],
    apply: |args| inclusive_range(args.i64("from")?, args.i64("to")?),
};

pub static REP: Function = Function {
    name: "rep",
    description: "An array repeating `element` `times` times.",
    signatures: &[Signature {
        params: &[
            ParamSpec::required("element", Shape::Any, "the repeated value"),
            ParamSpec::required("times", Shape::Int, "number of copies"),
        ],
    }],
    apply: |args| {
        let element = args.require("element")?;
        let count = args.i64("times")?;
        let times = to_index(count, "rep.times")?;
        if times > MAX_ARRAY_LEN {
            return Err(invalid_index(count, format!("rep.times (longer than {MAX_ARRAY_LEN})")));
        }
        Ok(Datum::Array(ArrayDatum::new(
            element.datum_type(),
            vec![element.clone(); times],
        )))
    },
};

pub static SUM: Function = Function {
    name: "sum",
    description: "Sum of a numeric array.",
    signatures: &[Signature {
        params: &[ParamSpec::required(
            "array",
            Shape::Array(&Shape::Number),
            "the values to add",
        )],
    }],
    apply: |args| {
        let array = args.array("array")?;
        let items = array.set_items("sum")?;
        if *array.elem() == DatumType::Int {
            items
                .into_iter()
                .filter_map(Datum::as_i64)
                .try_fold(0_i64, i64::checked_add)
                .map(Datum::Int)
                .ok_or_else(|| arithmetic("sum", "integer overflow"))
        } else {
            Ok(Datum::Float(items.into_iter().filter_map(Datum::as_f64).sum()))
        }
    },
};

pub static LENGTH: Function = Function {
    name: "length",
    description: "Number of entries of an array, set or not.",
    signatures: &[Signature {
        params: &[ParamSpec::required("array", Shape::Array(&Shape::Any), "the array")],
    }],
    apply: |args| Ok(Datum::Int(args.array("array")?.len() as i64)),
};

/// Jukes-Cantor instantaneous rate matrix over four nucleotide states,
/// scaled so the expected substitution rate is `meanRate`.
pub static JUKES_CANTOR: Function = Function {
    name: "jukesCantor",
    description: "The Jukes-Cantor rate matrix.",
    signatures: &[Signature {
        params: &[ParamSpec::optional(
            "meanRate",
            Shape::Number,
            "total rate of leaving a state, 1.0 when omitted",
        )],
    }],
    apply: |args| {
        let rate = args.opt_f64("meanRate")?.unwrap_or(1.0);
        let off = rate / 3.0;
        Ok(Datum::matrix((0..4).map(|row| {
            (0..4)
                .map(|col| if row == col { -rate } else { off })
                .collect()
        })))
    },
};
