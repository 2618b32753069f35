//! Expression evaluation.
//!
//! An expression evaluates either to an existing or freshly created value,
//! or to a function node not yet applied. Operands and call arguments are
//! always realized into values first, so every function node reads its
//! inputs from bound values.

use gm_ir::{CallArgs, ExprArena, ExprId, ExprKind, ScopeKind};
use gm_model::library::{binary_operator, unary_operator, ARRAY, ELEMENTS_AT, ELEMENT_AT};
use gm_model::{
    depth_limit_exceeded, shape_mismatch, undeclared_identifier, Arguments, ArrayDatum, Datum,
    DatumType, GeneratorDef, GeneratorId, GeneratorKind, ModelResult, Origin, ValueId,
};
use gm_stack::ensure_sufficient_stack;
use tracing::trace;

use super::Interpreter;

/// Result of evaluating an expression.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum Evaluated {
    Value(ValueId),
    /// A function node whose output has not been produced yet.
    Function(GeneratorId),
}

/// Literal text as integer, then float, then boolean, then string.
pub(super) fn parse_literal(text: &str) -> Datum {
    let quoted = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| text.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')));
    if let Some(inner) = quoted {
        return Datum::Str(inner.to_string());
    }
    if let Ok(i) = text.parse::<i64>() {
        return Datum::Int(i);
    }
    if let Ok(x) = text.parse::<f64>() {
        return Datum::Float(x);
    }
    match text {
        "true" => Datum::Bool(true),
        "false" => Datum::Bool(false),
        _ => Datum::Str(text.to_string()),
    }
}

impl Interpreter {
    pub(super) fn eval(
        &mut self,
        arena: &ExprArena,
        expr: ExprId,
        scope: ScopeKind,
    ) -> ModelResult<Evaluated> {
        self.depth += 1;
        let result = match self.max_depth {
            Some(limit) if self.depth > limit => Err(depth_limit_exceeded(limit)),
            _ => ensure_sufficient_stack(|| self.eval_inner(arena, expr, scope)),
        };
        self.depth -= 1;
        result
    }

    /// Evaluates and realizes: a function result is applied and its output
    /// added as an anonymous value.
    pub(super) fn eval_value(
        &mut self,
        arena: &ExprArena,
        expr: ExprId,
        scope: ScopeKind,
    ) -> ModelResult<ValueId> {
        let evaluated = self.eval(arena, expr, scope)?;
        self.realize(evaluated, None)
    }

    /// Produces the value for an evaluation result, naming it if given a name.
    pub(super) fn realize(
        &mut self,
        evaluated: Evaluated,
        name: Option<&str>,
    ) -> ModelResult<ValueId> {
        match evaluated {
            Evaluated::Value(v) => Ok(v),
            Evaluated::Function(g) => {
                let datum = self.graph.invoke(g, &mut self.rng)?;
                let origin = match self.graph.generator(g).kind() {
                    GeneratorKind::Function => Origin::Deterministic(g),
                    GeneratorKind::Distribution => Origin::Random(g),
                };
                Ok(self.graph.add_value(name, datum, origin))
            }
        }
    }

    fn eval_inner(
        &mut self,
        arena: &ExprArena,
        expr: ExprId,
        scope: ScopeKind,
    ) -> ModelResult<Evaluated> {
        match arena.get(expr) {
            ExprKind::Literal(text) => {
                let datum = parse_literal(text);
                trace!(%datum, "literal");
                Ok(Evaluated::Value(self.graph.add_value(None, datum, Origin::Constant)))
            }
            ExprKind::Ident(name) => self
                .env
                .lookup(scope, name)
                .map(Evaluated::Value)
                .ok_or_else(|| undeclared_identifier(name)),
            ExprKind::Binary { op, left, right } => {
                let left = self.eval_value(arena, *left, scope)?;
                let right = self.eval_value(arena, *right, scope)?;
                let g = self.graph.add_generator(binary_operator(*op), Some(0));
                self.graph.set_input(g, "left", left);
                self.graph.set_input(g, "right", right);
                Ok(Evaluated::Function(g))
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.eval_value(arena, *operand, scope)?;
                let g = self.graph.add_generator(unary_operator(*op), Some(0));
                self.graph.set_input(g, "operand", operand);
                Ok(Evaluated::Function(g))
            }
            ExprKind::Array(elements) => {
                let values = elements
                    .iter()
                    .map(|e| self.eval_value(arena, *e, scope))
                    .collect::<ModelResult<Vec<_>>>()?;
                self.pack(&values)
            }
            ExprKind::Index { target, indices } => self.eval_index(arena, *target, indices, scope),
            ExprKind::Call { name, args } => {
                let arguments = self.eval_args(arena, args, scope)?;
                let g = self.registry.resolve(
                    &mut self.graph,
                    GeneratorKind::Function,
                    name,
                    &arguments,
                )?;
                Ok(Evaluated::Function(g))
            }
        }
    }

    /// An array of the given element values: a constant if every element is
    /// constant, otherwise an array-construction function over them.
    fn pack(&mut self, values: &[ValueId]) -> ModelResult<Evaluated> {
        if values.iter().all(|v| self.graph.value(*v).is_constant()) {
            let items = values.iter().map(|v| self.graph.datum(*v).clone()).collect();
            let datum = Datum::Array(ArrayDatum::from_elements(items)?);
            return Ok(Evaluated::Value(self.graph.add_value(None, datum, Origin::Constant)));
        }
        let def: &'static dyn GeneratorDef = &ARRAY;
        let g = self.graph.add_generator(def, None);
        for (i, v) in values.iter().enumerate() {
            self.graph.set_input(g, &i.to_string(), *v);
        }
        Ok(Evaluated::Function(g))
    }

    fn eval_index(
        &mut self,
        arena: &ExprArena,
        target: ExprId,
        indices: &[ExprId],
        scope: ScopeKind,
    ) -> ModelResult<Evaluated> {
        let array = self.eval_value(arena, target, scope)?;
        let array_type = self.graph.datum(array).datum_type();
        if !matches!(array_type, DatumType::Array(_)) {
            return Err(shape_mismatch("indexing", "an array", array_type));
        }
        let index = match indices {
            [] => return Err(shape_mismatch("indexing", "at least one index", "none")),
            [single] => self.eval_value(arena, *single, scope)?,
            many => {
                let values = many
                    .iter()
                    .map(|e| self.eval_value(arena, *e, scope))
                    .collect::<ModelResult<Vec<_>>>()?;
                let packed = self.pack_indices(&values)?;
                self.realize(packed, None)?
            }
        };
        let (def, index_param): (&'static dyn GeneratorDef, &str) =
            match self.graph.datum(index) {
                Datum::Array(_) => (&ELEMENTS_AT, "indices"),
                _ => (&ELEMENT_AT, "index"),
            };
        let g = self.graph.add_generator(def, Some(0));
        self.graph.set_input(g, index_param, index);
        self.graph.set_input(g, "array", array);
        Ok(Evaluated::Function(g))
    }

    /// Several index entries flattened into one integer array.
    ///
    /// Scalar entries keep their dependencies through an array-construction
    /// function; entries that are themselves arrays are spliced in by value.
    fn pack_indices(&mut self, values: &[ValueId]) -> ModelResult<Evaluated> {
        if values
            .iter()
            .all(|v| !matches!(self.graph.datum(*v), Datum::Array(_)))
        {
            return self.pack(values);
        }
        let mut flat = Vec::new();
        for v in values {
            match self.graph.datum(*v) {
                Datum::Int(i) => flat.push(*i),
                datum @ Datum::Array(_) => match datum.to_i64_vec() {
                    Some(items) => flat.extend(items),
                    None => {
                        return Err(shape_mismatch(
                            "index list",
                            "Int[]",
                            datum.datum_type(),
                        ))
                    }
                },
                other => return Err(shape_mismatch("index list", "Int", other.datum_type())),
            }
        }
        let datum = Datum::int_array(flat);
        Ok(Evaluated::Value(self.graph.add_value(None, datum, Origin::Constant)))
    }

    /// Realizes call arguments, keeping their named or positional form.
    pub(super) fn eval_args(
        &mut self,
        arena: &ExprArena,
        args: &CallArgs,
        scope: ScopeKind,
    ) -> ModelResult<Arguments> {
        match args {
            CallArgs::Named(named) => {
                let mut out = Vec::with_capacity(named.len());
                for (name, expr) in named {
                    out.push((&**name, self.eval_value(arena, *expr, scope)?));
                }
                Ok(Arguments::named(out))
            }
            CallArgs::Positional(exprs) => {
                let mut out = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    out.push(self.eval_value(arena, *expr, scope)?);
                }
                Ok(Arguments::positional(out))
            }
        }
    }
}
