//! The statement forms: plain and stochastic assignment, indexed assignment
//! and removal.

use gm_ir::{CallArgs, ExprArena, ExprId, ScopeKind, Statement, TaggedStatement};
use gm_model::library::IDENTITY;
use gm_model::{
    invalid_index, shape_mismatch, stochastic_in_data_scope, undeclared_identifier, ArrayDatum,
    Assembly, Datum, DatumType, GeneratorDef, GeneratorKind, ModelResult, Origin, Slot, ValueId,
    MAX_ARRAY_LEN,
};
use tracing::debug;

use super::eval::Evaluated;
use super::Interpreter;

/// How the right-hand side of an indexed assignment spreads over the range.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Spread {
    /// The whole datum goes to every index.
    Broadcast,
    /// Element `k` of the source goes to the `k`-th index.
    Elementwise,
}

impl Interpreter {
    pub(super) fn apply(
        &mut self,
        arena: &ExprArena,
        tagged: &TaggedStatement,
    ) -> ModelResult<Option<ValueId>> {
        let scope = tagged.scope;
        match &tagged.statement {
            Statement::Assign { target, value } => {
                self.assign(arena, target, *value, scope).map(Some)
            }
            Statement::Draw {
                target,
                distribution,
                args,
            } => self
                .draw(arena, target, distribution, args, scope)
                .map(Some),
            Statement::IndexedAssign {
                target,
                range,
                value,
            } => self
                .assign_indexed(arena, target, range, *value, scope)
                .map(Some),
            Statement::Remove { target } => self.remove(target, scope).map(|_| None),
        }
    }

    /// `target = expr;`
    fn assign(
        &mut self,
        arena: &ExprArena,
        target: &str,
        expr: ExprId,
        scope: ScopeKind,
    ) -> ModelResult<ValueId> {
        let value = match self.eval(arena, expr, scope)? {
            evaluated @ Evaluated::Function(_) => self.realize(evaluated, Some(target))?,
            Evaluated::Value(v) => {
                let node = self.graph.value(v);
                if node.name().is_none() && !self.graph.is_used(v) {
                    // A fresh intermediate: the assignment just names it.
                    self.graph.set_name(v, target);
                    v
                } else {
                    self.alias(target, v)?
                }
            }
        };
        self.bind(scope, target, value);
        Ok(value)
    }

    /// A new value tied to `source` through the identity function.
    fn alias(&mut self, target: &str, source: ValueId) -> ModelResult<ValueId> {
        let def: &'static dyn GeneratorDef = &IDENTITY;
        let g = self.graph.add_generator(def, Some(0));
        self.graph.set_input(g, "x", source);
        self.realize(Evaluated::Function(g), Some(target))
    }

    /// `target ~ Dist(args);`
    fn draw(
        &mut self,
        arena: &ExprArena,
        target: &str,
        distribution: &str,
        args: &CallArgs,
        scope: ScopeKind,
    ) -> ModelResult<ValueId> {
        if scope == ScopeKind::Data {
            return Err(stochastic_in_data_scope(target));
        }
        let arguments = self.eval_args(arena, args, scope)?;
        let g = self.registry.resolve(
            &mut self.graph,
            GeneratorKind::Distribution,
            distribution,
            &arguments,
        )?;
        let value = self.realize(Evaluated::Function(g), Some(target))?;
        self.bind(scope, target, value);
        Ok(value)
    }

    /// `target[range] = expr;`
    ///
    /// Every write produces a fresh array value bound to `target`, sized to
    /// cover the largest index. The value previously bound is left as it
    /// was; untouched indices read from it (or from the sources it was
    /// assembled from), so the right-hand side may mention `target` itself.
    /// Each written index records the value it came from, so a later
    /// sampling pass can reassemble the array from redrawn sources.
    fn assign_indexed(
        &mut self,
        arena: &ExprArena,
        target: &str,
        range: &[ExprId],
        expr: ExprId,
        scope: ScopeKind,
    ) -> ModelResult<ValueId> {
        let indices = self.eval_range(arena, range, scope)?;
        let source = self.eval_value(arena, expr, scope)?;
        let src = self.graph.datum(source).clone();
        let Some(&max) = indices.iter().max() else {
            return Err(shape_mismatch(
                format!("{target}[]"),
                "at least one index",
                "none",
            ));
        };
        let context = format!("{target}[..]");
        if max >= MAX_ARRAY_LEN {
            return Err(invalid_index(
                i64::try_from(max).unwrap_or(i64::MAX),
                format!("{context} (longer than {MAX_ARRAY_LEN})"),
            ));
        }
        let len = max + 1;

        let existing = self.env.scope(scope).lookup(target);
        let (mut array, spread, mut assembly) = match existing {
            Some(prior) => {
                let node = self.graph.value(prior);
                let current = match node.datum() {
                    Datum::Array(current) => current.clone(),
                    scalar => {
                        return Err(shape_mismatch(
                            context,
                            "an array target",
                            scalar.datum_type(),
                        ))
                    }
                };
                let spread = spread_into(current.elem(), &src, indices.len(), &context)?;
                let assembly = match node.origin() {
                    Origin::Assembled(assembly) => assembly.clone(),
                    Origin::Constant => Assembly::with_len(current.len()),
                    Origin::Deterministic(_) | Origin::Random(_) => {
                        let mut assembly = Assembly::with_len(current.len());
                        for i in 0..current.len() {
                            assembly.record(
                                i,
                                Slot {
                                    source: prior,
                                    offset: Some(i),
                                },
                            );
                        }
                        assembly
                    }
                };
                (current, spread, assembly)
            }
            None => {
                let (elem, spread) = match &src {
                    Datum::Array(items) if indices.len() > 1 => {
                        if items.len() != indices.len() {
                            return Err(shape_mismatch(
                                context,
                                format!("{} elements", indices.len()),
                                format!("{} elements", items.len()),
                            ));
                        }
                        (items.elem().clone(), Spread::Elementwise)
                    }
                    other => (other.datum_type(), Spread::Broadcast),
                };
                (ArrayDatum::unset(elem, len), spread, Assembly::with_len(len))
            }
        };

        array.grow_to(len);
        for (position, &index) in indices.iter().enumerate() {
            let (entry, offset) = match (spread, &src) {
                (Spread::Elementwise, Datum::Array(items)) => {
                    (items.get(position).cloned(), Some(position))
                }
                _ => (Some(src.clone()), None),
            };
            array.set_entry(index, entry);
            assembly.record(index, Slot { source, offset });
        }

        let value = self.graph.add_value(
            Some(target),
            Datum::Array(array),
            Origin::Assembled(assembly),
        );
        debug!(name = target, %scope, len, ?existing, "array written");
        self.bind(scope, target, value);
        Ok(value)
    }

    /// Range entries flattened to indices, in order.
    fn eval_range(
        &mut self,
        arena: &ExprArena,
        range: &[ExprId],
        scope: ScopeKind,
    ) -> ModelResult<Vec<usize>> {
        let mut indices = Vec::new();
        for expr in range {
            let v = self.eval_value(arena, *expr, scope)?;
            match self.graph.datum(v) {
                Datum::Int(i) => indices.push(to_index(*i)?),
                datum @ Datum::Array(items) if matches!(items.elem(), DatumType::Int) => {
                    let Some(items) = datum.to_i64_vec() else {
                        return Err(shape_mismatch("index range", "Int[]", "unset entries"));
                    };
                    for i in items {
                        indices.push(to_index(i)?);
                    }
                }
                other => return Err(shape_mismatch("index range", "Int", other.datum_type())),
            }
        }
        Ok(indices)
    }

    /// `remove(target);`
    fn remove(&mut self, target: &str, scope: ScopeKind) -> ModelResult<ValueId> {
        let removed = self
            .env
            .scope_mut(scope)
            .unbind(target)
            .ok_or_else(|| undeclared_identifier(target))?;
        debug!(name = target, %scope, "unbound");
        Ok(removed)
    }

    fn bind(&mut self, scope: ScopeKind, name: &str, value: ValueId) {
        let replaced = self.env.scope_mut(scope).bind(name, value);
        debug!(
            name,
            %scope,
            ?value,
            random = self.graph.is_random(value),
            replaced = replaced.is_some(),
            "bound"
        );
    }
}

fn to_index(i: i64) -> ModelResult<usize> {
    usize::try_from(i).map_err(|_| invalid_index(i, "index range"))
}

/// How `src` fills a range of `count` indices of an array of `elem`s.
fn spread_into(
    elem: &DatumType,
    src: &Datum,
    count: usize,
    context: &str,
) -> ModelResult<Spread> {
    let src_type = src.datum_type();
    if &src_type == elem {
        return Ok(Spread::Broadcast);
    }
    match src {
        Datum::Array(items) if items.elem() == elem && items.len() == count => {
            Ok(Spread::Elementwise)
        }
        Datum::Array(items) if items.elem() == elem => Err(shape_mismatch(
            context,
            format!("{count} elements"),
            format!("{} elements", items.len()),
        )),
        _ => Err(shape_mismatch(context, elem, src_type)),
    }
}
