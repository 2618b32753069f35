//! The value/generator graph.
//!
//! Values and generators live in two flat arenas addressed by [`ValueId`] and
//! [`GeneratorId`]. Edges are handles: a generator holds the ids of its bound
//! parameter values, a value records the generator (or assembly) it came
//! from. The reverse direction ("who consumes this value") is kept as a
//! dependents index maintained alongside the arena.
//!
//! Nodes are never removed individually. A statement that fails rolls the
//! arena back to a [`Checkpoint`] taken before it started.

use std::fmt;

use rand::RngCore;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::trace;

use crate::datum::Datum;
use crate::errors::{internal, shape_mismatch, ModelResult};
use crate::generator::{GeneratorDef, GeneratorKind, ParamArgs, Signature};
use crate::ids::{GeneratorId, NodeRef, ValueId};


/// Where a value's datum comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum Origin {
    /// A literal; never resampled.
    Constant,
    /// Output of a deterministic function.
    Deterministic(GeneratorId),
    /// A random variable drawn from a distribution.
    Random(GeneratorId),
    /// An array assembled by indexed assignments.
    Assembled(Assembly),
}

impl Origin {
    pub fn generator(&self) -> Option<GeneratorId> {
        match *self {
            Origin::Deterministic(g) | Origin::Random(g) => Some(g),
            Origin::Constant | Origin::Assembled(_) => None,
        }
    }
}

/// Where one index of an assembled array was last written from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    pub source: ValueId,
    /// `Some(i)`: element `i` of the source array. `None`: the whole source
    /// datum (a broadcast scalar or a row of a 2-D array).
    pub offset: Option<usize>,
}

/// Per-index provenance of an assembled array. The last write to an index
/// wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Assembly {
    slots: Vec<Option<Slot>>,
}

impl Assembly {
    pub fn with_len(len: usize) -> Self {
        Assembly {
            slots: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Option<Slot>] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<Slot> {
        self.slots.get(index).copied().flatten()
    }

    /// Records the provenance of `index`, growing as needed.
    pub fn record(&mut self, index: usize, slot: Slot) {
        if index >= self.slots.len() {
            self.slots.resize(index + 1, None);
        }
        self.slots[index] = Some(slot);
    }

    /// Distinct source values, in first-use order.
    pub fn sources(&self) -> SmallVec<[ValueId; 4]> {
        let mut out: SmallVec<[ValueId; 4]> = SmallVec::new();
        for slot in self.slots.iter().flatten() {
            if !out.contains(&slot.source) {
                out.push(slot.source);
            }
        }
        out
    }
}

/// A named or anonymous value.
#[derive(Clone, Debug, PartialEq)]
pub struct ValueNode {
    name: Option<Box<str>>,
    datum: Datum,
    origin: Origin,
}

impl ValueNode {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name for messages: the id, or `<anonymous>`.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }

    pub fn datum(&self) -> &Datum {
        &self.datum
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn generator(&self) -> Option<GeneratorId> {
        self.origin.generator()
    }

    /// A random variable, as opposed to a value merely downstream of one.
    pub fn is_random_variable(&self) -> bool {
        matches!(self.origin, Origin::Random(_))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self.origin, Origin::Constant)
    }
}

/// A parameter binding.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    Bound(ValueId),
    /// An optional parameter the caller left out.
    Absent,
}

impl Binding {
    pub fn value(self) -> Option<ValueId> {
        match self {
            Binding::Bound(v) => Some(v),
            Binding::Absent => None,
        }
    }
}

/// A generator instance with its parameter bindings.
#[derive(Clone)]
pub struct GeneratorNode {
    def: &'static dyn GeneratorDef,
    signature: Option<usize>,
    params: SmallVec<[(Box<str>, Binding); 4]>,
}

impl GeneratorNode {
    pub fn def(&self) -> &'static dyn GeneratorDef {
        self.def
    }

    pub fn name(&self) -> &'static str {
        self.def.name()
    }

    pub fn kind(&self) -> GeneratorKind {
        self.def.kind()
    }

    /// The constructor form this instance was resolved against, if any.
    pub fn signature(&self) -> Option<&'static Signature> {
        self.signature.and_then(|i| self.def.signatures().get(i))
    }

    /// Bindings in binding order.
    pub fn params(&self) -> &[(Box<str>, Binding)] {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<Binding> {
        self.params
            .iter()
            .find(|(n, _)| &**n == name)
            .map(|(_, b)| *b)
    }

    /// Bound input values, in binding order.
    pub fn inputs(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.params.iter().filter_map(|(_, b)| b.value())
    }
}

impl fmt::Debug for GeneratorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorNode")
            .field("def", &self.def.name())
            .field("signature", &self.signature)
            .field("params", &self.params)
            .finish()
    }
}

/// A consumer of a value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dependent {
    Generator(GeneratorId),
    /// An assembled array with at least one slot sourced from the value.
    Assembly(ValueId),
}

/// Arena sizes to roll back to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    values: usize,
    generators: usize,
}

/// Arena of values and generators plus the reverse indexes.
#[derive(Default)]
pub struct Graph {
    values: Vec<ValueNode>,
    generators: Vec<GeneratorNode>,
    /// Per value: its consumers.
    dependents: Vec<SmallVec<[Dependent; 2]>>,
    /// Per generator: the values it produced.
    outputs: Vec<SmallVec<[ValueId; 1]>>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    pub fn generator_count(&self) -> usize {
        self.generators.len()
    }

    /// Adds a value. Binding it into a scope is the caller's business.
    pub fn add_value(&mut self, name: Option<&str>, datum: Datum, origin: Origin) -> ValueId {
        let id = ValueId::from_len(self.values.len());
        self.link_origin(id, &origin);
        self.values.push(ValueNode {
            name: name.map(Into::into),
            datum,
            origin,
        });
        self.dependents.push(SmallVec::new());
        trace!(?id, name, "add value");
        id
    }

    /// Adds a generator with no bindings.
    ///
    /// `signature` indexes `def.signatures()`; `None` for generators built
    /// without resolution.
    pub fn add_generator(
        &mut self,
        def: &'static dyn GeneratorDef,
        signature: Option<usize>,
    ) -> GeneratorId {
        let id = GeneratorId::from_len(self.generators.len());
        self.generators.push(GeneratorNode {
            def,
            signature,
            params: SmallVec::new(),
        });
        self.outputs.push(SmallVec::new());
        trace!(?id, generator = def.name(), "add generator");
        id
    }

    pub fn value(&self, id: ValueId) -> &ValueNode {
        &self.values[id.index()]
    }

    pub fn try_value(&self, id: ValueId) -> Option<&ValueNode> {
        self.values.get(id.index())
    }

    pub fn generator(&self, id: GeneratorId) -> &GeneratorNode {
        &self.generators[id.index()]
    }

    pub fn try_generator(&self, id: GeneratorId) -> Option<&GeneratorNode> {
        self.generators.get(id.index())
    }

    pub fn datum(&self, id: ValueId) -> &Datum {
        &self.values[id.index()].datum
    }

    pub fn values(&self) -> impl Iterator<Item = (ValueId, &ValueNode)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (ValueId::from_len(i), v))
    }

    /// Binds a parameter without recording the value as used.
    ///
    /// No shape check happens here; an incompatible datum fails when the
    /// generator is invoked.
    pub fn set_param(&mut self, generator: GeneratorId, name: &str, binding: Binding) {
        let params = &mut self.generators[generator.index()].params;
        match params.iter_mut().find(|(n, _)| &**n == name) {
            Some((_, slot)) => *slot = binding,
            None => params.push((name.into(), binding)),
        }
    }

    /// Binds a parameter and records the generator as a dependent of the
    /// value.
    pub fn set_input(&mut self, generator: GeneratorId, name: &str, value: ValueId) {
        self.set_param(generator, name, Binding::Bound(value));
        let dependent = Dependent::Generator(generator);
        let deps = &mut self.dependents[value.index()];
        if !deps.contains(&dependent) {
            deps.push(dependent);
        }
    }

    pub fn dependents(&self, value: ValueId) -> &[Dependent] {
        &self.dependents[value.index()]
    }

    /// Whether any generator or assembly consumes the value.
    pub fn is_used(&self, value: ValueId) -> bool {
        !self.dependents[value.index()].is_empty()
    }

    pub fn outputs(&self, generator: GeneratorId) -> &[ValueId] {
        &self.outputs[generator.index()]
    }

    /// Values one hop upstream: a generator's bound inputs or an assembly's
    /// sources.
    pub fn value_parents(&self, value: ValueId) -> SmallVec<[ValueId; 4]> {
        match &self.values[value.index()].origin {
            Origin::Constant => SmallVec::new(),
            Origin::Deterministic(g) | Origin::Random(g) => match self.generators.get(g.index()) {
                Some(node) => node.inputs().collect(),
                None => SmallVec::new(),
            },
            Origin::Assembled(assembly) => assembly.sources(),
        }
    }

    /// Derived randomness: the value or anything upstream of it is a random
    /// variable.
    pub fn is_random(&self, value: ValueId) -> bool {
        let mut seen = FxHashSet::default();
        let mut stack = vec![value];
        while let Some(v) = stack.pop() {
            if !seen.insert(v) {
                continue;
            }
            if self.values[v.index()].is_random_variable() {
                return true;
            }
            stack.extend(self.value_parents(v));
        }
        false
    }

    pub fn upstream(&self, node: NodeRef) -> Vec<NodeRef> {
        match node {
            NodeRef::Value(v) => match &self.values[v.index()].origin {
                Origin::Constant => Vec::new(),
                Origin::Deterministic(g) | Origin::Random(g) => vec![NodeRef::Generator(*g)],
                Origin::Assembled(assembly) => {
                    assembly.sources().into_iter().map(NodeRef::Value).collect()
                }
            },
            NodeRef::Generator(g) => self.generators[g.index()]
                .inputs()
                .map(NodeRef::Value)
                .collect(),
        }
    }

    pub fn downstream(&self, node: NodeRef) -> Vec<NodeRef> {
        match node {
            NodeRef::Value(v) => self.dependents[v.index()]
                .iter()
                .map(|d| match *d {
                    Dependent::Generator(g) => NodeRef::Generator(g),
                    Dependent::Assembly(a) => NodeRef::Value(a),
                })
                .collect(),
            NodeRef::Generator(g) => self.outputs[g.index()]
                .iter()
                .copied()
                .map(NodeRef::Value)
                .collect(),
        }
    }

    /// Invokes a generator on the data currently stored in the graph.
    pub fn invoke(&self, generator: GeneratorId, rng: &mut dyn RngCore) -> ModelResult<Datum> {
        self.invoke_with(generator, &|_| None, rng)
    }

    /// Invokes a generator, reading inputs from `overrides` first.
    ///
    /// Bound data is checked against the resolved signature's declared
    /// shapes before the generator runs.
    pub fn invoke_with<'a>(
        &'a self,
        generator: GeneratorId,
        overrides: &dyn Fn(ValueId) -> Option<&'a Datum>,
        rng: &mut dyn RngCore,
    ) -> ModelResult<Datum> {
        let args = self.param_args(generator, overrides)?;
        self.generators[generator.index()].def.generate(&args, rng)
    }

    /// Log density of a random variable at its current datum.
    ///
    /// `Ok(None)` for values that are not random variables, or whose
    /// distribution defines no density.
    pub fn log_density_at(&self, value: ValueId) -> ModelResult<Option<f64>> {
        let node = &self.values[value.index()];
        let Origin::Random(g) = node.origin else {
            return Ok(None);
        };
        let args = self.param_args(g, &|_| None)?;
        self.generators[g.index()].def.log_density(&args, &node.datum)
    }

    fn param_args<'a>(
        &'a self,
        generator: GeneratorId,
        overrides: &dyn Fn(ValueId) -> Option<&'a Datum>,
    ) -> ModelResult<ParamArgs<'a>> {
        let node = self
            .generators
            .get(generator.index())
            .ok_or_else(|| internal(format!("dangling generator handle {generator:?}")))?;
        let signature = node.signature();
        let mut bound = Vec::with_capacity(node.params.len());
        for (name, binding) in &node.params {
            let datum = match *binding {
                Binding::Bound(v) => {
                    let datum = match overrides(v) {
                        Some(d) => d,
                        None => {
                            &self
                                .values
                                .get(v.index())
                                .ok_or_else(|| internal(format!("dangling value handle {v:?}")))?
                                .datum
                        }
                    };
                    Some(datum)
                }
                Binding::Absent => None,
            };
            if let Some(spec) = signature.and_then(|s| s.param(name)) {
                match datum {
                    Some(d) if !spec.shape.accepts(&d.datum_type()) => {
                        return Err(shape_mismatch(
                            format!("{}.{name}", node.name()),
                            spec.shape,
                            d.datum_type(),
                        ));
                    }
                    None if !spec.optional => {
                        return Err(shape_mismatch(
                            format!("{}.{name}", node.name()),
                            spec.shape,
                            "absent",
                        ));
                    }
                    _ => {}
                }
            }
            bound.push((&**name, datum));
        }
        Ok(ParamArgs::new(node.name(), bound))
    }

    /// Overwrites a value's datum. Used when a sampling pass commits.
    pub fn set_datum(&mut self, value: ValueId, datum: Datum) {
        self.values[value.index()].datum = datum;
    }

    pub fn set_name(&mut self, value: ValueId, name: &str) {
        self.values[value.index()].name = Some(name.into());
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            values: self.values.len(),
            generators: self.generators.len(),
        }
    }

    /// Drops every node created after `checkpoint`, and every reverse-index
    /// entry pointing at one.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        if checkpoint.values == self.values.len() && checkpoint.generators == self.generators.len()
        {
            return;
        }
        trace!(
            values = self.values.len() - checkpoint.values,
            generators = self.generators.len() - checkpoint.generators,
            "rollback"
        );
        self.values.truncate(checkpoint.values);
        self.dependents.truncate(checkpoint.values);
        self.generators.truncate(checkpoint.generators);
        self.outputs.truncate(checkpoint.generators);
        for deps in &mut self.dependents {
            deps.retain(|d| match *d {
                Dependent::Generator(g) => g.index() < checkpoint.generators,
                Dependent::Assembly(v) => v.index() < checkpoint.values,
            });
        }
        for outs in &mut self.outputs {
            outs.retain(|v| v.index() < checkpoint.values);
        }
    }

    fn link_origin(&mut self, value: ValueId, origin: &Origin) {
        match origin {
            Origin::Constant => {}
            Origin::Deterministic(g) | Origin::Random(g) => {
                let outs = &mut self.outputs[g.index()];
                if !outs.contains(&value) {
                    outs.push(value);
                }
            }
            Origin::Assembled(assembly) => {
                let dependent = Dependent::Assembly(value);
                for source in assembly.sources() {
                    let deps = &mut self.dependents[source.index()];
                    if !deps.contains(&dependent) {
                        deps.push(dependent);
                    }
                }
            }
        }
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("values", &self.values.len())
            .field("generators", &self.generators.len())
            .finish_non_exhaustive()
    }
}
