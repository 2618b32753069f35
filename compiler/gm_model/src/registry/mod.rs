//! Generator catalog and argument resolver.
//!
//! The registry maps a display name to one or more [`GeneratorDef`]s, kept in
//! registration order, with separate tables for functions and distributions.
//! [`GeneratorRegistry::resolve`] picks the first definition and constructor
//! form whose declared parameters the supplied arguments satisfy, then
//! instantiates it in the graph with every argument bound via
//! [`Graph::set_input`].

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::errors::{no_matching_signature, unknown_generator, ModelResult};
use crate::generator::{GeneratorDef, GeneratorKind, Signature};
use crate::graph::{Binding, Graph};
use crate::ids::{GeneratorId, ValueId};


/// Caller-supplied arguments: all named or all positional.
#[derive(Clone, Debug, PartialEq)]
pub enum Arguments {
    Named(IndexMap<Box<str>, ValueId>),
    Positional(Vec<ValueId>),
}

impl Arguments {
    pub fn named<'n>(args: impl IntoIterator<Item = (&'n str, ValueId)>) -> Self {
        Arguments::Named(args.into_iter().map(|(n, v)| (n.into(), v)).collect())
    }

    pub fn positional(args: impl IntoIterator<Item = ValueId>) -> Self {
        Arguments::Positional(args.into_iter().collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Arguments::Named(args) => args.len(),
            Arguments::Positional(args) => args.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Argument set for error messages.
    pub fn describe(&self) -> String {
        match self {
            Arguments::Named(args) => args.keys().map(|k| &**k).collect::<Vec<_>>().join(", "),
            Arguments::Positional(args) => format!("{} positional", args.len()),
        }
    }
}

/// A successful match: every declared parameter with the argument bound to
/// it, or `None` for an absent optional.
pub type ParamMatch = SmallVec<[(&'static str, Option<ValueId>); 4]>;

/// Match arguments against one constructor form.
///
/// A single named argument against a one-parameter form binds to that
/// parameter whatever its name; otherwise every required parameter must be
/// named and every name must be declared.
pub fn match_signature(signature: &Signature, args: &Arguments) -> Option<ParamMatch> {
    let params = signature.params;
    match args {
        Arguments::Named(named) => {
            if let ([param], 1) = (params, named.len()) {
                let (_, value) = named.first()?;
                return Some(SmallVec::from_iter([(param.name, Some(*value))]));
            }
            if signature.required().any(|p| !named.contains_key(p.name)) {
                return None;
            }
            if named.keys().any(|k| signature.param(k).is_none()) {
                return None;
            }
            Some(
                params
                    .iter()
                    .map(|p| (p.name, named.get(p.name).copied()))
                    .collect(),
            )
        }
        Arguments::Positional(values) => {
            if values.len() == params.len() {
                Some(
                    params
                        .iter()
                        .zip(values)
                        .map(|(p, v)| (p.name, Some(*v)))
                        .collect(),
                )
            } else if values.is_empty() && params.len() == 1 {
                Some(SmallVec::from_iter([(params[0].name, None)]))
            } else {
                None
            }
        }
    }
}

type Catalog = FxHashMap<&'static str, SmallVec<[&'static dyn GeneratorDef; 2]>>;

/// Named catalog of generator definitions.
#[derive(Default)]
pub struct GeneratorRegistry {
    functions: Catalog,
    distributions: Catalog,
}

impl GeneratorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        GeneratorRegistry::default()
    }

    /// A registry holding the built-in library.
    pub fn standard() -> Self {
        let mut registry = GeneratorRegistry::new();
        crate::library::register_standard(&mut registry);
        registry
    }

    /// Adds a definition after any already registered under the same name.
    pub fn register(&mut self, def: &'static dyn GeneratorDef) -> &mut Self {
        self.catalog_mut(def.kind())
            .entry(def.name())
            .or_default()
            .push(def);
        self
    }

    /// Candidates for a name, in registration order.
    pub fn candidates(&self, kind: GeneratorKind, name: &str) -> &[&'static dyn GeneratorDef] {
        self.catalog(kind)
            .get(name)
            .map(|defs| defs.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains(&self, kind: GeneratorKind, name: &str) -> bool {
        !self.candidates(kind, name).is_empty()
    }

    /// Registered names of one kind, sorted.
    pub fn names(&self, kind: GeneratorKind) -> Vec<&'static str> {
        let mut names: Vec<_> = self.catalog(kind).keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered definitions across both kinds.
    pub fn len(&self) -> usize {
        self.functions.values().map(SmallVec::len).sum::<usize>()
            + self.distributions.values().map(SmallVec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.distributions.is_empty()
    }

    /// Finds the definition and constructor form for `name` that accept
    /// `args`, and instantiates it in `graph`.
    ///
    /// Candidates are tried in registration order, each form in declaration
    /// order; the first form that accepts the arguments wins.
    pub fn resolve(
        &self,
        graph: &mut Graph,
        kind: GeneratorKind,
        name: &str,
        args: &Arguments,
    ) -> ModelResult<GeneratorId> {
        let candidates = self.candidates(kind, name);
        if candidates.is_empty() {
            return Err(unknown_generator(kind, name));
        }
        for &def in candidates {
            for (index, signature) in def.signatures().iter().enumerate() {
                let Some(matched) = match_signature(signature, args) else {
                    continue;
                };
                let generator = graph.add_generator(def, Some(index));
                for (param, value) in matched {
                    match value {
                        Some(v) => graph.set_input(generator, param, v),
                        None => graph.set_param(generator, param, Binding::Absent),
                    }
                }
                debug!(generator = name, %kind, signature = %signature, "resolved");
                return Ok(generator);
            }
        }
        Err(no_matching_signature(name, args.describe()))
    }

    fn catalog(&self, kind: GeneratorKind) -> &Catalog {
        match kind {
            GeneratorKind::Function => &self.functions,
            GeneratorKind::Distribution => &self.distributions,
        }
    }

    fn catalog_mut(&mut self, kind: GeneratorKind) -> &mut Catalog {
        match kind {
            GeneratorKind::Function => &mut self.functions,
            GeneratorKind::Distribution => &mut self.distributions,
        }
    }
}
