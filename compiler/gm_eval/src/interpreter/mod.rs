//! Statement interpreter.
//!
//! Consumes scope-tagged statements one at a time, growing the graph and
//! rebinding ids in the two scopes. Each statement is atomic: the graph is
//! checkpointed first and rolled back if any step fails, and scope bindings
//! are only written once every fallible step has succeeded.

mod assign;
mod builder;
mod eval;


pub use builder::InterpreterBuilder;

use gm_ir::{ExprArena, ScopeKind, StatementList, TaggedStatement};
use gm_model::{
    Datum, GeneratorRegistry, Graph, ModelResult, NodeRef, ValueId, ValueNode,
};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rustc_hash::FxHashSet;
use tracing::{debug, instrument};

use crate::environment::Environment;
use crate::listener::{ChangeEvent, ChangeListener};
use crate::sampler::Sampler;

/// Interpreter state: the graph, both scopes, the generator catalog and the
/// random source.
pub struct Interpreter {
    graph: Graph,
    env: Environment,
    registry: GeneratorRegistry,
    rng: StdRng,
    listeners: Vec<Box<dyn ChangeListener>>,
    history: Vec<TaggedStatement>,
    max_depth: Option<usize>,
    /// Current expression nesting depth.
    depth: usize,
}

impl Interpreter {
    /// An interpreter with the standard library and an entropy-seeded RNG.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// Applies one statement to its scope.
    ///
    /// Returns the value now bound to the statement's target, or `None` for
    /// a removal.
    #[instrument(
        level = "debug",
        skip_all,
        fields(scope = %tagged.scope, target = tagged.statement.target())
    )]
    pub fn process(
        &mut self,
        arena: &ExprArena,
        tagged: &TaggedStatement,
    ) -> ModelResult<Option<ValueId>> {
        let checkpoint = self.graph.checkpoint();
        self.depth = 0;
        match self.apply(arena, tagged) {
            Ok(bound) => {
                self.history.push(tagged.clone());
                self.notify(ChangeEvent::StatementApplied(tagged.scope));
                Ok(bound)
            }
            Err(err) => {
                self.graph.rollback(checkpoint);
                debug!(error = %err, "statement rejected");
                Err(err)
            }
        }
    }

    /// Applies every statement in order, stopping at the first failure.
    pub fn process_all(&mut self, statements: &StatementList) -> ModelResult<()> {
        for tagged in statements.statements() {
            self.process(statements.arena(), tagged)?;
        }
        Ok(())
    }

    /// One forward sample of every model-scope sink.
    pub fn sample(&mut self) -> ModelResult<()> {
        let sinks = self.sinks(ScopeKind::Model);
        self.sample_from(&sinks)
    }

    /// One forward sample of the given target values and everything upstream
    /// of them.
    ///
    /// Data-scope values are never redrawn. Nothing is written unless the
    /// whole pass succeeds.
    #[instrument(level = "debug", skip_all, fields(targets = targets.len()))]
    pub fn sample_from(&mut self, targets: &[ValueId]) -> ModelResult<()> {
        let fixed: FxHashSet<ValueId> = self.env.scope(ScopeKind::Data).ids().collect();
        let mut sampler = Sampler::new(&self.graph, fixed, &mut self.rng, self.max_depth);
        for &target in targets {
            sampler.resample(target)?;
        }
        let redrawn = sampler.finish();
        debug!(redrawn = redrawn.len(), "sampling pass committed");
        for (value, datum) in redrawn {
            self.graph.set_datum(value, datum);
        }
        self.notify(ChangeEvent::Sampled);
        Ok(())
    }

    /// Clears both scopes, the graph and the statement history.
    pub fn reset(&mut self) {
        self.graph = Graph::new();
        self.env.clear();
        self.history.clear();
        debug!("interpreter reset");
        self.notify(ChangeEvent::Reset);
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    /// Statements applied since construction or the last reset.
    pub fn history(&self) -> &[TaggedStatement] {
        &self.history
    }

    /// The value bound to `name` as seen from `scope`.
    pub fn lookup(&self, scope: ScopeKind, name: &str) -> Option<ValueId> {
        self.env.lookup(scope, name)
    }

    pub fn value(&self, scope: ScopeKind, name: &str) -> Option<&ValueNode> {
        self.lookup(scope, name).map(|id| self.graph.value(id))
    }

    pub fn datum(&self, scope: ScopeKind, name: &str) -> Option<&Datum> {
        self.value(scope, name).map(ValueNode::datum)
    }

    pub fn is_random(&self, value: ValueId) -> bool {
        self.graph.is_random(value)
    }

    /// Bound values of `scope` that no live consumer references, in display
    /// order.
    ///
    /// Consumers count as live when reachable upstream from some binding of
    /// the scope; generators left behind by rebinding do not hide a sink.
    pub fn sinks(&self, scope: ScopeKind) -> Vec<ValueId> {
        let bound = self.env.scope(scope);
        let mut referenced = FxHashSet::default();
        let mut seen = FxHashSet::default();
        let mut stack: Vec<ValueId> = bound.ids().collect();
        while let Some(value) = stack.pop() {
            if !seen.insert(value) {
                continue;
            }
            for parent in self.graph.value_parents(value) {
                referenced.insert(parent);
                stack.push(parent);
            }
        }
        bound.ids().filter(|v| !referenced.contains(v)).collect()
    }

    pub fn upstream(&self, node: NodeRef) -> Vec<NodeRef> {
        self.graph.upstream(node)
    }

    pub fn downstream(&self, node: NodeRef) -> Vec<NodeRef> {
        self.graph.downstream(node)
    }

    /// Current data of every binding in `scope`, in display order.
    pub fn snapshot(&self, scope: ScopeKind) -> IndexMap<String, Datum> {
        self.env
            .scope(scope)
            .iter()
            .map(|(name, id)| (name.to_string(), self.graph.datum(id).clone()))
            .collect()
    }

    /// Joint log density of the model scope's random variables at their
    /// current draws.
    ///
    /// `None` if any of those distributions defines no density.
    pub fn log_density(&self) -> ModelResult<Option<f64>> {
        let mut total = 0.0;
        for id in self.env.scope(ScopeKind::Model).ids() {
            if !self.graph.value(id).is_random_variable() {
                continue;
            }
            match self.graph.log_density_at(id)? {
                Some(density) => total += density,
                None => return Ok(None),
            }
        }
        Ok(Some(total))
    }

    fn notify(&self, event: ChangeEvent) {
        for listener in &self.listeners {
            listener.scopes_changed(event);
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
