//! `InterpreterBuilder` for configuring an [`Interpreter`].

use gm_model::{GeneratorRegistry, Graph};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::Interpreter;
use crate::environment::Environment;
use crate::listener::ChangeListener;

/// Builder for [`Interpreter`] instances.
///
/// Defaults: the standard generator library, an entropy-seeded RNG, no
/// listeners and no recursion limit beyond available stack.
#[derive(Default)]
pub struct InterpreterBuilder {
    seed: Option<u64>,
    registry: Option<GeneratorRegistry>,
    listeners: Vec<Box<dyn ChangeListener>>,
    max_depth: Option<usize>,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the random source, making every draw reproducible.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replace the generator catalog.
    #[must_use]
    pub fn registry(mut self, registry: GeneratorRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Add a change listener. May be called repeatedly.
    #[must_use]
    pub fn listener(mut self, listener: Box<dyn ChangeListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Fail with a depth-limit error when expression nesting or sampling
    /// recursion exceeds `depth`.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn build(self) -> Interpreter {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Interpreter {
            graph: Graph::new(),
            env: Environment::new(),
            registry: self.registry.unwrap_or_else(GeneratorRegistry::standard),
            rng,
            listeners: self.listeners,
            history: Vec::new(),
            max_depth: self.max_depth,
            depth: 0,
        }
    }
}
