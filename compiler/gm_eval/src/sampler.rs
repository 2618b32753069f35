//! Ancestral (forward) sampling over the graph.
//!
//! A pass walks upstream from its targets, redrawing every non-constant value
//! after its inputs. Redrawn data goes into an overlay keyed by value id;
//! each id is redrawn at most once per pass, so every consumer of a random
//! variable sees the same fresh draw. The interpreter commits the overlay to
//! the graph only when the whole pass succeeds.

use gm_model::{
    depth_limit_exceeded, internal, missing_generator, Datum, Graph, ModelResult, Origin, ValueId,
};
use gm_stack::ensure_sufficient_stack;
use rand::RngCore;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

pub(crate) struct Sampler<'a> {
    graph: &'a Graph,
    /// Values that keep their data (the data scope).
    fixed: FxHashSet<ValueId>,
    overlay: FxHashMap<ValueId, Datum>,
    /// Memo of values already redrawn this pass.
    done: FxHashSet<ValueId>,
    /// Values on the current recursion path.
    active: FxHashSet<ValueId>,
    rng: &'a mut dyn RngCore,
    max_depth: Option<usize>,
    depth: usize,
}

impl<'a> Sampler<'a> {
    pub(crate) fn new(
        graph: &'a Graph,
        fixed: FxHashSet<ValueId>,
        rng: &'a mut dyn RngCore,
        max_depth: Option<usize>,
    ) -> Self {
        Sampler {
            graph,
            fixed,
            overlay: FxHashMap::default(),
            done: FxHashSet::default(),
            active: FxHashSet::default(),
            rng,
            max_depth,
            depth: 0,
        }
    }

    /// Redraws `value` and everything upstream of it not yet redrawn.
    pub(crate) fn resample(&mut self, value: ValueId) -> ModelResult<()> {
        if self.done.contains(&value) || self.fixed.contains(&value) {
            return Ok(());
        }
        if !self.active.insert(value) {
            let label = self.graph.try_value(value).map_or("<missing>", |v| v.label());
            return Err(internal(format!("dependency cycle through `{label}`")));
        }
        self.depth += 1;
        let result = match self.max_depth {
            Some(limit) if self.depth > limit => Err(depth_limit_exceeded(limit)),
            _ => ensure_sufficient_stack(|| self.redraw(value)),
        };
        self.depth -= 1;
        self.active.remove(&value);
        result?;
        self.done.insert(value);
        Ok(())
    }

    fn redraw(&mut self, value: ValueId) -> ModelResult<()> {
        let graph = self.graph;
        let node = graph
            .try_value(value)
            .ok_or_else(|| internal(format!("dangling value handle {value:?}")))?;
        match node.origin() {
            Origin::Constant => Ok(()),
            Origin::Deterministic(g) | Origin::Random(g) => {
                let generator = graph
                    .try_generator(*g)
                    .ok_or_else(|| missing_generator(node.label()))?;
                for input in generator.inputs() {
                    self.resample(input)?;
                }
                let overlay = &self.overlay;
                let datum = graph.invoke_with(*g, &|v| overlay.get(&v), &mut *self.rng)?;
                trace!(value = node.label(), generator = generator.name(), %datum, "redrawn");
                self.overlay.insert(value, datum);
                Ok(())
            }
            Origin::Assembled(assembly) => {
                for source in assembly.sources() {
                    self.resample(source)?;
                }
                let Datum::Array(mut rebuilt) = self.current(value).clone() else {
                    return Err(internal(format!(
                        "assembled value `{}` does not hold an array",
                        node.label()
                    )));
                };
                for (index, slot) in assembly.slots().iter().enumerate() {
                    let Some(slot) = slot else {
                        continue;
                    };
                    let source = self.current(slot.source);
                    let entry = match slot.offset {
                        None => Some(source.clone()),
                        Some(offset) => source
                            .as_array()
                            .and_then(|array| array.get(offset))
                            .cloned(),
                    };
                    rebuilt.set_entry(index, entry);
                }
                trace!(value = node.label(), "reassembled");
                self.overlay.insert(value, Datum::Array(rebuilt));
                Ok(())
            }
        }
    }

    fn current(&self, value: ValueId) -> &Datum {
        self.overlay
            .get(&value)
            .unwrap_or_else(|| self.graph.datum(value))
    }

    /// The redrawn data, ready to commit.
    pub(crate) fn finish(self) -> FxHashMap<ValueId, Datum> {
        self.overlay
    }
}
