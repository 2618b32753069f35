//! Value/generator graph for the modeling language.
//!
//! - [`Graph`]: arena of value and generator nodes with a dependents index
//! - [`GeneratorDef`]: declared parameter schema plus behavior of a generator
//! - [`GeneratorRegistry`]: named catalog and argument resolver
//! - [`library`]: built-in distributions, functions and operators
//! - [`ModelError`]: the error taxonomy shared by every layer

mod datum;
mod errors;
mod generator;
mod graph;
mod ids;
pub mod library;
mod registry;
mod shape;

pub use datum::{ArrayDatum, Datum, DatumType, MAX_ARRAY_LEN};
pub use errors::{
    arithmetic, depth_limit_exceeded, internal, invalid_index, missing_generator,
    no_matching_signature, sampling_failed, shape_mismatch, stochastic_in_data_scope,
    undeclared_identifier, unknown_generator, ModelError, ModelResult,
};
pub use generator::{GeneratorDef, GeneratorKind, ParamArgs, ParamSpec, Signature};
pub use graph::{
    Assembly, Binding, Checkpoint, Dependent, GeneratorNode, Graph, Origin, Slot, ValueNode,
};
pub use ids::{GeneratorId, NodeRef, ValueId};
pub use registry::{match_signature, Arguments, GeneratorRegistry, ParamMatch};
pub use shape::Shape;
