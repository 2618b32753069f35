//! Built-in generator library.
//!
//! Distributions and utility functions are registered by name through
//! [`register_standard`]. Operator, array-construction and element-extraction
//! functions are not registered; the interpreter instantiates them directly.

pub mod distributions;
pub mod functions;
pub mod math;
pub mod operators;

#[cfg(test)]
mod tests;

use crate::registry::GeneratorRegistry;

pub use functions::{ARRAY, ELEMENTS_AT, ELEMENT_AT, IDENTITY};
pub use operators::{binary_operator, evaluate_binary, evaluate_unary, unary_operator};

/// Registers every built-in distribution and named function.
///
/// `Categorical` is registered twice: the probability-vector form first, then
/// the category-count form. A single argument always fits the first one, so
/// the count form is reached only from a registry that lists it first.
pub fn register_standard(registry: &mut GeneratorRegistry) {
    registry
        .register(&distributions::NORMAL)
        .register(&distributions::LOG_NORMAL)
        .register(&distributions::EXP)
        .register(&distributions::GAMMA)
        .register(&distributions::BETA)
        .register(&distributions::UNIFORM)
        .register(&distributions::POISSON)
        .register(&distributions::BERNOULLI)
        .register(&distributions::GEOMETRIC)
        .register(&distributions::CATEGORICAL_PROBS)
        .register(&distributions::CATEGORICAL_COUNT)
        .register(&distributions::DIRICHLET);

    registry
        .register(&functions::IDENTITY)
        .register(&functions::RANGE)
        .register(&functions::REP)
        .register(&functions::SUM)
        .register(&functions::LENGTH)
        .register(&functions::JUKES_CANTOR);

    for function in &math::MATH_FUNCTIONS {
        registry.register(function);
    }
}
