//! Error taxonomy shared by the graph, the resolver, the interpreter and the
//! sampler.
//!
//! Constructors below are the preferred way to build errors; they keep the
//! message fields consistent across call sites.

use crate::generator::GeneratorKind;

/// Result of any model operation.
pub type ModelResult<T> = Result<T, ModelError>;

/// Every failure a statement or a sampling pass can surface.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("no {kind} named `{name}` is registered")]
    UnknownGenerator { kind: GeneratorKind, name: String },

    #[error("no signature of `{name}` accepts the arguments ({arguments})")]
    NoMatchingSignature { name: String, arguments: String },

    #[error("`{name}` is a stochastic declaration; only the model scope may draw from a distribution")]
    StochasticInDataScope { name: String },

    #[error("undeclared identifier `{name}`")]
    UndeclaredIdentifier { name: String },

    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("value `{value}` has no generator to resample it from")]
    MissingGenerator { value: String },

    #[error("internal inconsistency: {detail}")]
    InternalInconsistency { detail: String },

    #[error("invalid index {index} in {context}")]
    InvalidIndex { index: i64, context: String },

    #[error("`{op}`: {detail}")]
    Arithmetic { op: String, detail: String },

    #[error("sampling from `{name}` failed: {detail}")]
    SamplingFailed { name: String, detail: String },

    #[error("recursion depth limit of {depth} exceeded")]
    DepthLimitExceeded { depth: usize },
}

#[cold]
pub fn unknown_generator(kind: GeneratorKind, name: &str) -> ModelError {
    ModelError::UnknownGenerator {
        kind,
        name: name.to_string(),
    }
}

#[cold]
pub fn no_matching_signature(name: &str, arguments: String) -> ModelError {
    ModelError::NoMatchingSignature {
        name: name.to_string(),
        arguments,
    }
}

#[cold]
pub fn stochastic_in_data_scope(name: &str) -> ModelError {
    ModelError::StochasticInDataScope {
        name: name.to_string(),
    }
}

#[cold]
pub fn undeclared_identifier(name: &str) -> ModelError {
    ModelError::UndeclaredIdentifier {
        name: name.to_string(),
    }
}

#[cold]
pub fn shape_mismatch(
    context: impl Into<String>,
    expected: impl ToString,
    found: impl ToString,
) -> ModelError {
    ModelError::ShapeMismatch {
        context: context.into(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

#[cold]
pub fn missing_generator(value: &str) -> ModelError {
    ModelError::MissingGenerator {
        value: value.to_string(),
    }
}

#[cold]
pub fn internal(detail: impl Into<String>) -> ModelError {
    ModelError::InternalInconsistency {
        detail: detail.into(),
    }
}

#[cold]
pub fn invalid_index(index: i64, context: impl Into<String>) -> ModelError {
    ModelError::InvalidIndex {
        index,
        context: context.into(),
    }
}

#[cold]
pub fn arithmetic(op: &str, detail: impl Into<String>) -> ModelError {
    ModelError::Arithmetic {
        op: op.to_string(),
        detail: detail.into(),
    }
}

#[cold]
pub fn sampling_failed(name: &str, detail: impl ToString) -> ModelError {
    ModelError::SamplingFailed {
        name: name.to_string(),
        detail: detail.to_string(),
    }
}

#[cold]
pub fn depth_limit_exceeded(depth: usize) -> ModelError {
    ModelError::DepthLimitExceeded { depth }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = no_matching_signature("Normal", "mean, scale".into());
        assert_eq!(
            err.to_string(),
            "no signature of `Normal` accepts the arguments (mean, scale)"
        );

        let err = unknown_generator(GeneratorKind::Distribution, "Foo");
        assert_eq!(err.to_string(), "no distribution named `Foo` is registered");

        let err = shape_mismatch("x[1]", "Float", "Int[]");
        assert_eq!(
            err.to_string(),
            "shape mismatch in x[1]: expected Float, found Int[]"
        );
    }
}
