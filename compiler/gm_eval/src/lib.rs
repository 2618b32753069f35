//! Statement interpreter and ancestral sampler.
//!
//! - [`Interpreter`]: applies scope-tagged statements to a growing graph
//! - [`Environment`]: the data and model scopes
//! - [`ChangeListener`]: notification hook for scope changes
//!
//! Sampling goes through [`Interpreter::sample`] and
//! [`Interpreter::sample_from`].

mod environment;
mod interpreter;
mod listener;
mod sampler;

pub use environment::{Environment, Scope};
pub use interpreter::{Interpreter, InterpreterBuilder};
pub use listener::{ChangeEvent, ChangeListener, RecordingListener, TracingListener};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Installs a tracing subscriber for debug output.
///
/// Safe to call more than once. Does nothing unless `RUST_LOG` is set, e.g.
/// `RUST_LOG=gm_eval=debug` or `RUST_LOG=gm_model=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};
        use tracing_tree::HierarchicalLayer;

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(HierarchicalLayer::new(2).with_targets(true))
                .with(filter)
                .init();
        }
    });
}
