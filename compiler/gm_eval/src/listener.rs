//! Change notification.
//!
//! Listeners hear that the scopes changed and nothing more; they re-read the
//! interpreter's query surface for details.

use std::sync::Arc;

use gm_ir::ScopeKind;
use parking_lot::Mutex;
use tracing::info;

/// What just happened.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A statement was applied to the given scope.
    StatementApplied(ScopeKind),
    /// A sampling pass committed.
    Sampled,
    /// Scopes and graph were cleared.
    Reset,
}

/// Receives scope change notifications.
pub trait ChangeListener {
    fn scopes_changed(&self, event: ChangeEvent);
}

/// Logs each event at `info` level.
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingListener;

impl ChangeListener for TracingListener {
    fn scopes_changed(&self, event: ChangeEvent) {
        info!(?event, "scopes changed");
    }
}

/// Records events into a buffer shared between clones.
///
/// Hand one clone to the interpreter and keep another to read the events.
#[derive(Clone, Debug, Default)]
pub struct RecordingListener {
    events: Arc<Mutex<Vec<ChangeEvent>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        RecordingListener::default()
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl ChangeListener for RecordingListener {
    fn scopes_changed(&self, event: ChangeEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_buffer() {
        let listener = RecordingListener::new();
        let handle = listener.clone();
        listener.scopes_changed(ChangeEvent::Sampled);
        listener.scopes_changed(ChangeEvent::StatementApplied(ScopeKind::Data));
        assert_eq!(
            handle.events(),
            vec![
                ChangeEvent::Sampled,
                ChangeEvent::StatementApplied(ScopeKind::Data)
            ]
        );
        handle.clear();
        assert!(listener.events().is_empty());
    }
}
