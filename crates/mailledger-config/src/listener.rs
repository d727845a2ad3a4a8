//! Change notification.
//!
//! After a mutation commits a new value, every registered [`Listener`] is
//! told about it, synchronously and in registration order. Listeners observe;
//! they cannot veto. A listener that fails is logged and skipped, and the
//! value stays committed.
//!
//! # Example
//!
//! ```ignore
//! use mailledger_config::{ConfigEvent, ConfigSet};
//!
//! let mut cs = ConfigSet::with_default_types();
//! cs.add_listener(|event: &ConfigEvent| {
//!     println!("{} changed: {} -> {}", event.name, event.old, event.new);
//! });
//! ```

use thiserror::Error;

use crate::definition::NativeValue;

/// Which operation produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// `string_set` or `native_set`.
    Set,
    /// `reset`.
    Reset,
}

/// A committed, value-changing mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigEvent {
    /// Name as addressed, `scope:name` for scoped variables.
    pub name: String,
    /// Value before the mutation.
    pub old: NativeValue,
    /// Value after the mutation.
    pub new: NativeValue,
    /// Operation that caused it.
    pub kind: EventKind,
}

/// Error reported by a listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    /// Creates an error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Observer of committed configuration changes.
///
/// Any `FnMut(&ConfigEvent)` closure is a listener that never fails;
/// implement the trait directly to report failures.
pub trait Listener {
    /// Called after `event` has been committed.
    ///
    /// # Errors
    ///
    /// A returned error is logged; it does not undo the change or stop
    /// later listeners.
    fn on_change(&mut self, event: &ConfigEvent) -> Result<(), ListenerError>;
}

impl<F> Listener for F
where
    F: FnMut(&ConfigEvent),
{
    fn on_change(&mut self, event: &ConfigEvent) -> Result<(), ListenerError> {
        self(event);
        Ok(())
    }
}

/// A listener that logs every change using tracing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl Listener for LoggingListener {
    fn on_change(&mut self, event: &ConfigEvent) -> Result<(), ListenerError> {
        tracing::info!(
            name = %event.name,
            old = event.old,
            new = event.new,
            kind = ?event.kind,
            "config changed"
        );
        Ok(())
    }
}

/// Ordered list of listeners.
#[derive(Default)]
pub(crate) struct Listeners(Vec<Box<dyn Listener>>);

impl Listeners {
    pub(crate) fn push(&mut self, listener: Box<dyn Listener>) {
        self.0.push(listener);
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn notify(&mut self, event: &ConfigEvent) {
        for (index, listener) in self.0.iter_mut().enumerate() {
            if let Err(e) = listener.on_change(event) {
                tracing::warn!(index, name = %event.name, error = %e, "Listener failed");
            }
        }
    }
}
