//! # mailledger-config
//!
//! Typed configuration engine for the `MailLedger` mail client.
//!
//! This crate provides:
//! - A registry of named, typed variables ([`ConfigSet`])
//! - Pluggable type handlers (bool, number, sort order)
//! - Sort orders with per-context method tables and `reverse`/`last` modifiers
//! - Scoped variables (`account:name`) that inherit from a global parent
//! - Validators and change listeners
//! - A text dump of the current settings
//!
//! Values live in [`Storage`] cells owned by the module that uses them; the
//! registry reads and writes them through a shared handle.
//!
//! ```ignore
//! use mailledger_config::{ConfigSet, RegisterFlags, SortContext, Storage, VariableDef};
//!
//! let sort = Storage::new();
//! let mut cs = ConfigSet::with_default_types();
//! cs.register(
//!     vec![VariableDef::new("sort", SortContext::Index.var_type(), &sort).with_initial(1)],
//!     RegisterFlags::NONE,
//! )?;
//! cs.string_set("sort", "reverse-date")?;
//! assert_eq!(cs.string_get("sort")?, "reverse-date");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod definition;
pub mod dump;
mod error;
pub mod listener;
pub mod scope;
pub mod set;
pub mod types;
pub mod validator;

pub use definition::{NativeValue, RegisterFlags, SCOPE_DELIMITER, Storage, VarType, VariableDef};
pub use dump::{DumpOptions, DumpStyle, dump};
pub use error::{Error, ErrorKind, Result};
pub use listener::{ConfigEvent, EventKind, Listener, ListenerError, LoggingListener};
pub use scope::ScopeId;
pub use set::{ConfigSet, Lookup, SetStatus, VarId, VarKey};
pub use types::{
    BoolType, DataType, NumberType, SortContext, SortKey, SortOrder, SortType, TypeHandler,
    builtin_handlers,
};
pub use validator::{Validation, Validator};
