//! Core module - Knowledge subsystem
//!
//! Store, document codec, version log, manifest and rule engine.

pub mod codec;
pub mod context;
pub mod entry;
pub mod error;
pub mod manifest;
pub mod rules;
pub mod similarity;
pub mod store;
pub mod version_log;
