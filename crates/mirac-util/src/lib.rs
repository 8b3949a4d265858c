//! mirac-util - Foundation types shared by every compiler phase.
//!
//! This crate holds the pieces the rest of the pipeline is built on:
//!
//! - [`span`]: source files, the source map, and source locations
//! - [`name`]: interned identifier strings ([`Name`])
//! - [`ids`]: typed arena indices ([`SymbolId`], [`TypeId`], [`LoopId`])
//! - [`diagnostic`]: diagnostic messages, suggested fixes, and the manager
//! - [`stack`]: the recursion guard used by deeply recursive walks
//!
//! Nothing here knows about tokens, AST nodes, or symbols; those live in
//! the phase crates layered on top.

pub mod diagnostic;
pub mod ids;
pub mod name;
pub mod span;
pub mod stack;

pub use diagnostic::{Diagnostic, DiagnosticManager, Fix, FixDiff, Message, Severity};
pub use ids::{LoopId, SymbolId, TypeId};
pub use name::Name;
pub use span::{FileId, SourceFile, SourceLocation, SourceMap};
pub use stack::{StackGuard, StackOverflowError};

// Re-export the hash maps used throughout the compiler
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;
