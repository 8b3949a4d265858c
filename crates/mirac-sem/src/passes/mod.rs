//! The three ordered semantic passes.
//!
//! 1. [`ModuleDefinitionPass`]: module symbol + function placeholders,
//!    member registration. No name errors yet.
//! 2. [`GlobalScopePass`]: function signatures - return and parameter
//!    types resolved, parameter symbols created and linked.
//! 3. [`LocalScopePass`]: function bodies - names, types, control flow.
//!
//! Every pass reports through the diagnostic manager and degrades
//! locally: an error aborts only the current node's analysis, leaving its
//! back-references unset, never the whole pass. Nodes marked bad by the
//! parser are skipped along with their children.

mod global_scope;
mod local_scope;
mod module_definition;

pub use global_scope::GlobalScopePass;
pub use local_scope::LocalScopePass;
pub use module_definition::ModuleDefinitionPass;
