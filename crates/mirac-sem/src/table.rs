//! Scoped symbol table.
//!
//! A LIFO stack of scopes over an incrementally maintained name map. Each
//! binding records its scope depth and whether it may be shadowed; closing
//! a scope restores whatever each of its bindings shadowed.
//!
//! Depth 0 is the outermost scope, the one holding the non-shadowable
//! built-in type names.

use mirac_util::{FxHashMap, Name, SymbolId};

/// A name-map entry: the visible symbol plus its insertion facts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Binding {
    pub symbol: SymbolId,
    pub depth: usize,
    pub can_shadow: bool,
}

/// Outcome of [`SymbolTable::insert`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertResult {
    Successful,
    /// A binding of the same name already exists at the same depth
    NameConflict(SymbolId),
    /// The outer binding of the same name forbids shadowing
    ProhibitedShadowing(SymbolId),
}

impl InsertResult {
    #[inline]
    pub fn is_successful(self) -> bool {
        matches!(self, InsertResult::Successful)
    }
}

/// Scope stack + name map.
///
/// # Examples
///
/// ```
/// use mirac_sem::table::SymbolTable;
/// use mirac_util::{Name, SymbolId};
///
/// let mut table = SymbolTable::new();
/// table.open_scope();
/// let x = Name::intern("x");
/// assert!(table.insert(x, SymbolId::new(0), true).is_successful());
/// assert_eq!(table.find(x).unwrap().symbol, SymbolId::new(0));
/// ```
#[derive(Default)]
pub struct SymbolTable {
    names: FxHashMap<Name, Binding>,
    /// Per-scope journal: each entry is (name, binding it replaced)
    scopes: Vec<Vec<(Name, Option<Binding>)>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `open_scope` calls unmatched by `close_scope`, minus one:
    /// the outermost open scope is depth 0.
    pub fn depth(&self) -> usize {
        self.scopes.len().saturating_sub(1)
    }

    pub fn open_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// Close the innermost scope, restoring every binding it shadowed.
    pub fn close_scope(&mut self) {
        let journal = self.scopes.pop().expect("close_scope without an open scope");
        for (name, previous) in journal.into_iter().rev() {
            match previous {
                Some(binding) => {
                    self.names.insert(name, binding);
                }
                None => {
                    self.names.remove(&name);
                }
            }
        }
    }

    /// Bind `name` to `symbol` in the current scope.
    ///
    /// Fails with `NameConflict` when the name is already bound at the
    /// current depth, and with `ProhibitedShadowing` when the visible
    /// outer binding was inserted as non-shadowable.
    pub fn insert(&mut self, name: Name, symbol: SymbolId, can_shadow: bool) -> InsertResult {
        let depth = self.depth();
        let previous = self.names.get(&name).copied();

        if let Some(existing) = previous {
            if existing.depth == depth {
                return InsertResult::NameConflict(existing.symbol);
            }
            if !existing.can_shadow {
                return InsertResult::ProhibitedShadowing(existing.symbol);
            }
        }

        let journal = self.scopes.last_mut().expect("insert without an open scope");
        journal.push((name, previous));
        self.names.insert(
            name,
            Binding {
                symbol,
                depth,
                can_shadow,
            },
        );
        InsertResult::Successful
    }

    /// The currently visible binding for `name`, if any.
    pub fn find(&self, name: Name) -> Option<Binding> {
        self.names.get(&name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(index: usize) -> SymbolId {
        SymbolId::new(index)
    }

    #[test]
    fn test_depth_counting() {
        let mut table = SymbolTable::new();
        table.open_scope();
        assert_eq!(table.depth(), 0);
        table.open_scope();
        assert_eq!(table.depth(), 1);
        table.close_scope();
        assert_eq!(table.depth(), 0);
    }

    #[test]
    fn test_find_missing() {
        let table = SymbolTable::new();
        assert!(table.find(Name::intern("nope")).is_none());
    }

    #[test]
    fn test_same_depth_is_a_conflict() {
        let mut table = SymbolTable::new();
        table.open_scope();
        let name = Name::intern("x");
        assert!(table.insert(name, sym(0), true).is_successful());
        assert_eq!(
            table.insert(name, sym(1), true),
            InsertResult::NameConflict(sym(0))
        );
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let mut table = SymbolTable::new();
        let name = Name::intern("x");
        table.open_scope();
        table.insert(name, sym(0), true);
        table.open_scope();
        assert!(table.insert(name, sym(1), true).is_successful());
        assert_eq!(table.find(name).unwrap().symbol, sym(1));

        table.close_scope();
        // The outer binding is visible again.
        assert_eq!(table.find(name).unwrap().symbol, sym(0));
    }

    #[test]
    fn test_non_shadowable_binding_blocks_inner_insert() {
        let mut table = SymbolTable::new();
        let name = Name::intern("int32");
        table.open_scope();
        table.insert(name, sym(0), false);
        table.open_scope();
        assert_eq!(
            table.insert(name, sym(1), true),
            InsertResult::ProhibitedShadowing(sym(0))
        );
        // The failed insert left the original binding visible.
        assert_eq!(table.find(name).unwrap().symbol, sym(0));
    }

    #[test]
    fn test_close_scope_removes_fresh_bindings() {
        let mut table = SymbolTable::new();
        let name = Name::intern("y");
        table.open_scope();
        table.open_scope();
        table.insert(name, sym(0), true);
        table.close_scope();
        assert!(table.find(name).is_none());
    }

    #[test]
    fn test_shadow_chain_restores_in_order() {
        let mut table = SymbolTable::new();
        let name = Name::intern("x");
        table.open_scope();
        table.insert(name, sym(0), true);
        table.open_scope();
        table.insert(name, sym(1), true);
        table.open_scope();
        table.insert(name, sym(2), true);

        assert_eq!(table.find(name).unwrap().symbol, sym(2));
        table.close_scope();
        assert_eq!(table.find(name).unwrap().symbol, sym(1));
        table.close_scope();
        assert_eq!(table.find(name).unwrap().symbol, sym(0));
    }

    #[test]
    fn test_binding_records_depth() {
        let mut table = SymbolTable::new();
        table.open_scope();
        table.open_scope();
        let name = Name::intern("z");
        table.insert(name, sym(4), true);
        let binding = table.find(name).unwrap();
        assert_eq!(binding.depth, 1);
        assert!(binding.can_shadow);
    }
}
