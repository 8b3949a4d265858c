//! Symbol model.
//!
//! Symbols are arena-allocated by the [`SymbolContext`] and referenced by
//! [`SymbolId`] from AST nodes and from one another. A symbol moves
//! through the lifecycle Placeholder -> Incomplete -> Complete as the
//! passes fill in its kind-specific fields.
//!
//! [`SymbolContext`]: crate::SymbolContext

use indexmap::IndexMap;
use mirac_util::{Name, SymbolId, TypeId};

/// Definition lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolState {
    /// Allocated, nothing resolved yet
    Placeholder,
    /// Definition in progress
    Incomplete,
    /// Fully resolved
    Complete,
}

/// A named entity: module, built-in type, local variable, or function.
#[derive(Debug)]
pub struct Symbol {
    pub name: Name,
    pub state: SymbolState,
    pub kind: SymbolKind,
}

impl Symbol {
    pub fn start_definition(&mut self) {
        self.state = SymbolState::Incomplete;
    }

    pub fn finish_definition(&mut self) {
        self.state = SymbolState::Complete;
    }

    /// The kind as it reads in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            SymbolKind::Module(_) => "module",
            SymbolKind::Type(_) => "type",
            SymbolKind::Variable(_) => "variable",
            SymbolKind::Function(_) => "function",
        }
    }

    pub fn as_module(&self) -> Option<&ModuleSymbol> {
        match &self.kind {
            SymbolKind::Module(module) => Some(module),
            _ => None,
        }
    }

    pub fn as_module_mut(&mut self) -> Option<&mut ModuleSymbol> {
        match &mut self.kind {
            SymbolKind::Module(module) => Some(module),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&TypeSymbol> {
        match &self.kind {
            SymbolKind::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_variable(&self) -> Option<&VariableSymbol> {
        match &self.kind {
            SymbolKind::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    pub fn as_variable_mut(&mut self) -> Option<&mut VariableSymbol> {
        match &mut self.kind {
            SymbolKind::Variable(variable) => Some(variable),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionSymbol> {
        match &self.kind {
            SymbolKind::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut FunctionSymbol> {
        match &mut self.kind {
            SymbolKind::Function(function) => Some(function),
            _ => None,
        }
    }
}

/// Kind-specific symbol payload.
#[derive(Debug)]
pub enum SymbolKind {
    Module(ModuleSymbol),
    Type(TypeSymbol),
    Variable(VariableSymbol),
    Function(FunctionSymbol),
}

/// Module symbol: a name -> members multimap with stable insertion order.
#[derive(Debug, Default)]
pub struct ModuleSymbol {
    members: IndexMap<Name, Vec<SymbolId>>,
}

impl ModuleSymbol {
    pub fn add_member(&mut self, name: Name, symbol: SymbolId) {
        self.members.entry(name).or_default().push(symbol);
    }

    /// Every member registered under `name` (duplicates included).
    pub fn find_member(&self, name: Name) -> &[SymbolId] {
        self.members.get(&name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All members in registration order.
    pub fn members(&self) -> impl Iterator<Item = (Name, SymbolId)> + '_ {
        self.members
            .iter()
            .flat_map(|(name, symbols)| symbols.iter().map(move |&symbol| (*name, symbol)))
    }

    pub fn member_count(&self) -> usize {
        self.members.values().map(Vec::len).sum()
    }
}

/// Built-in type symbol.
#[derive(Debug)]
pub struct TypeSymbol {
    pub ty: TypeId,
}

/// Local variable or parameter symbol.
#[derive(Debug, Default)]
pub struct VariableSymbol {
    /// The declared type's [`TypeSymbol`], once resolved
    pub type_symbol: Option<SymbolId>,
}

/// Function symbol.
#[derive(Debug, Default)]
pub struct FunctionSymbol {
    /// Parameter symbols, in declaration order
    pub params: Vec<SymbolId>,
    /// How many trailing parameters carry default values
    pub default_count: usize,
    /// The return type's [`TypeSymbol`], once resolved
    pub return_type: Option<SymbolId>,
    /// Index of the function's declaration inside its enclosing
    /// declarations block; the body lives there
    pub body_decl: Option<usize>,
}

impl FunctionSymbol {
    /// Parameters a call site must supply.
    pub fn required_params(&self) -> usize {
        self.params.len() - self.default_count
    }
}
