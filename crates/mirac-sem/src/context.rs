//! Symbol context: the arenas behind semantic analysis.
//!
//! The context owns every [`Symbol`] and every [`Type`] created during a
//! compilation; AST nodes and symbols reference them by id only, so the
//! context must outlive the annotated AST. Construction pre-populates the
//! built-in types (`int8`..`int64`, `uint8`..`uint64`, `bool`) and binds
//! their type symbols into the table's outermost scope as non-shadowable.

use mirac_par::ast::{BinOp, UnOp};
use mirac_util::{FxHashMap, Name, SymbolId, TypeId};

use crate::symbol::{
    FunctionSymbol, ModuleSymbol, Symbol, SymbolKind, SymbolState, TypeSymbol, VariableSymbol,
};
use crate::table::SymbolTable;
use crate::types::Type;

/// Arena owner for symbols and types.
pub struct SymbolContext {
    symbols: Vec<Symbol>,
    types: Vec<Type>,
    int_symbols: FxHashMap<(u8, bool), SymbolId>,
    int32_type: TypeId,
    bool_type: TypeId,
}

impl SymbolContext {
    /// Build the context and seed `table` with the built-in type names.
    ///
    /// Opens the table's outermost scope (depth 0) and leaves it open for
    /// the rest of the compilation.
    pub fn new(table: &mut SymbolTable) -> Self {
        let mut context = Self {
            symbols: Vec::new(),
            types: vec![Type::Undefined],
            int_symbols: FxHashMap::default(),
            int32_type: TypeId::UNDEFINED,
            bool_type: TypeId::UNDEFINED,
        };

        table.open_scope();

        for width in [8u8, 16, 32, 64] {
            for signed in [true, false] {
                let prefix = if signed { "int" } else { "uint" };
                let name = Name::intern(&format!("{}{}", prefix, width));
                let ty = context.add_type(Type::Integer { width, signed });
                let symbol = context.add_type_symbol(name, ty);
                table.insert(name, symbol, false);
                context.int_symbols.insert((width, signed), symbol);
            }
        }
        context.int32_type = context
            .type_symbol_type(context.int_symbols[&(32, true)])
            .expect("int32 was just created");

        let bool_name = Name::intern("bool");
        context.bool_type = context.add_type(Type::Boolean);
        let bool_symbol = context.add_type_symbol(bool_name, context.bool_type);
        table.insert(bool_name, bool_symbol, false);

        context
    }

    fn add_type(&mut self, ty: Type) -> TypeId {
        let id = TypeId::new(self.types.len());
        self.types.push(ty);
        id
    }

    fn add_type_symbol(&mut self, name: Name, ty: TypeId) -> SymbolId {
        self.add_symbol(Symbol {
            name,
            state: SymbolState::Complete,
            kind: SymbolKind::Type(TypeSymbol { ty }),
        })
    }

    fn add_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId::new(self.symbols.len());
        self.symbols.push(symbol);
        id
    }

    /// Allocate a placeholder module symbol.
    pub fn add_module_symbol(&mut self, name: Name) -> SymbolId {
        self.add_symbol(Symbol {
            name,
            state: SymbolState::Placeholder,
            kind: SymbolKind::Module(ModuleSymbol::default()),
        })
    }

    /// Allocate a placeholder function symbol.
    pub fn add_function_symbol(&mut self, name: Name) -> SymbolId {
        self.add_symbol(Symbol {
            name,
            state: SymbolState::Placeholder,
            kind: SymbolKind::Function(FunctionSymbol::default()),
        })
    }

    /// Allocate a placeholder local-variable symbol.
    pub fn add_variable_symbol(&mut self, name: Name) -> SymbolId {
        self.add_symbol(Symbol {
            name,
            state: SymbolState::Placeholder,
            kind: SymbolKind::Variable(VariableSymbol::default()),
        })
    }

    #[inline]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    #[inline]
    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    #[inline]
    pub fn ty(&self, id: TypeId) -> &Type {
        &self.types[id.index()]
    }

    /// The `bool` type.
    #[inline]
    pub fn bool_type(&self) -> TypeId {
        self.bool_type
    }

    /// The `int32` type, the type of every number literal.
    #[inline]
    pub fn int32_type(&self) -> TypeId {
        self.int32_type
    }

    /// The type a type symbol stands for.
    pub fn type_symbol_type(&self, id: SymbolId) -> Option<TypeId> {
        self.symbol(id).as_type().map(|type_symbol| type_symbol.ty)
    }

    /// The declared type of a variable symbol, if resolution got there.
    pub fn variable_type(&self, id: SymbolId) -> Option<TypeId> {
        let type_symbol = self.symbol(id).as_variable()?.type_symbol?;
        self.type_symbol_type(type_symbol)
    }

    /// The return type of a function symbol, if resolution got there.
    pub fn function_return_type(&self, id: SymbolId) -> Option<TypeId> {
        let type_symbol = self.symbol(id).as_function()?.return_type?;
        self.type_symbol_type(type_symbol)
    }

    /// The type algebra for binary operators.
    ///
    /// Every rule requires identical operand types (identity on ids):
    /// comparisons on integers or bools yield `bool`; arithmetic and
    /// bitwise operators on integers yield the operand type; `&& ||` and
    /// the bitwise operators on bools yield `bool`. Everything else is a
    /// type error (`None`).
    pub fn binary_operation_type(&self, lhs: TypeId, op: BinOp, rhs: TypeId) -> Option<TypeId> {
        if lhs != rhs {
            return None;
        }

        match self.ty(lhs) {
            Type::Integer { .. } if op.is_comparison() => Some(self.bool_type),
            Type::Integer { .. } if op.is_arithmetic() || op.is_bitwise() => Some(lhs),
            Type::Boolean if op.is_comparison() || op.is_logic() || op.is_bitwise() => {
                Some(self.bool_type)
            }
            _ => None,
        }
    }

    /// The type algebra for prefix operators: `-` on any integer, `!` on
    /// `bool`, each yielding the operand type.
    pub fn prefix_operation_type(&self, op: UnOp, operand: TypeId) -> Option<TypeId> {
        match (self.ty(operand), op) {
            (Type::Integer { .. }, UnOp::Neg) => Some(operand),
            (Type::Boolean, UnOp::Not) => Some(operand),
            _ => None,
        }
    }
}
