//! AST node definitions.
//!
//! Three node families - declarations, statements, expressions - each with
//! a `Bad` placeholder produced by error recovery. Parents own their
//! children; the non-tree edges (a node's symbol, an expression's type, a
//! break's target loop) are arena indices, `None` until semantic analysis
//! fills them in.

use mirac_util::span::SourceLocation;
use mirac_util::{LoopId, Name, SymbolId, TypeId};

/// Placeholder node synthesized after a parse error.
#[derive(Debug, Clone)]
pub struct BadNode {
    pub location: SourceLocation,
}

// ============================================================================
// Declarations
// ============================================================================

/// Top-level declaration.
#[derive(Debug, Clone)]
pub enum Decl {
    Module(ModuleDecl),
    Function(FunctionDecl),
    Bad(BadNode),
}

impl Decl {
    pub fn location(&self) -> SourceLocation {
        match self {
            Decl::Module(module) => module.location,
            Decl::Function(function) => function.location,
            Decl::Bad(bad) => bad.location,
        }
    }

    #[inline]
    pub fn is_bad(&self) -> bool {
        matches!(self, Decl::Bad(_))
    }

    /// The symbol this declaration was linked to, if analysis got there.
    pub fn symbol(&self) -> Option<SymbolId> {
        match self {
            Decl::Module(module) => module.symbol,
            Decl::Function(function) => function.symbol,
            Decl::Bad(_) => None,
        }
    }

    /// The declared name, absent for `Bad` nodes.
    pub fn name(&self) -> Option<Name> {
        match self {
            Decl::Module(module) => Some(module.name),
            Decl::Function(function) => Some(function.name),
            Decl::Bad(_) => None,
        }
    }
}

/// `mod name { ... }`
#[derive(Debug, Clone)]
pub struct ModuleDecl {
    pub name: Name,
    pub body: DeclBlock,
    pub location: SourceLocation,
    pub symbol: Option<SymbolId>,
}

/// Brace-delimited sequence of declarations.
#[derive(Debug, Clone)]
pub struct DeclBlock {
    pub decls: Vec<Decl>,
    pub location: SourceLocation,
}

/// `func name(params) -> type { ... }`
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Name,
    pub params: Vec<FunctionParam>,
    /// Spelled return type, resolved in the global-scope pass
    pub return_type: Name,
    pub body: Block,
    pub location: SourceLocation,
    pub symbol: Option<SymbolId>,
}

/// One `type name` parameter, optionally with a default value.
#[derive(Debug, Clone)]
pub struct FunctionParam {
    pub type_name: Name,
    pub name: Name,
    pub default: Option<Expr>,
    pub location: SourceLocation,
    pub symbol: Option<SymbolId>,
}

// ============================================================================
// Statements
// ============================================================================

/// Statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    Block(Block),
    If(IfStmt),
    While(WhileStmt),
    Break(BreakStmt),
    VarDecl(VarDeclStmt),
    Assign(AssignStmt),
    /// Expression-statement form, calls only: `f(x);`
    Call(CallExpr),
    Return(ReturnStmt),
    Print(PrintStmt),
    Bad(BadNode),
}

impl Stmt {
    pub fn location(&self) -> SourceLocation {
        match self {
            Stmt::Block(block) => block.location,
            Stmt::If(stmt) => stmt.location,
            Stmt::While(stmt) => stmt.location,
            Stmt::Break(stmt) => stmt.location,
            Stmt::VarDecl(stmt) => stmt.location,
            Stmt::Assign(stmt) => stmt.location,
            Stmt::Call(call) => call.location,
            Stmt::Return(stmt) => stmt.location,
            Stmt::Print(stmt) => stmt.location,
            Stmt::Bad(bad) => bad.location,
        }
    }

    #[inline]
    pub fn is_bad(&self) -> bool {
        matches!(self, Stmt::Bad(_))
    }
}

/// Brace-delimited sequence of statements.
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub location: SourceLocation,
}

/// `if (cond) { ... }` with an optional `else` block or chained `if`.
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_block: Block,
    /// `Stmt::Block` or a nested `Stmt::If`
    pub else_branch: Option<Box<Stmt>>,
    pub location: SourceLocation,
}

/// `while (cond) { ... }`
#[derive(Debug, Clone)]
pub struct WhileStmt {
    /// Parser-assigned identity, the target of `break`
    pub loop_id: LoopId,
    pub condition: Expr,
    pub body: Block,
    pub location: SourceLocation,
}

/// `break;`
#[derive(Debug, Clone)]
pub struct BreakStmt {
    pub location: SourceLocation,
    /// Enclosing loop, filled by the local-scope pass
    pub target: Option<LoopId>,
}

/// `var type name = value;`
#[derive(Debug, Clone)]
pub struct VarDeclStmt {
    pub type_name: Name,
    pub name: Name,
    pub value: Expr,
    pub location: SourceLocation,
    pub symbol: Option<SymbolId>,
}

/// `name = value;`
#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub name: Name,
    pub value: Expr,
    pub location: SourceLocation,
    pub symbol: Option<SymbolId>,
}

/// `return value;`
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub value: Expr,
    pub location: SourceLocation,
}

/// `print value;`
#[derive(Debug, Clone)]
pub struct PrintStmt {
    pub value: Expr,
    pub location: SourceLocation,
}

// ============================================================================
// Expressions
// ============================================================================

/// Expression. Every variant carries a resolved type slot, `None` until
/// the local-scope pass annotates it.
#[derive(Debug, Clone)]
pub enum Expr {
    Number(NumberExpr),
    Identifier(IdentifierExpr),
    Binary(BinaryExpr),
    Prefix(PrefixExpr),
    Call(CallExpr),
    Bad(BadNode),
}

impl Expr {
    pub fn location(&self) -> SourceLocation {
        match self {
            Expr::Number(expr) => expr.location,
            Expr::Identifier(expr) => expr.location,
            Expr::Binary(expr) => expr.location,
            Expr::Prefix(expr) => expr.location,
            Expr::Call(expr) => expr.location,
            Expr::Bad(bad) => bad.location,
        }
    }

    /// The resolved type, if the local-scope pass annotated this node.
    pub fn ty(&self) -> Option<TypeId> {
        match self {
            Expr::Number(expr) => expr.ty,
            Expr::Identifier(expr) => expr.ty,
            Expr::Binary(expr) => expr.ty,
            Expr::Prefix(expr) => expr.ty,
            Expr::Call(expr) => expr.ty,
            Expr::Bad(_) => None,
        }
    }

    #[inline]
    pub fn is_bad(&self) -> bool {
        matches!(self, Expr::Bad(_))
    }
}

/// Decimal integer literal; the lexeme is kept verbatim.
#[derive(Debug, Clone)]
pub struct NumberExpr {
    pub lexeme: Name,
    pub location: SourceLocation,
    pub ty: Option<TypeId>,
}

/// Variable use.
#[derive(Debug, Clone)]
pub struct IdentifierExpr {
    pub name: Name,
    pub location: SourceLocation,
    pub ty: Option<TypeId>,
    pub symbol: Option<SymbolId>,
}

/// Infix operation.
#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub op: BinOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
    pub location: SourceLocation,
    pub ty: Option<TypeId>,
}

/// Prefix operation.
#[derive(Debug, Clone)]
pub struct PrefixExpr {
    pub op: UnOp,
    pub operand: Box<Expr>,
    pub location: SourceLocation,
    pub ty: Option<TypeId>,
}

/// `name(args)`, as an expression or a call statement.
#[derive(Debug, Clone)]
pub struct CallExpr {
    pub name: Name,
    pub args: Vec<Expr>,
    pub location: SourceLocation,
    pub ty: Option<TypeId>,
    pub symbol: Option<SymbolId>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    LogicAnd,
    LogicOr,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinOp {
    pub fn glyph(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::LogicAnd => "&&",
            BinOp::LogicOr => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
        }
    }

    /// `== != < <= > >=`
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    /// `+ - * / %`
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem
        )
    }

    /// `& | ^`
    pub fn is_bitwise(self) -> bool {
        matches!(self, BinOp::BitAnd | BinOp::BitOr | BinOp::BitXor)
    }

    /// `&& ||`
    pub fn is_logic(self) -> bool {
        matches!(self, BinOp::LogicAnd | BinOp::LogicOr)
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

impl UnOp {
    pub fn glyph(self) -> &'static str {
        match self {
            UnOp::Neg => "-",
            UnOp::Not => "!",
        }
    }
}
