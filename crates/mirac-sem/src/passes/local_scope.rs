//! Pass 3: function bodies.
//!
//! Resolves every name use to its symbol, annotates every expression with
//! its type, links `break` statements to their enclosing loop, and checks
//! the type rules: operand compatibility, argument counts and types,
//! assignment and initializer types, `bool` conditions, return types.

use mirac_par::ast::{
    AssignStmt, Block, BreakStmt, CallExpr, Decl, Expr, FunctionDecl, IfStmt, ModuleDecl, Stmt,
    VarDeclStmt, WhileStmt,
};
use mirac_util::diagnostic::{DiagnosticManager, Message};
use mirac_util::span::SourceLocation;
use mirac_util::stack::StackGuard;
use mirac_util::{LoopId, Name, SymbolId, TypeId};

use crate::context::SymbolContext;
use crate::symbol::SymbolKind;
use crate::table::{InsertResult, SymbolTable};

/// Walks function bodies, maintaining the scope stack, the stack of
/// enclosing `while` loops, and the current function's return type.
pub struct LocalScopePass<'a> {
    context: &'a mut SymbolContext,
    table: &'a mut SymbolTable,
    diagnostics: &'a DiagnosticManager,
    loops: Vec<LoopId>,
    current_return_type: Option<TypeId>,
    overflowed: bool,
}

impl<'a> LocalScopePass<'a> {
    pub fn new(
        context: &'a mut SymbolContext,
        table: &'a mut SymbolTable,
        diagnostics: &'a DiagnosticManager,
    ) -> Self {
        Self {
            context,
            table,
            diagnostics,
            loops: Vec::new(),
            current_return_type: None,
            overflowed: false,
        }
    }

    pub fn run(&mut self, root: &mut Decl) {
        if let Decl::Module(module) = root {
            self.visit_module(module);
        }
    }

    /// Acquire a recursion-depth token; on overflow report once and make
    /// every further visit a no-op.
    fn guard(&mut self) -> Option<StackGuard> {
        if self.overflowed {
            return None;
        }
        match StackGuard::enter() {
            Ok(guard) => Some(guard),
            Err(error) => {
                self.overflowed = true;
                self.diagnostics
                    .report(Message::fatal(error.to_string()).into());
                None
            }
        }
    }

    fn error(&self, text: impl Into<String>, location: SourceLocation) {
        self.diagnostics
            .report(Message::error(text).with_location(location).into());
    }

    fn check_insert(&self, result: InsertResult, name: Name, location: SourceLocation) {
        match result {
            InsertResult::Successful => {}
            InsertResult::NameConflict(_) => {
                self.error(
                    format!("`{}` is already declared in this scope", name),
                    location,
                );
            }
            InsertResult::ProhibitedShadowing(_) => {
                self.error(format!("`{}` can't be shadowed", name), location);
            }
        }
    }

    fn require_bool(&self, ty: Option<TypeId>, location: SourceLocation) {
        if let Some(ty) = ty {
            if ty != self.context.bool_type() {
                self.error("incompatible types: condition must be `bool`", location);
            }
        }
    }

    fn visit_module(&mut self, module: &mut ModuleDecl) {
        let Some(_guard) = self.guard() else { return };

        self.table.open_scope();
        if let Some(symbol) = module.symbol {
            let result = self.table.insert(module.name, symbol, true);
            self.check_insert(result, module.name, module.location);
        }
        for decl in &module.body.decls {
            if let (Some(name), Some(symbol)) = (decl.name(), decl.symbol()) {
                let result = self.table.insert(name, symbol, true);
                self.check_insert(result, name, decl.location());
            }
        }

        for decl in &mut module.body.decls {
            match decl {
                Decl::Function(function) => self.visit_function(function),
                Decl::Module(nested) => self.visit_module(nested),
                Decl::Bad(_) => {}
            }
        }
        self.table.close_scope();
    }

    fn visit_function(&mut self, function: &mut FunctionDecl) {
        let Some(_guard) = self.guard() else { return };

        let saved_return_type = self.current_return_type.take();
        self.current_return_type = function.symbol.and_then(|s| self.context.function_return_type(s));

        self.table.open_scope();
        for param in &function.params {
            if let Some(symbol) = param.symbol {
                let result = self.table.insert(param.name, symbol, true);
                self.check_insert(result, param.name, param.location);
            }
        }

        // Defaults resolve in the parameter scope, so a later parameter's
        // default may read an earlier parameter.
        for index in 0..function.params.len() {
            let declared = function.params[index]
                .symbol
                .and_then(|s| self.context.variable_type(s));
            if let Some(default) = function.params[index].default.as_mut() {
                let location = default.location();
                let default_ty = self.visit_expr(default);
                if let (Some(default_ty), Some(declared)) = (default_ty, declared) {
                    if default_ty != declared {
                        self.error("incompatible types", location);
                    }
                }
            }
        }

        self.visit_block_stmts(&mut function.body);
        self.table.close_scope();

        self.current_return_type = saved_return_type;
    }

    /// Visit a block's statements in the current scope; a child that is
    /// itself a block gets a fresh scope around it.
    fn visit_block_stmts(&mut self, block: &mut Block) {
        let Some(_guard) = self.guard() else { return };

        for stmt in &mut block.stmts {
            if let Stmt::Block(nested) = stmt {
                self.table.open_scope();
                self.visit_block_stmts(nested);
                self.table.close_scope();
            } else {
                self.visit_stmt(stmt);
            }
        }
    }

    fn visit_stmt(&mut self, stmt: &mut Stmt) {
        let Some(_guard) = self.guard() else { return };

        match stmt {
            Stmt::Block(block) => {
                self.table.open_scope();
                self.visit_block_stmts(block);
                self.table.close_scope();
            }
            Stmt::If(stmt) => self.visit_if(stmt),
            Stmt::While(stmt) => self.visit_while(stmt),
            Stmt::Break(stmt) => self.visit_break(stmt),
            Stmt::VarDecl(stmt) => self.visit_var_decl(stmt),
            Stmt::Assign(stmt) => self.visit_assign(stmt),
            Stmt::Call(call) => {
                self.visit_call(call);
            }
            Stmt::Return(stmt) => {
                let location = stmt.value.location();
                let ty = self.visit_expr(&mut stmt.value);
                if let (Some(ty), Some(expected)) = (ty, self.current_return_type) {
                    if ty != expected {
                        self.error("bad return type", location);
                    }
                }
            }
            Stmt::Print(stmt) => {
                self.visit_expr(&mut stmt.value);
            }
            Stmt::Bad(_) => {}
        }
    }

    fn visit_if(&mut self, stmt: &mut IfStmt) {
        let location = stmt.condition.location();
        let condition_ty = self.visit_expr(&mut stmt.condition);
        self.require_bool(condition_ty, location);

        self.table.open_scope();
        self.visit_block_stmts(&mut stmt.then_block);
        self.table.close_scope();

        if let Some(else_branch) = stmt.else_branch.as_deref_mut() {
            self.table.open_scope();
            match else_branch {
                Stmt::Block(block) => self.visit_block_stmts(block),
                other => self.visit_stmt(other),
            }
            self.table.close_scope();
        }
    }

    /// Condition and body statements share one scope; the loop itself is
    /// pushed for `break` targeting.
    fn visit_while(&mut self, stmt: &mut WhileStmt) {
        self.loops.push(stmt.loop_id);
        self.table.open_scope();

        let location = stmt.condition.location();
        let condition_ty = self.visit_expr(&mut stmt.condition);
        self.require_bool(condition_ty, location);
        self.visit_block_stmts(&mut stmt.body);

        self.loops.pop();
        self.table.close_scope();
    }

    fn visit_break(&mut self, stmt: &mut BreakStmt) {
        match self.loops.last() {
            Some(&loop_id) => stmt.target = Some(loop_id),
            None => self.error("break operator outside loop body", stmt.location),
        }
    }

    fn visit_var_decl(&mut self, stmt: &mut VarDeclStmt) {
        let type_symbol = self.resolve_type_symbol(stmt.type_name, stmt.location);

        let symbol = self.context.add_variable_symbol(stmt.name);
        self.context.symbol_mut(symbol).start_definition();
        if let Some(type_symbol) = type_symbol {
            if let Some(variable) = self.context.symbol_mut(symbol).as_variable_mut() {
                variable.type_symbol = Some(type_symbol);
            }
        }
        self.context.symbol_mut(symbol).finish_definition();
        stmt.symbol = Some(symbol);

        let result = self.table.insert(stmt.name, symbol, true);
        self.check_insert(result, stmt.name, stmt.location);

        let location = stmt.value.location();
        let value_ty = self.visit_expr(&mut stmt.value);
        let declared = self.context.variable_type(symbol);
        if let (Some(value_ty), Some(declared)) = (value_ty, declared) {
            if value_ty != declared {
                self.error("incompatible types", location);
            }
        }
    }

    fn visit_assign(&mut self, stmt: &mut AssignStmt) {
        let value_ty = self.visit_expr(&mut stmt.value);

        match self.table.find(stmt.name) {
            None => self.error(
                format!("undeclared variable `{}`", stmt.name),
                stmt.location,
            ),
            Some(binding) => match self.context.symbol(binding.symbol).kind {
                SymbolKind::Variable(_) => {
                    stmt.symbol = Some(binding.symbol);
                    let declared = self.context.variable_type(binding.symbol);
                    if let (Some(value_ty), Some(declared)) = (value_ty, declared) {
                        if value_ty != declared {
                            self.error("incompatible types", stmt.value.location());
                        }
                    }
                }
                _ => self.error(
                    format!("`{}` is not a variable", stmt.name),
                    stmt.location,
                ),
            },
        }
    }

    fn visit_expr(&mut self, expr: &mut Expr) -> Option<TypeId> {
        let Some(_guard) = self.guard() else {
            return None;
        };

        match expr {
            Expr::Number(number) => {
                number.ty = Some(self.context.int32_type());
                number.ty
            }
            Expr::Identifier(identifier) => match self.table.find(identifier.name) {
                None => {
                    self.error(
                        format!("undeclared variable `{}`", identifier.name),
                        identifier.location,
                    );
                    None
                }
                Some(binding) => match self.context.symbol(binding.symbol).kind {
                    SymbolKind::Variable(_) => {
                        identifier.symbol = Some(binding.symbol);
                        identifier.ty = self.context.variable_type(binding.symbol);
                        identifier.ty
                    }
                    _ => {
                        self.error(
                            format!("`{}` is not a variable", identifier.name),
                            identifier.location,
                        );
                        None
                    }
                },
            },
            Expr::Binary(binary) => {
                let left = self.visit_expr(&mut binary.left);
                let right = self.visit_expr(&mut binary.right);
                if let (Some(left), Some(right)) = (left, right) {
                    match self.context.binary_operation_type(left, binary.op, right) {
                        Some(ty) => binary.ty = Some(ty),
                        None => self.error("incompatible types", binary.location),
                    }
                }
                binary.ty
            }
            Expr::Prefix(prefix) => {
                let operand = self.visit_expr(&mut prefix.operand);
                if let Some(operand) = operand {
                    match self.context.prefix_operation_type(prefix.op, operand) {
                        Some(ty) => prefix.ty = Some(ty),
                        None => self.error("incompatible types", prefix.location),
                    }
                }
                prefix.ty
            }
            Expr::Call(call) => self.visit_call(call),
            Expr::Bad(_) => None,
        }
    }

    fn visit_call(&mut self, call: &mut CallExpr) -> Option<TypeId> {
        let Some(_guard) = self.guard() else {
            return None;
        };

        let function = match self.table.find(call.name) {
            None => {
                self.error(format!("undeclared function `{}`", call.name), call.location);
                // Still visit the arguments for their own errors.
                for arg in &mut call.args {
                    self.visit_expr(arg);
                }
                return None;
            }
            Some(binding) => {
                let is_function = matches!(
                    self.context.symbol(binding.symbol).kind,
                    SymbolKind::Function(_)
                );
                if !is_function {
                    self.error(format!("`{}` is not a function", call.name), call.location);
                    for arg in &mut call.args {
                        self.visit_expr(arg);
                    }
                    return None;
                }
                binding.symbol
            }
        };

        call.symbol = Some(function);
        call.ty = self.context.function_return_type(function);

        let (param_types, param_count, required) = {
            let function_symbol = self
                .context
                .symbol(function)
                .as_function()
                .expect("checked above");
            let types: Vec<Option<TypeId>> = function_symbol
                .params
                .iter()
                .map(|&param| self.context.variable_type(param))
                .collect();
            let count = function_symbol.params.len();
            (types, count, function_symbol.required_params())
        };

        if call.args.len() < required || call.args.len() > param_count {
            self.error(
                format!(
                    "different argument count: `{}` expects {}, got {}",
                    call.name,
                    param_count,
                    call.args.len()
                ),
                call.location,
            );
        }

        for (index, arg) in call.args.iter_mut().enumerate() {
            let location = arg.location();
            let arg_ty = self.visit_expr(arg);
            if let Some(Some(param_ty)) = param_types.get(index) {
                if let Some(arg_ty) = arg_ty {
                    if arg_ty != *param_ty {
                        self.error("incompatible types", location);
                    }
                }
            }
        }

        call.ty
    }

    /// Same lookup as the global-scope pass, for `var` declarations.
    fn resolve_type_symbol(&mut self, name: Name, location: SourceLocation) -> Option<SymbolId> {
        match self.table.find(name) {
            None => {
                self.error(format!("can't find `{}` type", name), location);
                None
            }
            Some(binding) => match self.context.symbol(binding.symbol).kind {
                SymbolKind::Type(_) => Some(binding.symbol),
                _ => {
                    self.error(format!("`{}` isn't a type", name), location);
                    None
                }
            },
        }
    }
}
