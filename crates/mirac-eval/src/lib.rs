//! mirac-eval - Tree-walking evaluator.
//!
//! [`Evaluator::evaluate`] locates `main` through the root module's
//! symbol and runs it with no arguments. Execution is strictly
//! sequential, depth-first, left-to-right; the only I/O is `print`
//! writing to the evaluator's output sink (stdout in the driver, a
//! buffer in tests).
//!
//! Statement execution produces a [`Flow`]: blocks stop at the first
//! non-normal result, a `while` consumes a `Break` aimed at itself, and
//! `Return` propagates until the active call consumes it. Activation
//! frames are pushed and popped by the call machinery only - executing a
//! `return` never touches the frame stack.
//!
//! `&&` and `||` short-circuit: the right operand is not evaluated when
//! the left one decides the result.

mod value;

pub use value::Value;

use std::io::Write;

use mirac_par::ast::{Block, CallExpr, Decl, Expr, FunctionDecl, ModuleDecl, Stmt};
use mirac_sem::SymbolContext;
use mirac_util::stack::{StackGuard, StackOverflowError};
use mirac_util::{FxHashMap, LoopId, Name, SymbolId};
use thiserror::Error;

/// Runtime failure. All of these abort evaluation; none of them panic.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("unsupported runtime operation: {0}")]
    UnsupportedOperation(&'static str),
    #[error("can't find `main` function")]
    MainNotFound,
    #[error("`{0}` used before it was given a value")]
    UninitializedVariable(String),
    #[error("function `{0}` ended without returning a value")]
    MissingReturn(String),
    #[error(transparent)]
    StackOverflow(#[from] StackOverflowError),
    #[error("print failed: {0}")]
    Print(#[from] std::io::Error),
}

/// Result of executing one statement.
#[derive(Debug)]
enum Flow {
    Normal,
    /// Unwinding towards the loop with this id
    Break(LoopId),
    /// Unwinding towards the active call
    Return(Value),
}

/// Tree-walking interpreter over a resolved AST.
///
/// Borrows the AST and the symbol context; both must outlive the run.
pub struct Evaluator<'a, W: Write> {
    root: &'a Decl,
    context: &'a SymbolContext,
    /// Function symbol -> its declaration, resolved through each symbol's
    /// body index at construction
    functions: FxHashMap<SymbolId, &'a FunctionDecl>,
    /// Activation frames, innermost last
    frames: Vec<FxHashMap<SymbolId, Value>>,
    output: W,
}

impl<'a, W: Write> Evaluator<'a, W> {
    pub fn new(root: &'a Decl, context: &'a SymbolContext, output: W) -> Self {
        let mut functions = FxHashMap::default();
        if let Decl::Module(module) = root {
            collect_functions(module, context, &mut functions);
        }
        Self {
            root,
            context,
            functions,
            frames: Vec::new(),
            output,
        }
    }

    /// Run `main` to completion, returning its value.
    pub fn evaluate(&mut self) -> Result<Value, RuntimeError> {
        let Decl::Module(module) = self.root else {
            return Err(RuntimeError::MainNotFound);
        };
        let main = self.find_main(module)?;
        self.call_function(main, Vec::new())
    }

    fn find_main(&self, module: &ModuleDecl) -> Result<SymbolId, RuntimeError> {
        let module_symbol = module.symbol.ok_or(RuntimeError::MainNotFound)?;
        let members = self
            .context
            .symbol(module_symbol)
            .as_module()
            .ok_or(RuntimeError::MainNotFound)?;

        let main = *members
            .find_member(Name::intern("main"))
            .first()
            .ok_or(RuntimeError::MainNotFound)?;
        if self.context.symbol(main).as_function().is_none() {
            return Err(RuntimeError::MainNotFound);
        }
        Ok(main)
    }

    /// One activation: push a frame, bind arguments (and defaults for
    /// omitted trailing parameters), run the body, pop, unwrap `Return`.
    fn call_function(&mut self, symbol: SymbolId, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let _guard = StackGuard::enter()?;

        let function = *self
            .functions
            .get(&symbol)
            .ok_or(RuntimeError::UnsupportedOperation("call of an unresolved function"))?;
        let params = self
            .context
            .symbol(symbol)
            .as_function()
            .ok_or(RuntimeError::UnsupportedOperation("call of a non-function symbol"))?
            .params
            .clone();

        let supplied = args.len();
        let mut frame = FxHashMap::default();
        for (&param, value) in params.iter().zip(args) {
            frame.insert(param, value);
        }
        self.frames.push(frame);

        let result = self.bind_defaults(function, &params, supplied).and_then(|()| {
            self.execute_block(&function.body)
        });
        self.frames.pop();

        match result? {
            Flow::Return(value) => Ok(value),
            _ => Err(RuntimeError::MissingReturn(function.name.to_string())),
        }
    }

    /// Evaluate defaults for omitted trailing parameters, left to right,
    /// inside the new frame (a default may read an earlier parameter).
    fn bind_defaults(
        &mut self,
        function: &'a FunctionDecl,
        params: &[SymbolId],
        supplied: usize,
    ) -> Result<(), RuntimeError> {
        for index in supplied..params.len() {
            let default = function.params[index].default.as_ref().ok_or(
                RuntimeError::UnsupportedOperation("missing argument without a default"),
            )?;
            let value = self.evaluate_expr(default)?;
            self.current_frame()?.insert(params[index], value);
        }
        Ok(())
    }

    fn current_frame(&mut self) -> Result<&mut FxHashMap<SymbolId, Value>, RuntimeError> {
        self.frames
            .last_mut()
            .ok_or(RuntimeError::UnsupportedOperation("no active frame"))
    }

    fn execute_block(&mut self, block: &'a Block) -> Result<Flow, RuntimeError> {
        let _guard = StackGuard::enter()?;

        for stmt in &block.stmts {
            match self.execute_stmt(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn execute_stmt(&mut self, stmt: &'a Stmt) -> Result<Flow, RuntimeError> {
        let _guard = StackGuard::enter()?;

        match stmt {
            Stmt::Block(block) => self.execute_block(block),
            Stmt::If(stmt) => {
                if self.evaluate_bool(&stmt.condition)? {
                    self.execute_block(&stmt.then_block)
                } else if let Some(else_branch) = &stmt.else_branch {
                    self.execute_stmt(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While(stmt) => {
                while self.evaluate_bool(&stmt.condition)? {
                    match self.execute_block(&stmt.body)? {
                        Flow::Normal => {}
                        Flow::Break(target) if target == stmt.loop_id => break,
                        other => return Ok(other),
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Break(stmt) => {
                let target = stmt
                    .target
                    .ok_or(RuntimeError::UnsupportedOperation("unresolved break"))?;
                Ok(Flow::Break(target))
            }
            Stmt::VarDecl(stmt) => {
                let value = self.evaluate_expr(&stmt.value)?;
                self.store(stmt.symbol, value)?;
                Ok(Flow::Normal)
            }
            Stmt::Assign(stmt) => {
                let value = self.evaluate_expr(&stmt.value)?;
                self.store(stmt.symbol, value)?;
                Ok(Flow::Normal)
            }
            Stmt::Call(call) => {
                self.evaluate_call(call)?;
                Ok(Flow::Normal)
            }
            Stmt::Return(stmt) => Ok(Flow::Return(self.evaluate_expr(&stmt.value)?)),
            Stmt::Print(stmt) => {
                let value = self.evaluate_expr(&stmt.value)?;
                writeln!(self.output, "{}", value)?;
                Ok(Flow::Normal)
            }
            Stmt::Bad(_) => Err(RuntimeError::UnsupportedOperation(
                "evaluation of an invalid statement",
            )),
        }
    }

    fn evaluate_expr(&mut self, expr: &'a Expr) -> Result<Value, RuntimeError> {
        let _guard = StackGuard::enter()?;

        match expr {
            Expr::Number(number) => number
                .lexeme
                .as_str()
                .parse::<i32>()
                .map(Value::Int32)
                .map_err(|_| RuntimeError::Overflow),
            Expr::Identifier(identifier) => {
                let symbol = identifier
                    .symbol
                    .ok_or(RuntimeError::UnsupportedOperation("unresolved identifier"))?;
                self.frames
                    .last()
                    .and_then(|frame| frame.get(&symbol))
                    .cloned()
                    .ok_or_else(|| RuntimeError::UninitializedVariable(identifier.name.to_string()))
            }
            Expr::Binary(binary) => match binary.op {
                mirac_par::ast::BinOp::LogicAnd => {
                    if !self.evaluate_bool(&binary.left)? {
                        Ok(Value::Bool(false))
                    } else {
                        Ok(Value::Bool(self.evaluate_bool(&binary.right)?))
                    }
                }
                mirac_par::ast::BinOp::LogicOr => {
                    if self.evaluate_bool(&binary.left)? {
                        Ok(Value::Bool(true))
                    } else {
                        Ok(Value::Bool(self.evaluate_bool(&binary.right)?))
                    }
                }
                op => {
                    let left = self.evaluate_expr(&binary.left)?;
                    let right = self.evaluate_expr(&binary.right)?;
                    left.binary(op, &right)
                }
            },
            Expr::Prefix(prefix) => {
                let operand = self.evaluate_expr(&prefix.operand)?;
                operand.prefix(prefix.op)
            }
            Expr::Call(call) => self.evaluate_call(call),
            Expr::Bad(_) => Err(RuntimeError::UnsupportedOperation(
                "evaluation of an invalid expression",
            )),
        }
    }

    /// Arguments evaluate left to right before the new activation.
    fn evaluate_call(&mut self, call: &'a CallExpr) -> Result<Value, RuntimeError> {
        let symbol = call
            .symbol
            .ok_or(RuntimeError::UnsupportedOperation("unresolved call"))?;

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.evaluate_expr(arg)?);
        }
        self.call_function(symbol, args)
    }

    fn evaluate_bool(&mut self, expr: &'a Expr) -> Result<bool, RuntimeError> {
        self.evaluate_expr(expr)?
            .as_bool()
            .ok_or(RuntimeError::UnsupportedOperation("expected a boolean value"))
    }

    fn store(&mut self, symbol: Option<SymbolId>, value: Value) -> Result<(), RuntimeError> {
        let symbol = symbol.ok_or(RuntimeError::UnsupportedOperation("unresolved variable"))?;
        self.current_frame()?.insert(symbol, value);
        Ok(())
    }
}

/// Resolve every function member's declaration through its symbol's body
/// index into the enclosing declarations block. The AST itself is only
/// walked to reach nested modules.
fn collect_functions<'a>(
    module: &'a ModuleDecl,
    context: &SymbolContext,
    functions: &mut FxHashMap<SymbolId, &'a FunctionDecl>,
) {
    if let Some(symbol) = module.symbol {
        if let Some(members) = context.symbol(symbol).as_module() {
            for (_, member) in members.members() {
                let Some(function_symbol) = context.symbol(member).as_function() else {
                    continue;
                };
                let Some(index) = function_symbol.body_decl else {
                    continue;
                };
                if let Some(Decl::Function(function)) = module.body.decls.get(index) {
                    functions.insert(member, function);
                }
            }
        }
    }

    for decl in &module.body.decls {
        if let Decl::Module(nested) = decl {
            collect_functions(nested, context, functions);
        }
    }
}
