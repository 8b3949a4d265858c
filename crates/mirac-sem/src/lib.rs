//! mirac-sem - Semantic analysis.
//!
//! The symbol model ([`symbol`]), the scoped [`table::SymbolTable`], the
//! type arena inside [`context::SymbolContext`], and the three ordered
//! [`passes`] that annotate a parsed AST:
//!
//! 1. module definition - symbols for modules, placeholders for functions
//! 2. global scope - function signatures
//! 3. local scope - bodies: names, types, control flow
//!
//! After a clean run every non-bad use site carries its symbol, every
//! expression its type, every `break` its target loop, and the symbol
//! table is back at depth 0.

pub mod context;
pub mod passes;
pub mod symbol;
pub mod table;
pub mod types;

pub use context::SymbolContext;
pub use passes::{GlobalScopePass, LocalScopePass, ModuleDefinitionPass};
pub use symbol::{
    FunctionSymbol, ModuleSymbol, Symbol, SymbolKind, SymbolState, TypeSymbol, VariableSymbol,
};
pub use table::{Binding, InsertResult, SymbolTable};
pub use types::Type;

use mirac_par::ast::Decl;
use mirac_util::diagnostic::DiagnosticManager;

/// Run the three passes in order over a parsed compilation unit.
pub fn analyze(
    root: &mut Decl,
    context: &mut SymbolContext,
    table: &mut SymbolTable,
    diagnostics: &DiagnosticManager,
) {
    ModuleDefinitionPass::new(context, diagnostics).run(root);
    GlobalScopePass::new(context, table, diagnostics).run(root);
    LocalScopePass::new(context, table, diagnostics).run(root);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mirac_par::ast::{Decl, Expr, Stmt};
    use mirac_par::Parser;
    use mirac_util::diagnostic::Severity;
    use mirac_util::span::SourceMap;

    use super::*;

    struct Analyzed {
        root: Decl,
        context: SymbolContext,
        table: SymbolTable,
        diagnostics: DiagnosticManager,
    }

    fn analyze_source(source: &str) -> Analyzed {
        let mut map = SourceMap::new();
        let id = map.add_file("test.mira", source);
        let map = Arc::new(map);
        let file = map.get(id).unwrap();
        let diagnostics = DiagnosticManager::with_threshold(map, Severity::Fatal);
        let mut root = Parser::new(&file, &diagnostics).program();

        let mut table = SymbolTable::new();
        let mut context = SymbolContext::new(&mut table);
        analyze(&mut root, &mut context, &mut table, &diagnostics);

        Analyzed {
            root,
            context,
            table,
            diagnostics,
        }
    }

    fn error_texts(analyzed: &Analyzed) -> Vec<String> {
        analyzed
            .diagnostics
            .messages()
            .into_iter()
            .map(|m| m.text)
            .collect()
    }

    fn main_body(analyzed: &Analyzed) -> &[Stmt] {
        let Decl::Module(module) = &analyzed.root else {
            panic!("expected module");
        };
        for decl in &module.body.decls {
            if let Decl::Function(function) = decl {
                if function.name.as_str() == "main" {
                    return &function.body.stmts;
                }
            }
        }
        panic!("no main function");
    }

    #[test]
    fn test_clean_program_has_no_errors_and_balanced_scopes() {
        let analyzed = analyze_source(
            "mod demo {\n\
             \tfunc fib(int32 n) -> int32 {\n\
             \t\tif (n < 2) { return n; }\n\
             \t\treturn fib(n - 1) + fib(n - 2);\n\
             \t}\n\
             \tfunc main() -> int32 {\n\
             \t\tvar int32 x = fib(10);\n\
             \t\tprint x;\n\
             \t\treturn 0;\n\
             \t}\n\
             }",
        );
        assert_eq!(error_texts(&analyzed), Vec::<String>::new());
        // Scope balance: only the built-in scope remains open.
        assert_eq!(analyzed.table.depth(), 0);
    }

    #[test]
    fn test_symbol_and_type_wiring() {
        let analyzed = analyze_source(
            "mod m { func main() -> int32 { var int32 x = 1; x = x + 2; return x; } }",
        );
        assert_eq!(analyzed.diagnostics.error_count(), 0);
        let body = main_body(&analyzed);

        let Stmt::VarDecl(decl) = &body[0] else {
            panic!("expected var decl");
        };
        let declared = decl.symbol.expect("var decl bound to a symbol");
        assert!(decl.value.ty().is_some());

        let Stmt::Assign(assign) = &body[1] else {
            panic!("expected assignment");
        };
        assert_eq!(assign.symbol, Some(declared));
        let Expr::Binary(sum) = &assign.value else {
            panic!("expected binary value");
        };
        // Type identity: both operands annotated with the same arena id.
        assert_eq!(sum.left.ty(), sum.right.ty());
        assert_eq!(sum.ty, Some(analyzed.context.int32_type()));

        let Stmt::Return(ret) = &body[2] else {
            panic!("expected return");
        };
        let Expr::Identifier(identifier) = &ret.value else {
            panic!("expected identifier");
        };
        assert_eq!(identifier.symbol, Some(declared));
    }

    #[test]
    fn test_number_literals_are_int32() {
        let analyzed = analyze_source("mod m { func main() -> int32 { return 42; } }");
        let body = main_body(&analyzed);
        let Stmt::Return(ret) = &body[0] else {
            panic!("expected return");
        };
        assert_eq!(ret.value.ty(), Some(analyzed.context.int32_type()));
    }

    #[test]
    fn test_incompatible_initializer() {
        let analyzed = analyze_source(
            "mod m { func main() -> int32 { var int32 x = 1; var bool y = x; return 0; } }",
        );
        assert!(error_texts(&analyzed).iter().any(|t| t.contains("incompatible types")));
    }

    #[test]
    fn test_condition_must_be_bool() {
        let analyzed =
            analyze_source("mod m { func main() -> int32 { if (1) { return 0; } return 1; } }");
        assert!(error_texts(&analyzed)
            .iter()
            .any(|t| t.contains("condition must be `bool`")));

        let analyzed =
            analyze_source("mod m { func main() -> int32 { while (1) { break; } return 0; } }");
        assert!(error_texts(&analyzed)
            .iter()
            .any(|t| t.contains("condition must be `bool`")));
    }

    #[test]
    fn test_break_outside_loop() {
        let analyzed = analyze_source("mod m { func main() -> int32 { break; return 0; } }");
        assert!(error_texts(&analyzed)
            .iter()
            .any(|t| t.contains("break operator outside loop body")));
    }

    #[test]
    fn test_break_targets_innermost_loop() {
        let analyzed = analyze_source(
            "mod m { func main() -> int32 { \
               var bool t = 1 == 1; \
               while (t) { while (t) { break; } } \
               return 0; } }",
        );
        assert_eq!(analyzed.diagnostics.error_count(), 0);
        let body = main_body(&analyzed);

        let Stmt::While(outer) = &body[1] else {
            panic!("expected while");
        };
        let Stmt::While(inner) = &outer.body.stmts[0] else {
            panic!("expected nested while");
        };
        let Stmt::Break(break_stmt) = &inner.body.stmts[0] else {
            panic!("expected break");
        };
        assert_eq!(break_stmt.target, Some(inner.loop_id));
        assert_ne!(break_stmt.target, Some(outer.loop_id));
    }

    #[test]
    fn test_undeclared_variable() {
        let analyzed = analyze_source("mod m { func main() -> int32 { return nope; } }");
        assert!(error_texts(&analyzed)
            .iter()
            .any(|t| t.contains("undeclared variable `nope`")));
    }

    #[test]
    fn test_function_used_as_variable() {
        let analyzed = analyze_source("mod m { func main() -> int32 { return main + 1; } }");
        assert!(error_texts(&analyzed)
            .iter()
            .any(|t| t.contains("`main` is not a variable")));
    }

    #[test]
    fn test_variable_called_as_function() {
        let analyzed = analyze_source(
            "mod m { func main() -> int32 { var int32 x = 1; return x(); } }",
        );
        assert!(error_texts(&analyzed)
            .iter()
            .any(|t| t.contains("`x` is not a function")));
    }

    #[test]
    fn test_argument_count_mismatch() {
        let analyzed = analyze_source(
            "mod m { func f(int32 a) -> int32 { return a; } \
                     func main() -> int32 { return f(1, 2); } }",
        );
        assert!(error_texts(&analyzed)
            .iter()
            .any(|t| t.contains("different argument count")));
    }

    #[test]
    fn test_argument_type_mismatch() {
        let analyzed = analyze_source(
            "mod m { func f(bool a) -> int32 { return 0; } \
                     func main() -> int32 { return f(1); } }",
        );
        assert!(error_texts(&analyzed).iter().any(|t| t.contains("incompatible types")));
    }

    #[test]
    fn test_bad_return_type() {
        let analyzed = analyze_source(
            "mod m { func main() -> bool { return 1; } }",
        );
        assert!(error_texts(&analyzed).iter().any(|t| t.contains("bad return type")));
    }

    #[test]
    fn test_shadowing_in_nested_block_is_allowed() {
        let analyzed = analyze_source(
            "mod m { func main() -> int32 { var int32 x = 1; { var int32 x = 2; print x; } return x; } }",
        );
        assert_eq!(analyzed.diagnostics.error_count(), 0);
    }

    #[test]
    fn test_redeclaration_in_same_scope_conflicts() {
        let analyzed = analyze_source(
            "mod m { func main() -> int32 { var int32 x = 1; var int32 x = 2; return x; } }",
        );
        assert!(error_texts(&analyzed)
            .iter()
            .any(|t| t.contains("`x` is already declared in this scope")));
    }

    #[test]
    fn test_builtin_type_names_cannot_be_shadowed() {
        let analyzed = analyze_source(
            "mod m { func main() -> int32 { var int32 int32 = 1; return 0; } }",
        );
        assert!(error_texts(&analyzed)
            .iter()
            .any(|t| t.contains("`int32` can't be shadowed")));
    }

    #[test]
    fn test_loop_scope_spans_condition_and_body() {
        // A variable declared in the loop body is gone after the loop.
        let analyzed = analyze_source(
            "mod m { func main() -> int32 { \
               var bool t = 1 == 1; \
               while (t) { var int32 inner = 1; break; } \
               return inner; } }",
        );
        assert!(error_texts(&analyzed)
            .iter()
            .any(|t| t.contains("undeclared variable `inner`")));
    }

    #[test]
    fn test_default_with_wrong_type_is_an_error() {
        let analyzed = analyze_source(
            "mod m { func f(bool a = 1) -> int32 { return 0; } \
                     func main() -> int32 { return f(); } }",
        );
        assert!(error_texts(&analyzed).iter().any(|t| t.contains("incompatible types")));
    }

    #[test]
    fn test_call_may_omit_defaulted_arguments() {
        let analyzed = analyze_source(
            "mod m { func f(int32 a, int32 b = 10) -> int32 { return a + b; } \
                     func main() -> int32 { return f(1) + f(1, 2); } }",
        );
        assert_eq!(error_texts(&analyzed), Vec::<String>::new());
    }

    #[test]
    fn test_omitting_required_argument_is_an_error() {
        let analyzed = analyze_source(
            "mod m { func f(int32 a, int32 b = 10) -> int32 { return a + b; } \
                     func main() -> int32 { return f(); } }",
        );
        assert!(error_texts(&analyzed)
            .iter()
            .any(|t| t.contains("different argument count")));
    }

    #[test]
    fn test_bad_nodes_are_tolerated() {
        let analyzed = analyze_source(
            "mod m { func main() -> int32 { var int32 x = 1 print x; return 0; } }",
        );
        // The parser reported; analysis must get through without panicking
        // and with scopes balanced.
        assert!(analyzed.diagnostics.error_count() >= 1);
        assert_eq!(analyzed.table.depth(), 0);
    }

    #[test]
    fn test_call_statement_resolves() {
        let analyzed = analyze_source(
            "mod m { func f() -> int32 { return 1; } \
                     func main() -> int32 { f(); return 0; } }",
        );
        assert_eq!(analyzed.diagnostics.error_count(), 0);
        let body = main_body(&analyzed);
        let Stmt::Call(call) = &body[0] else {
            panic!("expected call statement");
        };
        assert!(call.symbol.is_some());
        assert_eq!(call.ty, Some(analyzed.context.int32_type()));
    }
}
