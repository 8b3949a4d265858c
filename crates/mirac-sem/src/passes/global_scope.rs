//! Pass 2: function signatures.

use mirac_par::ast::{Decl, FunctionDecl, ModuleDecl};
use mirac_util::diagnostic::{DiagnosticManager, Message};
use mirac_util::span::SourceLocation;
use mirac_util::stack::StackGuard;
use mirac_util::{Name, SymbolId};

use crate::context::SymbolContext;
use crate::symbol::SymbolKind;
use crate::table::SymbolTable;

/// Resolves every function's signature: return type, parameter types,
/// parameter symbols (created here and linked both into the AST and into
/// the function symbol's argument list), and the body pointer. Function
/// symbols go Placeholder -> Incomplete -> Complete across this pass.
pub struct GlobalScopePass<'a> {
    context: &'a mut SymbolContext,
    table: &'a mut SymbolTable,
    diagnostics: &'a DiagnosticManager,
}

impl<'a> GlobalScopePass<'a> {
    pub fn new(
        context: &'a mut SymbolContext,
        table: &'a mut SymbolTable,
        diagnostics: &'a DiagnosticManager,
    ) -> Self {
        Self {
            context,
            table,
            diagnostics,
        }
    }

    pub fn run(&mut self, root: &mut Decl) {
        if let Decl::Module(module) = root {
            self.visit_module(module);
        }
    }

    fn visit_module(&mut self, module: &mut ModuleDecl) {
        let Ok(_guard) = StackGuard::enter() else {
            self.diagnostics
                .report(Message::fatal("stack overflow: module nesting too deep").into());
            return;
        };

        self.table.open_scope();
        if let Some(symbol) = module.symbol {
            self.table.insert(module.name, symbol, true);
        }
        for decl in &module.body.decls {
            if let (Some(name), Some(symbol)) = (decl.name(), decl.symbol()) {
                self.table.insert(name, symbol, true);
            }
        }

        for (index, decl) in module.body.decls.iter_mut().enumerate() {
            match decl {
                Decl::Function(function) => self.visit_function(function, index),
                Decl::Module(nested) => self.visit_module(nested),
                Decl::Bad(_) => {}
            }
        }

        self.table.close_scope();
    }

    fn visit_function(&mut self, function: &mut FunctionDecl, decl_index: usize) {
        let Some(symbol) = function.symbol else {
            return;
        };
        self.context.symbol_mut(symbol).start_definition();

        let mut defaults_started = false;
        for param in &mut function.params {
            let param_symbol = self.context.add_variable_symbol(param.name);
            self.context.symbol_mut(param_symbol).start_definition();

            if let Some(type_symbol) = self.resolve_type_symbol(param.type_name, param.location) {
                if let Some(variable) = self.context.symbol_mut(param_symbol).as_variable_mut() {
                    variable.type_symbol = Some(type_symbol);
                }
            }
            self.context.symbol_mut(param_symbol).finish_definition();
            param.symbol = Some(param_symbol);

            if param.default.is_some() {
                defaults_started = true;
            } else if defaults_started {
                self.diagnostics.report(
                    Message::error(format!(
                        "parameter `{}` without a default value follows a defaulted parameter",
                        param.name
                    ))
                    .with_location(param.location)
                    .into(),
                );
            }

            if let Some(function_symbol) = self.context.symbol_mut(symbol).as_function_mut() {
                function_symbol.params.push(param_symbol);
            }
        }

        let return_type = self.resolve_type_symbol(function.return_type, function.location);
        let default_count = function
            .params
            .iter()
            .filter(|param| param.default.is_some())
            .count();

        if let Some(function_symbol) = self.context.symbol_mut(symbol).as_function_mut() {
            function_symbol.return_type = return_type;
            function_symbol.default_count = default_count;
            function_symbol.body_decl = Some(decl_index);
        }
        self.context.symbol_mut(symbol).finish_definition();
    }

    /// Look up a spelled type name; report and return `None` when it is
    /// missing or names something that is not a type.
    fn resolve_type_symbol(&mut self, name: Name, location: SourceLocation) -> Option<SymbolId> {
        match self.table.find(name) {
            None => {
                self.diagnostics.report(
                    Message::error(format!("can't find `{}` type", name))
                        .with_location(location)
                        .into(),
                );
                None
            }
            Some(binding) => match self.context.symbol(binding.symbol).kind {
                SymbolKind::Type(_) => Some(binding.symbol),
                _ => {
                    self.diagnostics.report(
                        Message::error(format!("`{}` isn't a type", name))
                            .with_location(location)
                            .into(),
                    );
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mirac_par::Parser;
    use mirac_util::diagnostic::Severity;
    use mirac_util::span::SourceMap;

    use super::*;
    use crate::passes::ModuleDefinitionPass;
    use crate::symbol::SymbolState;

    fn run_passes(source: &str) -> (Decl, SymbolContext, SymbolTable, DiagnosticManager) {
        let mut map = SourceMap::new();
        let id = map.add_file("test.mira", source);
        let map = Arc::new(map);
        let file = map.get(id).unwrap();
        let diagnostics = DiagnosticManager::with_threshold(map, Severity::Fatal);
        let mut root = Parser::new(&file, &diagnostics).program();

        let mut table = SymbolTable::new();
        let mut context = SymbolContext::new(&mut table);
        ModuleDefinitionPass::new(&mut context, &diagnostics).run(&mut root);
        GlobalScopePass::new(&mut context, &mut table, &diagnostics).run(&mut root);
        (root, context, table, diagnostics)
    }

    fn first_function(root: &Decl) -> &FunctionDecl {
        let Decl::Module(module) = root else {
            panic!("expected module");
        };
        for decl in &module.body.decls {
            if let Decl::Function(function) = decl {
                return function;
            }
        }
        panic!("no function declaration");
    }

    #[test]
    fn test_signature_resolution() {
        let (root, context, table, diagnostics) =
            run_passes("mod m { func f(int32 a, bool b) -> uint8 { return 0; } }");
        assert_eq!(diagnostics.error_count(), 0);
        assert_eq!(table.depth(), 0);

        let function = first_function(&root);
        let symbol = function.symbol.unwrap();
        assert_eq!(context.symbol(symbol).state, SymbolState::Complete);

        let function_symbol = context.symbol(symbol).as_function().unwrap();
        assert_eq!(function_symbol.params.len(), 2);
        assert_eq!(function_symbol.body_decl, Some(0));
        assert_eq!(
            context.function_return_type(symbol).map(|t| context.ty(t).to_string()),
            Some("uint8".to_owned())
        );

        // Parameter AST <-> symbol wiring, and declared types.
        let a = function.params[0].symbol.unwrap();
        assert_eq!(a, function_symbol.params[0]);
        assert_eq!(
            context.variable_type(a).map(|t| context.ty(t).to_string()),
            Some("int32".to_owned())
        );
        let b = function.params[1].symbol.unwrap();
        assert_eq!(
            context.variable_type(b).map(|t| context.ty(t).to_string()),
            Some("bool".to_owned())
        );
    }

    #[test]
    fn test_unknown_return_type() {
        let (_, _, _, diagnostics) = run_passes("mod m { func f() -> nosuch { return 0; } }");
        assert_eq!(diagnostics.error_count(), 1);
        assert!(diagnostics.messages()[0].text.contains("can't find `nosuch` type"));
    }

    #[test]
    fn test_unknown_parameter_type() {
        let (_, _, _, diagnostics) =
            run_passes("mod m { func f(nosuch a) -> int32 { return 0; } }");
        assert!(diagnostics
            .messages()
            .iter()
            .any(|m| m.text.contains("can't find `nosuch` type")));
    }

    #[test]
    fn test_non_type_in_type_position() {
        // `f` names a function, not a type.
        let (_, _, _, diagnostics) = run_passes(
            "mod m { func f() -> int32 { return 0; } func g() -> f { return 0; } }",
        );
        assert!(diagnostics
            .messages()
            .iter()
            .any(|m| m.text.contains("`f` isn't a type")));
    }

    #[test]
    fn test_default_count_tracked() {
        let (root, context, _, diagnostics) =
            run_passes("mod m { func f(int32 a, int32 b = 1, int32 c = 2) -> int32 { return a; } }");
        assert_eq!(diagnostics.error_count(), 0);

        let function = first_function(&root);
        let function_symbol = context.symbol(function.symbol.unwrap()).as_function().unwrap();
        assert_eq!(function_symbol.default_count, 2);
        assert_eq!(function_symbol.required_params(), 1);
    }

    #[test]
    fn test_non_trailing_default_is_an_error() {
        let (_, _, _, diagnostics) =
            run_passes("mod m { func f(int32 a = 1, int32 b) -> int32 { return b; } }");
        assert!(diagnostics
            .messages()
            .iter()
            .any(|m| m.text.contains("follows a defaulted parameter")));
    }
}
