//! Pass 1: module symbols and function placeholders.

use mirac_par::ast::{Decl, ModuleDecl};
use mirac_util::diagnostic::{DiagnosticManager, Message};
use mirac_util::stack::StackGuard;

use crate::context::SymbolContext;

/// Creates a symbol for each module and a placeholder symbol for each
/// function, links the declarations to them, and registers every direct
/// member in its module's member multimap.
pub struct ModuleDefinitionPass<'a> {
    context: &'a mut SymbolContext,
    diagnostics: &'a DiagnosticManager,
}

impl<'a> ModuleDefinitionPass<'a> {
    pub fn new(context: &'a mut SymbolContext, diagnostics: &'a DiagnosticManager) -> Self {
        Self {
            context,
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

        let symbol = self.context.add_module_symbol(module.name);
        module.symbol = Some(symbol);
        self.context.symbol_mut(symbol).start_definition();

        for decl in &mut module.body.decls {
            match decl {
                Decl::Module(nested) => self.visit_module(nested),
                Decl::Function(function) => {
                    function.symbol = Some(self.context.add_function_symbol(function.name));
                }
                Decl::Bad(_) => {}
            }
        }

        for decl in &module.body.decls {
            if let (Some(name), Some(member)) = (decl.name(), decl.symbol()) {
                if let Some(module_symbol) = self.context.symbol_mut(symbol).as_module_mut() {
                    module_symbol.add_member(name, member);
                }
            }
        }

        self.context.symbol_mut(symbol).finish_definition();
    }
}
