//! mirac-drv - Compiler driver.
//!
//! Orchestrates the pipeline over a single source file:
//!
//! ```text
//! source text -> lex/parse -> semantic passes -> evaluate `main`
//! ```
//!
//! The evaluator only runs when parsing and analysis produced no error or
//! fatal diagnostics. Exit status: 0 for a clean run, 1 for compile or
//! runtime failures, 2 for usage and file-system problems.

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use mirac_eval::Evaluator;
use mirac_par::Parser;
use mirac_sem::{SymbolContext, SymbolTable};
use mirac_util::diagnostic::{DiagnosticManager, Message};
use mirac_util::span::SourceMap;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = 2;

/// Entry point behind the `mirac` binary: expects exactly one argument,
/// the path of the source file to compile and run.
pub fn run(args: impl IntoIterator<Item = String>) -> Result<i32> {
    let args: Vec<String> = args.into_iter().collect();
    let [path] = args.as_slice() else {
        bail!("usage: mirac <file.mira>");
    };

    let source = std::fs::read_to_string(path)
        .with_context(|| format!("can't open input file `{}`", path))?;
    Ok(run_source(path, &source, &mut std::io::stdout()))
}

/// Compile and evaluate one source buffer.
///
/// `print` output goes to `output`; diagnostics go to standard output
/// through the [`DiagnosticManager`]. Returns the process exit code.
pub fn run_source(name: &str, source: &str, output: &mut impl Write) -> i32 {
    let mut map = SourceMap::new();
    let id = map.add_file(name, source);
    let map = Arc::new(map);
    let file = map.get(id).expect("file was just added");
    let diagnostics = DiagnosticManager::new(map);

    let mut root = Parser::new(&file, &diagnostics).program();

    // A fatal during lexing/parsing ends the compilation; plain parse
    // errors still go through analysis for whatever it can resolve.
    if diagnostics.fatal_count() == 0 {
        let mut table = SymbolTable::new();
        let mut context = SymbolContext::new(&mut table);
        mirac_sem::analyze(&mut root, &mut context, &mut table, &diagnostics);

        if diagnostics.fatal_count() == 0 && diagnostics.error_count() == 0 {
            return match Evaluator::new(&root, &context, output).evaluate() {
                Ok(_) => EXIT_SUCCESS,
                Err(error) => {
                    diagnostics.report(Message::fatal(error.to_string()).into());
                    EXIT_FAILURE
                }
            };
        }
    }

    EXIT_FAILURE
}
