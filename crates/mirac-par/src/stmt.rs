//! Statement productions.

use mirac_lex::TokenKind;
use mirac_util::diagnostic::{Fix, Message};
use mirac_util::stack::StackGuard;

use crate::ast::{
    AssignStmt, BadNode, Block, BreakStmt, IfStmt, PrintStmt, ReturnStmt, Stmt, VarDeclStmt,
    WhileStmt,
};
use crate::{ParseError, ParseResult, Parser};

impl Parser<'_> {
    /// One statement, including its trailing semicolon where the grammar
    /// requires one (never after `if`, `while`, or a block).
    pub(crate) fn stmt(&mut self) -> ParseResult<Stmt> {
        let _guard = StackGuard::enter()?;
        let start = self.current.location;

        let node = match self.current.kind {
            TokenKind::LBrace => Stmt::Block(self.stmt_block()?),
            TokenKind::If => Stmt::If(self.if_stmt()?),
            TokenKind::While => Stmt::While(self.while_stmt()?),
            TokenKind::Break => {
                self.expect(TokenKind::Break)?;
                Stmt::Break(BreakStmt {
                    location: self.span_from(start),
                    target: None,
                })
            }
            TokenKind::Var => Stmt::VarDecl(self.var_decl()?),
            TokenKind::Return => {
                self.expect(TokenKind::Return)?;
                let value = self.expr()?;
                Stmt::Return(ReturnStmt {
                    value,
                    location: self.span_from(start),
                })
            }
            TokenKind::Identifier => {
                // `print` is not a keyword; it is recognized here by its
                // payload and stays usable as a variable name elsewhere.
                if self.current.text() == Some("print") {
                    self.advance();
                    let value = self.expr()?;
                    Stmt::Print(PrintStmt {
                        value,
                        location: self.span_from(start),
                    })
                } else {
                    self.assign_or_call_stmt()?
                }
            }
            _ => return Err(self.unexpected("statement")),
        };

        let needs_semicolon = !matches!(node, Stmt::Block(_) | Stmt::If(_) | Stmt::While(_));
        if needs_semicolon {
            if self.current.is(TokenKind::Semicolon) {
                self.advance();
            } else {
                return Err(self.missing_semicolon());
            }
        }

        Ok(node)
    }

    /// `{ Statement* }`, catching statement errors so one bad statement
    /// does not take the whole block down.
    pub(crate) fn stmt_block(&mut self) -> ParseResult<Block> {
        let _guard = StackGuard::enter()?;
        let start = self.current.location;
        self.expect(TokenKind::LBrace)?;

        let mut stmts = Vec::new();
        while !self.current.is(TokenKind::RBrace) {
            if self.current.is(TokenKind::Eof) {
                return Err(self.unexpected("`}`"));
            }

            match self.stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(error) => {
                    let location = self.current.location;
                    self.report(error);
                    self.synchronize();
                    stmts.push(Stmt::Bad(BadNode { location }));
                }
            }
        }
        self.advance(); // }

        Ok(Block {
            stmts,
            location: self.span_from(start),
        })
    }

    fn if_stmt(&mut self) -> ParseResult<IfStmt> {
        let start = self.current.location;

        self.expect(TokenKind::If)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.expr()?;
        self.expect(TokenKind::RParen)?;
        let then_block = self.stmt_block()?;

        let else_branch = if self.current.is(TokenKind::Else) {
            self.advance();
            let branch = if self.current.is(TokenKind::If) {
                Stmt::If(self.if_stmt()?)
            } else {
                Stmt::Block(self.stmt_block()?)
            };
            Some(Box::new(branch))
        } else {
            None
        };

        Ok(IfStmt {
            condition,
            then_block,
            else_branch,
            location: self.span_from(start),
        })
    }

    fn while_stmt(&mut self) -> ParseResult<WhileStmt> {
        let start = self.current.location;

        self.expect(TokenKind::While)?;
        self.expect(TokenKind::LParen)?;
        let condition = self.expr()?;
        self.expect(TokenKind::RParen)?;

        let loop_id = self.fresh_loop_id();
        let body = self.stmt_block()?;

        Ok(WhileStmt {
            loop_id,
            condition,
            body,
            location: self.span_from(start),
        })
    }

    fn var_decl(&mut self) -> ParseResult<VarDeclStmt> {
        let start = self.current.location;

        self.expect(TokenKind::Var)?;
        let type_name = self.expect_identifier()?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Assign)?;
        let value = self.expr()?;

        Ok(VarDeclStmt {
            type_name,
            name,
            value,
            location: self.span_from(start),
            symbol: None,
        })
    }

    /// `ident = Expr` or `ident ( Args )` - disambiguated one token after
    /// the identifier.
    fn assign_or_call_stmt(&mut self) -> ParseResult<Stmt> {
        let start = self.current.location;
        let name = self.expect_identifier()?;

        match self.current.kind {
            TokenKind::Assign => {
                self.advance();
                let value = self.expr()?;
                Ok(Stmt::Assign(AssignStmt {
                    name,
                    value,
                    location: self.span_from(start),
                    symbol: None,
                }))
            }
            TokenKind::LParen => {
                let call = self.finish_call(name, start)?;
                Ok(Stmt::Call(call))
            }
            _ => Err(self.unexpected("`=` or `(`")),
        }
    }

    /// "expected semicolon" with a suggested fix: the previous token's
    /// line reprinted with `;` inserted right after that token.
    fn missing_semicolon(&self) -> ParseError {
        let previous = self.previous.location;
        let mut message =
            Message::error("expected semicolon").with_location(self.current.location);

        if previous.is_valid() {
            let line_no = previous.end_line as usize;
            if let (Some(line), Some(line_start)) =
                (self.file.line(line_no), self.file.line_start(line_no))
            {
                let insert_at = previous.end.saturating_sub(line_start).min(line.len());
                let mut replacement = String::with_capacity(line.len() + 1);
                replacement.push_str(&line[..insert_at]);
                replacement.push(';');
                replacement.push_str(&line[insert_at..]);
                message =
                    message.with_fix(Fix::new().with_diff(self.file.id(), line_no, replacement));
            }
        }

        ParseError::new(message)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mirac_util::diagnostic::{DiagnosticManager, Severity};
    use mirac_util::span::SourceMap;

    use crate::ast::{Decl, Stmt};
    use crate::Parser;

    fn parse_body(body: &str) -> (Vec<Stmt>, DiagnosticManager) {
        let source = format!("mod m {{ func main() -> int32 {{ {} }} }}", body);
        let mut map = SourceMap::new();
        let id = map.add_file("test.mira", source);
        let map = Arc::new(map);
        let file = map.get(id).unwrap();
        let diagnostics = DiagnosticManager::with_threshold(map, Severity::Fatal);
        let root = Parser::new(&file, &diagnostics).program();

        let Decl::Module(module) = root else {
            panic!("expected module root");
        };
        let Decl::Function(function) = module.body.decls.into_iter().next().unwrap() else {
            panic!("expected function");
        };
        (function.body.stmts, diagnostics)
    }

    #[test]
    fn test_statement_inventory() {
        let (stmts, diagnostics) = parse_body(
            "var int32 x = 1; x = 2; print x; f(x); break; return 0; \
             { x = 3; } if (x < 1) { x = 4; } while (x < 5) { x = x + 1; }",
        );
        assert_eq!(diagnostics.error_count(), 0);
        assert!(matches!(stmts[0], Stmt::VarDecl(_)));
        assert!(matches!(stmts[1], Stmt::Assign(_)));
        assert!(matches!(stmts[2], Stmt::Print(_)));
        assert!(matches!(stmts[3], Stmt::Call(_)));
        assert!(matches!(stmts[4], Stmt::Break(_)));
        assert!(matches!(stmts[5], Stmt::Return(_)));
        assert!(matches!(stmts[6], Stmt::Block(_)));
        assert!(matches!(stmts[7], Stmt::If(_)));
        assert!(matches!(stmts[8], Stmt::While(_)));
    }

    #[test]
    fn test_else_if_chain() {
        let (stmts, diagnostics) =
            parse_body("if (a < 1) { print a; } else if (a < 2) { print a; } else { print a; }");
        assert_eq!(diagnostics.error_count(), 0);

        let Stmt::If(first) = &stmts[0] else {
            panic!("expected if");
        };
        let Some(else_branch) = &first.else_branch else {
            panic!("expected else branch");
        };
        let Stmt::If(second) = else_branch.as_ref() else {
            panic!("expected chained if");
        };
        assert!(matches!(
            second.else_branch.as_deref(),
            Some(Stmt::Block(_))
        ));
    }

    #[test]
    fn test_while_loops_get_distinct_ids() {
        let (stmts, _) = parse_body("while (a) { b = 1; } while (a) { b = 2; }");
        let (Stmt::While(first), Stmt::While(second)) = (&stmts[0], &stmts[1]) else {
            panic!("expected two loops");
        };
        assert_ne!(first.loop_id, second.loop_id);
    }

    #[test]
    fn test_missing_semicolon_reports_fix() {
        let (stmts, diagnostics) = parse_body("var int32 x = 1 print x; return 0;");
        assert_eq!(diagnostics.error_count(), 1);

        let messages = diagnostics.messages();
        assert_eq!(messages[0].text, "expected semicolon");
        let fix = &messages[0].fixes[0];
        assert!(fix.diffs()[0].replacement.contains("var int32 x = 1;"));

        // Recovery consumed through the next `;` and kept going.
        assert!(stmts[0].is_bad());
        assert!(matches!(stmts.last(), Some(Stmt::Return(_))));
    }

    #[test]
    fn test_no_semicolon_after_blocks() {
        let (_, diagnostics) = parse_body("if (a) { b = 1; } return 0;");
        assert_eq!(diagnostics.error_count(), 0);
    }

    #[test]
    fn test_recovery_skips_nested_blocks_wholesale() {
        // The error is followed by a nested block; the `;` and `}` inside
        // it are at depth 1 and must not end the skip. The next depth-0
        // boundary is the `;` after `return 0`.
        let (stmts, diagnostics) = parse_body("var x { a = 1; } return 0;");
        assert!(diagnostics.error_count() >= 1);
        assert_eq!(stmts.len(), 1);
        assert!(stmts[0].is_bad());
    }

    #[test]
    fn test_recovery_stops_at_depth_zero_semicolon() {
        let (stmts, diagnostics) = parse_body("var x = ; return 0;");
        assert_eq!(diagnostics.error_count(), 1);
        assert!(stmts[0].is_bad());
        assert!(matches!(stmts.last(), Some(Stmt::Return(_))));
    }

    #[test]
    fn test_statement_spans_cover_children() {
        let (stmts, _) = parse_body("while (i < 3) { print i; i = i + 1; }");
        let Stmt::While(while_stmt) = &stmts[0] else {
            panic!("expected while");
        };
        assert!(while_stmt.location.start <= while_stmt.condition.location().start);
        assert!(while_stmt.location.end >= while_stmt.body.location.end);
        for stmt in &while_stmt.body.stmts {
            assert!(while_stmt.body.location.start <= stmt.location().start);
            assert!(while_stmt.body.location.end >= stmt.location().end);
        }
    }
}
