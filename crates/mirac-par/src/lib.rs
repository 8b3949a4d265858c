//! mirac-par - Recursive-descent parser.
//!
//! [`Parser::program`] parses one compilation unit into an AST rooted at a
//! module declaration. The parse always terminates and always returns a
//! root: errors are reported through the [`DiagnosticManager`] and recovery
//! synthesizes `Bad` placeholder nodes, so a malformed file still yields a
//! partial tree.
//!
//! Recovery model: a failing production returns a [`ParseError`] carrying
//! the diagnostic. The enclosing block-parsing loop reports it, skips
//! tokens to the next `;` or `}` at bracket depth 0 (consuming it, and
//! tracking `{`/`}` nesting so a closer inside a skipped block does not end
//! the scan), then splices in a `Bad` node and keeps going.
//!
//! Every node's span merges the span of the first token of its production
//! with the span of the last consumed token.

pub mod ast;
mod expr;
mod stmt;

use mirac_lex::{LexError, Lexer, Token, TokenKind};
use mirac_util::diagnostic::{Diagnostic, DiagnosticManager, Message};
use mirac_util::span::{SourceFile, SourceLocation};
use mirac_util::stack::{StackGuard, StackOverflowError};
use mirac_util::Name;

use ast::{BadNode, Decl, DeclBlock, FunctionDecl, FunctionParam, ModuleDecl};

/// A parse failure carrying the diagnostic to report, unwound to the
/// nearest declaration or statement boundary.
#[derive(Debug)]
pub struct ParseError {
    pub diagnostic: Diagnostic,
}

impl ParseError {
    fn new(message: Message) -> Self {
        Self {
            diagnostic: message.into(),
        }
    }
}

impl From<StackOverflowError> for ParseError {
    fn from(error: StackOverflowError) -> Self {
        Self::new(Message::fatal(error.to_string()))
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Recursive-descent parser over a pull lexer.
///
/// Holds the one-token window (`current`, `previous`) the grammar needs;
/// the `previous` token supplies the end of every node span.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    file: &'a SourceFile,
    diagnostics: &'a DiagnosticManager,
    current: Token,
    previous: Token,
    next_loop_id: u32,
}

impl<'a> Parser<'a> {
    pub fn new(file: &'a SourceFile, diagnostics: &'a DiagnosticManager) -> Self {
        let mut parser = Self {
            lexer: Lexer::new(file.id(), file.content()),
            file,
            diagnostics,
            current: Token::eof(),
            previous: Token::eof(),
            next_loop_id: 0,
        };
        parser.advance();
        parser
    }

    /// Parse one compilation unit: `Program = Declaration EOF`.
    ///
    /// Always returns a root declaration; on an unrecoverable error at the
    /// top level the root is a `Bad` node and the diagnostics tell why.
    pub fn program(&mut self) -> Decl {
        let root = match self.declaration() {
            Ok(decl) => decl,
            Err(error) => {
                let location = self.current.location;
                self.report(error);
                self.synchronize();
                Decl::Bad(BadNode { location })
            }
        };

        if !self.current.is(TokenKind::Eof) {
            self.diagnostics.report(
                Message::error(format!(
                    "expected end of file, found {}",
                    self.current.description()
                ))
                .with_location(self.current.location)
                .into(),
            );
        }

        root
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn declaration(&mut self) -> ParseResult<Decl> {
        let _guard = StackGuard::enter()?;

        match self.current.kind {
            TokenKind::Mod => Ok(Decl::Module(self.module_declaration()?)),
            TokenKind::Func => Ok(Decl::Function(self.function_declaration()?)),
            _ => Err(self.unexpected("declaration")),
        }
    }

    fn module_declaration(&mut self) -> ParseResult<ModuleDecl> {
        let start = self.current.location;

        self.expect(TokenKind::Mod)?;
        let name = self.expect_identifier()?;
        let body = self.declarations_block()?;

        Ok(ModuleDecl {
            name,
            body,
            location: start.merge(self.previous.location),
            symbol: None,
        })
    }

    fn declarations_block(&mut self) -> ParseResult<DeclBlock> {
        let start = self.current.location;
        self.expect(TokenKind::LBrace)?;

        let mut decls = Vec::new();
        while !self.current.is(TokenKind::RBrace) {
            if self.current.is(TokenKind::Eof) {
                return Err(self.unexpected("`}`"));
            }

            match self.declaration() {
                Ok(decl) => decls.push(decl),
                Err(error) => {
                    let location = self.current.location;
                    self.report(error);
                    self.synchronize();
                    decls.push(Decl::Bad(BadNode { location }));
                }
            }
        }
        self.advance(); // }

        Ok(DeclBlock {
            decls,
            location: start.merge(self.previous.location),
        })
    }

    fn function_declaration(&mut self) -> ParseResult<FunctionDecl> {
        let start = self.current.location;

        self.expect(TokenKind::Func)?;
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen)?;

        let mut params = Vec::new();
        while !self.current.is(TokenKind::RParen) {
            if self.current.is(TokenKind::Eof) {
                return Err(self.unexpected("`)`"));
            }
            params.push(self.function_parameter()?);
            if self.current.is(TokenKind::Comma) {
                self.advance();
            }
        }
        self.advance(); // )

        self.expect(TokenKind::Arrow)?;
        let return_type = self.expect_identifier()?;
        let body = self.stmt_block()?;

        Ok(FunctionDecl {
            name,
            params,
            return_type,
            body,
            location: start.merge(self.previous.location),
            symbol: None,
        })
    }

    fn function_parameter(&mut self) -> ParseResult<FunctionParam> {
        let start = self.current.location;

        let type_name = self.expect_identifier()?;
        let name = self.expect_identifier()?;

        let default = if self.current.is(TokenKind::Assign) {
            self.advance();
            Some(self.expr()?)
        } else {
            None
        };

        Ok(FunctionParam {
            type_name,
            name,
            default,
            location: start.merge(self.previous.location),
            symbol: None,
        })
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    /// Step the token window. A lex error becomes a fatal diagnostic and
    /// the stream is clamped to end-of-file so the parse unwinds.
    pub(crate) fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, Token::eof());
        match self.lexer.next_token() {
            Ok(token) => self.current = token,
            Err(LexError::UnterminatedString { location }) => {
                self.diagnostics.report(
                    Message::fatal("unterminated string literal")
                        .with_location(location)
                        .into(),
                );
            }
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> ParseResult<()> {
        if self.current.is(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{}`", kind.glyph())))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> ParseResult<Name> {
        match (self.current.kind, self.current.value) {
            (TokenKind::Identifier, Some(name)) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::new(
            Message::error(format!(
                "expected {}, found {}",
                expected,
                self.current.description()
            ))
            .with_location(self.current.location),
        )
    }

    pub(crate) fn report(&self, error: ParseError) {
        self.diagnostics.report(error.diagnostic);
    }

    /// Skip to the next `;` or `}` at bracket depth 0 and consume it.
    pub(crate) fn synchronize(&mut self) {
        let mut depth: u32 = 0;
        loop {
            match self.current.kind {
                TokenKind::Eof => return,
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                TokenKind::Semicolon => {
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                }
                _ => self.advance(),
            }
        }
    }

    pub(crate) fn fresh_loop_id(&mut self) -> mirac_util::LoopId {
        let id = mirac_util::LoopId(self.next_loop_id);
        self.next_loop_id += 1;
        id
    }

    pub(crate) fn span_from(&self, start: SourceLocation) -> SourceLocation {
        start.merge(self.previous.location)
    }
}
