//! mirac-lex - Lexical analysis.
//!
//! The [`Lexer`] pulls [`Token`]s out of a source buffer on demand. Rules:
//!
//! - whitespace: space and `\r` are skipped, `\n` advances the line and
//!   resets the column, `\t` advances the column by 4
//! - two-glyph operators (`->`, `!=`, `||`, `&&`, `<=`, `>=`, `==`) are
//!   recognized by one character of lookahead
//! - numbers are maximal runs of decimal digits
//! - identifiers match `[A-Za-z][A-Za-z0-9]*`, with a keyword lookup on
//!   completion; any other non-whitespace character starts an identifier
//!   attempt, so the lexer itself never rejects a character
//! - strings are double-quote delimited; an embedded `\n` is kept (and
//!   advances the line), `\r` is dropped from the text; a missing closing
//!   quote is the one fatal lex error
//!
//! Every token carries a span covering exactly its source extent; slicing
//! the source with `location.start..location.end` yields the lexeme. The
//! lexer reports no diagnostics itself — [`LexError`] is surfaced by the
//! parser.

mod token;

pub use token::{Token, TokenKind};

use mirac_util::span::{FileId, SourceLocation};
use mirac_util::{FxHashMap, Name};
use thiserror::Error;

/// Fatal lexical error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A string literal reached end of file before its closing quote.
    /// The location points at the opening quote.
    #[error("unterminated string literal")]
    UnterminatedString { location: SourceLocation },
}

/// Saved lexer position, used to build token spans.
#[derive(Clone, Copy)]
struct Mark {
    pos: usize,
    line: u32,
    column: u32,
}

/// Streaming tokenizer over a single source buffer.
///
/// # Examples
///
/// ```
/// use mirac_lex::{Lexer, TokenKind};
/// use mirac_util::FileId;
///
/// let mut lexer = Lexer::new(FileId(0), "var int32 x = 1;");
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Var);
/// assert_eq!(lexer.next_token().unwrap().text(), Some("int32"));
/// ```
pub struct Lexer<'src> {
    file: FileId,
    source: &'src str,
    pos: usize,
    line: u32,
    column: u32,
    keywords: FxHashMap<&'static str, TokenKind>,
}

impl<'src> Lexer<'src> {
    pub fn new(file: FileId, source: &'src str) -> Self {
        let keywords = [
            ("mod", TokenKind::Mod),
            ("var", TokenKind::Var),
            ("func", TokenKind::Func),
            ("if", TokenKind::If),
            ("else", TokenKind::Else),
            ("while", TokenKind::While),
            ("break", TokenKind::Break),
            ("return", TokenKind::Return),
        ]
        .into_iter()
        .collect();

        Self {
            file,
            source,
            pos: 0,
            line: 1,
            column: 1,
            keywords,
        }
    }

    /// The next token, or an `Eof` token at the end of input.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        loop {
            let Some(c) = self.current() else {
                return Ok(Token::eof());
            };

            return Ok(match c {
                ' ' | '\r' | '\t' | '\n' => {
                    self.bump();
                    continue;
                }

                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '[' => self.single(TokenKind::LBracket),
                ']' => self.single(TokenKind::RBracket),
                '{' => self.single(TokenKind::LBrace),
                '}' => self.single(TokenKind::RBrace),
                ',' => self.single(TokenKind::Comma),
                ';' => self.single(TokenKind::Semicolon),
                '+' => self.single(TokenKind::Plus),
                '*' => self.single(TokenKind::Star),
                '/' => self.single(TokenKind::Slash),
                '%' => self.single(TokenKind::Percent),
                '^' => self.single(TokenKind::Caret),

                '-' => self.one_or_two(TokenKind::Minus, '>', TokenKind::Arrow),
                '!' => self.one_or_two(TokenKind::Not, '=', TokenKind::NotEq),
                '|' => self.one_or_two(TokenKind::Or, '|', TokenKind::OrOr),
                '&' => self.one_or_two(TokenKind::And, '&', TokenKind::AndAnd),
                '<' => self.one_or_two(TokenKind::Less, '=', TokenKind::LessEq),
                '>' => self.one_or_two(TokenKind::Greater, '=', TokenKind::GreaterEq),
                '=' => self.one_or_two(TokenKind::Assign, '=', TokenKind::EqEq),

                '"' => return self.lex_string(),
                '0'..='9' => self.lex_number(),
                _ => self.lex_identifier(),
            });
        }
    }

    /// Stream every remaining token into `sink`, including the final
    /// `Eof` token.
    pub fn drain(&mut self, sink: &mut Vec<Token>) -> Result<(), LexError> {
        loop {
            let token = self.next_token()?;
            let done = token.is(TokenKind::Eof);
            sink.push(token);
            if done {
                return Ok(());
            }
        }
    }

    /// Restore lexer state to immediately after `token`, enabling
    /// multi-token lookahead.
    pub fn revert(&mut self, token: &Token) {
        if token.location.is_valid() {
            self.pos = token.location.end;
            self.line = token.location.end_line;
            self.column = token.location.end_column + 1;
        } else {
            // Eof carries no span; reverting to it means staying there.
            self.pos = self.source.len();
        }
    }

    /// Lex one token and compare it against `expected` (kind and payload,
    /// locations ignored). The token is consumed either way.
    pub fn matches(&mut self, expected: &Token) -> Result<bool, LexError> {
        Ok(self.next_token()? == *expected)
    }

    fn current(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.current() {
            match c {
                '\n' => {
                    self.line += 1;
                    self.column = 1;
                }
                '\t' => self.column += 4,
                _ => self.column += 1,
            }
            self.pos += c.len_utf8();
        }
    }

    fn mark(&self) -> Mark {
        Mark {
            pos: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn span_from(&self, mark: Mark) -> SourceLocation {
        SourceLocation::new(
            self.file,
            mark.pos,
            self.pos,
            mark.line,
            self.line,
            mark.column,
            self.column.saturating_sub(1),
        )
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let mark = self.mark();
        self.bump();
        Token::new(kind, self.span_from(mark))
    }

    fn one_or_two(&mut self, one: TokenKind, second: char, two: TokenKind) -> Token {
        let mark = self.mark();
        self.bump();
        if self.current() == Some(second) {
            self.bump();
            Token::new(two, self.span_from(mark))
        } else {
            Token::new(one, self.span_from(mark))
        }
    }

    fn lex_number(&mut self) -> Token {
        let mark = self.mark();
        while matches!(self.current(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let text = &self.source[mark.pos..self.pos];
        Token::with_value(TokenKind::Number, self.span_from(mark), Name::intern(text))
    }

    fn lex_identifier(&mut self) -> Token {
        let mark = self.mark();
        // The first character is taken unconditionally; the lexer never
        // rejects a byte, the parser rejects the resulting token.
        self.bump();
        while matches!(self.current(), Some(c) if c.is_ascii_alphanumeric()) {
            self.bump();
        }

        let text = &self.source[mark.pos..self.pos];
        match self.keywords.get(text) {
            Some(&keyword) => Token::new(keyword, self.span_from(mark)),
            None => Token::with_value(
                TokenKind::Identifier,
                self.span_from(mark),
                Name::intern(text),
            ),
        }
    }

    fn lex_string(&mut self) -> Result<Token, LexError> {
        let mark = self.mark();
        self.bump(); // opening quote

        let mut text = String::new();
        loop {
            match self.current() {
                None => {
                    return Err(LexError::UnterminatedString {
                        location: SourceLocation::new(
                            self.file,
                            mark.pos,
                            mark.pos + 1,
                            mark.line,
                            mark.line,
                            mark.column,
                            mark.column,
                        ),
                    });
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                // Dropped from the text, still advances the column
                Some('\r') => self.bump(),
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }

        Ok(Token::with_value(
            TokenKind::String,
            self.span_from(mark),
            Name::intern(&text),
        ))
    }
}
