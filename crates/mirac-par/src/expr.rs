//! Expression productions.
//!
//! One method per precedence level, lowest binding first:
//! `||`, `&&`, `|`, `^`, `&`, equality, relational, additive,
//! multiplicative, prefix, primary. All binary levels are
//! left-associative except equality and relational, which are
//! non-associative: at most one operator of the level per chain, so
//! `a < b < c` does not parse.

use mirac_lex::TokenKind;
use mirac_util::span::SourceLocation;
use mirac_util::stack::StackGuard;
use mirac_util::Name;

use crate::ast::{
    BinOp, BinaryExpr, CallExpr, Expr, IdentifierExpr, NumberExpr, PrefixExpr, UnOp,
};
use crate::{ParseResult, Parser};

impl Parser<'_> {
    pub(crate) fn expr(&mut self) -> ParseResult<Expr> {
        let _guard = StackGuard::enter()?;
        self.logic_or()
    }

    fn binary_node(&self, op: BinOp, start: SourceLocation, left: Expr, right: Expr) -> Expr {
        Expr::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            location: self.span_from(start),
            ty: None,
        })
    }

    fn logic_or(&mut self) -> ParseResult<Expr> {
        let start = self.current.location;
        let mut node = self.logic_and()?;

        while self.current.is(TokenKind::OrOr) {
            self.advance();
            let right = self.logic_and()?;
            node = self.binary_node(BinOp::LogicOr, start, node, right);
        }
        Ok(node)
    }

    fn logic_and(&mut self) -> ParseResult<Expr> {
        let start = self.current.location;
        let mut node = self.bit_or()?;

        while self.current.is(TokenKind::AndAnd) {
            self.advance();
            let right = self.bit_or()?;
            node = self.binary_node(BinOp::LogicAnd, start, node, right);
        }
        Ok(node)
    }

    fn bit_or(&mut self) -> ParseResult<Expr> {
        let start = self.current.location;
        let mut node = self.bit_xor()?;

        while self.current.is(TokenKind::Or) {
            self.advance();
            let right = self.bit_xor()?;
            node = self.binary_node(BinOp::BitOr, start, node, right);
        }
        Ok(node)
    }

    fn bit_xor(&mut self) -> ParseResult<Expr> {
        let start = self.current.location;
        let mut node = self.bit_and()?;

        while self.current.is(TokenKind::Caret) {
            self.advance();
            let right = self.bit_and()?;
            node = self.binary_node(BinOp::BitXor, start, node, right);
        }
        Ok(node)
    }

    fn bit_and(&mut self) -> ParseResult<Expr> {
        let start = self.current.location;
        let mut node = self.equality()?;

        while self.current.is(TokenKind::And) {
            self.advance();
            let right = self.equality()?;
            node = self.binary_node(BinOp::BitAnd, start, node, right);
        }
        Ok(node)
    }

    /// Non-associative: at most one `==`/`!=` per chain.
    fn equality(&mut self) -> ParseResult<Expr> {
        let start = self.current.location;
        let mut node = self.relational()?;

        let op = match self.current.kind {
            TokenKind::EqEq => Some(BinOp::Eq),
            TokenKind::NotEq => Some(BinOp::Ne),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let right = self.relational()?;
            node = self.binary_node(op, start, node, right);
        }
        Ok(node)
    }

    /// Non-associative: at most one `<`/`<=`/`>`/`>=` per chain.
    fn relational(&mut self) -> ParseResult<Expr> {
        let start = self.current.location;
        let mut node = self.term()?;

        let op = match self.current.kind {
            TokenKind::Less => Some(BinOp::Lt),
            TokenKind::LessEq => Some(BinOp::Le),
            TokenKind::Greater => Some(BinOp::Gt),
            TokenKind::GreaterEq => Some(BinOp::Ge),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let right = self.term()?;
            node = self.binary_node(op, start, node, right);
        }
        Ok(node)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let start = self.current.location;
        let mut node = self.factor()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(node),
            };
            self.advance();
            let right = self.factor()?;
            node = self.binary_node(op, start, node, right);
        }
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let start = self.current.location;
        let mut node = self.unary()?;

        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Rem,
                _ => return Ok(node),
            };
            self.advance();
            let right = self.unary()?;
            node = self.binary_node(op, start, node, right);
        }
    }

    /// Prefix operators are right-associative: `--x` nests.
    fn unary(&mut self) -> ParseResult<Expr> {
        let _guard = StackGuard::enter()?;
        let start = self.current.location;

        let op = match self.current.kind {
            TokenKind::Minus => Some(UnOp::Neg),
            TokenKind::Not => Some(UnOp::Not),
            _ => None,
        };

        match op {
            Some(op) => {
                self.advance();
                let operand = self.unary()?;
                Ok(Expr::Prefix(PrefixExpr {
                    op,
                    operand: Box::new(operand),
                    location: self.span_from(start),
                    ty: None,
                }))
            }
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        let start = self.current.location;

        match (self.current.kind, self.current.value) {
            (TokenKind::Number, Some(lexeme)) => {
                self.advance();
                Ok(Expr::Number(NumberExpr {
                    lexeme,
                    location: self.span_from(start),
                    ty: None,
                }))
            }
            (TokenKind::Identifier, Some(name)) => {
                self.advance();
                if self.current.is(TokenKind::LParen) {
                    Ok(Expr::Call(self.finish_call(name, start)?))
                } else {
                    Ok(Expr::Identifier(IdentifierExpr {
                        name,
                        location: self.span_from(start),
                        ty: None,
                        symbol: None,
                    }))
                }
            }
            (TokenKind::LParen, _) => {
                self.advance();
                let inner = self.expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// Argument list of a call whose callee name is already consumed;
    /// `current` is the opening parenthesis.
    pub(crate) fn finish_call(
        &mut self,
        name: Name,
        start: SourceLocation,
    ) -> ParseResult<CallExpr> {
        self.expect(TokenKind::LParen)?;

        let mut args = Vec::new();
        while !self.current.is(TokenKind::RParen) {
            if self.current.is(TokenKind::Eof) {
                return Err(self.unexpected("`)`"));
            }
            args.push(self.expr()?);
            if self.current.is(TokenKind::Comma) {
                self.advance();
            }
        }
        self.advance(); // )

        Ok(CallExpr {
            name,
            args,
            location: self.span_from(start),
            ty: None,
            symbol: None,
        })
    }
}
