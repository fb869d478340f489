// Parser — Recursive descent parser for the TSL language
//
// The parser consumes a Vec<Token> (from the Lexer) and produces an AST
// (Program). It's a classic hand-written recursive descent parser — one
// method per grammar production.
//
// ERROR RECOVERY: Inside a statement we use panic mode — on error, we
// return Err immediately. The program-level loop catches the error,
// records it, and synchronizes to the next statement boundary (the token
// after the next `;`, or the next `fn`/`var`/`const` keyword), then keeps
// parsing. `parse` surfaces the first recorded error; `parse_with_recovery`
// returns the partial Program together with every error found.
//
// OPERATOR PRECEDENCE (lowest to highest):
//   1. = (assignment, right-associative)
//   2. || (logical or)
//   3. && (logical and)
//   4. == != (equality)
//   5. < > <= >= (comparison)
//   6. + - (additive)
//   7. * / % (multiplicative)
//   8. - ! (unary prefix)
//   9. . () (postfix: member, call)
//
// Parenthesized groups are unwrapped on the spot — precedence is already
// encoded in the tree shape, so no grouping node exists in the AST.

use crate::ast::*;
use crate::error::{Error, ErrorKind, Result};
use crate::lexer;
use crate::token::{Span, Token, TokenKind};
use crate::types::ShaderType;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Parse the full program, recovering at statement boundaries.
    /// Returns the statements that parsed cleanly plus every error found.
    pub fn parse_program(&mut self) -> (Program, Vec<Error>) {
        let mut statements = Vec::new();
        let mut errors = Vec::new();
        while !self.at_eof() {
            match self.parse_stmt() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    errors.push(err);
                    self.synchronize();
                }
            }
        }
        (Program { statements }, errors)
    }

    /// Skip tokens until a likely statement boundary: just past the next
    /// `;`, or right before the next declaration keyword.
    fn synchronize(&mut self) {
        while !self.at_eof() {
            if self.check(&TokenKind::Semi) {
                self.advance();
                return;
            }
            match self.peek_kind() {
                TokenKind::Fn | TokenKind::Var | TokenKind::Const => return,
                _ => {}
            }
            self.advance();
        }
    }

    // Statements

    fn parse_stmt(&mut self) -> Result<Stmt> {
        match self.peek_kind() {
            TokenKind::Fn => Ok(Stmt::FunctionDecl(self.parse_function_decl()?)),
            TokenKind::Var => self.parse_var_decl(true),
            TokenKind::Const => self.parse_var_decl(false),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            _ => {
                let span = self.current_span();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::Semi)?;
                Ok(Stmt::Expression { expr, span })
            }
        }
    }

    /// `fn name(float a, float b) -> float { ... }`
    fn parse_function_decl(&mut self) -> Result<FunctionDecl> {
        let span = self.expect(TokenKind::Fn)?.span;
        let name = self.expect_ident()?;
        self.expect(TokenKind::LParen)?;

        let mut parameters = Vec::new();
        if !self.check(&TokenKind::RParen) {
            parameters.push(self.parse_param()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                if self.check(&TokenKind::RParen) {
                    break;
                }
                parameters.push(self.parse_param()?);
            }
        }
        self.expect(TokenKind::RParen)?;
        self.expect(TokenKind::Arrow)?;
        let return_type = self.expect_type()?;
        let body = self.parse_block()?;

        Ok(FunctionDecl {
            name,
            parameters,
            return_type,
            body,
            span,
        })
    }

    /// A `type name` parameter pair.
    fn parse_param(&mut self) -> Result<Param> {
        let span = self.current_span();
        let ty = self.expect_type()?;
        let name = self.expect_ident()?;
        Ok(Param { name, ty, span })
    }

    /// `var name [: type] = expr;` (`mutable` distinguishes var/const)
    fn parse_var_decl(&mut self, mutable: bool) -> Result<Stmt> {
        let span = self.advance().span; // var | const
        let name = self.expect_ident()?;
        let ty = if self.check(&TokenKind::Colon) {
            self.advance();
            Some(self.expect_type()?)
        } else {
            None
        };
        self.expect(TokenKind::Eq)?;
        let init = self.parse_expr()?;
        self.expect(TokenKind::Semi)?;
        Ok(Stmt::VarDecl(VarDecl {
            name,
            ty,
            init,
            mutable,
            span,
        }))
    }

    /// `return [expr];`
    fn parse_return(&mut self) -> Result<Stmt> {
        let span = self.expect(TokenKind::Return)?.span;
        let value = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Semi)?;
        Ok(Stmt::Return { value, span })
    }

    /// `if cond { ... } [else { ... }]` — a missing else yields None.
    fn parse_if(&mut self) -> Result<Stmt> {
        let span = self.expect(TokenKind::If)?.span;
        let condition = self.parse_expr()?;
        let then_branch = self.parse_block()?;
        let else_branch = if self.check(&TokenKind::Else) {
            self.advance();
            Some(self.parse_block()?)
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span,
        })
    }

    fn parse_block(&mut self) -> Result<Block> {
        let span = self.expect(TokenKind::LBrace)?.span;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            if self.at_eof() {
                return Err(Error::new(ErrorKind::UnexpectedEof, self.current_span()));
            }
            statements.push(self.parse_stmt()?);
        }
        self.expect(TokenKind::RBrace)?;
        Ok(Block { statements, span })
    }

    // Expressions (Pratt parser with precedence climbing)

    pub fn parse_expr(&mut self) -> Result<Expr> {
        // Assignment is lowest and right-associative: `name = expr`
        if let TokenKind::Ident(name) = self.peek_kind() {
            if self.peek_ahead_kind(1) == TokenKind::Eq {
                let span = self.current_span();
                self.advance(); // ident
                self.advance(); // =
                let value = self.parse_expr()?;
                return Ok(Expr::Assignment {
                    target: name,
                    value: Box::new(value),
                    span,
                });
            }
        }
        self.parse_expr_bp(0)
    }

    /// Pratt parser: parse expression with minimum binding power `min_bp`.
    /// Left binding power > right keeps every binary tier left-associative.
    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_prefix()?;

        // Postfix: member access
        loop {
            lhs = match self.peek_kind() {
                TokenKind::Dot => {
                    let span = lhs.span();
                    self.advance();
                    let field = self.expect_ident()?;
                    Expr::Member {
                        object: Box::new(lhs),
                        field,
                        span,
                    }
                }
                _ => break,
            };
        }

        loop {
            let (op, bp) = match self.peek_kind() {
                TokenKind::PipePipe => (BinOp::Or, (1, 2)),
                TokenKind::AmpAmp => (BinOp::And, (3, 4)),
                TokenKind::EqEq => (BinOp::Eq, (5, 6)),
                TokenKind::BangEq => (BinOp::Ne, (5, 6)),
                TokenKind::Lt => (BinOp::Lt, (7, 8)),
                TokenKind::Gt => (BinOp::Gt, (7, 8)),
                TokenKind::LtEq => (BinOp::Le, (7, 8)),
                TokenKind::GtEq => (BinOp::Ge, (7, 8)),
                TokenKind::Plus => (BinOp::Add, (9, 10)),
                TokenKind::Minus => (BinOp::Sub, (9, 10)),
                TokenKind::Star => (BinOp::Mul, (11, 12)),
                TokenKind::Slash => (BinOp::Div, (11, 12)),
                TokenKind::Percent => (BinOp::Mod, (11, 12)),
                _ => break,
            };

            let (l_bp, r_bp) = bp;
            if l_bp < min_bp {
                break;
            }

            self.advance();
            let span = lhs.span();
            let rhs = self.parse_expr_bp(r_bp)?;
            lhs = Expr::Binary {
                left: Box::new(lhs),
                op,
                right: Box::new(rhs),
                span,
            };
        }

        Ok(lhs)
    }

    /// Parse a prefix expression (unary or primary).
    fn parse_prefix(&mut self) -> Result<Expr> {
        let span = self.current_span();
        match self.peek_kind() {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_expr_bp(13)?; // unary binds tighter than binary
                Ok(Expr::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                    span,
                })
            }
            TokenKind::Bang => {
                self.advance();
                let operand = self.parse_expr_bp(13)?;
                Ok(Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    span,
                })
            }
            _ => self.parse_primary(),
        }
    }

    /// Parse a primary expression (literals, identifiers, calls, groups).
    fn parse_primary(&mut self) -> Result<Expr> {
        let span = self.current_span();
        match self.peek_kind() {
            TokenKind::IntLit(n) => {
                self.advance();
                Ok(Expr::Int(n, span))
            }
            TokenKind::UintLit(n) => {
                self.advance();
                Ok(Expr::Uint(n, span))
            }
            TokenKind::FloatLit(n) => {
                self.advance();
                Ok(Expr::Float(n, span))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Bool(true, span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Bool(false, span))
            }
            TokenKind::LParen => {
                // Group: unwrap, keeping the inner expression
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(expr)
            }
            TokenKind::TypeName(ty) => {
                // Type name used as a constructor: vec3(...), float(...)
                self.advance();
                self.expect(TokenKind::LParen)?;
                let args = self.parse_arg_list()?;
                self.expect(TokenKind::RParen)?;
                Ok(Expr::Call {
                    callee: ty.to_string(),
                    args,
                    span,
                })
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    self.advance();
                    let args = self.parse_arg_list()?;
                    self.expect(TokenKind::RParen)?;
                    Ok(Expr::Call {
                        callee: name,
                        args,
                        span,
                    })
                } else {
                    Ok(Expr::Ident(name, span))
                }
            }
            _ => Err(self.error_unexpected("an expression")),
        }
    }

    fn parse_arg_list(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.check(&TokenKind::RParen) {
            return Ok(args);
        }
        args.push(self.parse_expr()?);
        while self.check(&TokenKind::Comma) {
            self.advance();
            if self.check(&TokenKind::RParen) {
                break;
            }
            args.push(self.parse_expr()?);
        }
        Ok(args)
    }

    // Token stream helpers

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind.clone()
    }

    fn peek_ahead_kind(&self, offset: usize) -> TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        self.tokens[idx].kind.clone()
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek_kind()) == std::mem::discriminant(kind)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(Error::new(
                ErrorKind::UnexpectedToken {
                    expected: format!("{kind}"),
                    got: format!("{}", self.peek_kind()),
                },
                self.current_span(),
            ))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek_kind() {
            TokenKind::Ident(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(self.error_unexpected("an identifier")),
        }
    }

    fn expect_type(&mut self) -> Result<ShaderType> {
        match self.peek_kind() {
            TokenKind::TypeName(ty) => {
                self.advance();
                Ok(ty)
            }
            _ => Err(self.error_unexpected("a type name")),
        }
    }

    fn error_unexpected(&self, expected: &str) -> Error {
        Error::new(
            ErrorKind::UnexpectedToken {
                expected: expected.to_string(),
                got: format!("{}", self.peek_kind()),
            },
            self.current_span(),
        )
    }
}

// Public convenience functions

/// Parse a TSL source string into an AST Program.
/// Fails with the first parse error found.
pub fn parse(source: &str) -> Result<Program> {
    let (program, errors) = parse_with_recovery(source);
    match errors.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(program),
    }
}

/// Parse a TSL source string, recovering at statement boundaries.
/// Returns the statements that parsed cleanly and every error found.
pub fn parse_with_recovery(source: &str) -> (Program, Vec<Error>) {
    let tokens = lexer::tokenize(source);
    let mut parser = Parser::new(tokens);
    parser.parse_program()
}
