// Token — All lexical tokens of the TSL shading language
//
// Tokens fall into these categories:
//
//   1. Keywords      — fn, var, const, return, if, else
//   2. Type names    — float, int, uint, bool, vec2..vec4, ivec/uvec/bvec,
//                      mat2..mat4, sampler2D, samplerCube
//   3. Operators     — + - * / % == != < <= > >= && || ! =
//   4. Punctuation   — { } ( ) : ; , . ->
//   5. Literals      — integers, unsigned integers, floats, booleans
//   6. Identifiers   — user-defined names
//
// Each token carries a Span (byte offset + length) for error reporting.
// The scanner is total: bytes it cannot classify become Unknown tokens.

use crate::types::{type_lookup, ShaderType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte-level location in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset from the start of the source.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
    /// Line number (1-based).
    pub line: usize,
    /// Column number (1-based, in bytes).
    pub col: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize, line: usize, col: usize) -> Self {
        Self {
            offset,
            len,
            line,
            col,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Every possible token kind in the TSL language.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    Fn,
    Var,
    Const,
    Return,
    If,
    Else,

    // Type names
    TypeName(ShaderType),

    // Literals
    IntLit(i64),
    UintLit(u32),
    FloatLit(f64),
    True,
    False,

    // Operators
    Plus,     // +
    Minus,    // -
    Star,     // *
    Slash,    // /
    Percent,  // %
    EqEq,     // ==
    BangEq,   // !=
    Lt,       // <
    Gt,       // >
    LtEq,     // <=
    GtEq,     // >=
    AmpAmp,   // &&
    PipePipe, // ||
    Bang,     // !
    Eq,       // =

    // Punctuation
    LBrace, // {
    RBrace, // }
    LParen, // (
    RParen, // )
    Colon,  // :
    Semi,   // ;
    Comma,  // ,
    Dot,    // .
    Arrow,  // ->

    // Identifiers
    Ident(String),

    // A byte the scanner could not classify. Non-fatal at lex time; the
    // parser rejects it like any other unexpected token.
    Unknown(char),

    // Special
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Fn => write!(f, "fn"),
            TokenKind::Var => write!(f, "var"),
            TokenKind::Const => write!(f, "const"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::TypeName(ty) => write!(f, "{ty}"),
            TokenKind::IntLit(n) => write!(f, "{n}"),
            TokenKind::UintLit(n) => write!(f, "{n}u"),
            TokenKind::FloatLit(n) => write!(f, "{n}"),
            TokenKind::True => write!(f, "true"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::BangEq => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::AmpAmp => write!(f, "&&"),
            TokenKind::PipePipe => write!(f, "||"),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::Eq => write!(f, "="),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Semi => write!(f, ";"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Arrow => write!(f, "->"),
            TokenKind::Ident(s) => write!(f, "{s}"),
            TokenKind::Unknown(c) => write!(f, "{c}"),
            TokenKind::Eof => write!(f, "<eof>"),
        }
    }
}

/// Look up keyword/type/boolean tokens from an identifier string.
/// Returns None if the string is a plain identifier.
pub fn keyword_lookup(s: &str) -> Option<TokenKind> {
    match s {
        "fn" => Some(TokenKind::Fn),
        "var" => Some(TokenKind::Var),
        "const" => Some(TokenKind::Const),
        "return" => Some(TokenKind::Return),
        "if" => Some(TokenKind::If),
        "else" => Some(TokenKind::Else),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        _ => type_lookup(s).map(TokenKind::TypeName),
    }
}
