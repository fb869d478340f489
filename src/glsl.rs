// GLSL scanner — Tokenizes existing GLSL shader source
//
// This is a standalone leaf used to analyze and validate externally
// supplied shader fragments (code templates, backend-provided chunks).
// It shares nothing with the TSL lexer besides its manner: a hand-written
// byte scanner with line/column tracking.
//
// The scanner is total: it never fails. Unclassifiable bytes become
// Unknown tokens, and the token list always ends in exactly one Eof.
//
// Preprocessor lines (`#version`, `#define`, ...) are captured as one
// token spanning to the end of the line, since the compiler treats them
// as opaque.

use std::fmt;

/// Coarse classification of a GLSL token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlslTokenKind {
    Keyword,
    TypeName,
    Identifier,
    Int,
    Uint,
    Float,
    Bool,
    Operator,
    Preprocessor,
    Unknown,
    Eof,
}

/// The semantic value of a literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum GlslLiteral {
    Int(i64),
    Uint(u32),
    Float(f64),
    Bool(bool),
}

/// A single GLSL token.
#[derive(Debug, Clone, PartialEq)]
pub struct GlslToken {
    pub kind: GlslTokenKind,
    pub lexeme: String,
    pub literal: Option<GlslLiteral>,
    /// Line number (1-based).
    pub line: usize,
    /// Column number (1-based, in bytes).
    pub column: usize,
}

impl fmt::Display for GlslToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lexeme)
    }
}

/// Exact-match table for GLSL keywords.
fn is_glsl_keyword(s: &str) -> bool {
    matches!(
        s,
        "attribute"
            | "uniform"
            | "varying"
            | "buffer"
            | "shared"
            | "in"
            | "out"
            | "inout"
            | "const"
            | "if"
            | "else"
            | "for"
            | "while"
            | "do"
            | "switch"
            | "case"
            | "default"
            | "return"
            | "break"
            | "continue"
            | "discard"
            | "struct"
            | "layout"
            | "precision"
            | "highp"
            | "mediump"
            | "lowp"
            | "invariant"
            | "flat"
            | "smooth"
            | "centroid"
    )
}

/// Exact-match table for GLSL type names.
fn is_glsl_type(s: &str) -> bool {
    matches!(
        s,
        "void"
            | "bool"
            | "int"
            | "uint"
            | "float"
            | "double"
            | "vec2"
            | "vec3"
            | "vec4"
            | "ivec2"
            | "ivec3"
            | "ivec4"
            | "uvec2"
            | "uvec3"
            | "uvec4"
            | "bvec2"
            | "bvec3"
            | "bvec4"
            | "mat2"
            | "mat3"
            | "mat4"
            | "sampler2D"
            | "sampler3D"
            | "samplerCube"
            | "sampler2DShadow"
            | "sampler2DArray"
            | "isampler2D"
            | "usampler2D"
            | "image2D"
            | "atomic_uint"
    )
}

/// Scanner state over a GLSL source string.
pub struct GlslScanner<'src> {
    src: &'src str,
    bytes: &'src [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'src> GlslScanner<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Scan the entire source. The last token is always Eof.
    pub fn tokenize(&mut self) -> Vec<GlslToken> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.kind == GlslTokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn next_token(&mut self) -> GlslToken {
        self.skip_whitespace_and_comments();

        let start_line = self.line;
        let start_col = self.col;

        if self.pos >= self.bytes.len() {
            return self.token(GlslTokenKind::Eof, String::new(), None, start_line, start_col);
        }

        let start_pos = self.pos;
        let ch = self.bytes[self.pos] as char;

        // Preprocessor line: capture `#...` to end of line as one token
        if ch == '#' {
            while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                self.advance();
            }
            let lexeme = self.src[start_pos..self.pos].trim_end().to_string();
            return self.token(GlslTokenKind::Preprocessor, lexeme, None, start_line, start_col);
        }

        // Number literal
        if ch.is_ascii_digit()
            || (ch == '.'
                && self.pos + 1 < self.bytes.len()
                && self.bytes[self.pos + 1].is_ascii_digit())
        {
            return self.lex_number(start_pos, start_line, start_col);
        }

        // Identifier, keyword, or type name
        if ch.is_ascii_alphabetic() || ch == '_' {
            while self.pos < self.bytes.len()
                && (self.bytes[self.pos].is_ascii_alphanumeric() || self.bytes[self.pos] == b'_')
            {
                self.advance();
            }
            let word = &self.src[start_pos..self.pos];
            let (kind, literal) = if word == "true" || word == "false" {
                (GlslTokenKind::Bool, Some(GlslLiteral::Bool(word == "true")))
            } else if is_glsl_type(word) {
                (GlslTokenKind::TypeName, None)
            } else if is_glsl_keyword(word) {
                (GlslTokenKind::Keyword, None)
            } else {
                (GlslTokenKind::Identifier, None)
            };
            return self.token(kind, word.to_string(), literal, start_line, start_col);
        }

        // Operators and punctuation, longest match first
        let two = if self.pos + 1 < self.bytes.len()
            && self.bytes[self.pos].is_ascii()
            && self.bytes[self.pos + 1].is_ascii()
        {
            &self.src[self.pos..self.pos + 2]
        } else {
            ""
        };
        let op_len = match two {
            "==" | "!=" | "<=" | ">=" | "&&" | "||" | "^^" | "+=" | "-=" | "*=" | "/=" | "++"
            | "--" | "<<" | ">>" => 2,
            _ => match ch {
                '+' | '-' | '*' | '/' | '%' | '<' | '>' | '=' | '!' | '&' | '|' | '^' | '~'
                | '?' | ':' | ';' | ',' | '.' | '(' | ')' | '[' | ']' | '{' | '}' => 1,
                _ => 0,
            },
        };

        if op_len > 0 {
            for _ in 0..op_len {
                self.advance();
            }
            let lexeme = self.src[start_pos..self.pos].to_string();
            return self.token(GlslTokenKind::Operator, lexeme, None, start_line, start_col);
        }

        // Anything else degrades to Unknown. Step over the whole UTF-8
        // character so the next slice stays on a char boundary.
        let width = self.src[start_pos..]
            .chars()
            .next()
            .map_or(1, char::len_utf8);
        for _ in 0..width {
            self.advance();
        }
        let lexeme = self.src[start_pos..self.pos].to_string();
        self.token(GlslTokenKind::Unknown, lexeme, None, start_line, start_col)
    }

    fn token(
        &self,
        kind: GlslTokenKind,
        lexeme: String,
        literal: Option<GlslLiteral>,
        line: usize,
        column: usize,
    ) -> GlslToken {
        GlslToken {
            kind,
            lexeme,
            literal,
            line,
            column,
        }
    }

    fn advance(&mut self) {
        if self.pos < self.bytes.len() {
            if self.bytes[self.pos] == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.advance();
            }

            if self.pos + 1 < self.bytes.len()
                && self.bytes[self.pos] == b'/'
                && self.bytes[self.pos + 1] == b'/'
            {
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.advance();
                }
                continue;
            }

            if self.pos + 1 < self.bytes.len()
                && self.bytes[self.pos] == b'/'
                && self.bytes[self.pos + 1] == b'*'
            {
                self.advance();
                self.advance();
                loop {
                    if self.pos >= self.bytes.len() {
                        break;
                    }
                    if self.bytes[self.pos] == b'*'
                        && self.pos + 1 < self.bytes.len()
                        && self.bytes[self.pos + 1] == b'/'
                    {
                        self.advance();
                        self.advance();
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            break;
        }
    }

    /// Lex a number. Fractional part, exponent, or `f`/`F` suffix makes a
    /// float; a bare `u`/`U` suffix makes an unsigned int.
    fn lex_number(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> GlslToken {
        let mut is_float = false;

        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.advance();
        }

        if self.pos < self.bytes.len() && self.bytes[self.pos] == b'.' {
            is_float = true;
            self.advance();
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
                self.advance();
            }
        }

        if self.pos < self.bytes.len()
            && (self.bytes[self.pos] == b'e' || self.bytes[self.pos] == b'E')
        {
            let mut ahead = self.pos + 1;
            if ahead < self.bytes.len() && (self.bytes[ahead] == b'+' || self.bytes[ahead] == b'-')
            {
                ahead += 1;
            }
            if ahead < self.bytes.len() && self.bytes[ahead].is_ascii_digit() {
                is_float = true;
                while self.pos < ahead {
                    self.advance();
                }
                while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
                    self.advance();
                }
            }
        }

        let digits_end = self.pos;
        let mut is_uint = false;
        if self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b'f' | b'F' => {
                    is_float = true;
                    self.advance();
                }
                b'u' | b'U' => {
                    if !is_float {
                        is_uint = true;
                    }
                    self.advance();
                }
                _ => {}
            }
        }

        let digits = &self.src[start_pos..digits_end];
        let lexeme = self.src[start_pos..self.pos].to_string();

        let (kind, literal) = if is_float {
            match digits.parse::<f64>() {
                Ok(v) => (GlslTokenKind::Float, Some(GlslLiteral::Float(v))),
                Err(_) => (GlslTokenKind::Unknown, None),
            }
        } else if is_uint {
            match digits.parse::<u32>() {
                Ok(v) => (GlslTokenKind::Uint, Some(GlslLiteral::Uint(v))),
                Err(_) => (GlslTokenKind::Unknown, None),
            }
        } else {
            match digits.parse::<i64>() {
                Ok(v) => (GlslTokenKind::Int, Some(GlslLiteral::Int(v))),
                Err(_) => (GlslTokenKind::Unknown, None),
            }
        };

        self.token(kind, lexeme, literal, start_line, start_col)
    }
}

/// Tokenize a GLSL source string. Always succeeds; the final token is Eof.
pub fn tokenize(source: &str) -> Vec<GlslToken> {
    GlslScanner::new(source).tokenize()
}
