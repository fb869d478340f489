// Lexer — Converts TSL source text into a stream of Tokens
//
// The lexer is a hand-written scanner (no regex, no generator). It processes
// the source one byte at a time, producing Token values.
//
// DESIGN DECISIONS:
//
//   1. The scanner is a total function: any input produces a token list
//      ending in exactly one Eof. Bytes that fit no rule become Unknown
//      tokens instead of aborting the scan.
//
//   2. Numbers: a literal with a fractional part, an exponent, or an
//      `f`/`F` suffix is a float; one with only a `u`/`U` suffix is an
//      unsigned int; anything else is a signed int.
//
//   3. Comments: // line comments and /* block comments */ (no nesting).
//      An unterminated block comment runs to end of input.
//
//   4. Identifiers may contain underscores and map to keyword/type tokens
//      via `keyword_lookup`.

use crate::token::{keyword_lookup, Span, Token, TokenKind};

/// Lexer state over a source string.
pub struct Lexer<'src> {
    src: &'src str,
    bytes: &'src [u8],
    pos: usize,
    line: usize,
    col: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    /// Tokenize the entire source, returning a Vec of Tokens.
    /// The last token is always Eof.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let is_eof = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Read the next token.
    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        if self.pos >= self.bytes.len() {
            return Token::new(TokenKind::Eof, self.span(0));
        }

        let start_pos = self.pos;
        let start_line = self.line;
        let start_col = self.col;
        let ch = self.bytes[self.pos] as char;

        // Number literal
        if ch.is_ascii_digit() {
            return self.lex_number(start_pos, start_line, start_col);
        }

        // Identifier or keyword
        if ch.is_ascii_alphabetic() || ch == '_' {
            return self.lex_ident(start_pos, start_line, start_col);
        }

        // Operators & punctuation
        let kind = match ch {
            '{' => {
                self.advance();
                TokenKind::LBrace
            }
            '}' => {
                self.advance();
                TokenKind::RBrace
            }
            '(' => {
                self.advance();
                TokenKind::LParen
            }
            ')' => {
                self.advance();
                TokenKind::RParen
            }
            ':' => {
                self.advance();
                TokenKind::Colon
            }
            ';' => {
                self.advance();
                TokenKind::Semi
            }
            ',' => {
                self.advance();
                TokenKind::Comma
            }
            '.' => {
                self.advance();
                TokenKind::Dot
            }
            '+' => {
                self.advance();
                TokenKind::Plus
            }
            '%' => {
                self.advance();
                TokenKind::Percent
            }
            '*' => {
                self.advance();
                TokenKind::Star
            }
            '/' => {
                self.advance();
                TokenKind::Slash
            }
            '-' => {
                self.advance();
                if self.peek() == Some('>') {
                    self.advance();
                    TokenKind::Arrow
                } else {
                    TokenKind::Minus
                }
            }
            '=' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::BangEq
                } else {
                    TokenKind::Bang
                }
            }
            '<' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::LtEq
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                self.advance();
                if self.peek() == Some('=') {
                    self.advance();
                    TokenKind::GtEq
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                self.advance();
                if self.peek() == Some('&') {
                    self.advance();
                    TokenKind::AmpAmp
                } else {
                    TokenKind::Unknown('&')
                }
            }
            '|' => {
                self.advance();
                if self.peek() == Some('|') {
                    self.advance();
                    TokenKind::PipePipe
                } else {
                    TokenKind::Unknown('|')
                }
            }
            _ => {
                // Step over the whole UTF-8 character so multi-byte input
                // degrades to a single Unknown token.
                let c = self.src[start_pos..].chars().next().unwrap_or('\u{fffd}');
                for _ in 0..c.len_utf8() {
                    self.advance();
                }
                TokenKind::Unknown(c)
            }
        };

        Token::new(
            kind,
            Span::new(start_pos, self.pos - start_pos, start_line, start_col),
        )
    }

    // Helpers

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

    fn peek(&self) -> Option<char> {
        if self.pos < self.bytes.len() {
            Some(self.bytes[self.pos] as char)
        } else {
            None
        }
    }

    fn span(&self, len: usize) -> Span {
        Span::new(self.pos, len, self.line, self.col)
    }

    /// Skip whitespace, single-line comments (//), and block comments (/* */).
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.advance();
            }

            if self.pos + 1 < self.bytes.len()
                && self.bytes[self.pos] == b'/'
                && self.bytes[self.pos + 1] == b'/'
            {
                // Single-line comment: skip to end of line
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.advance();
                }
                continue;
            }

            if self.pos + 1 < self.bytes.len()
                && self.bytes[self.pos] == b'/'
                && self.bytes[self.pos + 1] == b'*'
            {
                // Block comment: skip to */ (or end of input if unterminated)
                self.advance(); // /
                self.advance(); // *
                loop {
                    if self.pos >= self.bytes.len() {
                        break;
                    }
                    if self.bytes[self.pos] == b'*'
                        && self.pos + 1 < self.bytes.len()
                        && self.bytes[self.pos + 1] == b'/'
                    {
                        self.advance(); // *
                        self.advance(); // /
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            break;
        }
    }

    /// Lex a number: int, uint, or float depending on shape and suffix.
    fn lex_number(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
        let num_start = self.pos;
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.advance();
        }

        let mut is_float = false;

        // Fractional part
        if self.pos < self.bytes.len()
            && self.bytes[self.pos] == b'.'
            && self.pos + 1 < self.bytes.len()
            && self.bytes[self.pos + 1].is_ascii_digit()
        {
            is_float = true;
            self.advance(); // skip .
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
                self.advance();
            }
        }

        // Exponent
        if self.pos < self.bytes.len()
            && (self.bytes[self.pos] == b'e' || self.bytes[self.pos] == b'E')
        {
            let mut ahead = self.pos + 1;
            if ahead < self.bytes.len() && (self.bytes[ahead] == b'+' || self.bytes[ahead] == b'-')
            {
                ahead += 1;
            }
            // Only treat e/E as an exponent when digits follow; otherwise it
            // starts the next identifier token.
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

        // Type suffix
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

        let raw = &self.src[num_start..digits_end];
        let span = Span::new(start_pos, self.pos - start_pos, start_line, start_col);

        let kind = if is_float {
            raw.parse::<f64>()
                .map(TokenKind::FloatLit)
                .unwrap_or(TokenKind::Unknown('?'))
        } else if is_uint {
            raw.parse::<u32>()
                .map(TokenKind::UintLit)
                .unwrap_or(TokenKind::Unknown('?'))
        } else {
            raw.parse::<i64>()
                .map(TokenKind::IntLit)
                .unwrap_or(TokenKind::Unknown('?'))
        };
        Token::new(kind, span)
    }

    /// Lex an identifier, keyword, or type name.
    fn lex_ident(&mut self, start_pos: usize, start_line: usize, start_col: usize) -> Token {
        let id_start = self.pos;
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_alphanumeric() || self.bytes[self.pos] == b'_')
        {
            self.advance();
        }
        let word = &self.src[id_start..self.pos];
        let span = Span::new(start_pos, self.pos - start_pos, start_line, start_col);

        let kind = keyword_lookup(word).unwrap_or_else(|| TokenKind::Ident(word.to_string()));
        Token::new(kind, span)
    }
}

/// Tokenize a TSL source string. Always succeeds; the final token is Eof.
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShaderType;

    fn lex(src: &str) -> Vec<TokenKind> {
        tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_ident() {
        let kinds = lex("fn foo var x");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Fn,
                TokenKind::Ident("foo".into()),
                TokenKind::Var,
                TokenKind::Ident("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_type_names() {
        let kinds = lex("float vec3 mat4 sampler2D");
        assert_eq!(
            kinds,
            vec![
                TokenKind::TypeName(ShaderType::Float),
                TokenKind::TypeName(ShaderType::Vec3),
                TokenKind::TypeName(ShaderType::Mat4),
                TokenKind::TypeName(ShaderType::Sampler2D),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numeric_literal_kinds() {
        // 1 → int, 1.0 → float, 1e3 → float, 1u → uint, 1f → float
        let kinds = lex("1 1.0 1e3 1u 1f");
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntLit(1),
                TokenKind::FloatLit(1.0),
                TokenKind::FloatLit(1000.0),
                TokenKind::UintLit(1),
                TokenKind::FloatLit(1.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_float_exponent_sign() {
        let kinds = lex("2.5e-3 1E+2");
        assert_eq!(
            kinds,
            vec![
                TokenKind::FloatLit(2.5e-3),
                TokenKind::FloatLit(100.0),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_uppercase_suffixes() {
        let kinds = lex("3F 7U");
        assert_eq!(
            kinds,
            vec![TokenKind::FloatLit(3.0), TokenKind::UintLit(7), TokenKind::Eof,]
        );
    }

    #[test]
    fn test_operators() {
        let kinds = lex("+ - * / % == != <= >= && || ! = ->");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::EqEq,
                TokenKind::BangEq,
                TokenKind::LtEq,
                TokenKind::GtEq,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
                TokenKind::Bang,
                TokenKind::Eq,
                TokenKind::Arrow,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comment_skipping() {
        let kinds = lex("var // this is a comment\nconst");
        assert_eq!(kinds, vec![TokenKind::Var, TokenKind::Const, TokenKind::Eof,]);
    }

    #[test]
    fn test_block_comment() {
        let kinds = lex("var /* skip this */ const");
        assert_eq!(kinds, vec![TokenKind::Var, TokenKind::Const, TokenKind::Eof,]);
    }

    #[test]
    fn test_unterminated_block_comment_runs_to_eof() {
        let kinds = lex("var /* never closed");
        assert_eq!(kinds, vec![TokenKind::Var, TokenKind::Eof]);
    }

    #[test]
    fn test_unknown_char_degrades() {
        let kinds = lex("var @ x");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Var,
                TokenKind::Unknown('@'),
                TokenKind::Ident("x".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_single_eof() {
        let kinds = lex("");
        assert_eq!(kinds, vec![TokenKind::Eof]);
        let kinds = lex("x + y");
        assert_eq!(kinds.iter().filter(|k| **k == TokenKind::Eof).count(), 1);
        assert_eq!(kinds.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_negative_number_as_minus_int() {
        // -3 is lexed as Minus + IntLit(3), NOT IntLit(-3)
        let kinds = lex("-3");
        assert_eq!(
            kinds,
            vec![TokenKind::Minus, TokenKind::IntLit(3), TokenKind::Eof,]
        );
    }

    #[test]
    fn test_span_tracking() {
        let tokens = tokenize("ab cd");
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[0].span.col, 1);
        assert_eq!(tokens[1].span.line, 1);
        assert_eq!(tokens[1].span.col, 4);
    }

    #[test]
    fn test_multiline_span() {
        let tokens = tokenize("ab\ncd");
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.col, 1);
    }

    #[test]
    fn test_exponent_not_consuming_ident() {
        // `2e` with no digits after is an int followed by an identifier
        let kinds = lex("2e");
        assert_eq!(
            kinds,
            vec![TokenKind::IntLit(2), TokenKind::Ident("e".into()), TokenKind::Eof,]
        );
    }
}
