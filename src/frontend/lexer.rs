//! Lexer for Ember
//!
//! Converts source code into a stream of tokens. Scanning is total: input
//! that cannot be tokenized produces `Error` tokens instead of failing, and
//! the stream always ends with exactly one `Eof` token.

use crate::frontend::token::{Literal, Token, TokenKind};

/// The lexer state
pub struct Lexer {
    /// Source code as chars
    source: Vec<char>,
    /// Start position of the current token
    start: usize,
    /// Current position in source
    pos: usize,
    /// Current 1-based line
    line: u32,
    tokens: Vec<Token>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            start: 0,
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source.
    ///
    /// Never fails; unscannable characters become `Error` tokens and the
    /// result is always terminated by a single `Eof`.
    pub fn tokenize(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.pos;
            self.scan_token();
        }

        log::trace!("scanned {} tokens", self.tokens.len() + 1);
        self.tokens.push(Token::eof(self.line));
        self.tokens
    }

    fn scan_token(&mut self) {
        let c = self.advance();

        match c {
            '(' => self.add_token(TokenKind::LParen),
            ')' => self.add_token(TokenKind::RParen),
            '{' => self.add_token(TokenKind::LBrace),
            '}' => self.add_token(TokenKind::RBrace),
            '[' => self.add_token(TokenKind::LBracket),
            ']' => self.add_token(TokenKind::RBracket),
            ':' => self.add_token(TokenKind::Colon),
            ',' => self.add_token(TokenKind::Comma),
            '@' => self.add_token(TokenKind::At),
            '+' => self.add_token(TokenKind::Plus),
            '*' => self.add_token(TokenKind::Star),
            '/' => self.add_token(TokenKind::Slash),
            '&' => self.add_token(TokenKind::And),
            '|' => self.add_token(TokenKind::Or),
            '^' => self.add_token(TokenKind::Xor),
            '-' => {
                if self.peek() == Some('>') {
                    self.advance();
                    self.add_token(TokenKind::Arrow);
                } else {
                    self.add_token(TokenKind::Minus);
                }
            }
            '=' => {
                if self.peek() == Some('=') {
                    self.advance();
                    self.add_token(TokenKind::EqEq);
                } else {
                    self.add_token(TokenKind::Equals);
                }
            }
            '<' => {
                if self.peek() == Some('<') {
                    self.advance();
                    self.add_token(TokenKind::Shl);
                } else {
                    self.add_token(TokenKind::Less);
                }
            }
            '>' => {
                if self.peek() == Some('>') {
                    self.advance();
                    self.add_token(TokenKind::Shr);
                } else {
                    self.add_token(TokenKind::Greater);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '\'' | '"' => self.read_string(c),
            _ => {
                if c.is_ascii_digit() {
                    self.read_number();
                } else if c.is_alphabetic() || c == '_' {
                    self.read_identifier();
                } else {
                    self.add_token(TokenKind::Error);
                }
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }

    /// Read a number literal (integer or float)
    fn read_number(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        // A '.' only turns the literal into a float when digits follow
        let is_float = self.peek() == Some('.')
            && self.peek_next().map_or(false, |c| c.is_ascii_digit());

        if is_float {
            self.advance(); // consume '.'
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();
        if is_float {
            let value = text.parse().unwrap_or(0.0);
            self.add_literal(TokenKind::Float, Literal::Float(value));
        } else {
            let value = text.parse().unwrap_or(0);
            self.add_literal(TokenKind::Integer, Literal::Int(value));
        }
    }

    /// Read a string literal opened by `quote` (either `'` or `"`)
    fn read_string(&mut self, quote: char) {
        while let Some(c) = self.peek() {
            if c == quote {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            // Unterminated string
            self.add_token(TokenKind::Error);
            return;
        }

        // The closing quote
        self.advance();

        // The decoded value excludes the quotes; the lexeme keeps them
        let value: String = self.source[self.start + 1..self.pos - 1].iter().collect();
        self.add_literal(TokenKind::Str, Literal::Str(value));
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.pos];
        self.pos += 1;
        c
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn add_token(&mut self, kind: TokenKind) {
        let text: String = self.source[self.start..self.pos].iter().collect();
        self.tokens.push(Token::new(kind, text, None, self.line));
    }

    fn add_literal(&mut self, kind: TokenKind, literal: Literal) {
        let text: String = self.source[self.start..self.pos].iter().collect();
        self.tokens
            .push(Token::new(kind, text, Some(literal), self.line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize()
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        scan(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_empty_source() {
        let tokens = scan("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn test_basic_tokens() {
        let tokens = scan("def main() -> int:");

        let expected = [
            (TokenKind::Def, "def"),
            (TokenKind::Identifier, "main"),
            (TokenKind::LParen, "("),
            (TokenKind::RParen, ")"),
            (TokenKind::Arrow, "->"),
            (TokenKind::Identifier, "int"),
            (TokenKind::Colon, ":"),
            (TokenKind::Eof, ""),
        ];

        assert_eq!(tokens.len(), expected.len());
        for (actual, (kind, lexeme)) in tokens.iter().zip(expected) {
            assert_eq!(actual.kind, kind);
            assert_eq!(actual.lexeme, lexeme);
        }
    }

    #[test]
    fn test_multiple_assignment() {
        let tokens = scan("x, y = 1, 2");

        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Identifier,
                TokenKind::Comma,
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::Integer,
                TokenKind::Comma,
                TokenKind::Integer,
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[4].literal, Some(Literal::Int(1)));
        assert_eq!(tokens[6].literal, Some(Literal::Int(2)));
    }

    #[test]
    fn test_string_literal_keeps_quotes_in_lexeme() {
        let tokens = scan("name: str = 'Alice'");

        assert_eq!(tokens[4].kind, TokenKind::Str);
        assert_eq!(tokens[4].lexeme, "'Alice'");
        assert_eq!(tokens[4].literal, Some(Literal::Str("Alice".to_string())));
    }

    #[test]
    fn test_float_literal() {
        let tokens = scan("3.25");
        assert_eq!(tokens[0].kind, TokenKind::Float);
        assert_eq!(tokens[0].literal, Some(Literal::Float(3.25)));

        // '.' without following digits stays an error, not a float
        let tokens = scan("3.");
        assert_eq!(tokens[0].kind, TokenKind::Integer);
        assert_eq!(tokens[1].kind, TokenKind::Error);
    }

    #[test]
    fn test_generic_types() {
        assert_eq!(
            kinds("def first<T>(items: List[T]) -> T:"),
            vec![
                TokenKind::Def,
                TokenKind::Identifier,
                TokenKind::Less,
                TokenKind::Identifier,
                TokenKind::Greater,
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Identifier,
                TokenKind::LBracket,
                TokenKind::Identifier,
                TokenKind::RBracket,
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_bitwise_operators() {
        assert_eq!(
            kinds("x = a & b | c ^ d << 2 >> 1"),
            vec![
                TokenKind::Identifier,
                TokenKind::Equals,
                TokenKind::Identifier,
                TokenKind::And,
                TokenKind::Identifier,
                TokenKind::Or,
                TokenKind::Identifier,
                TokenKind::Xor,
                TokenKind::Identifier,
                TokenKind::Shl,
                TokenKind::Integer,
                TokenKind::Shr,
                TokenKind::Integer,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_boolean_keyword_operators() {
        assert_eq!(
            kinds("if a and b or not c:"),
            vec![
                TokenKind::If,
                TokenKind::Identifier,
                TokenKind::And,
                TokenKind::Identifier,
                TokenKind::Or,
                TokenKind::Not,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_decorator_line_numbers() {
        let tokens = scan("@parallel\ndef process_data():");

        assert_eq!(tokens[0].kind, TokenKind::At);
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].lexeme, "parallel");
        assert_eq!(tokens[2].kind, TokenKind::Def);
        assert_eq!(tokens[2].line, 2);
    }

    #[test]
    fn test_newline_inside_string_counts_lines() {
        let tokens = scan("\"a\nb\"\nx");

        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].literal, Some(Literal::Str("a\nb".to_string())));
        // one newline inside the string, one after it
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = scan("'abc");

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Error);
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn test_unknown_character_does_not_stop_scanning() {
        let tokens = scan("a $ b");

        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].kind, TokenKind::Error);
        assert_eq!(tokens[1].lexeme, "$");
        assert_eq!(tokens[2].kind, TokenKind::Identifier);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_single_trailing_eof() {
        let tokens = scan("def f(): return 1");
        let eofs = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Eof)
            .count();
        assert_eq!(eofs, 1);
        assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn test_operator_lexeme_round_trip() {
        // Whitespace-free operator/delimiter soup reassembles to the input
        let source = "(){}[]:,@+-*/=->&|^<<>><>==";
        let joined: String = scan(source)
            .iter()
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(joined, source);
    }

    #[test]
    fn test_pattern_match_keywords() {
        assert_eq!(
            kinds("match command:\n    case \"help\":"),
            vec![
                TokenKind::Match,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Case,
                TokenKind::Str,
                TokenKind::Colon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_actor_keywords() {
        assert_eq!(
            kinds("actor WebServer:\n    state:\n    async def handle(self):"),
            vec![
                TokenKind::Actor,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::State,
                TokenKind::Colon,
                TokenKind::Async,
                TokenKind::Def,
                TokenKind::Identifier,
                TokenKind::LParen,
                TokenKind::Identifier,
                TokenKind::RParen,
                TokenKind::Colon,
                TokenKind::Eof,
            ]
        );
    }
}
