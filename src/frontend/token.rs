//! Token definitions for Ember

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text of the token, exactly as written
    pub lexeme: String,
    /// Decoded value for literal tokens
    pub literal: Option<Literal>,
    /// 1-based source line
    pub line: u32,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        lexeme: impl Into<String>,
        literal: Option<Literal>,
        line: u32,
    ) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            literal,
            line,
        }
    }

    pub fn eof(line: u32) -> Self {
        Self::new(TokenKind::Eof, "", None, line)
    }

    /// Sentinel token used when a diagnostic has no better anchor
    pub fn sentinel() -> Self {
        Self::new(TokenKind::Error, "", None, 0)
    }

    /// The lexeme, or "end of file" for the Eof token
    pub fn describe(&self) -> String {
        if self.kind == TokenKind::Eof {
            "end of file".to_string()
        } else {
            self.lexeme.clone()
        }
    }
}

/// Decoded literal payload of a token
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Token kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // ============ Keywords ============
    /// def
    Def,
    /// if
    If,
    /// else
    Else,
    /// return
    Return,
    /// match
    Match,
    /// case
    Case,
    /// async
    Async,
    /// await
    Await,
    /// actor
    Actor,
    /// state
    State,
    /// with
    With,
    /// for
    For,
    /// while
    While,
    /// class
    Class,
    /// as
    As,
    /// in
    In,

    // ============ Literals ============
    /// Identifier (variable name, function name, type name)
    Identifier,
    /// Integer literal
    Integer,
    /// Floating-point literal
    Float,
    /// String literal (single- or double-quoted)
    Str,

    // ============ Operators ============
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// =
    Equals,
    /// ->
    Arrow,
    /// & or `and`
    And,
    /// | or `or`
    Or,
    /// ^
    Xor,
    /// not
    Not,
    /// <<
    Shl,
    /// >>
    Shr,
    /// <
    Less,
    /// >
    Greater,
    /// ==
    EqEq,

    // ============ Delimiters ============
    /// (
    LParen,
    /// )
    RParen,
    /// {
    LBrace,
    /// }
    RBrace,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// :
    Colon,
    /// ,
    Comma,
    /// @
    At,

    // ============ Special ============
    /// End of input
    Eof,
    /// Unscannable input (unknown character, unterminated string)
    Error,
}

impl TokenKind {
    /// Try to convert an identifier to a keyword.
    ///
    /// `and`, `or` and `not` spell the same operations as `&`, `|` and
    /// prefix `not`, so they map onto the operator kinds.
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s {
            "def" => Some(TokenKind::Def),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "return" => Some(TokenKind::Return),
            "match" => Some(TokenKind::Match),
            "case" => Some(TokenKind::Case),
            "async" => Some(TokenKind::Async),
            "await" => Some(TokenKind::Await),
            "actor" => Some(TokenKind::Actor),
            "state" => Some(TokenKind::State),
            "with" => Some(TokenKind::With),
            "for" => Some(TokenKind::For),
            "while" => Some(TokenKind::While),
            "class" => Some(TokenKind::Class),
            "as" => Some(TokenKind::As),
            "in" => Some(TokenKind::In),
            "and" => Some(TokenKind::And),
            "or" => Some(TokenKind::Or),
            "not" => Some(TokenKind::Not),
            _ => None,
        }
    }

    /// Check if this token can begin a new declaration.
    ///
    /// A flat statement run (function body, `with` body, loop body) ends
    /// where one of these begins.
    pub fn starts_declaration(&self) -> bool {
        matches!(
            self,
            TokenKind::Def | TokenKind::Async | TokenKind::At | TokenKind::Actor
        )
    }
}
