use std::fmt;

use rust_decimal::Decimal;

/// A lexical token together with its raw spelling and position.
///
/// `text` is exactly what appeared in the source, so error messages can echo
/// the user's own casing even though keyword and symbol matching is
/// case-insensitive.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Character offset of the first character of the token.
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            offset,
        }
    }

    pub fn is(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.kind) == std::mem::discriminant(kind)
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of expression"),
            _ => write!(f, "'{}'", self.text),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Numeric literal; the subtype is settled by the lexer from the
    /// magnitude and suffix.
    ///
    /// # Examples
    /// ```text
    /// 42      // Int32
    /// 42L     // Int64
    /// 1.5f    // Single
    /// 1.5m    // Decimal
    /// ```
    Number(NumberLiteral),

    /// String literal
    ///
    /// # Examples
    /// ```text
    /// "hello"
    /// 'two chars'
    /// ```
    String(String),

    /// Single-quoted literal holding exactly one character
    Char(char),

    /// Name that is not a keyword: a type, a member or a lambda parameter.
    /// The raw spelling is kept; lookups fold it.
    Identifier(String),

    /// Reserved word, matched without regard to case
    Keyword(Keyword),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AmpAmp,
    PipePipe,
    Question,
    QuestionQuestion,
    Colon,
    /// Lambda arrow (`=>`)
    Arrow,

    // Delimiters
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    /// End of input
    Eof,
}

/// Reserved words of the expression language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// The implicit parameter
    It,
    Null,
    True,
    False,
    New,
    As,
    And,
    Or,
    Not,
    Mod,
    /// Null propagation, `np(a.b.c)`
    Np,
    /// Inline conditional, `iif(cond, a, b)`
    Iif,
}

impl Keyword {
    /// Resolves an identifier spelling to a keyword, ignoring case.
    pub fn from_ident(ident: &str) -> Option<Self> {
        let keyword = match ident.to_lowercase().as_str() {
            "it" => Keyword::It,
            "null" => Keyword::Null,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "new" => Keyword::New,
            "as" => Keyword::As,
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "not" => Keyword::Not,
            "mod" => Keyword::Mod,
            "np" => Keyword::Np,
            "iif" => Keyword::Iif,
            _ => return None,
        };
        Some(keyword)
    }
}

/// A numeric literal after suffix and range resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberLiteral {
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Single(f32),
    Double(f64),
    Decimal(Decimal),
}
