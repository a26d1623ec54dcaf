// tests/lexer_tests.rs

use quill_expr::ast::{Keyword, NumberLiteral, TokenKind};
use quill_expr::lexer::{LexError, Lexer};
use rust_decimal::Decimal;

fn kinds(input: &str) -> Vec<TokenKind> {
    Lexer::new(input)
        .tokenize()
        .unwrap()
        .into_iter()
        .map(|token| token.kind)
        .collect()
}

// ============================================================================
// Operators and Delimiters
// ============================================================================

#[test]
fn test_single_char_tokens() {
    let test_cases = vec![
        ("+", TokenKind::Plus),
        ("-", TokenKind::Minus),
        ("*", TokenKind::Star),
        ("/", TokenKind::Slash),
        ("%", TokenKind::Percent),
        ("!", TokenKind::Bang),
        ("<", TokenKind::Lt),
        (">", TokenKind::Gt),
        ("?", TokenKind::Question),
        (":", TokenKind::Colon),
        (".", TokenKind::Dot),
        (",", TokenKind::Comma),
        ("(", TokenKind::LParen),
        (")", TokenKind::RParen),
        ("[", TokenKind::LBracket),
        ("]", TokenKind::RBracket),
        ("{", TokenKind::LBrace),
        ("}", TokenKind::RBrace),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        assert_eq!(lexer.next_token().unwrap().kind, expected, "Failed for input: {}", input);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }
}

#[test]
fn test_two_char_tokens() {
    let test_cases = vec![
        ("==", TokenKind::EqEq),
        ("!=", TokenKind::NotEq),
        ("<>", TokenKind::NotEq),
        ("<=", TokenKind::LtEq),
        (">=", TokenKind::GtEq),
        ("&&", TokenKind::AmpAmp),
        ("||", TokenKind::PipePipe),
        ("??", TokenKind::QuestionQuestion),
        ("=>", TokenKind::Arrow),
    ];

    for (input, expected) in test_cases {
        let mut lexer = Lexer::new(input);
        let token = lexer.next_token().unwrap();
        assert_eq!(token.kind, expected, "Failed for input: {}", input);
        assert_eq!(token.text, input);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }
}

#[test]
fn test_single_equals_is_equality() {
    assert_eq!(kinds("="), vec![TokenKind::EqEq, TokenKind::Eof]);
}

#[test]
fn test_two_char_vs_single_char() {
    assert_eq!(
        kinds("< =="),
        vec![TokenKind::Lt, TokenKind::EqEq, TokenKind::Eof]
    );
    assert_eq!(
        kinds("? ?"),
        vec![TokenKind::Question, TokenKind::Question, TokenKind::Eof]
    );
}

#[test]
fn test_lone_ampersand_is_rejected() {
    let err = Lexer::new("a & b").tokenize().unwrap_err();
    assert_eq!(err, LexError::UnexpectedCharacter { ch: '&', offset: 2 });
}

// ============================================================================
// Keywords and Identifiers
// ============================================================================

#[test]
fn test_keywords_any_case() {
    let test_cases = vec![
        ("it", Keyword::It),
        ("IT", Keyword::It),
        ("Null", Keyword::Null),
        ("TRUE", Keyword::True),
        ("fAlSe", Keyword::False),
        ("NEW", Keyword::New),
        ("As", Keyword::As),
        ("and", Keyword::And),
        ("OR", Keyword::Or),
        ("Not", Keyword::Not),
        ("MOD", Keyword::Mod),
        ("NP", Keyword::Np),
        ("Iif", Keyword::Iif),
    ];

    for (input, expected) in test_cases {
        let token = Lexer::new(input).next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Keyword(expected), "Failed for input: {}", input);
        assert_eq!(token.text, input, "spelling must be kept");
    }
}

#[test]
fn test_identifiers_keep_spelling() {
    assert_eq!(
        kinds("Math.PI _x item2"),
        vec![
            TokenKind::Identifier("Math".into()),
            TokenKind::Dot,
            TokenKind::Identifier("PI".into()),
            TokenKind::Identifier("_x".into()),
            TokenKind::Identifier("item2".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    assert_eq!(
        kinds("items newer"),
        vec![
            TokenKind::Identifier("items".into()),
            TokenKind::Identifier("newer".into()),
            TokenKind::Eof,
        ]
    );
}

// ============================================================================
// Numeric Literals
// ============================================================================

#[test]
fn test_integer_literal_subtypes() {
    let test_cases = vec![
        ("0", NumberLiteral::Int32(0)),
        ("2147483647", NumberLiteral::Int32(i32::MAX)),
        ("2147483648", NumberLiteral::UInt32(2_147_483_648)),
        ("4294967296", NumberLiteral::Int64(4_294_967_296)),
        ("9223372036854775808", NumberLiteral::UInt64(9_223_372_036_854_775_808)),
        ("7L", NumberLiteral::Int64(7)),
        ("7l", NumberLiteral::Int64(7)),
        ("7U", NumberLiteral::UInt32(7)),
        ("7UL", NumberLiteral::UInt64(7)),
        ("7lu", NumberLiteral::UInt64(7)),
        ("0x10", NumberLiteral::Int32(16)),
        ("0xFFFFFFFF", NumberLiteral::UInt32(u32::MAX)),
    ];

    for (input, expected) in test_cases {
        let token = Lexer::new(input).next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Number(expected), "Failed for input: {}", input);
    }
}

#[test]
fn test_real_literal_subtypes() {
    let test_cases = vec![
        ("1.5", NumberLiteral::Double(1.5)),
        ("1.5d", NumberLiteral::Double(1.5)),
        ("1.5F", NumberLiteral::Single(1.5)),
        ("2f", NumberLiteral::Single(2.0)),
        ("1e3", NumberLiteral::Double(1000.0)),
        ("2.5E-1", NumberLiteral::Double(0.25)),
        ("1.25m", NumberLiteral::Decimal(Decimal::new(125, 2))),
        ("3M", NumberLiteral::Decimal(Decimal::from(3))),
    ];

    for (input, expected) in test_cases {
        let token = Lexer::new(input).next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Number(expected), "Failed for input: {}", input);
    }
}

#[test]
fn test_member_access_on_integer() {
    // `1.ToString()` is a number followed by member access, not a real
    assert_eq!(
        kinds("1.ToString"),
        vec![
            TokenKind::Number(NumberLiteral::Int32(1)),
            TokenKind::Dot,
            TokenKind::Identifier("ToString".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_invalid_numbers() {
    let test_cases = vec!["18446744073709551616", "1.5L", "42x", "1.5q"];

    for input in test_cases {
        let err = Lexer::new(input).next_token().unwrap_err();
        assert!(
            matches!(err, LexError::InvalidNumber { offset: 0, .. }),
            "Failed for input: {}: {:?}",
            input,
            err
        );
    }
}

// ============================================================================
// String and Char Literals
// ============================================================================

#[test]
fn test_string_literals() {
    let test_cases = vec![
        (r#""hello""#, "hello"),
        (r#""""#, ""),
        (r#""a\nb""#, "a\nb"),
        (r#""tab\there""#, "tab\there"),
        (r#""quote\"d""#, "quote\"d"),
        (r#""back\\slash""#, "back\\slash"),
        (r#""A""#, "A"),
        ("'two'", "two"),
        ("''", ""),
    ];

    for (input, expected) in test_cases {
        let token = Lexer::new(input).next_token().unwrap();
        assert_eq!(token.kind, TokenKind::String(expected.into()), "Failed for input: {}", input);
        assert_eq!(token.text, input);
    }
}

#[test]
fn test_char_literals() {
    let test_cases = vec![("'a'", 'a'), (r"'\n'", '\n'), (r"'\''", '\''), ("'é'", 'é')];

    for (input, expected) in test_cases {
        let token = Lexer::new(input).next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Char(expected), "Failed for input: {}", input);
    }
}

#[test]
fn test_string_case_is_preserved() {
    let token = Lexer::new("\"MiXeD\"").next_token().unwrap();
    assert_eq!(token.kind, TokenKind::String("MiXeD".into()));
}

#[test]
fn test_unterminated_string() {
    let err = Lexer::new("it + \"open").tokenize().unwrap_err();
    assert_eq!(err, LexError::UnterminatedString { offset: 5 });
    assert_eq!(err.offset(), 5);
}

#[test]
fn test_invalid_escape() {
    let err = Lexer::new(r#""\q""#).tokenize().unwrap_err();
    assert_eq!(err, LexError::InvalidEscape { ch: 'q', offset: 1 });
}

// ============================================================================
// Whole Expressions
// ============================================================================

#[test]
fn test_offsets_count_characters() {
    let tokens = Lexer::new("  it *  2").tokenize().unwrap();
    let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
    assert_eq!(offsets, vec![2, 5, 8, 9]);
}

#[test]
fn test_lambda_expression() {
    assert_eq!(
        kinds("new[] { it }.Select(x => x * 2)"),
        vec![
            TokenKind::Keyword(Keyword::New),
            TokenKind::LBracket,
            TokenKind::RBracket,
            TokenKind::LBrace,
            TokenKind::Keyword(Keyword::It),
            TokenKind::RBrace,
            TokenKind::Dot,
            TokenKind::Identifier("Select".into()),
            TokenKind::LParen,
            TokenKind::Identifier("x".into()),
            TokenKind::Arrow,
            TokenKind::Identifier("x".into()),
            TokenKind::Star,
            TokenKind::Number(NumberLiteral::Int32(2)),
            TokenKind::RParen,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_empty_input_is_eof() {
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
    assert_eq!(kinds("   \t\n"), vec![TokenKind::Eof]);
}
