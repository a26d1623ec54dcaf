use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, Ident, Keyword, Literal, Token, TokenKind, UnaryOp},
    lexer::{LexError, Lexer},
};

/// Errors raised when the token stream does not match the grammar.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyntaxError {
    #[error("expression is empty")]
    EmptyExpression,

    #[error("unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        offset: usize,
    },

    #[error("anonymous object member at offset {offset} must be followed by 'as <name>'")]
    MissingAlias { offset: usize },

    #[error("'{function}' takes {expected} argument(s) but {found} were given at offset {offset}")]
    WrongArgumentCount {
        function: &'static str,
        expected: usize,
        found: usize,
        offset: usize,
    },

    #[error("expression nests deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },
}

/// Deepest nesting of sub-expressions, prefix operators and conditional
/// tails the parser accepts.
pub const MAX_NESTING: usize = 128;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    /// Lexes the whole input up front; lexical errors surface here rather
    /// than halfway through parsing.
    pub fn new(mut lexer: Lexer) -> Result<Self, LexError> {
        let tokens = lexer.tokenize()?;
        Ok(Parser::from_tokens(tokens))
    }

    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let offset = tokens.last().map_or(0, |t| t.offset + t.text.chars().count());
            tokens.push(Token::new(TokenKind::Eof, "", offset));
        }
        Parser {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    fn current(&self) -> &Token {
        self.peek(0)
    }

    fn peek(&self, offset: usize) -> &Token {
        let index = (self.position + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.current().is(kind)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current().is_keyword(keyword)
    }

    fn unexpected(&self, expected: &'static str) -> SyntaxError {
        let token = self.current();
        SyntaxError::UnexpectedToken {
            found: token.to_string(),
            expected,
            offset: token.offset,
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, SyntaxError> {
        if !self.check(&kind) {
            return Err(self.unexpected(expected));
        }
        Ok(self.advance())
    }

    fn expect_identifier(&mut self, expected: &'static str) -> Result<Ident, SyntaxError> {
        match &self.current().kind {
            TokenKind::Identifier(name) => {
                let ident = Ident::new(name.clone(), self.current().offset);
                self.advance();
                Ok(ident)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    /// Parses a complete expression; the whole input must be consumed.
    pub fn parse(&mut self) -> Result<Expr, SyntaxError> {
        if self.check(&TokenKind::Eof) {
            return Err(SyntaxError::EmptyExpression);
        }
        let expr = self.parse_expression()?;
        self.expect(TokenKind::Eof, "end of expression")?;
        Ok(expr)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        self.nested(Self::parse_conditional)
    }

    fn nested(
        &mut self,
        parse: fn(&mut Self) -> Result<Expr, SyntaxError>,
    ) -> Result<Expr, SyntaxError> {
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::TooDeep {
                limit: MAX_NESTING,
                offset: self.current().offset,
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn parse_conditional(&mut self) -> Result<Expr, SyntaxError> {
        let condition = self.parse_coalesce()?;

        if !self.check(&TokenKind::Question) {
            return Ok(condition);
        }
        let offset = self.advance().offset;
        let when_true = self.parse_expression()?;
        self.expect(TokenKind::Colon, "':'")?;
        // Right-associative: `a ? b : c ? d : e` groups the tail
        let when_false = self.nested(Self::parse_conditional)?;

        Ok(Expr::Conditional {
            condition: Box::new(condition),
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
            offset,
        })
    }

    fn parse_coalesce(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.parse_or()?;

        if !self.check(&TokenKind::QuestionQuestion) {
            return Ok(left);
        }
        let offset = self.advance().offset;
        let right = self.parse_coalesce()?;

        Ok(Expr::BinaryOp {
            op: BinOp::NullCoalesce,
            left: Box::new(left),
            right: Box::new(right),
            offset,
        })
    }

    fn parse_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_and()?;

        while self.check(&TokenKind::PipePipe) || self.check_keyword(Keyword::Or) {
            let offset = self.advance().offset;
            let right = self.parse_and()?;

            left = Expr::BinaryOp {
                op: BinOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                offset,
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_equality()?;

        while self.check(&TokenKind::AmpAmp) || self.check_keyword(Keyword::And) {
            let offset = self.advance().offset;
            let right = self.parse_equality()?;

            left = Expr::BinaryOp {
                op: BinOp::And,
                left: Box::new(left),
                right: Box::new(right),
                offset,
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match &self.current().kind {
                TokenKind::EqEq => BinOp::Equal,
                TokenKind::NotEq => BinOp::NotEqual,
                _ => break,
            };
            let offset = self.advance().offset;
            let right = self.parse_relational()?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                offset,
            };
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match &self.current().kind {
                TokenKind::Lt => BinOp::LessThan,
                TokenKind::Gt => BinOp::GreaterThan,
                TokenKind::LtEq => BinOp::LessEqual,
                TokenKind::GtEq => BinOp::GreaterEqual,
                _ => break,
            };
            let offset = self.advance().offset;
            let right = self.parse_additive()?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                offset,
            };
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Subtract,
                _ => break,
            };
            let offset = self.advance().offset;
            let right = self.parse_multiplicative()?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                offset,
            };
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current().kind {
                TokenKind::Star => BinOp::Multiply,
                TokenKind::Slash => BinOp::Divide,
                TokenKind::Percent | TokenKind::Keyword(Keyword::Mod) => BinOp::Modulo,
                _ => break,
            };
            let offset = self.advance().offset;
            let right = self.parse_unary()?;

            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
                offset,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match &self.current().kind {
            TokenKind::Bang | TokenKind::Keyword(Keyword::Not) => UnaryOp::Not,
            TokenKind::Minus => UnaryOp::Negate,
            TokenKind::Plus => UnaryOp::Plus,
            _ => return self.parse_postfix(),
        };
        let offset = self.advance().offset;
        let operand = self.nested(Self::parse_unary)?;

        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            offset,
        })
    }

    /// Member access, calls and indexers chain left to right.
    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;

        loop {
            match &self.current().kind {
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect_identifier("member name after '.'")?;
                    expr = Expr::Member {
                        object: Box::new(expr),
                        name,
                    };
                }
                TokenKind::LParen => {
                    let offset = self.advance().offset;
                    let args = self.parse_arguments(TokenKind::RParen, "',' or ')'")?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        offset,
                    };
                }
                TokenKind::LBracket => {
                    let offset = self.advance().offset;
                    let args = self.parse_arguments(TokenKind::RBracket, "',' or ']'")?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        args,
                        offset,
                    };
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Parse primary expressions (atoms): literals, `it`, names, lambdas,
    /// parenthesized expressions and the `new`/`np`/`iif` forms.
    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.current().clone();

        match token.kind {
            // Literals
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Literal::Number(n)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Literal(Literal::String(s)))
            }
            TokenKind::Char(c) => {
                self.advance();
                Ok(Expr::Literal(Literal::Char(c)))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Literal(Literal::Boolean(false)))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::Null)
            }

            // `it => body` rebinds the implicit parameter inside the body
            TokenKind::Keyword(Keyword::It) if self.peek(1).is(&TokenKind::Arrow) => {
                self.advance();
                self.parse_lambda_body(Ident::new(token.text, token.offset))
            }
            TokenKind::Keyword(Keyword::It) => {
                self.advance();
                Ok(Expr::It {
                    offset: token.offset,
                })
            }

            TokenKind::Identifier(name) => {
                let ident = Ident::new(name, token.offset);
                if self.peek(1).is(&TokenKind::Arrow) {
                    self.advance();
                    return self.parse_lambda_body(ident);
                }
                // `long?(it)` is one nullable conversion, not `long ? (it) : ...`
                if self.peek(1).is(&TokenKind::Question) && self.peek(2).is(&TokenKind::LParen) {
                    self.advance();
                    self.advance();
                    self.advance();
                    let args = self.parse_arguments(TokenKind::RParen, "',' or ')'")?;
                    return Ok(Expr::NullableConversion {
                        target: ident,
                        args,
                    });
                }
                self.advance();
                Ok(Expr::Identifier(ident))
            }

            TokenKind::LParen => {
                // `(x) => body`
                if let TokenKind::Identifier(name) = &self.peek(1).kind
                    && self.peek(2).is(&TokenKind::RParen)
                    && self.peek(3).is(&TokenKind::Arrow)
                {
                    let ident = Ident::new(name.clone(), self.peek(1).offset);
                    self.advance();
                    self.advance();
                    self.advance();
                    return self.parse_lambda_body(ident);
                }
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }

            TokenKind::Keyword(Keyword::New) => {
                self.advance();
                self.parse_new(token.offset)
            }

            TokenKind::Keyword(Keyword::Np) => {
                self.advance();
                let mut args = self.parse_call_arguments("np", 1, token.offset)?;
                Ok(Expr::NullPropagation {
                    operand: Box::new(args.remove(0)),
                    offset: token.offset,
                })
            }

            TokenKind::Keyword(Keyword::Iif) => {
                self.advance();
                let mut args = self.parse_call_arguments("iif", 3, token.offset)?;
                let when_false = args.remove(2);
                let when_true = args.remove(1);
                let condition = args.remove(0);
                Ok(Expr::Conditional {
                    condition: Box::new(condition),
                    when_true: Box::new(when_true),
                    when_false: Box::new(when_false),
                    offset: token.offset,
                })
            }

            TokenKind::Eof if self.position == 0 => Err(SyntaxError::EmptyExpression),

            _ => Err(self.unexpected("an expression")),
        }
    }

    /// The arrow is the current token.
    fn parse_lambda_body(&mut self, param: Ident) -> Result<Expr, SyntaxError> {
        self.expect(TokenKind::Arrow, "'=>'")?;
        let body = self.parse_expression()?;
        Ok(Expr::Lambda {
            param,
            body: Box::new(body),
        })
    }

    /// `new[] { ... }` or `new(expr as Name, ...)`; `new` is already consumed.
    fn parse_new(&mut self, offset: usize) -> Result<Expr, SyntaxError> {
        match &self.current().kind {
            TokenKind::LBracket => {
                self.advance();
                self.expect(TokenKind::RBracket, "']'")?;
                self.expect(TokenKind::LBrace, "'{'")?;
                let elements = self.parse_arguments(TokenKind::RBrace, "',' or '}'")?;
                Ok(Expr::Array { elements, offset })
            }
            TokenKind::LParen => {
                self.advance();
                let members = self.parse_object_members()?;
                Ok(Expr::Object { members, offset })
            }
            _ => Err(self.unexpected("'[' or '(' after 'new'")),
        }
    }

    fn parse_object_members(&mut self) -> Result<Vec<(Ident, Expr)>, SyntaxError> {
        let mut members = vec![];

        if self.check(&TokenKind::RParen) {
            self.advance();
            return Ok(members);
        }

        loop {
            let start = self.current().offset;
            let value = self.parse_expression()?;

            if !self.check_keyword(Keyword::As) {
                return Err(SyntaxError::MissingAlias { offset: start });
            }
            self.advance();
            let alias = self.expect_identifier("member name after 'as'")?;
            members.push((alias, value));

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                self.expect(TokenKind::RParen, "',' or ')'")?;
                return Ok(members);
            }
        }
    }

    /// Parses `( args )` for the fixed-arity keyword forms.
    fn parse_call_arguments(
        &mut self,
        function: &'static str,
        expected: usize,
        offset: usize,
    ) -> Result<Vec<Expr>, SyntaxError> {
        self.expect(TokenKind::LParen, "'('")?;
        let args = self.parse_arguments(TokenKind::RParen, "',' or ')'")?;
        if args.len() != expected {
            return Err(SyntaxError::WrongArgumentCount {
                function,
                expected,
                found: args.len(),
                offset,
            });
        }
        Ok(args)
    }

    /// Comma-separated expressions up to `close`; the opening delimiter is
    /// already consumed.
    fn parse_arguments(
        &mut self,
        close: TokenKind,
        expected: &'static str,
    ) -> Result<Vec<Expr>, SyntaxError> {
        let mut args = vec![];

        if self.check(&close) {
            self.advance();
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else if self.check(&close) {
                self.advance();
                return Ok(args);
            } else {
                return Err(self.unexpected(expected));
            }
        }
    }
}

/// Lexes and parses `source` into an unbound tree.
pub fn parse(source: &str) -> Result<Expr, crate::CompileError> {
    let mut parser = Parser::new(Lexer::new(source))?;
    Ok(parser.parse()?)
}
