use crate::ast::{BinOp, NumberLiteral, UnaryOp};

/// An identifier as written, plus where it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub offset: usize,
}

impl Ident {
    pub fn new(name: impl Into<String>, offset: usize) -> Self {
        Ident {
            name: name.into(),
            offset,
        }
    }

    /// The case-folded key used for every symbol and member lookup.
    pub fn folded(&self) -> String {
        self.name.to_lowercase()
    }
}

/// Literal constants other than `null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Boolean(bool),
    Char(char),
    String(String),
    Number(NumberLiteral),
}

/// Abstract Syntax Tree node representing a parsed expression.
///
/// The parser produces this tree without resolving any name: `float(it)` is a
/// plain [`Expr::Call`] whose callee happens to be the identifier `float`.
/// Deciding that this is a conversion is the binder's job.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value
    ///
    /// # Example
    /// ```text
    /// 42
    /// "text"
    /// 'c'
    /// ```
    Literal(Literal),

    /// Null literal
    Null,

    /// Implicit parameter (`it`)
    ///
    /// The current input element, or the current element inside a query
    /// operator argument that is not an explicit lambda.
    It { offset: usize },

    /// Bare name: a library type, a conversion function or a lambda parameter
    Identifier(Ident),

    /// Member access
    ///
    /// # Examples
    /// ```text
    /// Math.PI
    /// it.Length
    /// ```
    Member { object: Box<Expr>, name: Ident },

    /// Indexer access
    ///
    /// # Example
    /// ```text
    /// guid.empty.tobytearray()[0]
    /// ```
    Index {
        object: Box<Expr>,
        args: Vec<Expr>,
        offset: usize,
    },

    /// Call of a conversion function, library method or query operator
    ///
    /// # Examples
    /// ```text
    /// float(it)
    /// Convert.ToInt16(it)
    /// items.Select(x => x * 2)
    /// ```
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        offset: usize,
    },

    /// Conversion to the nullable form of a type
    ///
    /// # Example
    /// ```text
    /// long?(it)
    /// ```
    NullableConversion { target: Ident, args: Vec<Expr> },

    /// Prefix operation
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        offset: usize,
    },

    /// Binary operation (arithmetic, comparison, logical, `??`)
    BinaryOp {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        offset: usize,
    },

    /// Conditional expression (`cond ? a : b` or `iif(cond, a, b)`)
    Conditional {
        condition: Box<Expr>,
        when_true: Box<Expr>,
        when_false: Box<Expr>,
        offset: usize,
    },

    /// Null propagation
    ///
    /// # Example
    /// ```text
    /// np(string(null).Length)
    /// ```
    NullPropagation { operand: Box<Expr>, offset: usize },

    /// Array literal
    ///
    /// # Example
    /// ```text
    /// new[] { it, it + 1 }
    /// ```
    Array { elements: Vec<Expr>, offset: usize },

    /// Anonymous object literal; every member carries its alias
    ///
    /// # Example
    /// ```text
    /// new(single(it) as X, single(it) as Y)
    /// ```
    Object {
        members: Vec<(Ident, Expr)>,
        offset: usize,
    },

    /// Single-parameter lambda
    ///
    /// # Example
    /// ```text
    /// x => x * 2
    /// ```
    Lambda { param: Ident, body: Box<Expr> },
}

impl Expr {
    /// Best-effort source offset of the node, used for diagnostics.
    pub fn offset(&self) -> usize {
        match self {
            Expr::Literal(_) | Expr::Null => 0,
            Expr::It { offset }
            | Expr::Index { offset, .. }
            | Expr::Call { offset, .. }
            | Expr::Unary { offset, .. }
            | Expr::BinaryOp { offset, .. }
            | Expr::Conditional { offset, .. }
            | Expr::NullPropagation { offset, .. }
            | Expr::Array { offset, .. }
            | Expr::Object { offset, .. } => *offset,
            Expr::Identifier(ident) => ident.offset,
            Expr::Member { name, .. } => name.offset,
            Expr::NullableConversion { target, .. } => target.offset,
            Expr::Lambda { param, .. } => param.offset,
        }
    }
}
