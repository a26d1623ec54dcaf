//! The typed tree produced by the binder.
//!
//! Every node carries its resolved [`Type`]. Implicit coercions and explicit
//! conversions are nodes of their own, so the compiler lowers the tree
//! without inspecting types.

use std::sync::Arc;

use crate::{
    catalog::Builtin,
    types::{EnumType, NumericKind, RecordType, Type},
    value::Value,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BoundExpr {
    pub kind: BoundKind,
    pub ty: Type,
}

impl BoundExpr {
    pub fn new(kind: BoundKind, ty: Type) -> Self {
        BoundExpr { kind, ty }
    }

    pub fn constant(value: Value, ty: Type) -> Self {
        BoundExpr::new(BoundKind::Constant(value), ty)
    }

    pub fn is_null_literal(&self) -> bool {
        self.ty == Type::Null
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoundKind {
    Constant(Value),

    /// The implicit parameter or a lambda parameter, addressed by how many
    /// scopes out it lives (0 is the innermost).
    Parameter { depth: usize },

    /// Implicit, always-succeeding conversion
    Coerce {
        coercion: Coercion,
        operand: Box<BoundExpr>,
    },

    /// Explicit conversion; may fault at run time
    Convert {
        conversion: Conversion,
        operand: Box<BoundExpr>,
    },

    Unary {
        op: UnaryOperator,
        operand: Box<BoundExpr>,
        lifted: bool,
    },

    /// Both operands already have the operator's operand type.
    Binary {
        op: BinaryOperator,
        left: Box<BoundExpr>,
        right: Box<BoundExpr>,
        lifted: bool,
    },

    /// `left ?? right`
    Coalesce {
        left: Box<BoundExpr>,
        right: Box<BoundExpr>,
    },

    Conditional {
        condition: Box<BoundExpr>,
        when_true: Box<BoundExpr>,
        when_false: Box<BoundExpr>,
    },

    /// Library call; instance members receive the receiver first. With
    /// `null_conditional` a null receiver short-circuits to null.
    Call {
        builtin: Builtin,
        args: Vec<BoundExpr>,
        null_conditional: bool,
    },

    /// Record field read
    Field {
        receiver: Box<BoundExpr>,
        index: usize,
        null_conditional: bool,
    },

    /// Array or string indexer
    Index {
        receiver: Box<BoundExpr>,
        index: Box<BoundExpr>,
        null_conditional: bool,
    },

    /// Query operator over an array or sequence. The lambda, when present,
    /// is evaluated with the element pushed as a new innermost scope.
    Query {
        method: QueryMethod,
        source: Box<BoundExpr>,
        lambda: Option<Box<BoundExpr>>,
        args: Vec<BoundExpr>,
        null_conditional: bool,
    },

    NewArray { elements: Vec<BoundExpr> },

    NewRecord {
        ty: Arc<RecordType>,
        fields: Vec<BoundExpr>,
    },
}

/// Implicit conversions inserted by the binder.
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    /// Widening numeric conversion
    Numeric(NumericKind),
    /// Widening numeric conversion between nullable types; null passes through
    LiftedNumeric(NumericKind),
    /// `T` to `Nullable<T>`
    Wrap,
    /// Value to `Object`
    Box,
    /// The `null` literal to a reference or nullable type
    NullLiteral,
    /// Array to sequence and similar representation-preserving steps
    Upcast,
}

impl Coercion {
    /// Whether the run-time representation is unchanged.
    pub fn is_identity(&self) -> bool {
        !matches!(self, Coercion::Numeric(_) | Coercion::LiftedNumeric(_))
    }
}

/// Explicit conversions requested by a conversion call such as `int(x)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Conversion {
    /// Unchecked numeric cast; null passes through when `lifted`
    Numeric { target: NumericKind, lifted: bool },
    /// Integral value to enumeration member
    ToEnum {
        ty: &'static EnumType,
        lifted: bool,
    },
    /// Enumeration member to its underlying integral value
    FromEnum { lifted: bool },
    /// `Nullable<T>` to `T`; faults on null
    Unwrap,
    /// `Object` to a concrete type; faults when the value does not conform
    Unbox(Type),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Plus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    /// String `+`; either operand is rendered as text, null as empty
    Concat,
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryMethod {
    Select,
    Where,
    OrderBy { descending: bool },
    ToArray,
    Count,
    Any,
    All,
    First,
    FirstOrDefault { default: Value },
    Last,
    LastOrDefault { default: Value },
    Sum(NumericKind),
    Average(NumericKind),
    Min,
    Max,
    Contains,
    Take,
    Skip,
    Distinct,
    Reverse,
}

impl QueryMethod {
    pub fn name(&self) -> &'static str {
        match self {
            QueryMethod::Select => "Select",
            QueryMethod::Where => "Where",
            QueryMethod::OrderBy { descending: false } => "OrderBy",
            QueryMethod::OrderBy { descending: true } => "OrderByDescending",
            QueryMethod::ToArray => "ToArray",
            QueryMethod::Count => "Count",
            QueryMethod::Any => "Any",
            QueryMethod::All => "All",
            QueryMethod::First => "First",
            QueryMethod::FirstOrDefault { .. } => "FirstOrDefault",
            QueryMethod::Last => "Last",
            QueryMethod::LastOrDefault { .. } => "LastOrDefault",
            QueryMethod::Sum(_) => "Sum",
            QueryMethod::Average(_) => "Average",
            QueryMethod::Min => "Min",
            QueryMethod::Max => "Max",
            QueryMethod::Contains => "Contains",
            QueryMethod::Take => "Take",
            QueryMethod::Skip => "Skip",
            QueryMethod::Distinct => "Distinct",
            QueryMethod::Reverse => "Reverse",
        }
    }
}
