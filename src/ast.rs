//! # Quill Expression Language - Abstract Syntax Tree
//!
//! This module defines the unbound syntax tree of the quill expression
//! language: a single expression, evaluated once per element of a stream,
//! where `it` names the current element.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes (literals, access, calls, literals
//!   for arrays and anonymous objects, lambdas)
//! - **[operators]** - Unary and binary operators
//!
//! ## Quick Start
//!
//! ```text
//! it * 2
//! float(it)
//! new[] { it }.Select(x => x * 2).ToArray()
//! ```
//!
//! ## Core Concepts
//!
//! ### Case-insensitive names
//!
//! Keywords, type names and member names are matched without regard to case:
//! `Math.PI`, `math.pi` and `MATH.PI` are the same expression. String and
//! char literal contents are kept verbatim.
//!
//! ### Conversions look like calls
//!
//! `float(it)`, `DayOfWeek(it + 1)` and `long?(it)` are parsed as calls; the
//! binder recognises the callee as a type and turns the call into a
//! conversion.
//!
//! ### No statements
//!
//! There are no loops, assignments or declarations. Lambdas exist only as
//! arguments of query operators such as `Select` and `Where`.
//!
//! ## Examples
//!
//! ```text
//! it > 0 ? convert.toint16(it) : int16.minvalue
//! np(string(null).Length) ?? it
//! new(single(it) as X, single(it) as Y).X
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::{Expr, Ident, Literal};
pub use operators::{BinOp, UnaryOp};
pub use tokens::{Keyword, NumberLiteral, Token, TokenKind};
