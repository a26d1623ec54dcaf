pub mod ast;
pub mod binder;
pub mod bound;
pub mod catalog;
pub mod compiler;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod runtime;
pub mod stage;
pub mod types;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{BinOp, Expr, Token, UnaryOp};
pub use binder::{BindError, bind};
pub use bound::BoundExpr;
pub use catalog::{Catalog, CatalogBuilder, CatalogError};
pub use compiler::{CompiledFunction, compile};
pub use lexer::{LexError, Lexer};
pub use output::{to_json, to_json_string};
pub use parser::{Parser, SyntaxError, parse};
pub use runtime::EvaluationFault;
pub use stage::{BuildError, CompileError, ExpressionStage};
pub use types::{NumericKind, Type};
pub use value::Value;
