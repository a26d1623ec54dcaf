//! The pipeline-facing expression stage: build once, then map elements.

use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::{
    binder::{BindError, Binder},
    bound::{BoundExpr, Coercion},
    catalog::Catalog,
    compiler::{CompiledFunction, compile},
    lexer::{LexError, Lexer},
    parser::{Parser, SyntaxError},
    runtime::{EvalResult, EvaluationFault},
    types::Type,
    value::Value,
};

/// Why an expression failed to build, by phase.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("lexical error: {0}")]
    Lex(#[from] LexError),

    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("type error: {0}")]
    Bind(#[from] BindError),
}

/// An expression that could not be turned into a stage.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot build expression '{expression}': {cause}")]
pub struct BuildError {
    pub expression: String,
    #[source]
    pub cause: CompileError,
}

/// A compiled expression bound to its input type.
///
/// # Examples
///
/// ```
/// use quill_expr::{ExpressionStage, Type, Value};
///
/// let stage = ExpressionStage::build("it * 2", Type::Int32).unwrap();
/// assert_eq!(stage.output_type(), &Type::Int32);
/// assert_eq!(stage.process(&Value::Int32(21)), Ok(Value::Int32(42)));
/// ```
#[derive(Debug, Clone)]
pub struct ExpressionStage {
    expression: String,
    function: CompiledFunction,
}

impl ExpressionStage {
    /// Builds `expression` for inputs of type `input` against the standard
    /// catalog.
    pub fn build(expression: &str, input: Type) -> Result<Self, BuildError> {
        Self::build_with(Catalog::standard(), expression, input)
    }

    pub fn build_with(catalog: &Catalog, expression: &str, input: Type) -> Result<Self, BuildError> {
        match compile_expression(catalog, expression, &input) {
            Ok(bound) => {
                let function = compile(bound, input);
                debug!(
                    expression,
                    input = %function.input_type(),
                    output = %function.output_type(),
                    "built expression stage"
                );
                Ok(ExpressionStage {
                    expression: expression.to_string(),
                    function,
                })
            }
            Err(cause) => {
                warn!(expression, input = %input, error = %cause, "expression failed to build");
                Err(BuildError {
                    expression: expression.to_string(),
                    cause,
                })
            }
        }
    }

    /// Evaluates one element. A fault affects only this element.
    pub fn process(&self, element: &Value) -> EvalResult {
        let input = self.function.input_type();
        if !element.conforms_to(input) {
            return Err(EvaluationFault::InputType {
                expected: input.to_string(),
                found: element.kind_name().to_string(),
            });
        }
        self.function.call(element)
    }

    /// Maps a stream of elements lazily, one result per element, in order.
    pub fn process_all<'s, I>(&'s self, elements: I) -> impl Iterator<Item = EvalResult> + 's
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: 's,
    {
        elements.into_iter().map(move |element| self.process(&element))
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn input_type(&self) -> &Type {
        self.function.input_type()
    }

    pub fn output_type(&self) -> &Type {
        self.function.output_type()
    }

    pub fn function(&self) -> &CompiledFunction {
        &self.function
    }
}

fn compile_expression(
    catalog: &Catalog,
    expression: &str,
    input: &Type,
) -> Result<BoundExpr, CompileError> {
    let tokens = Lexer::new(expression).tokenize()?;
    trace!(tokens = tokens.len(), "tokenized expression");

    let expr = Parser::from_tokens(tokens).parse()?;
    let bound = Binder::new(catalog, input.clone()).bind(&expr)?;
    trace!(ty = %bound.ty, "bound expression");

    // A bare `null` has no type of its own; the stage reports Object.
    if bound.is_null_literal() {
        return Ok(crate::binder::with_coercion(bound, Coercion::NullLiteral, Type::Object));
    }
    Ok(bound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_expression_is_object() {
        let stage = ExpressionStage::build("null", Type::Int32).unwrap();
        assert_eq!(stage.output_type(), &Type::Object);
        assert_eq!(stage.process(&Value::Int32(1)), Ok(Value::Null));
    }

    #[test]
    fn test_build_error_names_expression() {
        let err = ExpressionStage::build("string(it)", Type::Int32).unwrap_err();
        assert_eq!(err.expression, "string(it)");
        assert!(matches!(
            err.cause,
            CompileError::Bind(BindError::InvalidConversion { .. })
        ));
    }

    #[test]
    fn test_input_must_conform() {
        let stage = ExpressionStage::build("it", Type::Int32).unwrap();
        assert!(matches!(
            stage.process(&Value::from("42")),
            Err(EvaluationFault::InputType { .. })
        ));
    }

    #[test]
    fn test_process_all_keeps_going_after_a_fault() {
        let stage = ExpressionStage::build("10 / it", Type::Int32).unwrap();
        let results: Vec<_> = stage
            .process_all(vec![Value::Int32(2), Value::Int32(0), Value::Int32(5)])
            .collect();
        assert_eq!(results[0], Ok(Value::Int32(5)));
        assert_eq!(results[1], Err(EvaluationFault::DivisionByZero));
        assert_eq!(results[2], Ok(Value::Int32(2)));
    }
}
