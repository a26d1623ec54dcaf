//! Evaluate a quill expression against one JSON input

use super::{CliError, json_to_value, parse_type, value_to_json};
use crate::{BuildError, ExpressionStage, Type, parse};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The expression to evaluate
    pub expression: String,
    /// Type name of the input element, e.g. `int` or `DateTime?`
    pub input_type: String,
    /// JSON input string
    pub input: Option<String>,
    /// Pretty-print the output
    pub pretty: bool,
    /// Only validate syntax, don't bind or execute
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Expression evaluated successfully
    Success {
        output_type: Type,
        value: serde_json::Value,
    },
}

/// Execute a quill check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let expression = &options.expression;

    if options.syntax_only {
        parse(expression).map_err(|cause| BuildError {
            expression: expression.clone(),
            cause,
        })?;
        return Ok(CheckResult::SyntaxValid);
    }

    let input_type = parse_type(&options.input_type)?;
    let stage = ExpressionStage::build(expression, input_type)?;

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let json_value: serde_json::Value = serde_json::from_str(json_str)?;
    let element = json_to_value(json_value, stage.input_type())?;

    let result = stage.process(&element)?;
    Ok(CheckResult::Success {
        output_type: stage.output_type().clone(),
        value: value_to_json(&result),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(expression: &str, input_type: &str, input: &str) -> CheckOptions {
        CheckOptions {
            expression: expression.to_string(),
            input_type: input_type.to_string(),
            input: Some(input.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_check_evaluates() {
        match execute_check(&options("it * 2", "int", "21")).unwrap() {
            CheckResult::Success { output_type, value } => {
                assert_eq!(output_type, Type::Int32);
                assert_eq!(value, serde_json::json!(42));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_syntax_only_skips_binding() {
        let opts = CheckOptions {
            expression: "string(it)".to_string(),
            syntax_only: true,
            ..Default::default()
        };
        assert!(matches!(execute_check(&opts), Ok(CheckResult::SyntaxValid)));
    }

    #[test]
    fn test_syntax_only_reports_errors() {
        let opts = CheckOptions {
            expression: "it +".to_string(),
            syntax_only: true,
            ..Default::default()
        };
        assert!(matches!(execute_check(&opts), Err(CliError::Build(_))));
    }

    #[test]
    fn test_missing_input() {
        let opts = CheckOptions {
            expression: "it".to_string(),
            input_type: "int".to_string(),
            ..Default::default()
        };
        assert!(matches!(execute_check(&opts), Err(CliError::NoInput)));
    }

    #[test]
    fn test_fault_is_reported() {
        let result = execute_check(&options("Convert.ToByte(it)", "int", "300"));
        assert!(matches!(result, Err(CliError::Fault(_))));
    }
}
