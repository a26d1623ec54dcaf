//! Map an expression over newline-delimited JSON

use std::io::{BufRead, Write};

use tracing::{debug, info};

use super::{CliError, json_to_value, parse_type, value_to_json};
use crate::ExpressionStage;

/// Options for the stream command
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    pub expression: String,
    /// Type name of each input element
    pub input_type: String,
    /// Stop at the first element that fails to decode or evaluate
    pub fail_fast: bool,
}

/// Counts reported once the input is exhausted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    pub processed: usize,
    pub faulted: usize,
}

/// Evaluates the expression once per non-blank input line, writing one JSON
/// result per line to `out`. Elements that fail are reported to `err` as
/// `line N: message` and produce no output line.
pub fn execute_stream<R, W, E>(
    options: &StreamOptions,
    input: R,
    mut out: W,
    mut err: E,
) -> Result<StreamSummary, CliError>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let input_type = parse_type(&options.input_type)?;
    let stage = ExpressionStage::build(&options.expression, input_type)?;
    let mut summary = StreamSummary::default();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        summary.processed += 1;

        match evaluate_line(&stage, &line) {
            Ok(json) => {
                serde_json::to_writer(&mut out, &json)?;
                writeln!(out)?;
            }
            Err(e) => {
                summary.faulted += 1;
                debug!(line = index + 1, error = %e, "element faulted");
                writeln!(err, "line {}: {}", index + 1, e)?;
                if options.fail_fast {
                    break;
                }
            }
        }
    }

    out.flush()?;
    info!(
        processed = summary.processed,
        faulted = summary.faulted,
        "stream finished"
    );
    Ok(summary)
}

fn evaluate_line(stage: &ExpressionStage, line: &str) -> Result<serde_json::Value, CliError> {
    let json: serde_json::Value = serde_json::from_str(line)?;
    let element = json_to_value(json, stage.input_type())?;
    let result = stage.process(&element)?;
    Ok(value_to_json(&result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(expression: &str, input_type: &str, input: &str, fail_fast: bool) -> (StreamSummary, String, String) {
        let options = StreamOptions {
            expression: expression.to_string(),
            input_type: input_type.to_string(),
            fail_fast,
        };
        let mut out = Vec::new();
        let mut err = Vec::new();
        let summary = execute_stream(&options, input.as_bytes(), &mut out, &mut err).unwrap();
        (
            summary,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_stream_maps_each_line() {
        let (summary, out, err) = run("it * 2", "int", "1\n2\n\n3\n", false);
        assert_eq!(summary, StreamSummary { processed: 3, faulted: 0 });
        assert_eq!(out, "2\n4\n6\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_fault_skips_only_that_element() {
        let (summary, out, err) = run("10 / it", "int", "2\n0\n5\n", false);
        assert_eq!(summary, StreamSummary { processed: 3, faulted: 1 });
        assert_eq!(out, "5\n2\n");
        assert!(err.starts_with("line 2:"));
    }

    #[test]
    fn test_fail_fast_stops() {
        let (summary, out, _) = run("10 / it", "int", "0\n5\n", true);
        assert_eq!(summary, StreamSummary { processed: 1, faulted: 1 });
        assert!(out.is_empty());
    }

    #[test]
    fn test_bad_expression_is_an_error() {
        let options = StreamOptions {
            expression: "it +".to_string(),
            input_type: "int".to_string(),
            fail_fast: false,
        };
        let result = execute_stream(&options, "1\n".as_bytes(), Vec::new(), Vec::new());
        assert!(matches!(result, Err(CliError::Build(_))));
    }
}
