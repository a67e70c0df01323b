use crate::ast::{EvaluationTrace, FieldValue};

/// Formats evaluation traces into human-readable strings
pub struct TraceFormatter;

impl TraceFormatter {
    /// Format an evaluation trace into a human-readable explanation.
    ///
    /// Field leaves show the value they had, e.g. `$tcho (was 200) * 0.35`.
    pub fn format_trace(trace: &EvaluationTrace) -> String {
        // Start the recursive formatting with the lowest possible parent precedence.
        Self::format_recursive(trace, 0)
    }

    /// Recursively formats the trace, adding parentheses only when necessary.
    fn format_recursive(trace: &EvaluationTrace, parent_precedence: u8) -> String {
        let current_precedence = trace.precedence();
        let needs_parens = current_precedence < parent_precedence;

        let mut result = String::new();
        if needs_parens {
            result.push('(');
        }

        match trace {
            EvaluationTrace::BinaryOp {
                op_symbol,
                left,
                right,
                ..
            } => {
                let left_str = Self::format_recursive(left, current_precedence);
                // `a - (b - c)` and `a / (b / c)` keep their parentheses.
                let right_precedence = match *op_symbol {
                    "-" | "/" => current_precedence + 1,
                    _ => current_precedence,
                };
                let right_str = Self::format_recursive(right, right_precedence);
                result.push_str(&format!("{} {} {}", left_str, op_symbol, right_str));
            }
            EvaluationTrace::Call { name, args, .. } => {
                let args_str: Vec<String> = args
                    .iter()
                    .map(|arg| Self::format_recursive(arg, 0))
                    .collect();
                result.push_str(&format!("{}({})", name, args_str.join(", ")));
            }
            EvaluationTrace::Leaf { source, value } => {
                let formatted_leaf = if source.starts_with('$') {
                    format!("{} (was {})", source, FieldValue::Number(*value))
                } else {
                    source.clone()
                };
                result.push_str(&formatted_leaf);
            }
        }

        if needs_parens {
            result.push(')');
        }
        result
    }
}
