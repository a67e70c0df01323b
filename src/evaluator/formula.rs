use crate::ast::{EvaluationTrace, FieldValue, Formula, MAX_DECIMALS, round_to};
use crate::data::FormRecord;
use crate::error::EvaluationError;

/// The recursive engine for evaluating a single formula against a record.
pub struct FormulaEngine<'a> {
    formula: &'a Formula,
    record: &'a FormRecord,
}

impl<'a> FormulaEngine<'a> {
    pub fn new(formula: &'a Formula, record: &'a FormRecord) -> Self {
        Self { formula, record }
    }

    /// Evaluates the formula and returns a trace of the execution.
    pub fn evaluate(&self) -> Result<EvaluationTrace, EvaluationError> {
        self.evaluate_recursive(self.formula)
    }

    fn evaluate_recursive(&self, formula: &Formula) -> Result<EvaluationTrace, EvaluationError> {
        match formula {
            // --- Arithmetic Operations ---
            Formula::Sum(l, r) => self.eval_binary(l, r, "+", |a, b| a + b),
            Formula::Subtract(l, r) => self.eval_binary(l, r, "-", |a, b| a - b),
            Formula::Multiply(l, r) => self.eval_binary(l, r, "*", |a, b| a * b),
            Formula::Divide(l, r) => self.eval_binary(l, r, "/", |a, b| a / b),

            // --- Functions ---
            Formula::Min(l, r) => {
                self.eval_call("MIN", &[l.as_ref(), r.as_ref()], |args| args[0].min(args[1]))
            }
            Formula::Max(l, r) => {
                self.eval_call("MAX", &[l.as_ref(), r.as_ref()], |args| args[0].max(args[1]))
            }
            Formula::Abs(v) => self.eval_call("ABS", &[v.as_ref()], |args| args[0].abs()),
            Formula::Round(v, digits) => {
                if *digits > MAX_DECIMALS {
                    return Err(EvaluationError::DigitsOutOfRange(*digits));
                }
                let child_trace = self.evaluate_recursive(v)?;
                let outcome = round_to(child_trace.get_outcome(), *digits).ok_or_else(|| {
                    EvaluationError::NonFinite {
                        operation: "ROUND".to_string(),
                    }
                })?;
                let digits_trace = EvaluationTrace::Leaf {
                    source: digits.to_string(),
                    value: f64::from(*digits),
                };
                Ok(EvaluationTrace::Call {
                    name: "ROUND",
                    args: vec![child_trace, digits_trace],
                    outcome,
                })
            }

            // --- Leaves ---
            Formula::Literal(value) => Ok(EvaluationTrace::Leaf {
                source: FieldValue::Number(*value).to_string(),
                value: *value,
            }),
            Formula::Field(name) => {
                let raw = self.record.get(name);
                if raw.is_empty() {
                    return Err(EvaluationError::InputNotFound(name.clone()));
                }
                let value = raw.as_number().ok_or_else(|| EvaluationError::NotNumeric {
                    field: name.clone(),
                    found: raw.to_string(),
                })?;
                Ok(EvaluationTrace::Leaf {
                    source: format!("${}", name),
                    value,
                })
            }
        }
    }

    fn eval_binary<F>(
        &self,
        l: &Formula,
        r: &Formula,
        op: &'static str,
        f: F,
    ) -> Result<EvaluationTrace, EvaluationError>
    where
        F: Fn(f64, f64) -> f64,
    {
        let left_trace = self.evaluate_recursive(l)?;
        let right_trace = self.evaluate_recursive(r)?;
        let outcome = f(left_trace.get_outcome(), right_trace.get_outcome());
        self.finite(
            op,
            EvaluationTrace::BinaryOp {
                op_symbol: op,
                left: Box::new(left_trace),
                right: Box::new(right_trace),
                outcome,
            },
        )
    }

    fn eval_call<F>(
        &self,
        name: &'static str,
        args: &[&Formula],
        f: F,
    ) -> Result<EvaluationTrace, EvaluationError>
    where
        F: Fn(&[f64]) -> f64,
    {
        let arg_traces = args
            .iter()
            .map(|arg| self.evaluate_recursive(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let values: Vec<f64> = arg_traces.iter().map(EvaluationTrace::get_outcome).collect();
        let outcome = f(&values);
        self.finite(
            name,
            EvaluationTrace::Call {
                name,
                args: arg_traces,
                outcome,
            },
        )
    }

    fn finite(&self, op: &str, trace: EvaluationTrace) -> Result<EvaluationTrace, EvaluationError> {
        if trace.get_outcome().is_finite() {
            Ok(trace)
        } else {
            Err(EvaluationError::NonFinite {
                operation: op.to_string(),
            })
        }
    }
}
