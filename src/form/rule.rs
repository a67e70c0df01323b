use crate::ast::{FieldValue, Formula};
use crate::data::FormRecord;
use crate::evaluator::FormulaEngine;
use crate::trace::TraceFormatter;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A hand-written rule body. Returning `None` means "cannot compute yet".
pub type RuleFn = Arc<dyn Fn(&FormRecord) -> Option<FieldValue> + Send + Sync>;

#[derive(Clone)]
enum RuleBody {
    Formula {
        formula: Formula,
        precision: Option<u32>,
    },
    Custom(RuleFn),
}

/// A pure derivation of one field's value from others.
///
/// Only `dependencies` decide whether the rule re-runs after a change; the
/// body itself may read the whole record.
#[derive(Clone)]
pub struct CalculationRule {
    pub target: String,
    pub dependencies: Vec<String>,
    body: RuleBody,
}

impl CalculationRule {
    /// A formula rule. Dependencies default to the fields the formula reads.
    pub fn formula(target: &str, formula: Formula) -> Self {
        Self {
            target: target.to_string(),
            dependencies: formula.referenced_fields(),
            body: RuleBody::Formula {
                formula,
                precision: None,
            },
        }
    }

    /// A rule backed by a closure, for derivations a formula cannot express.
    pub fn custom<F>(target: &str, dependencies: &[&str], f: F) -> Self
    where
        F: Fn(&FormRecord) -> Option<FieldValue> + Send + Sync + 'static,
    {
        Self {
            target: target.to_string(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            body: RuleBody::Custom(Arc::new(f)),
        }
    }

    /// Writes formula results as fixed-decimal text instead of a number.
    pub fn with_precision(mut self, decimals: u32) -> Self {
        if let RuleBody::Formula { precision, .. } = &mut self.body {
            *precision = Some(decimals);
        }
        self
    }

    /// Replaces the trigger set.
    pub fn with_dependencies(mut self, dependencies: &[&str]) -> Self {
        self.dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn depends_on(&self, field: &str) -> bool {
        self.dependencies.iter().any(|d| d == field)
    }

    pub fn as_formula(&self) -> Option<&Formula> {
        match &self.body {
            RuleBody::Formula { formula, .. } => Some(formula),
            RuleBody::Custom(_) => None,
        }
    }

    pub fn precision(&self) -> Option<u32> {
        match &self.body {
            RuleBody::Formula { precision, .. } => *precision,
            RuleBody::Custom(_) => None,
        }
    }

    /// Computes the new value for `target`, or `None` if the inputs are not ready.
    pub fn evaluate(&self, record: &FormRecord) -> Option<FieldValue> {
        match &self.body {
            RuleBody::Formula { formula, precision } => {
                match FormulaEngine::new(formula, record).evaluate() {
                    Ok(trace) => {
                        let outcome = trace.get_outcome();
                        Some(match precision {
                            Some(decimals) => FieldValue::fixed(outcome, *decimals),
                            None => FieldValue::Number(outcome),
                        })
                    }
                    Err(e) => {
                        debug!(target_field = %self.target, reason = %e, "rule cannot compute yet");
                        None
                    }
                }
            }
            RuleBody::Custom(f) => match f(record) {
                Some(FieldValue::Number(n)) if !n.is_finite() => {
                    debug!(target_field = %self.target, "custom rule returned a non-finite number");
                    None
                }
                value => value,
            },
        }
    }

    /// Human-readable account of how a formula rule reaches its value.
    pub fn explain(&self, record: &FormRecord) -> Option<String> {
        let formula = self.as_formula()?;
        let trace = FormulaEngine::new(formula, record).evaluate().ok()?;
        Some(format!(
            "{} = {}",
            self.target,
            TraceFormatter::format_trace(&trace)
        ))
    }
}

impl fmt::Debug for CalculationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("CalculationRule");
        s.field("target", &self.target)
            .field("dependencies", &self.dependencies);
        match &self.body {
            RuleBody::Formula { formula, precision } => {
                s.field("formula", formula).field("precision", precision)
            }
            RuleBody::Custom(_) => s.field("body", &"<custom>"),
        };
        s.finish()
    }
}
