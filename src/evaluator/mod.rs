use crate::ast::FieldValue;
use crate::data::FormRecord;
use crate::form::CalculationRule;
use std::collections::VecDeque;
use tracing::{debug, warn};

mod formula;

pub use formula::FormulaEngine;

/// One write performed by the convergence loop.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedUpdate {
    pub field: String,
    pub value: FieldValue,
    /// The changed field whose pass produced this write.
    pub trigger: String,
}

/// The outcome of one convergence run.
#[derive(Debug, Clone)]
pub struct Convergence {
    /// The record at its fixed point, or at the last computed state if `capped`.
    pub record: FormRecord,
    /// Derived writes, in the order they were made.
    pub updates: Vec<DerivedUpdate>,
    /// Number of passes taken.
    pub passes: usize,
    /// True if the pass cap stopped a rule set that kept changing.
    pub capped: bool,
}

impl Convergence {
    pub fn is_fixed_point(&self) -> bool {
        !self.capped
    }
}

/// Propagates calculation rules over a record until nothing changes.
///
/// A `Recalculator` borrows the rules of one form and is cheap to create; the
/// engine builds one per edit.
pub struct Recalculator<'a> {
    rules: &'a [CalculationRule],
    pass_cap: usize,
}

impl<'a> Recalculator<'a> {
    /// Creates a recalculator that stops after `pass_multiplier` passes per rule.
    pub fn new(rules: &'a [CalculationRule], pass_multiplier: usize) -> Self {
        Self {
            rules,
            pass_cap: pass_multiplier.max(1) * rules.len().max(1),
        }
    }

    pub fn pass_cap(&self) -> usize {
        self.pass_cap
    }

    /// Runs the convergence loop seeded with `changed` as the edited field.
    ///
    /// Each pass takes the next changed field off a FIFO worklist and
    /// evaluates, in declaration order, every rule that depends on it. A rule
    /// whose value differs writes it and queues its target, so changes chain
    /// forward and the first writer of a pass drives the next one.
    pub fn propagate(&self, record: FormRecord, changed: &str) -> Convergence {
        let mut working = record;
        let mut worklist = VecDeque::from([changed.to_string()]);
        let mut updates = Vec::new();
        let mut passes = 0;
        let mut capped = false;

        while let Some(field) = worklist.pop_front() {
            if passes == self.pass_cap {
                capped = true;
                warn!(
                    edited = changed,
                    passes,
                    pending = %field,
                    "calculation rules did not converge; keeping last computed record"
                );
                break;
            }
            passes += 1;

            for rule in self.rules.iter().filter(|r| r.depends_on(&field)) {
                let Some(value) = rule.evaluate(&working) else {
                    continue;
                };
                if working.get(&rule.target) == &value {
                    continue;
                }

                debug!(field = %rule.target, %value, trigger = %field, "derived field updated");
                working.set(&rule.target, value.clone());
                updates.push(DerivedUpdate {
                    field: rule.target.clone(),
                    value,
                    trigger: field.clone(),
                });
                if !worklist.contains(&rule.target) {
                    worklist.push_back(rule.target.clone());
                }
            }
        }

        Convergence {
            record: working,
            updates,
            passes,
            capped,
        }
    }

    /// Evaluates every rule, in order, until a whole pass changes nothing.
    ///
    /// Brings a record that was not produced by edits (a fetched record, a
    /// hand-built fixture) to its fixed point.
    pub fn settle(&self, record: FormRecord) -> Convergence {
        let mut working = record;
        let mut updates = Vec::new();
        let mut passes = 0;

        loop {
            if passes == self.pass_cap {
                warn!(passes, "calculation rules did not settle; keeping last computed record");
                return Convergence {
                    record: working,
                    updates,
                    passes,
                    capped: true,
                };
            }
            passes += 1;

            let mut changed = false;
            for rule in self.rules {
                let Some(value) = rule.evaluate(&working) else {
                    continue;
                };
                if working.get(&rule.target) != &value {
                    working.set(&rule.target, value.clone());
                    updates.push(DerivedUpdate {
                        field: rule.target.clone(),
                        value,
                        trigger: "*".to_string(),
                    });
                    changed = true;
                }
            }

            if !changed {
                return Convergence {
                    record: working,
                    updates,
                    passes,
                    capped: false,
                };
            }
        }
    }
}
