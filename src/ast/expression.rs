use serde::{Deserialize, Serialize};
use std::fmt;

/// The expression tree of a declarative calculation rule.
///
/// Formulas serialize as externally tagged JSON, e.g.
/// `{"Multiply": [{"Field": "tcho"}, {"Literal": 0.35}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Formula {
    // Arithmetic
    Sum(Box<Formula>, Box<Formula>),
    Subtract(Box<Formula>, Box<Formula>),
    Multiply(Box<Formula>, Box<Formula>),
    Divide(Box<Formula>, Box<Formula>),
    Min(Box<Formula>, Box<Formula>),
    Max(Box<Formula>, Box<Formula>),
    Abs(Box<Formula>),
    Round(Box<Formula>, u32),

    // Leaf nodes
    Literal(f64),
    Field(String),
}

impl Formula {
    pub fn field(name: &str) -> Self {
        Formula::Field(name.to_string())
    }

    pub fn literal(value: f64) -> Self {
        Formula::Literal(value)
    }

    pub fn sum(l: Formula, r: Formula) -> Self {
        Formula::Sum(Box::new(l), Box::new(r))
    }

    pub fn subtract(l: Formula, r: Formula) -> Self {
        Formula::Subtract(Box::new(l), Box::new(r))
    }

    pub fn multiply(l: Formula, r: Formula) -> Self {
        Formula::Multiply(Box::new(l), Box::new(r))
    }

    pub fn divide(l: Formula, r: Formula) -> Self {
        Formula::Divide(Box::new(l), Box::new(r))
    }

    pub fn round(self, digits: u32) -> Self {
        Formula::Round(Box::new(self), digits)
    }

    /// Collects the field names this formula reads, in first-seen order.
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    /// The largest `Round` digit count anywhere in the tree.
    pub fn max_round_digits(&self) -> Option<u32> {
        match self {
            Formula::Sum(l, r)
            | Formula::Subtract(l, r)
            | Formula::Multiply(l, r)
            | Formula::Divide(l, r)
            | Formula::Min(l, r)
            | Formula::Max(l, r) => l.max_round_digits().max(r.max_round_digits()),
            Formula::Abs(v) => v.max_round_digits(),
            Formula::Round(v, digits) => Some(v.max_round_digits().unwrap_or(0).max(*digits)),
            Formula::Literal(_) | Formula::Field(_) => None,
        }
    }

    fn collect_fields(&self, fields: &mut Vec<String>) {
        match self {
            Formula::Field(name) => {
                if !fields.contains(name) {
                    fields.push(name.clone());
                }
            }
            Formula::Sum(l, r)
            | Formula::Subtract(l, r)
            | Formula::Multiply(l, r)
            | Formula::Divide(l, r)
            | Formula::Min(l, r)
            | Formula::Max(l, r) => {
                l.collect_fields(fields);
                r.collect_fields(fields);
            }
            Formula::Abs(v) | Formula::Round(v, _) => v.collect_fields(fields),
            Formula::Literal(_) => {}
        }
    }
}

/// A wrapper to display a formula as an indented tree.
pub struct DisplayFormula<'a> {
    pub formula: &'a Formula,
}

impl<'a> fmt::Display for DisplayFormula<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_as_tree(self.formula, f, "", true)
    }
}

impl<'a> DisplayFormula<'a> {
    fn fmt_as_tree(
        &self,
        formula: &Formula,
        f: &mut fmt::Formatter<'_>,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let node_marker = if is_last { "└── " } else { "├── " };
        write!(f, "{}{}", prefix, node_marker)?;

        let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });

        match formula {
            Formula::Literal(v) => writeln!(f, "Literal: {}", v)?,
            Formula::Field(name) => writeln!(f, "Field: ${}", name)?,
            Formula::Abs(v) => {
                writeln!(f, "ABS")?;
                self.fmt_as_tree(v, f, &child_prefix, true)?;
            }
            Formula::Round(v, digits) => {
                writeln!(f, "ROUND ({} decimals)", digits)?;
                self.fmt_as_tree(v, f, &child_prefix, true)?;
            }
            Formula::Sum(l, r) => self.fmt_binary(f, "+", l, r, &child_prefix)?,
            Formula::Subtract(l, r) => self.fmt_binary(f, "-", l, r, &child_prefix)?,
            Formula::Multiply(l, r) => self.fmt_binary(f, "*", l, r, &child_prefix)?,
            Formula::Divide(l, r) => self.fmt_binary(f, "/", l, r, &child_prefix)?,
            Formula::Min(l, r) => self.fmt_binary(f, "MIN", l, r, &child_prefix)?,
            Formula::Max(l, r) => self.fmt_binary(f, "MAX", l, r, &child_prefix)?,
        }
        Ok(())
    }

    fn fmt_binary(
        &self,
        f: &mut fmt::Formatter<'_>,
        name: &str,
        l: &Formula,
        r: &Formula,
        prefix: &str,
    ) -> fmt::Result {
        writeln!(f, "{}", name)?;
        self.fmt_as_tree(l, f, prefix, false)?;
        self.fmt_as_tree(r, f, prefix, true)?;
        Ok(())
    }
}
