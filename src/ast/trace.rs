/// A record of how a formula was evaluated, including intermediate values.
#[derive(Debug, Clone)]
pub enum EvaluationTrace {
    BinaryOp {
        op_symbol: &'static str,
        left: Box<EvaluationTrace>,
        right: Box<EvaluationTrace>,
        outcome: f64,
    },
    /// Function-style operations such as `ABS(x)` or `ROUND(x, 2)`.
    Call {
        name: &'static str,
        args: Vec<EvaluationTrace>,
        outcome: f64,
    },
    Leaf {
        source: String,
        value: f64,
    },
}

impl EvaluationTrace {
    pub fn get_outcome(&self) -> f64 {
        match self {
            EvaluationTrace::BinaryOp { outcome, .. } => *outcome,
            EvaluationTrace::Call { outcome, .. } => *outcome,
            EvaluationTrace::Leaf { value, .. } => *value,
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            EvaluationTrace::BinaryOp { op_symbol, .. } => match *op_symbol {
                "+" | "-" => 6,
                "*" | "/" => 7,
                _ => 0,
            },
            EvaluationTrace::Call { .. } | EvaluationTrace::Leaf { .. } => 9,
        }
    }
}
