//! Common test utilities for building form definitions, records and services.
use keisan::prelude::{
    CalculationRule, FieldDescriptor, FormDefinition, FormRecord, Formula, ServiceError,
};
use std::future::Future;

/// The lipid profile rules on a minimal form.
///
/// Logic: `hdl = tcho * 0.35`, `ldl = tcho + tg / 5 + hdl`, two decimals each.
#[allow(dead_code)]
pub fn create_lipid_form() -> FormDefinition {
    FormDefinition::builder("lipid_test", "Lipid Test")
        .field(FieldDescriptor::number("tcho", "TCHO"))
        .field(FieldDescriptor::number("tg", "TG"))
        .field(FieldDescriptor::number("hdl", "HDL").read_only())
        .field(FieldDescriptor::number("ldl", "LDL").read_only())
        .field(FieldDescriptor::text("comment", "Comment"))
        .rule(
            CalculationRule::formula(
                "hdl",
                Formula::multiply(Formula::field("tcho"), Formula::literal(0.35)),
            )
            .with_precision(2),
        )
        .rule(
            CalculationRule::formula(
                "ldl",
                Formula::sum(
                    Formula::sum(
                        Formula::field("tcho"),
                        Formula::divide(Formula::field("tg"), Formula::literal(5.0)),
                    ),
                    Formula::field("hdl"),
                ),
            )
            .with_precision(2),
        )
        .build()
        .expect("lipid test form is valid")
}

/// Two rules that feed each other and never agree: `a = b + 1`, `b = a + 1`.
#[allow(dead_code)]
pub fn create_oscillating_form() -> FormDefinition {
    FormDefinition::builder("cycle", "Cycle")
        .field(FieldDescriptor::number("a", "A"))
        .field(FieldDescriptor::number("b", "B"))
        .rule(CalculationRule::formula(
            "b",
            Formula::sum(Formula::field("a"), Formula::literal(1.0)),
        ))
        .rule(CalculationRule::formula(
            "a",
            Formula::sum(Formula::field("b"), Formula::literal(1.0)),
        ))
        .build()
        .expect("cycle form is valid")
}

/// The lipid scenario's starting record: `{tcho: 200, tg: 150}`.
#[allow(dead_code)]
pub fn create_lipid_record() -> FormRecord {
    FormRecord::new().with("tcho", 200.0).with("tg", 150.0)
}

/// A fetch future that resolves to `record`.
#[allow(dead_code)]
pub fn fetch_ok(
    record: FormRecord,
) -> impl Future<Output = Result<Option<FormRecord>, ServiceError>> {
    async move { Ok(Some(record)) }
}

/// A fetch future that always fails with a transport error.
#[allow(dead_code)]
pub fn fetch_failing() -> impl Future<Output = Result<Option<FormRecord>, ServiceError>> {
    async { Err(ServiceError::Transport("connection refused".to_string())) }
}
