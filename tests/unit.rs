//! Unit tests for values, formulas, definitions and configuration.
mod common;
use common::*;
use keisan::ast::DisplayFormula;
use keisan::error::{ConfigError, EvaluationError};
use keisan::evaluator::FormulaEngine;
use keisan::prelude::*;
use keisan::trace::TraceFormatter;

// --- FieldValue ---

#[test]
fn test_field_value_display() {
    assert_eq!(FieldValue::Number(200.0).to_string(), "200");
    assert_eq!(FieldValue::Number(0.35).to_string(), "0.35");
    assert_eq!(FieldValue::Number(-4.0).to_string(), "-4");
    assert_eq!(FieldValue::from("70.00").to_string(), "70.00");
    assert_eq!(FieldValue::Empty.to_string(), "");
}

#[test]
fn test_field_value_from_raw_input() {
    assert_eq!(FieldValue::from_raw(""), FieldValue::Empty);
    assert_eq!(FieldValue::from_raw("12.5"), FieldValue::Text("12.5".to_string()));
    assert_eq!(FieldValue::from_raw(" "), FieldValue::Text(" ".to_string()));
}

#[test]
fn test_field_value_numeric_view() {
    assert_eq!(FieldValue::Number(3.5).as_number(), Some(3.5));
    assert_eq!(FieldValue::from(" 42 ").as_number(), Some(42.0));
    assert_eq!(FieldValue::from("70.00").as_number(), Some(70.0));
    assert_eq!(FieldValue::from("abc").as_number(), None);
    assert_eq!(FieldValue::from("NaN").as_number(), None);
    assert_eq!(FieldValue::from("inf").as_number(), None);
    assert_eq!(FieldValue::Empty.as_number(), None);
}

#[test]
fn test_field_value_fixed_decimals() {
    assert_eq!(FieldValue::fixed(70.0, 2), FieldValue::from("70.00"));
    assert_eq!(FieldValue::fixed(22.857142, 1), FieldValue::from("22.9"));
    assert_eq!(FieldValue::fixed(3.0, 0), FieldValue::from("3"));
}

#[test]
fn test_field_value_fixed_rounds_ties_away_from_zero() {
    assert_eq!(FieldValue::fixed(300.125, 2), FieldValue::from("300.13"));
    assert_eq!(FieldValue::fixed(-2.5, 0), FieldValue::from("-3"));
    assert_eq!(FieldValue::fixed(0.125, 2), FieldValue::from("0.13"));
}

#[test]
fn test_field_value_fixed_caps_decimals() {
    assert_eq!(FieldValue::fixed(1.0, 40), FieldValue::from("1.000000000000000"));
}

#[test]
fn test_nan_values_compare_equal() {
    assert_eq!(FieldValue::Number(f64::NAN), FieldValue::Number(f64::NAN));
    assert_ne!(FieldValue::Number(1.0), FieldValue::from("1"));
}

#[test]
fn test_field_value_json_shape() {
    let values: Vec<FieldValue> = serde_json::from_str(r#"[200, "70.00", null]"#).unwrap();
    assert_eq!(
        values,
        vec![
            FieldValue::Number(200.0),
            FieldValue::from("70.00"),
            FieldValue::Empty
        ]
    );
    assert_eq!(serde_json::to_string(&values).unwrap(), r#"[200.0,"70.00",null]"#);
}

#[test]
fn test_field_value_from_option() {
    assert_eq!(FieldValue::from(Some(1.5)), FieldValue::Number(1.5));
    assert_eq!(FieldValue::from(None::<f64>), FieldValue::Empty);
}

// --- FormRecord ---

#[test]
fn test_record_reads_missing_fields_as_empty() {
    let record = create_lipid_record();
    assert_eq!(record.get("hdl"), &FieldValue::Empty);
    assert_eq!(record.number("tcho"), Some(200.0));
    assert!(!record.contains("hdl"));
}

#[test]
fn test_record_json_is_a_flat_object() {
    let record: FormRecord =
        serde_json::from_str(r#"{"tcho": 200, "hdl": "70.00", "remarks": null}"#).unwrap();
    assert_eq!(record.len(), 3);
    assert_eq!(record.get("hdl"), &FieldValue::from("70.00"));
    assert!(record.get("remarks").is_empty());

    let value = serde_json::to_value(&create_lipid_record()).unwrap();
    assert_eq!(value, serde_json::json!({"tcho": 200.0, "tg": 150.0}));
}

#[test]
fn test_record_sorted_and_changed_fields() {
    let before = FormRecord::new().with("b", 1.0).with("a", 2.0);
    let after = before.clone().with("b", 5.0).with("c", "x");

    let names: Vec<&str> = after.sorted().iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(
        before.changed_fields(&after),
        vec!["b".to_string(), "c".to_string()]
    );
}

#[test]
fn test_record_from_iterator() {
    let record: FormRecord = [("tcho", 200.0), ("tg", 150.0)].into_iter().collect();
    assert_eq!(record, create_lipid_record());
}

// --- Formula evaluation ---

#[test]
fn test_formula_referenced_fields_in_first_seen_order() {
    let formula = Formula::sum(
        Formula::sum(
            Formula::field("tcho"),
            Formula::divide(Formula::field("tg"), Formula::literal(5.0)),
        ),
        Formula::multiply(Formula::field("tcho"), Formula::field("hdl")),
    );
    assert_eq!(formula.referenced_fields(), vec!["tcho", "tg", "hdl"]);
}

#[test]
fn test_formula_engine_reports_missing_and_non_numeric_inputs() {
    let formula = Formula::multiply(Formula::field("tcho"), Formula::literal(0.35));

    let empty = FormRecord::new();
    let err = FormulaEngine::new(&formula, &empty).evaluate().unwrap_err();
    assert_eq!(err, EvaluationError::InputNotFound("tcho".to_string()));

    let garbage = FormRecord::new().with("tcho", "high");
    let err = FormulaEngine::new(&formula, &garbage).evaluate().unwrap_err();
    assert_eq!(
        err,
        EvaluationError::NotNumeric {
            field: "tcho".to_string(),
            found: "high".to_string()
        }
    );
}

#[test]
fn test_formula_engine_rejects_division_by_zero() {
    let formula = Formula::divide(Formula::field("bun"), Formula::field("creatinine"));
    let record = FormRecord::new().with("bun", 14.0).with("creatinine", 0.0);

    let err = FormulaEngine::new(&formula, &record).evaluate().unwrap_err();
    assert!(matches!(err, EvaluationError::NonFinite { .. }));
}

#[test]
fn test_formula_functions() {
    let record = FormRecord::new().with("a", -3.0).with("b", 2.345);

    let cases = [
        (Formula::Abs(Box::new(Formula::field("a"))), 3.0),
        (
            Formula::Min(Box::new(Formula::field("a")), Box::new(Formula::field("b"))),
            -3.0,
        ),
        (
            Formula::Max(Box::new(Formula::field("a")), Box::new(Formula::field("b"))),
            2.345,
        ),
        (Formula::field("b").round(0), 2.0),
    ];
    for (formula, expected) in cases {
        let trace = FormulaEngine::new(&formula, &record).evaluate().unwrap();
        assert_eq!(trace.get_outcome(), expected, "{:?}", formula);
    }
}

#[test]
fn test_round_matches_fixed_decimals_on_ties() {
    let record = FormRecord::new().with("ldl", 300.125);
    let formula = Formula::field("ldl").round(2);

    let trace = FormulaEngine::new(&formula, &record).evaluate().unwrap();
    assert_eq!(trace.get_outcome(), 300.13);
    assert_eq!(
        FieldValue::fixed(300.125, 2),
        FieldValue::fixed(trace.get_outcome(), 2)
    );
}

#[test]
fn test_round_rejects_out_of_range_digits() {
    let record = FormRecord::new();
    for digits in [16, 400, u32::MAX] {
        let formula = Formula::literal(123.456).round(digits);
        let err = FormulaEngine::new(&formula, &record).evaluate().unwrap_err();
        assert_eq!(err, EvaluationError::DigitsOutOfRange(digits));
    }

    let formula = Formula::literal(123.456).round(15);
    let trace = FormulaEngine::new(&formula, &record).evaluate().unwrap();
    assert!((trace.get_outcome() - 123.456).abs() < 1e-9);
}

// --- Trace formatting ---

fn explain(formula: &Formula, record: &FormRecord) -> String {
    let trace = FormulaEngine::new(formula, record).evaluate().unwrap();
    TraceFormatter::format_trace(&trace)
}

#[test]
fn test_trace_formatter_keeps_needed_parentheses() {
    let record = FormRecord::new().with("a", 10.0).with("b", 4.0).with("c", 1.0);

    let right_nested = Formula::subtract(
        Formula::field("a"),
        Formula::subtract(Formula::field("b"), Formula::field("c")),
    );
    assert_eq!(
        explain(&right_nested, &record),
        "$a (was 10) - ($b (was 4) - $c (was 1))"
    );

    let left_nested = Formula::subtract(
        Formula::subtract(Formula::field("a"), Formula::field("b")),
        Formula::field("c"),
    );
    assert_eq!(
        explain(&left_nested, &record),
        "$a (was 10) - $b (was 4) - $c (was 1)"
    );

    let grouped_sum = Formula::multiply(
        Formula::sum(Formula::field("a"), Formula::field("b")),
        Formula::literal(2.0),
    );
    assert_eq!(explain(&grouped_sum, &record), "($a (was 10) + $b (was 4)) * 2");
}

#[test]
fn test_trace_formatter_renders_calls() {
    let record = FormRecord::new().with("x", 2.5);
    let formula = Formula::Abs(Box::new(Formula::field("x").round(1)));
    assert_eq!(explain(&formula, &record), "ABS(ROUND($x (was 2.5), 1))");
}

#[test]
fn test_display_formula_tree() {
    let formula = Formula::multiply(Formula::field("tcho"), Formula::literal(0.35));
    let rendered = DisplayFormula { formula: &formula }.to_string();
    assert_eq!(rendered, "└── *\n    ├── Field: $tcho\n    └── Literal: 0.35\n");
}

#[test]
fn test_formula_json_is_externally_tagged() {
    let json = r#"{"Multiply": [{"Field": "tcho"}, {"Literal": 0.35}]}"#;
    let formula: Formula = serde_json::from_str(json).unwrap();
    assert_eq!(
        formula,
        Formula::multiply(Formula::field("tcho"), Formula::literal(0.35))
    );
}

// --- Definitions ---

#[test]
fn test_definition_rejects_duplicate_fields() {
    let err = FormDefinition::builder("dup", "Dup")
        .field(FieldDescriptor::number("tcho", "TCHO"))
        .field(FieldDescriptor::text("tcho", "Again"))
        .build()
        .unwrap_err();
    assert_eq!(err, DefinitionError::DuplicateField("tcho".to_string()));
}

#[test]
fn test_definition_checks_select_options() {
    let err = FormDefinition::builder("sel", "Sel")
        .field(FieldDescriptor::select("visit_type", "Visit", &[]))
        .build()
        .unwrap_err();
    assert_eq!(err, DefinitionError::MissingOptions("visit_type".to_string()));

    let mut text = FieldDescriptor::text("complaint", "Complaint");
    text.options = vec!["a".to_string()];
    let err = FormDefinition::builder("sel", "Sel")
        .field(text)
        .build()
        .unwrap_err();
    assert_eq!(err, DefinitionError::UnexpectedOptions("complaint".to_string()));
}

#[test]
fn test_definition_rejects_rules_without_dependencies() {
    let err = FormDefinition::builder("const", "Const")
        .field(FieldDescriptor::number("k", "K"))
        .rule(CalculationRule::formula("k", Formula::literal(1.0)))
        .build()
        .unwrap_err();
    assert_eq!(err, DefinitionError::EmptyDependencies("k".to_string()));
}

#[test]
fn test_definition_rejects_formulas_reading_undeclared_fields() {
    let err = FormDefinition::builder("hdl", "HDL")
        .field(FieldDescriptor::number("hdl", "HDL"))
        .rule(CalculationRule::formula(
            "hdl",
            Formula::multiply(Formula::field("tcho"), Formula::literal(0.35)),
        ))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        DefinitionError::UnknownField {
            target: "hdl".to_string(),
            field: "tcho".to_string()
        }
    );
}

#[test]
fn test_definition_rejects_undeclared_targets_and_triggers() {
    let err = FormDefinition::builder("typo", "Typo")
        .field(FieldDescriptor::number("tcho", "TCHO"))
        .field(FieldDescriptor::number("hdl", "HDL"))
        .rule(CalculationRule::formula(
            "hld",
            Formula::multiply(Formula::field("tcho"), Formula::literal(0.35)),
        ))
        .build()
        .unwrap_err();
    assert_eq!(err, DefinitionError::UnknownTarget("hld".to_string()));

    let err = FormDefinition::builder("typo", "Typo")
        .field(FieldDescriptor::number("tcho", "TCHO"))
        .field(FieldDescriptor::number("hdl", "HDL"))
        .rule(
            CalculationRule::formula(
                "hdl",
                Formula::multiply(Formula::field("tcho"), Formula::literal(0.35)),
            )
            .with_dependencies(&["tcho", "lab_cod"]),
        )
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        DefinitionError::UnknownField {
            target: "hdl".to_string(),
            field: "lab_cod".to_string()
        }
    );

    let err = FormDefinition::builder("typo", "Typo")
        .field(FieldDescriptor::number("hdl", "HDL"))
        .field(FieldDescriptor::text("flag", "Flag"))
        .rule(CalculationRule::custom("flag", &["hdl_x"], |_| None))
        .build()
        .unwrap_err();
    assert!(matches!(err, DefinitionError::UnknownField { .. }));
}

#[test]
fn test_definition_rejects_out_of_range_decimals() {
    let hdl_form = |rule: CalculationRule| {
        FormDefinition::builder("hdl", "HDL")
            .field(FieldDescriptor::number("tcho", "TCHO"))
            .field(FieldDescriptor::number("hdl", "HDL"))
            .rule(rule)
            .build()
    };
    let hdl = || Formula::multiply(Formula::field("tcho"), Formula::literal(0.35));

    let err = hdl_form(CalculationRule::formula("hdl", hdl()).with_precision(16)).unwrap_err();
    assert_eq!(
        err,
        DefinitionError::DecimalsOutOfRange {
            target: "hdl".to_string(),
            decimals: 16
        }
    );

    let err = hdl_form(CalculationRule::formula("hdl", hdl().round(u32::MAX))).unwrap_err();
    assert_eq!(
        err,
        DefinitionError::DecimalsOutOfRange {
            target: "hdl".to_string(),
            decimals: u32::MAX
        }
    );

    let widest = CalculationRule::formula("hdl", hdl().round(15)).with_precision(15);
    assert!(hdl_form(widest).is_ok());
}

#[test]
fn test_definition_lookups() {
    let form = create_lipid_form();
    assert_eq!(form.field("hdl").map(|f| f.read_only), Some(true));
    assert!(form.field("missing").is_none());
    assert_eq!(form.rule_for("ldl").map(|r| r.precision()), Some(Some(2)));
    assert!(form.rule_for("tcho").is_none());
    assert_eq!(
        form.rule_for("ldl").unwrap().dependencies,
        vec!["tcho", "tg", "hdl"]
    );
}

#[test]
fn test_rule_dependencies_can_be_overridden() {
    let rule = CalculationRule::formula(
        "hdl",
        Formula::multiply(Formula::field("tcho"), Formula::literal(0.35)),
    )
    .with_dependencies(&["tcho", "lab_code"]);
    assert!(rule.depends_on("lab_code"));
    assert!(!rule.depends_on("hdl"));
}

#[test]
fn test_field_descriptor_json() {
    let json = r#"{"name": "visit_type", "label": "Visit", "kind": "select", "options": ["new", "review"]}"#;
    let field: FieldDescriptor = serde_json::from_str(json).unwrap();
    assert_eq!(field.kind, FieldKind::Select);
    assert_eq!(field.options, vec!["new", "review"]);
    assert!(!field.read_only);
}

// --- Errors ---

#[test]
fn test_error_messages() {
    let err = DefinitionError::UnknownField {
        target: "ldl".to_string(),
        field: "tg".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "Rule for 'ldl' reads field 'tg', which the form does not declare"
    );

    let rejected = ServiceError::Rejected {
        status: 422,
        message: Some("HDL out of range".to_string()),
    };
    assert_eq!(rejected.user_message(), Some("HDL out of range"));
    assert_eq!(ServiceError::Transport("down".to_string()).user_message(), None);
    assert!(
        ServiceError::NotFound {
            identifier: "p".to_string()
        }
        .is_not_found()
    );

    assert_eq!(
        SubmitError::NoIdentifier.user_message(),
        "the form has no record identifier to save under"
    );
}

// --- Config ---

#[test]
fn test_config_defaults() {
    let config = EngineConfig::from_json("{}").unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.pass_multiplier, 3);
    assert_eq!(config.save_failure_message, "failed to save");
}

#[test]
fn test_config_overrides_and_validation() {
    let config = EngineConfig::from_json(r#"{"pass_multiplier": 5}"#).unwrap();
    assert_eq!(config.pass_multiplier, 5);
    assert_eq!(config.save_failure_message, "failed to save");

    let err = EngineConfig::from_json(r#"{"pass_multiplier": 0}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = EngineConfig::from_json(r#"{"save_failure_message": "  "}"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let err = EngineConfig::from_json("not json").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_config_from_missing_file() {
    let err = EngineConfig::from_file("/nonexistent/keisan.json").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
