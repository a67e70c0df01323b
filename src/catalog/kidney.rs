use super::{FormVariant, fixed_or_empty};
use crate::ast::Formula;
use crate::data::FormRecord;
use crate::form::{CalculationRule, FieldDescriptor};

/// Normal anion gap (mmol/L) used to estimate bicarbonate from the electrolytes.
const NORMAL_ANION_GAP: f64 = 12.0;

/// Converts serum urea (mg/dL) to blood urea nitrogen (mg/dL).
const UREA_TO_BUN: f64 = 0.467;

/// Kidney function test (renal panel) result entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KidneyFunction {
    pub urea: Option<f64>,
    pub creatinine: Option<f64>,
    pub sodium: Option<f64>,
    pub potassium: Option<f64>,
    pub chloride: Option<f64>,
    pub bun: Option<f64>,
    pub bun_creatinine_ratio: Option<f64>,
    pub hco3: Option<f64>,
}

impl FormVariant for KidneyFunction {
    const ID: &'static str = "kidney_function";
    const TITLE: &'static str = "Kidney Function Test";

    fn descriptors() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::number("urea", "Urea (mg/dL)"),
            FieldDescriptor::number("creatinine", "Creatinine (mg/dL)"),
            FieldDescriptor::number("sodium", "Sodium (mmol/L)"),
            FieldDescriptor::number("potassium", "Potassium (mmol/L)"),
            FieldDescriptor::number("chloride", "Chloride (mmol/L)"),
            FieldDescriptor::number("bun", "BUN (mg/dL)").read_only(),
            FieldDescriptor::number("bun_creatinine_ratio", "BUN/Creatinine Ratio").read_only(),
            FieldDescriptor::number("hco3", "Bicarbonate (mmol/L)").read_only(),
        ]
    }

    fn rules() -> Vec<CalculationRule> {
        vec![
            CalculationRule::formula(
                "bun",
                Formula::multiply(Formula::field("urea"), Formula::literal(UREA_TO_BUN)),
            )
            .with_precision(2),
            CalculationRule::formula(
                "bun_creatinine_ratio",
                Formula::divide(Formula::field("bun"), Formula::field("creatinine")),
            )
            .with_precision(2),
            CalculationRule::formula(
                "hco3",
                Formula::subtract(
                    Formula::subtract(Formula::field("sodium"), Formula::field("chloride")),
                    Formula::literal(NORMAL_ANION_GAP),
                ),
            )
            .with_precision(2),
        ]
    }

    fn from_record(record: &FormRecord) -> Self {
        Self {
            urea: record.number("urea"),
            creatinine: record.number("creatinine"),
            sodium: record.number("sodium"),
            potassium: record.number("potassium"),
            chloride: record.number("chloride"),
            bun: record.number("bun"),
            bun_creatinine_ratio: record.number("bun_creatinine_ratio"),
            hco3: record.number("hco3"),
        }
    }

    fn to_record(&self) -> FormRecord {
        let mut record = FormRecord::new()
            .with("urea", self.urea)
            .with("creatinine", self.creatinine)
            .with("sodium", self.sodium)
            .with("potassium", self.potassium)
            .with("chloride", self.chloride);
        fixed_or_empty(&mut record, "bun", self.bun, 2);
        fixed_or_empty(&mut record, "bun_creatinine_ratio", self.bun_creatinine_ratio, 2);
        fixed_or_empty(&mut record, "hco3", self.hco3, 2);
        record
    }
}
