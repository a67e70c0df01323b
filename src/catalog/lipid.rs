use super::{FormVariant, fixed_or_empty, text_of};
use crate::ast::Formula;
use crate::data::FormRecord;
use crate::form::{CalculationRule, FieldDescriptor};

/// Lipid profile result entry.
///
/// HDL is estimated as 35% of total cholesterol, and LDL as
/// `TCHO + TG/5 + HDL`, both stored with two decimals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LipidProfile {
    pub tcho: Option<f64>,
    pub tg: Option<f64>,
    pub hdl: Option<f64>,
    pub ldl: Option<f64>,
    pub remarks: Option<String>,
}

impl FormVariant for LipidProfile {
    const ID: &'static str = "lipid_profile";
    const TITLE: &'static str = "Lipid Profile";

    fn descriptors() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::number("tcho", "Total Cholesterol (mg/dL)"),
            FieldDescriptor::number("tg", "Triglycerides (mg/dL)"),
            FieldDescriptor::number("hdl", "HDL Cholesterol (mg/dL)").read_only(),
            FieldDescriptor::number("ldl", "LDL Cholesterol (mg/dL)").read_only(),
            FieldDescriptor::textarea("remarks", "Remarks"),
        ]
    }

    fn rules() -> Vec<CalculationRule> {
        vec![
            CalculationRule::formula(
                "hdl",
                Formula::multiply(Formula::field("tcho"), Formula::literal(0.35)),
            )
            .with_precision(2),
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
        ]
    }

    fn from_record(record: &FormRecord) -> Self {
        Self {
            tcho: record.number("tcho"),
            tg: record.number("tg"),
            hdl: record.number("hdl"),
            ldl: record.number("ldl"),
            remarks: text_of(record, "remarks"),
        }
    }

    fn to_record(&self) -> FormRecord {
        let mut record = FormRecord::new()
            .with("tcho", self.tcho)
            .with("tg", self.tg)
            .with("remarks", self.remarks.clone());
        fixed_or_empty(&mut record, "hdl", self.hdl, 2);
        fixed_or_empty(&mut record, "ldl", self.ldl, 2);
        record
    }
}
