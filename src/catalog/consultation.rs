use super::{FormVariant, fixed_or_empty, text_of};
use crate::ast::Formula;
use crate::data::FormRecord;
use crate::form::{CalculationRule, FieldDescriptor};

pub const VISIT_TYPES: &[&str] = &["new", "follow_up", "review", "emergency"];

/// Consultation entry with vital signs. BMI is derived from weight and height.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsultationVitals {
    pub visit_type: Option<String>,
    pub complaint: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub bmi: Option<f64>,
    pub notes: Option<String>,
}

impl FormVariant for ConsultationVitals {
    const ID: &'static str = "consultation";
    const TITLE: &'static str = "Consultation";

    fn descriptors() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::select("visit_type", "Visit Type", VISIT_TYPES),
            FieldDescriptor::text("complaint", "Presenting Complaint"),
            FieldDescriptor::number("weight_kg", "Weight (kg)"),
            FieldDescriptor::number("height_cm", "Height (cm)"),
            FieldDescriptor::number("bmi", "BMI (kg/m²)").read_only(),
            FieldDescriptor::textarea("notes", "Clinical Notes"),
        ]
    }

    fn rules() -> Vec<CalculationRule> {
        let height_m = || Formula::divide(Formula::field("height_cm"), Formula::literal(100.0));
        vec![
            CalculationRule::formula(
                "bmi",
                Formula::divide(
                    Formula::field("weight_kg"),
                    Formula::multiply(height_m(), height_m()),
                ),
            )
            .with_precision(1),
        ]
    }

    fn from_record(record: &FormRecord) -> Self {
        Self {
            visit_type: text_of(record, "visit_type"),
            complaint: text_of(record, "complaint"),
            weight_kg: record.number("weight_kg"),
            height_cm: record.number("height_cm"),
            bmi: record.number("bmi"),
            notes: text_of(record, "notes"),
        }
    }

    fn to_record(&self) -> FormRecord {
        let mut record = FormRecord::new()
            .with("visit_type", self.visit_type.clone())
            .with("complaint", self.complaint.clone())
            .with("weight_kg", self.weight_kg)
            .with("height_cm", self.height_cm)
            .with("notes", self.notes.clone());
        fixed_or_empty(&mut record, "bmi", self.bmi, 1);
        record
    }
}
