//! The clinic's derived-field forms.
//!
//! Each form is a [`FormVariant`]: its descriptors and calculation rules, plus a
//! strongly-typed record shape that converts to and from the flat wire record.

pub mod consultation;
pub mod kidney;
pub mod lipid;

use crate::ast::FieldValue;
use crate::data::FormRecord;
use crate::error::DefinitionError;
use crate::form::{CalculationRule, FieldDescriptor, FormDefinition};

pub use consultation::ConsultationVitals;
pub use kidney::KidneyFunction;
pub use lipid::LipidProfile;

/// Trait implemented by each catalog form.
pub trait FormVariant: Sized {
    /// Unique identifier for this form (e.g., "lipid_profile").
    const ID: &'static str;

    /// Human-readable title (e.g., "Lipid Profile").
    const TITLE: &'static str;

    /// The fields, in display order.
    fn descriptors() -> Vec<FieldDescriptor>;

    /// The calculation rules, in evaluation order.
    fn rules() -> Vec<CalculationRule>;

    /// Reads the typed shape out of a wire record. Unparseable values read as absent.
    fn from_record(record: &FormRecord) -> Self;

    /// Writes the typed shape as a wire record.
    fn to_record(&self) -> FormRecord;

    fn definition() -> Result<FormDefinition, DefinitionError> {
        FormDefinition::builder(Self::ID, Self::TITLE)
            .fields(Self::descriptors())
            .rules(Self::rules())
            .build()
    }
}

/// Return all catalog form definitions.
pub fn all_forms() -> Result<Vec<FormDefinition>, DefinitionError> {
    Ok(vec![
        LipidProfile::definition()?,
        KidneyFunction::definition()?,
        ConsultationVitals::definition()?,
    ])
}

/// Look up a catalog form by ID.
pub fn get_form(id: &str) -> Result<Option<FormDefinition>, DefinitionError> {
    Ok(all_forms()?.into_iter().find(|f| f.id == id))
}

/// Non-blank text content of a field.
fn text_of(record: &FormRecord, name: &str) -> Option<String> {
    let value = record.get(name);
    (!value.is_empty()).then(|| value.to_string())
}

/// Writes a number as fixed-decimal text, or clears the field.
fn fixed_or_empty(record: &mut FormRecord, name: &str, value: Option<f64>, decimals: u32) {
    match value {
        Some(v) => record.set(name, FieldValue::fixed(v, decimals)),
        None => record.set(name, FieldValue::Empty),
    }
}
