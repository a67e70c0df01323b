use super::{CalculationRule, FieldDescriptor, FormDefinition};
use crate::ast::Formula;
use crate::error::DefinitionError;
use serde::Deserialize;

/// A trait for custom form formats that can be converted into a `FormDefinition`.
///
/// Implement it on your own configuration structs to feed forms kept in any
/// format (a CMS export, a YAML file) into the engine. [`RawForm`] is the
/// implementation for the crate's own JSON format.
pub trait IntoForm {
    /// Consumes the object and converts it into a validated form definition.
    fn into_form(self) -> Result<FormDefinition, DefinitionError>;
}

/// JSON shape of a form definition.
///
/// ```json
/// {
///   "id": "lipid_profile",
///   "title": "Lipid Profile",
///   "fields": [ { "name": "tcho", "label": "Total cholesterol", "kind": "number" } ],
///   "rules": [ { "target": "hdl", "formula": { "Field": "tcho" }, "precision": 2 } ]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RawForm {
    pub id: String,
    pub title: String,
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
pub struct RawRule {
    pub target: String,
    pub formula: Formula,
    /// Overrides the trigger set; defaults to the fields the formula reads.
    #[serde(default)]
    pub dependencies: Option<Vec<String>>,
    #[serde(default)]
    pub precision: Option<u32>,
}

impl RawForm {
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        serde_json::from_str(json).map_err(|e| DefinitionError::JsonParseError(e.to_string()))
    }
}

impl IntoForm for RawForm {
    fn into_form(self) -> Result<FormDefinition, DefinitionError> {
        let rules = self.rules.into_iter().map(|raw| {
            let mut rule = CalculationRule::formula(&raw.target, raw.formula);
            if let Some(decimals) = raw.precision {
                rule = rule.with_precision(decimals);
            }
            if let Some(dependencies) = raw.dependencies {
                rule.dependencies = dependencies;
            }
            rule
        });

        FormDefinition::builder(&self.id, &self.title)
            .fields(self.fields)
            .rules(rules)
            .build()
    }
}
