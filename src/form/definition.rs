use super::{CalculationRule, FieldDescriptor, FieldKind};
use crate::ast::{Formula, MAX_DECIMALS};
use crate::error::DefinitionError;
use itertools::Itertools;

/// The complete, validated description of one form: its fields and its rules.
///
/// Rule declaration order is significant; it is the evaluation order of the
/// convergence loop.
#[derive(Debug, Clone)]
pub struct FormDefinition {
    pub id: String,
    pub title: String,
    fields: Vec<FieldDescriptor>,
    rules: Vec<CalculationRule>,
}

impl FormDefinition {
    pub fn builder(id: &str, title: &str) -> FormDefinitionBuilder {
        FormDefinitionBuilder::new(id, title)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn rules(&self) -> &[CalculationRule] {
        &self.rules
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The rule that writes `field`, if it is derived.
    pub fn rule_for(&self, field: &str) -> Option<&CalculationRule> {
        self.rules.iter().find(|r| r.target == field)
    }
}

/// Collects fields and rules, then validates them into a `FormDefinition`.
pub struct FormDefinitionBuilder {
    id: String,
    title: String,
    fields: Vec<FieldDescriptor>,
    rules: Vec<CalculationRule>,
}

impl FormDefinitionBuilder {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            fields: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn rule(mut self, rule: CalculationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = CalculationRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    pub fn build(self) -> Result<FormDefinition, DefinitionError> {
        if let Some(name) = self.fields.iter().map(|f| &f.name).duplicates().next() {
            return Err(DefinitionError::DuplicateField(name.clone()));
        }

        for field in &self.fields {
            match (field.kind, field.options.is_empty()) {
                (FieldKind::Select, true) => {
                    return Err(DefinitionError::MissingOptions(field.name.clone()));
                }
                (FieldKind::Select, false) | (_, true) => {}
                (_, false) => {
                    return Err(DefinitionError::UnexpectedOptions(field.name.clone()));
                }
            }
        }

        let declared = |name: &str| self.fields.iter().any(|f| f.name == name);
        for rule in &self.rules {
            if !declared(&rule.target) {
                return Err(DefinitionError::UnknownTarget(rule.target.clone()));
            }
            if rule.dependencies.is_empty() {
                return Err(DefinitionError::EmptyDependencies(rule.target.clone()));
            }
            // Triggers and formula inputs must be declared; custom bodies may read anything.
            let formula_inputs = rule
                .as_formula()
                .map(|formula| formula.referenced_fields())
                .unwrap_or_default();
            if let Some(unknown) = rule
                .dependencies
                .iter()
                .chain(&formula_inputs)
                .find(|name| !declared(name))
            {
                return Err(DefinitionError::UnknownField {
                    target: rule.target.clone(),
                    field: unknown.clone(),
                });
            }

            let decimals = rule
                .precision()
                .max(rule.as_formula().and_then(Formula::max_round_digits));
            if let Some(decimals) = decimals
                && decimals > MAX_DECIMALS
            {
                return Err(DefinitionError::DecimalsOutOfRange {
                    target: rule.target.clone(),
                    decimals,
                });
            }
        }

        Ok(FormDefinition {
            id: self.id,
            title: self.title,
            fields: self.fields,
            rules: self.rules,
        })
    }
}
