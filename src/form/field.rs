use serde::{Deserialize, Serialize};

/// The widget a field asks the presentation layer for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Textarea,
    Select,
}

/// Static metadata describing how to render and label one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    /// Allowed values, in display order. Required iff `kind` is `Select`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Derived fields are shown but must not accept direct edits.
    #[serde(default)]
    pub read_only: bool,
}

impl FieldDescriptor {
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            options: Vec::new(),
            read_only: false,
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn number(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Number)
    }

    pub fn textarea(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Textarea)
    }

    pub fn select(name: &str, label: &str, options: &[&str]) -> Self {
        Self {
            options: options.iter().map(|o| o.to_string()).collect(),
            ..Self::new(name, label, FieldKind::Select)
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}
