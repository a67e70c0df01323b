use crate::ast::FieldValue;
use ahash::AHashMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

static EMPTY: FieldValue = FieldValue::Empty;

/// The mutable state of one form instance: field name to value.
///
/// On the wire this is a flat JSON object. A missing key and an explicit
/// `null` both read as [`FieldValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormRecord {
    fields: AHashMap<String, FieldValue>,
}

impl FormRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `name`, or `Empty` when absent.
    pub fn get(&self, name: &str) -> &FieldValue {
        self.fields.get(name).unwrap_or(&EMPTY)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).as_number()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<FieldValue>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    /// Entries ordered by field name, for stable display and diffs.
    pub fn sorted(&self) -> Vec<(&String, &FieldValue)> {
        self.fields.iter().sorted_by(|a, b| a.0.cmp(b.0)).collect()
    }

    /// Names of fields whose value differs between `self` and `other`.
    pub fn changed_fields(&self, other: &FormRecord) -> Vec<String> {
        self.fields
            .keys()
            .chain(other.fields.keys())
            .unique()
            .filter(|name| self.get(name) != other.get(name))
            .sorted()
            .cloned()
            .collect()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FormRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
