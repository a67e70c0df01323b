use super::FormRecord;
use serde::{Deserialize, Serialize};
use std::fs;

/// One user edit: the field that changed and its raw widget input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Edit {
    pub field: String,
    pub value: String,
}

/// A replayable sequence of edits, matching the JSON format the CLI reads.
///
/// ```json
/// { "initial": { "tg": 150 }, "edits": [ { "field": "tcho", "value": "200" } ] }
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EditScript {
    /// Values merged over the loaded record before the first edit.
    #[serde(default)]
    pub initial: FormRecord,
    pub edits: Vec<Edit>,
}

impl EditScript {
    /// Load an edit script from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let script = serde_json::from_str(&content)?;
        Ok(script)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
