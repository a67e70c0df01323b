//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the keisan crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use keisan::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let form_json = std::fs::read_to_string("path/to/form.json")?;
//! let definition = RawForm::from_json(&form_json)?.into_form()?;
//!
//! let engine = FormEngine::new(definition);
//! let report = engine.apply_edit_with_report("weight_kg", "72");
//! for update in &report.updates {
//!     println!("{} -> {}", update.field, update.value);
//! }
//! # Ok(())
//! # }
//! ```

// Engine
pub use crate::config::EngineConfig;
pub use crate::engine::{FieldBinding, FormEngine, LoadState};
pub use crate::evaluator::{Convergence, DerivedUpdate, Recalculator};

// Form definitions
pub use crate::ast::{FieldValue, Formula};
pub use crate::form::{
    CalculationRule, FieldDescriptor, FieldKind, FormDefinition, IntoForm, RawForm,
};

// Records
pub use crate::data::{Edit, EditScript, FormRecord};

// Catalog
pub use crate::catalog::{ConsultationVitals, FormVariant, KidneyFunction, LipidProfile};

// Services
pub use crate::service::{
    CredentialProvider, InMemoryRecordService, JsonFileRecordService, RecordService,
    StaticCredential,
};

// Error types
pub use crate::error::{DefinitionError, ServiceError, SubmitError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
