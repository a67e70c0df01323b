//! # Keisan - Derived-Field Form Engine
//!
//! **Keisan** drives data-entry forms whose fields depend on each other. A form
//! is a list of field descriptors plus a list of calculation rules; every edit
//! re-evaluates the rules that depend on the edited field, and chains through
//! derived fields until the record reaches a fixed point.
//!
//! ## Core Workflow
//!
//! 1.  **Describe the form**: build a `FormDefinition` from `FieldDescriptor`s and
//!     `CalculationRule`s, take one from the [`catalog`], or load one from JSON
//!     through [`form::RawForm`].
//! 2.  **Load**: create a `FormEngine` and `initialize` it for a record
//!     identifier. A missing or unreadable record starts the form empty.
//! 3.  **Edit**: `apply_edit` stores the raw input and propagates the rules.
//! 4.  **Save**: `submit` hands the whole record to the caller's save function;
//!     failures come back with a message fit for the user.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use keisan::prelude::*;
//!
//! fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let service = InMemoryRecordService::new();
//!     let engine = FormEngine::new(LipidProfile::definition()?);
//!
//!     tokio_test::block_on(engine.load_from(&service, "patient-1042"));
//!
//!     engine.apply_edit("tg", "150");
//!     let record = engine.apply_edit("tcho", "200");
//!     assert_eq!(record.get("hdl"), &FieldValue::from("70.00"));
//!     assert_eq!(record.get("ldl"), &FieldValue::from("300.00"));
//!
//!     if let Some(why) = engine.explain("ldl") {
//!         println!("{}", why);
//!     }
//!
//!     tokio_test::block_on(engine.save_to(&service))?;
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod catalog;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod form;
pub mod prelude;
pub mod service;
pub mod trace;
