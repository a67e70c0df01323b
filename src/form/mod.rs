//! Form definitions: field descriptors, calculation rules and their JSON format.

pub mod conversion;
pub mod definition;
pub mod field;
pub mod rule;

pub use conversion::*;
pub use definition::*;
pub use field::*;
pub use rule::*;
