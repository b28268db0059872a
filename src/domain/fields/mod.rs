//! Fields module - definitions, extraction contract and value validation.

mod definition;
mod extraction;
mod validation;

pub use definition::{FieldDefinition, FieldType};
pub use extraction::{build_extraction_prompt, parse_extraction_reply, Extraction, INVALID, NOT_PROVIDED};
pub use validation::{is_valid_value, validate_value, InvalidValue};
