//! Convert a parsed form definition (fields, groups, repeats and choice
//! lists) into a draft-07 JSON Schema describing one batch of submissions.
//!
//! ```
//! use serde_json::json;
//! use xlsform_schema::{generate_from_definition, FormDefinition};
//!
//! let form: FormDefinition = serde_json::from_value(json!({
//!     "children": [{"type": "integer", "name": "age", "bind": {"required": "yes"}}]
//! })).unwrap();
//! let schema = generate_from_definition(&form).unwrap();
//! assert_eq!(schema["properties"]["value"]["items"]["required"], json!(["age"]));
//! ```
pub mod error;
pub mod form;
pub mod mapping;
pub mod path_de;
pub mod schema;
pub mod transform;

pub use error::{InputError, TransformError};
pub use form::{Choice, ChoiceTable, FormDefinition, FormNode, NodeKind};
pub use mapping::{map_field, DeclaredType, FieldType};
pub use schema::Schema;
pub use transform::{build_document, generate_from_definition, generate_schema};
