//! Form tree → JSON Schema document.
//!
//! The walk is depth-first and purely functional: every call builds the
//! object schema for one sibling list and hands it back to its parent, which
//! places it under a group (object) or a repeat (array of objects).
//!
//! Document skeleton:
//!
//! ```text
//! { "$schema": draft-07, "type": "object",
//!   "properties": { "value": { "type": "array", "items": <form object> } } }
//! ```

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::TransformError;
use crate::form::{ChoiceTable, FormDefinition, FormNode, NodeKind};
use crate::mapping::map_field;
use crate::schema::{Schema, DRAFT_07};

// ————————————————————————————————————————————————————————————————————————————
// FRONT API
// ————————————————————————————————————————————————————————————————————————————

/// Build the JSON Schema document for a form tree.
pub fn generate_schema(roots: &[FormNode], choices: &ChoiceTable) -> Result<Value, TransformError> {
    Ok(build_document(roots, choices)?.into_value()?)
}

pub fn generate_from_definition(form: &FormDefinition) -> Result<Value, TransformError> {
    generate_schema(&form.children, &form.choices)
}

/// Typed variant of [`generate_schema`].
pub fn build_document(roots: &[FormNode], choices: &ChoiceTable) -> Result<Schema, TransformError> {
    let items = build_object(roots, choices, "")?;
    let mut properties = IndexMap::new();
    properties.insert("value".to_string(), Schema::array(items));
    Ok(Schema::object(properties, Vec::new()).with_dialect(DRAFT_07))
}

// ————————————————————————————————————————————————————————————————————————————
// WALK
// ————————————————————————————————————————————————————————————————————————————

/// Object schema for one list of sibling nodes. `path` is the slash-joined
/// name path of the parent, used in errors and logs.
fn build_object(nodes: &[FormNode], choices: &ChoiceTable, path: &str) -> Result<Schema, TransformError> {
    let mut properties: IndexMap<String, Schema> = IndexMap::new();
    let mut required: Vec<String> = Vec::new();

    for node in nodes {
        let Some(name) = node.name() else {
            tracing::debug!(parent = path, ty = %node.declared_type, "skipping unnamed node");
            continue;
        };
        let node_path = format!("{path}/{name}");

        let (fragment, is_required) = match node.kind() {
            NodeKind::Group => {
                let children = children_of(node, NodeKind::Group, &node_path)?;
                (build_object(children, choices, &node_path)?, false)
            }
            NodeKind::Repeat => {
                let children = children_of(node, NodeKind::Repeat, &node_path)?;
                (Schema::array(build_object(children, choices, &node_path)?), false)
            }
            NodeKind::Field => field_fragment(node, choices, &node_path),
        };

        if properties.insert(name.to_string(), fragment).is_some() {
            tracing::warn!(path = %node_path, "duplicate sibling name; later node replaces earlier one");
        }
        // The last node under a name decides its requiredness.
        if !is_required {
            required.retain(|r| r != name);
        } else if !required.iter().any(|r| r == name) {
            required.push(name.to_string());
        }
    }

    Ok(Schema::object(properties, required))
}

fn children_of<'a>(node: &'a FormNode, kind: NodeKind, path: &str) -> Result<&'a [FormNode], TransformError> {
    node.children
        .as_deref()
        .ok_or_else(|| TransformError::MissingChildren { kind, path: path.to_string() })
}

/// Mapped fragment for a leaf field, widened to accept `null` unless required.
fn field_fragment(node: &FormNode, choices: &ChoiceTable, path: &str) -> (Schema, bool) {
    if node.children.is_some() {
        tracing::debug!(path, "ignoring children of a field node");
    }
    if node.is_conditional() {
        // Relevance is detected but not represented; only `bind.required` shapes the schema.
        tracing::trace!(path, "relevance expression present; not represented");
    }
    let fragment = map_field(node, choices);
    if node.is_required() {
        (fragment, true)
    } else {
        (fragment.nullable(), false)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
