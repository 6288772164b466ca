use thiserror::Error;

use crate::form::NodeKind;

/// Failure of the tree-to-schema transformation. Only structural contract
/// violations end up here; type information never fails.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("{kind} `{path}` has no `children` sequence")]
    MissingChildren { kind: NodeKind, path: String },

    #[error("failed to encode schema document: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failure to read a form definition out of JSON text.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("at JSON path {path} → {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Decode failure inside the value selected by a JSON Pointer; `path` is
    /// relative to that value.
    #[error("under JSON pointer `{pointer}`, at JSON path {path} → {source}")]
    DecodeAt {
        pointer: String,
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON pointer `{0}` does not resolve to a value")]
    Pointer(String),
}
