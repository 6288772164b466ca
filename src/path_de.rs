use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::InputError;
use crate::form::FormDefinition;

/// Deserialize with JSON-path context in error messages.
pub fn from_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, InputError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize::<_, T>(de).map_err(into_input_error)
}

pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, InputError> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(into_input_error)
}

/// Decode a form dictionary, optionally selecting it with a JSON Pointer
/// (e.g. `/survey`) inside a larger document.
pub fn load_form(src: &str, json_pointer: Option<&str>) -> Result<FormDefinition, InputError> {
    let Some(pointer) = json_pointer else {
        return from_str_with_path(src);
    };
    let mut document: Value = from_str_with_path(src)?;
    let selected = document
        .pointer_mut(pointer)
        .map(Value::take)
        .ok_or_else(|| InputError::Pointer(pointer.to_string()))?;
    from_value_with_path(selected).map_err(|error| match error {
        InputError::Decode { path, source } => InputError::DecodeAt {
            pointer: pointer.to_string(),
            path,
            source,
        },
        other => other,
    })
}

fn into_input_error(err: serde_path_to_error::Error<serde_json::Error>) -> InputError {
    InputError::Decode {
        path: err.path().to_string(),
        source: err.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_the_offending_path() {
        let src = r#"{"children": [{"type": "text", "name": "a"}, {"type": 7}]}"#;
        let err = load_form(src, None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("children[1]"), "{msg}");
    }

    #[test]
    fn pointer_selects_nested_form() {
        let src = r#"{"meta": {}, "survey": {"children": [{"type": "text", "name": "a"}]}}"#;
        let form = load_form(src, Some("/survey")).unwrap();
        assert_eq!(form.children.len(), 1);
    }

    #[test]
    fn decode_error_under_pointer_keeps_pointer_and_path_apart() {
        let src = r#"{"survey": {"children": [{"type": "text"}, {"type": 7}]}}"#;
        let err = load_form(src, Some("/survey")).unwrap_err();
        match &err {
            InputError::DecodeAt { pointer, path, .. } => {
                assert_eq!(pointer, "/survey");
                assert_eq!(path, "children[1].type");
            }
            other => panic!("unexpected error: {other}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("`/survey`") && msg.contains("children[1].type"), "{msg}");
        assert!(!msg.contains("/survey/children"), "{msg}");
    }

    #[test]
    fn unresolved_pointer_is_reported() {
        let err = load_form("{}", Some("/survey")).unwrap_err();
        assert!(matches!(err, InputError::Pointer(p) if p == "/survey"));
    }
}
