//! Input model: the JSON dictionary a form parser emits for a survey.
//!
//! Only the attributes the schema generator reads are modelled; everything
//! else in the dictionary (labels, hints, constraints...) is ignored.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Root of a parsed form: the top-level nodes plus the choice lists.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormDefinition {
    #[serde(default)]
    pub name: Option<String>,
    /// Plain string or a per-language mapping.
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub children: Vec<FormNode>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: ChoiceTable,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormNode {
    /// Raw type token, e.g. `"select_one colors"` or `"group"`.
    #[serde(rename = "type", default)]
    pub declared_type: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Present for groups and repeats only.
    #[serde(default)]
    pub children: Option<Vec<FormNode>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub bind: Bind,
    #[serde(default)]
    pub itemset: Option<String>,
    #[serde(default)]
    pub list_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub parameters: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Bind {
    #[serde(default)]
    pub required: Option<Value>,
    #[serde(default)]
    pub relevant: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Field,
    Group,
    Repeat,
}

/// Choice lists by name, in declaration order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ChoiceTable(IndexMap<String, Vec<Choice>>);

/// One entry of a choice list: a bare value or a `{name, label, ...}` record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Choice(pub Value);

/// An explicit `null` decodes like an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl FormNode {
    /// Non-empty name, if any. Unnamed nodes do not appear in the schema.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    pub fn kind(&self) -> NodeKind {
        match self.declared_type.trim().to_ascii_lowercase().as_str() {
            "group" => NodeKind::Group,
            "repeat" => NodeKind::Repeat,
            _ => NodeKind::Field,
        }
    }

    /// `bind.required` is `yes` or `true`, in any case.
    pub fn is_required(&self) -> bool {
        let flag = match &self.bind.required {
            Some(Value::String(s)) => s.to_lowercase(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => return false,
        };
        matches!(flag.as_str(), "yes" | "true")
    }

    /// A relevance expression is attached to this node.
    pub fn is_conditional(&self) -> bool {
        !matches!(self.bind.relevant, None | Some(Value::Null))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Field => "field",
            Self::Group => "group",
            Self::Repeat => "repeat",
        })
    }
}

impl ChoiceTable {
    /// Look a list up by exact name, then case-insensitively.
    pub fn list(&self, name: &str) -> Option<&[Choice]> {
        self.0
            .get(name)
            .or_else(|| {
                self.0
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(Vec::as_slice)
    }
}

impl FromIterator<(String, Vec<Choice>)> for ChoiceTable {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Choice>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Choice {
    /// The value this choice contributes to an `enum`: `name`, else `label`,
    /// else `""` for records; the value itself otherwise.
    pub fn enum_value(&self) -> Value {
        match &self.0 {
            Value::Object(record) => record
                .get("name")
                .or_else(|| record.get("label"))
                .cloned()
                .unwrap_or_else(|| Value::from("")),
            bare => bare.clone(),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
