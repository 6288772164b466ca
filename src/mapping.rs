//! Field type → JSON Schema fragment.
//!
//! A declared type token is parsed once into a closed [`FieldType`] (with an
//! `Other` arm for anything unrecognized) and [`map_field`] dispatches on it.
//! Mapping never fails: unknown types become plain strings and missing choice
//! lists become empty enumerations.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::form::{ChoiceTable, FormNode};
use crate::schema::{number_pref_i64, Format, Primitive, Schema};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    // choices
    SelectOne,
    SelectOneFromFile,
    SelectMultiple,
    SelectMultipleFromFile,
    Rank,
    // numeric
    Integer,
    Decimal,
    Range,
    // text-like
    Text,
    Note,
    Barcode,
    Acknowledge,
    Calculate,
    Hidden,
    // temporal
    Date,
    DateTime,
    Time,
    // device metadata
    Start,
    End,
    Today,
    DeviceId,
    Username,
    SimSerial,
    SubscriberId,
    PhoneNumber,
    Email,
    // geographic
    Geopoint,
    StartGeopoint,
    Geotrace,
    Geoshape,
    // media
    Image,
    Audio,
    BackgroundAudio,
    Video,
    File,
    Audit,
    /// Unrecognized base token, kept verbatim (lowercased).
    Other(String),
}

/// A declared type token split into its base type and choice list reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredType {
    pub base: FieldType,
    pub list_name: Option<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// PARSING
// ————————————————————————————————————————————————————————————————————————————

impl FieldType {
    pub fn from_token(token: &str) -> Self {
        match token {
            "select_one" => Self::SelectOne,
            "select_one_from_file" => Self::SelectOneFromFile,
            "select_multiple" => Self::SelectMultiple,
            "select_multiple_from_file" => Self::SelectMultipleFromFile,
            "rank" => Self::Rank,
            "integer" | "int" => Self::Integer,
            "decimal" => Self::Decimal,
            "range" => Self::Range,
            "text" => Self::Text,
            "note" => Self::Note,
            "barcode" => Self::Barcode,
            "acknowledge" | "trigger" => Self::Acknowledge,
            "calculate" => Self::Calculate,
            "hidden" => Self::Hidden,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "time" => Self::Time,
            "start" => Self::Start,
            "end" => Self::End,
            "today" => Self::Today,
            "deviceid" => Self::DeviceId,
            "username" => Self::Username,
            "simserial" => Self::SimSerial,
            "subscriberid" => Self::SubscriberId,
            "phonenumber" => Self::PhoneNumber,
            "email" => Self::Email,
            "geopoint" => Self::Geopoint,
            "start-geopoint" => Self::StartGeopoint,
            "geotrace" => Self::Geotrace,
            "geoshape" => Self::Geoshape,
            "image" | "photo" => Self::Image,
            "audio" => Self::Audio,
            "background-audio" => Self::BackgroundAudio,
            "video" => Self::Video,
            "file" => Self::File,
            "audit" => Self::Audit,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::SelectOne => "select_one",
            Self::SelectOneFromFile => "select_one_from_file",
            Self::SelectMultiple => "select_multiple",
            Self::SelectMultipleFromFile => "select_multiple_from_file",
            Self::Rank => "rank",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Range => "range",
            Self::Text => "text",
            Self::Note => "note",
            Self::Barcode => "barcode",
            Self::Acknowledge => "acknowledge",
            Self::Calculate => "calculate",
            Self::Hidden => "hidden",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Time => "time",
            Self::Start => "start",
            Self::End => "end",
            Self::Today => "today",
            Self::DeviceId => "deviceid",
            Self::Username => "username",
            Self::SimSerial => "simserial",
            Self::SubscriberId => "subscriberid",
            Self::PhoneNumber => "phonenumber",
            Self::Email => "email",
            Self::Geopoint => "geopoint",
            Self::StartGeopoint => "start-geopoint",
            Self::Geotrace => "geotrace",
            Self::Geoshape => "geoshape",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::BackgroundAudio => "background-audio",
            Self::Video => "video",
            Self::File => "file",
            Self::Audit => "audit",
            Self::Other(token) => token,
        }
    }

    /// Types whose second token names a choice list.
    pub fn takes_choices(&self) -> bool {
        matches!(
            self,
            Self::SelectOne
                | Self::SelectOneFromFile
                | Self::SelectMultiple
                | Self::SelectMultipleFromFile
                | Self::Rank
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DeclaredType {
    /// Lowercase, trim, split on whitespace. The first token (or a spelled-out
    /// alias such as `select one`) is the base type; for choice types the
    /// following token names the list. The list name keeps its original case.
    pub fn parse(raw: &str) -> Self {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        let words: Vec<&str> = lowered.iter().map(String::as_str).collect();

        let (base, consumed) = match words.as_slice() {
            [] => (FieldType::Other(String::new()), 0),
            ["select", "one", ..] => (FieldType::SelectOne, 2),
            ["select", "multiple", ..] => (FieldType::SelectMultiple, 2),
            ["select", "all", "that", "apply", ..] => (FieldType::SelectMultiple, 4),
            [first, ..] => (FieldType::from_token(first), 1),
        };

        let list_name = if base.takes_choices() {
            tokens.get(consumed).map(|s| s.to_string())
        } else {
            None
        };
        Self { base, list_name }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// MAPPING
// ————————————————————————————————————————————————————————————————————————————

/// Map one field node to its schema fragment. Requiredness and nullability
/// are left to the caller.
pub fn map_field(field: &FormNode, choices: &ChoiceTable) -> Schema {
    let declared = DeclaredType::parse(&field.declared_type);
    let list_name = declared
        .list_name
        .as_deref()
        .or(field.itemset.as_deref())
        .or(field.list_name.as_deref());

    match declared.base {
        FieldType::SelectOne | FieldType::SelectOneFromFile => {
            choice_item(list_name, choices)
        }
        FieldType::SelectMultiple | FieldType::SelectMultipleFromFile => {
            Schema::array(choice_item(list_name, choices)).with_unique_items()
        }
        FieldType::Rank => Schema::array(choice_item(list_name, choices))
            .describe("Ranked items in order of preference"),

        FieldType::Integer => Schema::integer(),
        FieldType::Decimal => Schema::number(),
        FieldType::Range => range(field),

        FieldType::Text | FieldType::Hidden => Schema::string(),
        FieldType::Note => Schema::string().read_only().describe("Display-only note"),
        FieldType::Barcode => Schema::string().describe("Scanned barcode data"),
        FieldType::Acknowledge => Schema::boolean().describe("Acknowledgement checkbox"),
        FieldType::Calculate => Schema::string().read_only(),

        FieldType::Date => Schema::string().with_format(Format::Date),
        FieldType::DateTime => Schema::string().with_format(Format::DateTime),
        FieldType::Time => Schema::string().with_format(Format::Time),

        FieldType::Start | FieldType::End => {
            Schema::string().with_format(Format::DateTime).read_only()
        }
        FieldType::Today => Schema::string().with_format(Format::Date).read_only(),
        FieldType::DeviceId
        | FieldType::Username
        | FieldType::SimSerial
        | FieldType::SubscriberId
        | FieldType::PhoneNumber
        | FieldType::Email => Schema::string().read_only(),

        FieldType::Geopoint => geopoint(),
        FieldType::StartGeopoint => geopoint().read_only(),
        FieldType::Geotrace => geojson("LineString", position_list()),
        FieldType::Geoshape => geojson("Polygon", Schema::array(position_list())),

        FieldType::Image => Schema::string().describe("Image file name/URI"),
        FieldType::Audio => Schema::string().describe("Audio file name/URI"),
        FieldType::BackgroundAudio => {
            Schema::string().read_only().describe("Audio file name/URI")
        }
        FieldType::Video => Schema::string().describe("Video file name/URI"),
        FieldType::File => Schema::string().describe("Generic file attachment"),
        FieldType::Audit => Schema::string().read_only().describe("Generic file attachment"),

        FieldType::Other(token) => {
            tracing::debug!(
                field = field.name().unwrap_or_default(),
                token = %token,
                "unrecognized field type, mapping to string"
            );
            Schema::string()
        }
    }
}

/// Values of a choice list as `enum` entries. A missing list yields `[]`.
pub fn resolve_enum(list_name: Option<&str>, choices: &ChoiceTable) -> Vec<Value> {
    let Some(list) = list_name.and_then(|name| choices.list(name)) else {
        tracing::debug!(list = list_name.unwrap_or_default(), "choice list not found");
        return Vec::new();
    };
    list.iter().map(|c| c.enum_value()).collect()
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn choice_item(list_name: Option<&str>, choices: &ChoiceTable) -> Schema {
    Schema::string().with_enum(resolve_enum(list_name, choices))
}

fn range(field: &FormNode) -> Schema {
    let schema = Schema::number().describe("Slider/Range component");
    let (Some(start), Some(end)) = (range_param(field, "start"), range_param(field, "end")) else {
        return schema;
    };
    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
    match (number_pref_i64(lo), number_pref_i64(hi)) {
        (Some(lo), Some(hi)) => schema.with_minimum(lo).with_maximum(hi),
        _ => schema,
    }
}

fn range_param(field: &FormNode, key: &str) -> Option<f64> {
    match field.parameters.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn geopoint() -> Schema {
    let mut props = IndexMap::new();
    props.insert("latitude".to_string(), bounded_number(-90, 90));
    props.insert("longitude".to_string(), bounded_number(-180, 180));
    props.insert("altitude".to_string(), Schema::number());
    props.insert("accuracy".to_string(), Schema::number());
    Schema::object(props, vec!["latitude".to_string(), "longitude".to_string()])
}

fn bounded_number(min: i64, max: i64) -> Schema {
    Schema::number().with_minimum(min.into()).with_maximum(max.into())
}

/// `[[x, y, ...], ...]`: each position holds at least two numbers.
fn position_list() -> Schema {
    Schema::array(Schema::array(Schema::number()).with_min_items(2))
}

fn geojson(geometry: &str, coordinates: Schema) -> Schema {
    let mut props = IndexMap::new();
    props.insert(
        "type".to_string(),
        Schema::string().with_enum(vec![Value::from(geometry)]),
    );
    props.insert("coordinates".to_string(), coordinates);
    props.insert("properties".to_string(), Schema::of(Primitive::Object));
    Schema::object(props, Vec::new())
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
