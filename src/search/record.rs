//! Searchable records and field extraction
//!
//! Records are supplied by the caller and never mutated. Each search derives
//! a small, fixed list of typed fields from a record; absent or blank
//! attributes are simply left out.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single searchable record (an institution, program or location)
///
/// Records arrive as loose attribute maps from whatever produced them, so
/// deserialization never rejects an object: typed fields are read leniently
/// and anything unusable stays in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct Record {
    /// Identity assigned by the data supplier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Course / program text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
    /// Institution type, e.g. "Engineering"
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    /// Every other attribute, only consulted by filters
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Accepted keys per typed field, earlier keys winning
const NAME_KEYS: &[&str] = &["name", "college_name"];
const COURSE_KEYS: &[&str] = &["course", "courses"];
const KIND_KEYS: &[&str] = &["type", "college_type"];
const LATITUDE_KEYS: &[&str] = &["latitude", "lat"];
const LONGITUDE_KEYS: &[&str] = &["longitude", "lng", "lon"];

/// Text from a string, a scalar, or a list of scalars joined with ", "
fn lenient_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter(|item| !item.is_array() && !item.is_object())
                .filter_map(lenient_text)
                .filter(|part| !part.trim().is_empty())
                .collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Null | Value::Object(_) => None,
    }
}

/// A finite number, or a string that parses as one
fn lenient_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Take the first usable value under `keys`. Nulls are dropped; unusable
/// values stay in the map unless they would shadow the canonical key.
fn take<T>(
    map: &mut Map<String, Value>,
    keys: &[&str],
    convert: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    let mut found = None;
    for key in keys {
        match map.get(*key) {
            Some(Value::Null) => {
                map.remove(*key);
            }
            Some(value) => {
                if let Some(converted) = convert(value) {
                    map.remove(*key);
                    found = Some(converted);
                    break;
                }
            }
            None => {}
        }
    }
    if found.is_some() {
        map.remove(keys[0]);
    }
    found
}

impl From<Map<String, Value>> for Record {
    fn from(mut map: Map<String, Value>) -> Self {
        let id = take(&mut map, &["id"], |v| Some(v.clone()));
        let name = take(&mut map, NAME_KEYS, lenient_text);
        let city = take(&mut map, &["city"], lenient_text);
        let state = take(&mut map, &["state"], lenient_text);
        let course = take(&mut map, COURSE_KEYS, lenient_text);
        let kind = take(&mut map, KIND_KEYS, lenient_text);
        let management = take(&mut map, &["management"], lenient_text);
        let latitude = take(&mut map, LATITUDE_KEYS, lenient_number);
        let longitude = take(&mut map, LONGITUDE_KEYS, lenient_number);

        Self {
            id,
            name,
            city,
            state,
            course,
            kind,
            management,
            latitude,
            longitude,
            extra: map,
        }
    }
}

/// How a field's text should be interpreted by the strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Name,
    Location,
    Text,
}

/// A named, typed field derived from a record for one search call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchableField<'a> {
    pub name: &'static str,
    pub value: &'a str,
    pub kind: FieldKind,
}

impl Record {
    /// Create a record with just a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Extract the searchable fields in fixed order:
    /// name, city, state, course, type, management.
    pub fn searchable_fields(&self) -> Vec<SearchableField<'_>> {
        let candidates = [
            ("name", &self.name, FieldKind::Name),
            ("city", &self.city, FieldKind::Location),
            ("state", &self.state, FieldKind::Location),
            ("course", &self.course, FieldKind::Text),
            ("type", &self.kind, FieldKind::Text),
            ("management", &self.management, FieldKind::Text),
        ];

        candidates
            .into_iter()
            .filter_map(|(name, value, kind)| {
                let value = value.as_deref()?;
                if value.trim().is_empty() {
                    return None;
                }
                Some(SearchableField { name, value, kind })
            })
            .collect()
    }

    /// All searchable text joined into one document
    pub fn searchable_text(&self) -> String {
        self.searchable_fields()
            .iter()
            .map(|f| f.value)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Coordinates, when both are present and finite
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some((lat, lng)),
            _ => None,
        }
    }

    /// Look up any attribute by its JSON key, typed fields included. A typed
    /// field that could not be read falls back to the raw value.
    pub fn attribute(&self, key: &str) -> Option<Value> {
        let text = |v: &Option<String>| v.as_ref().map(|s| Value::String(s.clone()));
        let number = |v: Option<f64>| v.and_then(serde_json::Number::from_f64).map(Value::Number);

        let typed = match key {
            "id" => self.id.clone(),
            "name" => text(&self.name),
            "city" => text(&self.city),
            "state" => text(&self.state),
            "course" => text(&self.course),
            "type" => text(&self.kind),
            "management" => text(&self.management),
            "latitude" => number(self.latitude),
            "longitude" => number(self.longitude),
            _ => None,
        };
        typed.or_else(|| self.extra.get(key).cloned())
    }
}
