//! JSON interop.
//!
//! Objects become maps with string keys, arrays become lists. Integers that
//! fit an `i32` become `Int`, larger ones `Long`, everything else `Double`.

use serde_json::{Map as JsonMap, Number, Value as Json};

use super::Value;

impl Value {
    pub fn from_json(json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => number_to_value(n),
            Json::String(s) => Value::string(s),
            Json::Array(items) => Value::list(items.iter().map(Value::from_json).collect()),
            Json::Object(fields) => Value::map(
                fields
                    .iter()
                    .map(|(k, v)| (Value::string(k), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Render as JSON. Host objects, types and functions become their
    /// display string; non-finite reals become `null`.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::from(*n),
            Value::Long(n) => Json::from(*n),
            Value::Float(n) => Number::from_f64(f64::from(*n)).map_or(Json::Null, Json::Number),
            Value::Double(n) => Number::from_f64(*n).map_or(Json::Null, Json::Number),
            Value::Char(c) => Json::String(c.to_string()),
            Value::Str(s) => Json::String(s.to_string()),
            Value::List(list) => Json::Array(list.snapshot().iter().map(Value::to_json).collect()),
            Value::Map(map) => {
                let mut out = JsonMap::new();
                for (key, value) in map.entries() {
                    let key = match key {
                        Value::Str(s) => s.to_string(),
                        other => other.to_string(),
                    };
                    out.insert(key, value.to_json());
                }
                Json::Object(out)
            }
            Value::Object(_) | Value::Type(_) | Value::Function(_) => {
                Json::String(self.to_string())
            }
        }
    }
}

fn number_to_value(n: &Number) -> Value {
    if let Some(i) = n.as_i64() {
        return i32::try_from(i).map_or(Value::Long(i), Value::Int);
    }
    Value::Double(n.as_f64().unwrap_or(f64::NAN))
}
