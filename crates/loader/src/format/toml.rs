//! TOML documents via the `toml` crate.
//!
//! Imports are declared with a quoted key: `"@import" = ["base.toml"]`.
//! Datetimes decode to their RFC 3339 string.

use super::Format;
use persist_core::error::BoxError;
use serde_json::{Number, Value};

#[derive(Debug, Clone, Copy, Default)]
pub struct TomlFormat;

impl Format for TomlFormat {
    fn name(&self) -> &'static str {
        "toml"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["toml"]
    }

    fn decode(&self, text: &str) -> Result<Value, BoxError> {
        let table: toml::Table = toml::from_str(text)?;
        to_json(toml::Value::Table(table))
    }

    /// Fails for documents TOML cannot express (`null`, non-table roots).
    fn encode(&self, data: &Value) -> Result<String, BoxError> {
        Ok(toml::to_string_pretty(data)?)
    }
}

fn to_json(value: toml::Value) -> Result<Value, BoxError> {
    Ok(match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Value::Number(
            Number::from_f64(f).ok_or_else(|| format!("float `{f}` has no JSON representation"))?,
        ),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => {
            Value::Array(items.into_iter().map(to_json).collect::<Result<_, _>>()?)
        }
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| Ok((k, to_json(v)?)))
                .collect::<Result<_, BoxError>>()?,
        ),
    })
}
