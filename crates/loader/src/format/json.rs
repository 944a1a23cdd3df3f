//! JSON documents via `serde_json`.

use super::Format;
use persist_core::error::BoxError;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl Format for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn decode(&self, text: &str) -> Result<Value, BoxError> {
        Ok(serde_json::from_str(text)?)
    }

    fn encode(&self, data: &Value) -> Result<String, BoxError> {
        let mut text = serde_json::to_string_pretty(data)?;
        text.push('\n');
        Ok(text)
    }
}
