//! 基础请求验证逻辑

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

/// Accepts a JSON string or number for identifier fields (`messageId`, `number`).
///
/// `null` is treated as absent. Emptiness is checked by the dispatch gate.
pub fn deserialize_identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}
