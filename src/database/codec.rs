//! Record <-> attribute map conversion.
//!
//! Records go through `serde_json::Value` so any `Serialize` type with a
//! map shape can be stored without hand-written conversions.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Number, Value};

use super::error::{DatabaseError, Result};

pub type Item = HashMap<String, AttributeValue>;

pub fn to_item<T: Serialize>(record: &T) -> Result<Item> {
    let value = serde_json::to_value(record).map_err(|e| DatabaseError::Marshal(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(name, value)| (name, to_attribute(value)))
            .collect()),
        other => Err(DatabaseError::Marshal(format!(
            "expected a map-shaped record, got {}",
            json_kind(&other)
        ))),
    }
}

pub fn from_item<T: DeserializeOwned>(item: Item) -> Result<T> {
    let mut map = Map::with_capacity(item.len());
    for (name, attribute) in item {
        let value = from_attribute(attribute).map_err(|e| match e {
            DatabaseError::Unmarshal(msg) => DatabaseError::Unmarshal(format!("{name}: {msg}")),
            other => other,
        })?;
        map.insert(name, value);
    }
    serde_json::from_value(Value::Object(map)).map_err(|e| DatabaseError::Unmarshal(e.to_string()))
}

pub fn from_items<T: DeserializeOwned>(items: Vec<Item>) -> Result<Vec<T>> {
    items.into_iter().map(from_item).collect()
}

fn to_attribute(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(values) => AttributeValue::L(values.into_iter().map(to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.into_iter()
                .map(|(name, value)| (name, to_attribute(value)))
                .collect(),
        ),
    }
}

fn from_attribute(attribute: AttributeValue) -> Result<Value> {
    let value = match attribute {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::N(n) => Value::Number(parse_number(&n)?),
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::Ss(set) => Value::Array(set.into_iter().map(Value::String).collect()),
        AttributeValue::Ns(set) => Value::Array(
            set.iter()
                .map(|n| parse_number(n).map(Value::Number))
                .collect::<Result<_>>()?,
        ),
        AttributeValue::L(values) => Value::Array(
            values
                .into_iter()
                .map(from_attribute)
                .collect::<Result<_>>()?,
        ),
        AttributeValue::M(map) => {
            let mut out = Map::with_capacity(map.len());
            for (name, value) in map {
                out.insert(name, from_attribute(value)?);
            }
            Value::Object(out)
        }
        other => {
            return Err(DatabaseError::Unmarshal(format!(
                "unsupported attribute type: {other:?}"
            )))
        }
    };
    Ok(value)
}

fn parse_number(raw: &str) -> Result<Number> {
    if let Ok(n) = raw.parse::<i64>() {
        return Ok(n.into());
    }
    if let Ok(n) = raw.parse::<u64>() {
        return Ok(n.into());
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| DatabaseError::Unmarshal(format!("invalid number {raw:?}")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
