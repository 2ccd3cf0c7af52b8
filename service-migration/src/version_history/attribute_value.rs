//! Decoding of typed attribute values found in change-capture images.
//!
//! Each value is a single-key object naming its type, for example
//! `{"S": "text"}`, `{"N": "42"}` or `{"M": {"nested": {"BOOL": true}}}`.

use serde_json::{Map, Number, Value};

use crate::errors::ChangeCaptureError;

/// Convert one typed attribute value into a plain JSON value.
pub fn to_plain(value: &Value) -> Result<Value, ChangeCaptureError> {
    let Some(typed) = value.as_object().filter(|object| object.len() == 1) else {
        return Err(ChangeCaptureError::invalid_attribute(format!(
            "expected a single-key typed value, got {value}"
        )));
    };
    let Some((tag, inner)) = typed.iter().next() else {
        return Err(ChangeCaptureError::invalid_attribute("empty typed value"));
    };

    match tag.as_str() {
        "S" | "B" => expect_string(tag, inner).map(|s| Value::String(s.to_string())),
        "N" => expect_string(tag, inner).and_then(parse_number),
        "BOOL" => inner
            .as_bool()
            .map(Value::Bool)
            .ok_or_else(|| ChangeCaptureError::invalid_attribute("BOOL value is not a boolean")),
        "NULL" => Ok(Value::Null),
        "M" => {
            let map = inner
                .as_object()
                .ok_or_else(|| ChangeCaptureError::invalid_attribute("M value is not an object"))?;
            image_to_plain(map).map(Value::Object)
        }
        "L" => expect_array(tag, inner)?
            .iter()
            .map(to_plain)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        "SS" | "BS" => expect_array(tag, inner)?
            .iter()
            .map(|item| expect_string(tag, item).map(|s| Value::String(s.to_string())))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        "NS" => expect_array(tag, inner)?
            .iter()
            .map(|item| expect_string(tag, item).and_then(parse_number))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        other => Err(ChangeCaptureError::invalid_attribute(format!(
            "unknown attribute type {other}"
        ))),
    }
}

/// Convert a whole image (attribute name to typed value) into a plain object.
pub fn image_to_plain(image: &Map<String, Value>) -> Result<Map<String, Value>, ChangeCaptureError> {
    image
        .iter()
        .map(|(name, value)| to_plain(value).map(|plain| (name.clone(), plain)))
        .collect()
}

fn expect_string<'a>(tag: &str, value: &'a Value) -> Result<&'a str, ChangeCaptureError> {
    value
        .as_str()
        .ok_or_else(|| ChangeCaptureError::invalid_attribute(format!("{tag} value is not a string")))
}

fn expect_array<'a>(tag: &str, value: &'a Value) -> Result<&'a Vec<Value>, ChangeCaptureError> {
    value
        .as_array()
        .ok_or_else(|| ChangeCaptureError::invalid_attribute(format!("{tag} value is not a list")))
}

fn parse_number(raw: &str) -> Result<Value, ChangeCaptureError> {
    if let Ok(integer) = raw.parse::<i64>() {
        return Ok(Value::Number(integer.into()));
    }
    raw.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| ChangeCaptureError::invalid_attribute(format!("invalid number {raw}")))
}
