//! Response validation.
//!
//! A `Validator<T>` turns an untyped `Payload` into a `T` or rejects it with a
//! `Thrown`, which the dispatcher normalizes. Plain closures are validators, so
//! call sites can pass a function; `Schema<T>` checks JSON payloads against a
//! JSON Schema before deserializing them.
//!
//! Without a validator the dispatcher falls back to `decode_as`, which trusts
//! the payload to have the declared shape and only fails when serde cannot
//! map it.

use std::fmt;
use std::marker::PhantomData;

use serde::de::value::SeqDeserializer;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{RequestError, Thrown};
use crate::http::{ContentKind, Payload};

pub trait Validator<T> {
    fn validate(&self, payload: Payload) -> Result<T, Thrown>;
}

impl<T, E, F> Validator<T> for F
where
    F: Fn(Payload) -> Result<T, E>,
    E: Into<Thrown>,
{
    fn validate(&self, payload: Payload) -> Result<T, Thrown> {
        self(payload).map_err(Into::into)
    }
}

/// Map a payload onto `T` without checking it beyond what serde requires.
///
/// JSON maps directly, text is treated as a JSON string, and a binary body as
/// a sequence of bytes. An empty binary body maps like `null`, so `()` and
/// `Option<_>` responses accept bodiless replies.
pub fn decode_as<T: DeserializeOwned>(payload: Payload) -> Result<T, RequestError> {
    let decoded = match payload {
        Payload::Json(value) => serde_json::from_value(value),
        Payload::Text(text) => serde_json::from_value(Value::String(text)),
        Payload::Binary(bytes) if bytes.is_empty() => serde_json::from_value(Value::Null),
        Payload::Binary(bytes) => {
            T::deserialize(SeqDeserializer::<_, serde_json::Error>::new(bytes.into_iter()))
        }
    };
    decoded.map_err(RequestError::decode)
}

/// A payload that failed its schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaViolation {
    #[error("expected a JSON payload, got {0:?}")]
    NotJson(ContentKind),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
#[error("invalid schema: {0}")]
pub struct SchemaError(String);

/// Validator that checks a JSON payload against a JSON Schema, then
/// deserializes it into `T`.
pub struct Schema<T> {
    validator: jsonschema::Validator,
    _marker: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T: DeserializeOwned> Schema<T> {
    pub fn new(schema: &Value) -> Result<Self, SchemaError> {
        let validator =
            jsonschema::validator_for(schema).map_err(|e| SchemaError(e.to_string()))?;
        Ok(Self {
            validator,
            _marker: PhantomData,
        })
    }

    fn check(&self, value: &Value) -> Result<(), SchemaViolation> {
        let mut errors = self.validator.iter_errors(value);
        if let Some(first) = errors.next() {
            let mut message = first.to_string();
            for err in errors.take(3) {
                message.push_str("; ");
                message.push_str(&err.to_string());
            }
            return Err(SchemaViolation::Invalid(message));
        }
        Ok(())
    }
}

impl<T: DeserializeOwned> Validator<T> for Schema<T> {
    fn validate(&self, payload: Payload) -> Result<T, Thrown> {
        let value = match payload {
            Payload::Json(value) => value,
            other => return Err(Thrown::Error(Box::new(SchemaViolation::NotJson(other.kind())))),
        };
        self.check(&value)
            .map_err(|violation| Thrown::Error(Box::new(violation)))?;
        Ok(serde_json::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::error::{ensure_error, ErrorKind};

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    fn point_schema() -> Schema<Point> {
        Schema::new(&json!({
            "type": "object",
            "properties": {
                "x": { "type": "integer" },
                "y": { "type": "integer" }
            },
            "required": ["x", "y"]
        }))
        .unwrap()
    }

    #[test]
    fn decode_as_maps_json() {
        let point: Point = decode_as(Payload::Json(json!({"x": 1, "y": 2}))).unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });
    }

    #[test]
    fn decode_as_maps_text_and_bytes() {
        let text: String = decode_as(Payload::Text("hi".to_string())).unwrap();
        assert_eq!(text, "hi");

        let bytes: Vec<u8> = decode_as(Payload::Binary(Bytes::from_static(&[1, 2, 3]))).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);

        decode_as::<()>(Payload::Binary(Bytes::new())).unwrap();
    }

    #[test]
    fn decode_as_reports_shape_mismatch() {
        let err = decode_as::<Point>(Payload::Json(json!({"x": "one"}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn closure_is_a_validator() {
        let positive = |payload: Payload| -> Result<i64, Thrown> {
            match payload.as_json().and_then(Value::as_i64) {
                Some(n) if n > 0 => Ok(n),
                _ => Err(Thrown::from("not positive")),
            }
        };
        assert_eq!(positive.validate(Payload::Json(json!(5))).unwrap(), 5);

        let err = ensure_error(positive.validate(Payload::Json(json!(-1))).unwrap_err());
        assert_eq!(err.message(), "\"not positive\"");
    }

    #[test]
    fn schema_accepts_matching_payload() {
        let point = point_schema()
            .validate(Payload::Json(json!({"x": 3, "y": 4})))
            .unwrap();
        assert_eq!(point, Point { x: 3, y: 4 });
    }

    #[test]
    fn schema_rejects_missing_field() {
        let thrown = point_schema()
            .validate(Payload::Json(json!({"x": 3})))
            .unwrap_err();
        let err = ensure_error(thrown);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().contains("\"y\""), "{}", err.message());
        assert!(err.value().is_none());
    }

    #[test]
    fn schema_rejects_non_json() {
        let thrown = point_schema()
            .validate(Payload::Text("x=3".to_string()))
            .unwrap_err();
        assert_eq!(ensure_error(thrown).message(), "expected a JSON payload, got Text");
    }

    #[test]
    fn invalid_schema_fails_to_compile() {
        assert!(Schema::<Point>::new(&json!({"type": 12})).is_err());
    }
}
