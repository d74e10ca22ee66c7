//! The `{code, data, message}` response envelope.
//!
//! Every backend response is wrapped as
//!
//! ```json
//! { "code": 1, "data": { "...": "..." }, "message": "optional" }
//! ```
//!
//! `code == 1` means success. Only `code` is mandatory: a `data` field that
//! does not decode into the expected type is treated as absent, as is a
//! `message` that is not a string. The functions in this module also cover
//! the two envelope-free reading modes, raw bytes and loosely-typed JSON.

use crate::{transport::TransportResponse, Error, Result};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// The envelope `code` that marks success.
pub const SUCCESS_CODE: i64 = 1;

/// A decoded response envelope.
///
/// # Examples
///
/// ```
/// use netspec::ResponseEnvelope;
///
/// let envelope: ResponseEnvelope<Vec<u32>> =
///     serde_json::from_str(r#"{"code":1,"data":"not a list","message":"ok"}"#).unwrap();
///
/// assert!(envelope.is_success());
/// assert_eq!(envelope.data, None);
/// assert_eq!(envelope.message.as_deref(), Some("ok"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope<T> {
    /// The backend status code; `1` is success.
    pub code: i64,

    /// The payload, when present and decodable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// The backend message, when present and a string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ResponseEnvelope<T> {
    /// Returns `true` if `code` is [`SUCCESS_CODE`].
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Extracts the payload.
    ///
    /// # Errors
    ///
    /// Without data, returns [`Error::ServerReported`] if there is a message
    /// and [`Error::Transform`] otherwise, whatever the `code`.
    pub fn into_result(self) -> Result<T> {
        match (self.data, self.message) {
            (Some(data), _) => Ok(data),
            (None, Some(message)) => Err(Error::ServerReported {
                code: self.code,
                message,
            }),
            (None, None) => Err(Error::Transform("no data and no message".to_string())),
        }
    }

    /// Extracts the payload, accepting a successful envelope without data.
    ///
    /// # Errors
    ///
    /// Same as [`into_result`](Self::into_result) for unsuccessful envelopes.
    pub fn into_optional(self) -> Result<Option<T>> {
        if self.data.is_none() && self.is_success() {
            return Ok(None);
        }
        self.into_result().map(Some)
    }
}

impl<T: DeserializeOwned> ResponseEnvelope<T> {
    /// Decodes an envelope from response bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transform`] if the bytes are not a JSON object with an
    /// integer `code`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| {
            tracing::error!(
                error = %e,
                raw_response = %String::from_utf8_lossy(bytes),
                "Failed to decode response envelope"
            );
            Error::Transform(e.to_string())
        })
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for ResponseEnvelope<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawEnvelope {
            code: i64,
            #[serde(default)]
            data: Option<Value>,
            #[serde(default)]
            message: Option<Value>,
        }

        let raw = RawEnvelope::deserialize(deserializer)?;

        let data = raw.data.and_then(|value| match T::deserialize(value) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    code = raw.code,
                    "Envelope data did not match the expected type; treating as absent"
                );
                None
            }
        });
        let message = match raw.message {
            Some(Value::String(message)) => Some(message),
            _ => None,
        };

        Ok(Self {
            code: raw.code,
            data,
            message,
        })
    }
}

/// Decodes a typed payload from envelope bytes.
///
/// # Errors
///
/// See [`ResponseEnvelope::from_slice`] and [`ResponseEnvelope::into_result`].
///
/// # Examples
///
/// ```
/// use netspec::{envelope::decode, Error};
/// use serde_json::{json, Value};
///
/// let data: Value = decode(br#"{"code":1,"data":{"x":1}}"#).unwrap();
/// assert_eq!(data, json!({"x": 1}));
///
/// let err = decode::<Value>(br#"{"code":0,"message":"bad"}"#).unwrap_err();
/// assert!(matches!(err, Error::ServerReported { code: 0, .. }));
/// ```
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ResponseEnvelope::<T>::from_slice(bytes)?.into_result()
}

/// Returns the body of a response read in raw mode.
///
/// Any 2xx body is returned as-is, including an empty one.
///
/// # Errors
///
/// Returns [`Error::HttpError`] for non-2xx statuses.
pub fn decode_raw(response: TransportResponse) -> Result<Bytes> {
    if !response.is_success() {
        return Err(Error::HttpError {
            status: response.status,
            raw_response: response.text(),
        });
    }
    Ok(response.body)
}

/// Validates a response read in loosely-typed mode and returns its JSON.
///
/// Success requires a 2xx status and `"code": 1` in the body. Every other
/// outcome is reported under the HTTP status, with the body's `message` when
/// it has one. A missing or non-integer `code` counts as a failure.
///
/// # Errors
///
/// * [`Error::ServerReported`] with the HTTP status as its code
/// * [`Error::Transform`] for a 2xx body that is not JSON
pub fn decode_loose(response: &TransportResponse) -> Result<Value> {
    let parsed = serde_json::from_slice::<Value>(&response.body);

    let json = match parsed {
        Ok(json) => Some(json),
        Err(_) if !response.is_success() => None,
        Err(e) => {
            tracing::error!(
                error = %e,
                raw_response = %response.text(),
                "Failed to parse JSON response"
            );
            return Err(Error::Transform(e.to_string()));
        }
    };

    let code = json.as_ref().and_then(|j| j.get("code")).and_then(Value::as_i64);
    match json {
        Some(json) if response.is_success() && code == Some(SUCCESS_CODE) => Ok(json),
        json => Err(Error::ServerReported {
            code: i64::from(response.status.as_u16()),
            message: json
                .as_ref()
                .and_then(message_of)
                .unwrap_or_else(|| "Status Error".to_string()),
        }),
    }
}

fn message_of(json: &Value) -> Option<String> {
    json.get("message")?.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderMap, StatusCode};
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i32,
    }

    fn response(status: u16, body: &'static str) -> TransportResponse {
        TransportResponse::new(
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            body,
        )
    }

    #[test]
    fn test_success_with_data() {
        let point: Point = decode(br#"{"code":1,"data":{"x":1}}"#).unwrap();
        assert_eq!(point, Point { x: 1 });
    }

    #[test]
    fn test_success_without_data_is_transform_error() {
        let result = decode::<Point>(br#"{"code":1}"#);
        match result {
            Err(Error::Transform(msg)) => assert_eq!(msg, "no data and no message"),
            other => panic!("Expected Transform, got {:?}", other),
        }
    }

    #[test]
    fn test_server_reported() {
        let result = decode::<Point>(br#"{"code":0,"message":"bad"}"#);
        match result {
            Err(Error::ServerReported { code, message }) => {
                assert_eq!(code, 0);
                assert_eq!(message, "bad");
            }
            other => panic!("Expected ServerReported, got {:?}", other),
        }
    }

    #[test]
    fn test_data_wins_over_failure_code() {
        let point: Point = decode(br#"{"code":5,"data":{"x":2},"message":"warn"}"#).unwrap();
        assert_eq!(point.x, 2);
    }

    #[test]
    fn test_mismatched_data_is_absent() {
        let envelope: ResponseEnvelope<Point> =
            ResponseEnvelope::from_slice(br#"{"code":1,"data":{"y":"nope"}}"#).unwrap();
        assert!(envelope.is_success());
        assert_eq!(envelope.data, None);

        let result = decode::<Point>(br#"{"code":3,"data":[1],"message":"broken"}"#);
        assert!(matches!(result, Err(Error::ServerReported { code: 3, .. })));
    }

    #[test]
    fn test_non_string_message_is_absent() {
        let envelope: ResponseEnvelope<Point> =
            ResponseEnvelope::from_slice(br#"{"code":0,"message":42}"#).unwrap();
        assert_eq!(envelope.message, None);
        assert!(matches!(envelope.into_result(), Err(Error::Transform(_))));
    }

    #[test]
    fn test_missing_or_invalid_code_is_fatal() {
        let bodies: [&[u8]; 4] = [
            br#"{"data":{"x":1}}"#,
            br#"{"code":"1","data":{"x":1}}"#,
            b"<html>oops</html>",
            b"",
        ];
        for body in bodies {
            assert!(
                matches!(decode::<Point>(body), Err(Error::Transform(_))),
                "body {:?} should fail",
                String::from_utf8_lossy(body)
            );
        }
    }

    #[test]
    fn test_into_optional() {
        let envelope: ResponseEnvelope<Point> =
            ResponseEnvelope::from_slice(br#"{"code":1}"#).unwrap();
        assert_eq!(envelope.into_optional().unwrap(), None);

        let envelope: ResponseEnvelope<Point> =
            ResponseEnvelope::from_slice(br#"{"code":1,"data":{"x":4}}"#).unwrap();
        assert_eq!(envelope.into_optional().unwrap(), Some(Point { x: 4 }));

        let envelope: ResponseEnvelope<Point> =
            ResponseEnvelope::from_slice(br#"{"code":0,"message":"no"}"#).unwrap();
        assert!(envelope.into_optional().is_err());
    }

    #[test]
    fn test_envelope_serializes_without_absent_fields() {
        let envelope = ResponseEnvelope::<Value> {
            code: 0,
            data: None,
            message: Some("bad".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"code": 0, "message": "bad"})
        );

        let envelope = ResponseEnvelope {
            code: 1,
            data: Some(json!({"x": 1})),
            message: None,
        };
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"code": 1, "data": {"x": 1}})
        );
    }

    #[test]
    fn test_raw_mode() {
        let body = decode_raw(response(200, "plain bytes")).unwrap();
        assert_eq!(&body[..], b"plain bytes");

        assert!(decode_raw(response(204, "")).unwrap().is_empty());
        assert!(decode_raw(response(200, "")).unwrap().is_empty());

        match decode_raw(response(503, "down")) {
            Err(Error::HttpError {
                status,
                raw_response,
            }) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(raw_response, "down");
            }
            other => panic!("Expected HttpError, got {:?}", other),
        }
    }

    #[test]
    fn test_loose_mode_success() {
        let json = decode_loose(&response(200, r#"{"code":1,"anything":[1,2]}"#)).unwrap();
        assert_eq!(json["anything"], json!([1, 2]));
    }

    #[test]
    fn test_loose_mode_failures() {
        match decode_loose(&response(500, r#"{"code":1,"message":"maintenance"}"#)) {
            Err(Error::ServerReported { code, message }) => {
                assert_eq!(code, 500);
                assert_eq!(message, "maintenance");
            }
            other => panic!("Expected ServerReported, got {:?}", other),
        }
        match decode_loose(&response(404, "not json")) {
            Err(Error::ServerReported { code, message }) => {
                assert_eq!(code, 404);
                assert_eq!(message, "Status Error");
            }
            other => panic!("Expected ServerReported, got {:?}", other),
        }
        match decode_loose(&response(200, r#"{"code":7,"message":"nope"}"#)) {
            Err(Error::ServerReported { code, message }) => {
                assert_eq!(code, 200);
                assert_eq!(message, "nope");
            }
            other => panic!("Expected ServerReported, got {:?}", other),
        }
        match decode_loose(&response(200, r#"{"message":"m"}"#)) {
            Err(Error::ServerReported { code, message }) => {
                assert_eq!(code, 200);
                assert_eq!(message, "m");
            }
            other => panic!("Expected ServerReported, got {:?}", other),
        }
        assert!(matches!(
            decode_loose(&response(201, r#"{"ok":true}"#)),
            Err(Error::ServerReported { code: 201, .. })
        ));
        assert!(matches!(
            decode_loose(&response(200, "not json")),
            Err(Error::Transform(_))
        ));
    }
}
