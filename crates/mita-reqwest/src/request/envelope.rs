//! Response envelope shared by all backend endpoints.

use serde::{Deserialize, Serialize};

/// The `{ code, data, msg, requestId }` wrapper returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    /// Application-level status code.
    pub code: i64,
    /// Payload, absent on most failures.
    pub data: Option<T>,
    /// Human-readable message.
    #[serde(default)]
    pub msg: Option<String>,
    /// Backend request identifier.
    #[serde(default)]
    pub request_id: Option<String>,
}

impl ApiEnvelope<serde_json::Value> {
    /// Converts the untyped payload into `T`.
    pub fn into_typed<T>(self) -> serde_json::Result<ApiEnvelope<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let data = self.data.map(serde_json::from_value).transpose()?;
        Ok(ApiEnvelope {
            code: self.code,
            data,
            msg: self.msg,
            request_id: self.request_id,
        })
    }

    /// Deserializes the payload as `T`, reading a missing payload as `null`.
    pub fn into_data<T>(self) -> serde_json::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_value(self.data.unwrap_or(serde_json::Value::Null))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    #[test]
    fn test_parse_full_envelope() {
        let envelope: ApiEnvelope<Value> = serde_json::from_value(json!({
            "code": 0,
            "data": { "bucket": "mita-test" },
            "msg": "",
            "requestId": "d73b16c2"
        }))
        .unwrap();

        assert_eq!(envelope.code, 0);
        assert_eq!(envelope.request_id.as_deref(), Some("d73b16c2"));
        assert_eq!(envelope.data.unwrap()["bucket"], "mita-test");
    }

    #[test]
    fn test_parse_minimal_envelope() {
        let envelope: ApiEnvelope<Value> = serde_json::from_str(r#"{ "code": 401 }"#).unwrap();
        assert_eq!(envelope.code, 401);
        assert!(envelope.data.is_none());
        assert!(envelope.msg.is_none());
    }

    #[test]
    fn test_into_data_reads_missing_payload_as_null() {
        let envelope: ApiEnvelope<Value> = serde_json::from_str(r#"{ "code": 0 }"#).unwrap();
        let unit: Option<u32> = envelope.into_data().unwrap();
        assert!(unit.is_none());
    }

    #[test]
    fn test_into_typed() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Token {
            value: String,
        }

        let envelope: ApiEnvelope<Value> =
            serde_json::from_value(json!({ "code": 0, "data": { "value": "t" } })).unwrap();
        let typed = envelope.into_typed::<Token>().unwrap();
        assert_eq!(
            typed.data,
            Some(Token {
                value: "t".to_string()
            })
        );
    }
}
