//! JSON-RPC envelope used by the booking API.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of the random request id the API expects.
const REQUEST_ID_LEN: usize = 21;

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<P> {
    pub jsonrpc: &'static str,
    pub id: String,
    pub method: &'static str,
    pub params: P,
}

impl<P: Serialize> RpcRequest<P> {
    pub fn new(method: &'static str, params: P) -> Self {
        RpcRequest {
            jsonrpc: "2.0",
            id: generate_request_id(),
            method,
            params,
        }
    }
}

pub fn generate_request_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(REQUEST_ID_LEN)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<RpcErrorData>,
}

/// Application-level error details; `code` is a symbolic name such as
/// `APPOINTMENT_RECEPTION_NOT_FOUND`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcErrorData {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RpcError {
    pub fn data_code(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.code.as_deref())
    }

    /// Best human-readable description available.
    pub fn describe(&self) -> String {
        self.data
            .as_ref()
            .and_then(|d| d.message.clone())
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "no message".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_envelope() {
        let req = RpcRequest::new("getAppointmentReceptionsByPatient", json!({"omsNumber": "1"}));
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "getAppointmentReceptionsByPatient");
        assert_eq!(value["params"]["omsNumber"], "1");
        let id = value["id"].as_str().unwrap();
        assert_eq!(id.len(), REQUEST_ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_error_response() {
        let body = r#"{"error":{"code":-32000,"message":"fail","data":{"code":"APPOINTMENT_RECEPTION_NOT_FOUND"}}}"#;
        let resp: RpcResponse<serde_json::Value> = serde_json::from_str(body).unwrap();

        assert!(resp.result.is_none());
        let err = resp.error.unwrap();
        assert_eq!(err.data_code(), Some("APPOINTMENT_RECEPTION_NOT_FOUND"));
        assert_eq!(err.describe(), "fail");
    }

    #[derive(Debug, Deserialize)]
    struct NoDefault {
        id: i64,
    }

    #[test]
    fn test_result_type_needs_no_default() {
        let resp: RpcResponse<NoDefault> = serde_json::from_str(r#"{"result":{"id":7}}"#).unwrap();
        assert_eq!(resp.result.map(|r| r.id), Some(7));

        let resp: RpcResponse<NoDefault> = serde_json::from_str("{}").unwrap();
        assert!(resp.result.is_none());
    }

    #[test]
    fn test_empty_response() {
        let resp: RpcResponse<serde_json::Value> = serde_json::from_str("{}").unwrap();
        assert!(resp.result.is_none());
        assert!(resp.error.is_none());
    }
}
