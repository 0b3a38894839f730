//! HTTP API数据模型

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chatbridge_core::api::{GateError, SendRequest};
use serde::{Deserialize, Serialize};

use super::validation::deserialize_identifier;

// ============= Send =============

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBody {
    #[serde(default, deserialize_with = "deserialize_identifier")]
    pub message_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_identifier")]
    pub number: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub pdf_path: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl From<SendBody> for SendRequest {
    fn from(body: SendBody) -> Self {
        SendRequest {
            message_id: body.message_id,
            recipient: body.number,
            text: body.message,
            attachment_path: body.pdf_path,
            caption: body.caption,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
}

// ============= Check Number =============

#[derive(Debug, Default, Deserialize)]
pub struct CheckNumberBody {
    #[serde(default, deserialize_with = "deserialize_identifier")]
    pub number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckNumberResponse {
    pub registered: bool,
}

// ============= Error Handling =============

#[derive(Debug)]
pub enum HttpServerError {
    Gate(GateError),
    /// The body could not be read as JSON.
    InvalidRequest(String),
}

impl From<GateError> for HttpServerError {
    fn from(err: GateError) -> Self {
        Self::Gate(err)
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Gate(err) => {
                let message = err.to_string();
                match err {
                    GateError::NotReady { current } => (
                        StatusCode::BAD_REQUEST,
                        serde_json::json!({ "error": message, "currentStatus": current }),
                    ),
                    GateError::MissingField { .. } => (
                        StatusCode::BAD_REQUEST,
                        serde_json::json!({ "error": message }),
                    ),
                    GateError::NotRegistered => (
                        StatusCode::NOT_FOUND,
                        serde_json::json!({ "registered": false, "error": message }),
                    ),
                    GateError::LookupFailure(_) | GateError::SendFailure(_) => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        serde_json::json!({ "error": message }),
                    ),
                }
            }
            Self::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatbridge_core::api::SessionStatus;
    use pretty_assertions::assert_eq;

    async fn render(err: HttpServerError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_send_body_deserialize() {
        let json = r#"{"messageId":"m1","number":"15551234567","message":"hi","pdfPath":"/tmp/a.pdf","caption":"c"}"#;
        let body: SendBody = serde_json::from_str(json).unwrap();
        let req = SendRequest::from(body);
        assert_eq!(req.message_id.as_deref(), Some("m1"));
        assert_eq!(req.recipient.as_deref(), Some("15551234567"));
        assert_eq!(req.text.as_deref(), Some("hi"));
        assert_eq!(req.attachment_path.as_deref(), Some("/tmp/a.pdf"));
        assert_eq!(req.caption.as_deref(), Some("c"));
    }

    #[test]
    fn test_send_body_numeric_identifiers() {
        let body: SendBody = serde_json::from_str(r#"{"messageId":42,"number":15551234567}"#).unwrap();
        assert_eq!(body.message_id.as_deref(), Some("42"));
        assert_eq!(body.number.as_deref(), Some("15551234567"));
        assert!(body.message.is_none());
    }

    #[test]
    fn test_send_response_omits_duplicate_flag() {
        let json = serde_json::to_string(&SendResponse {
            success: true,
            duplicate: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }

    #[tokio::test]
    async fn test_not_ready_echoes_status() {
        let (status, body) = render(
            GateError::NotReady {
                current: SessionStatus::Qr,
            }
            .into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            serde_json::json!({"error": "WhatsApp is not ready", "currentStatus": "qr"})
        );
    }

    #[tokio::test]
    async fn test_not_registered_is_404() {
        let (status, body) = render(GateError::NotRegistered.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["registered"], false);
        assert_eq!(body["error"], "Number does not have WhatsApp");
    }

    #[tokio::test]
    async fn test_lookup_failure_hides_detail() {
        let (status, body) =
            render(GateError::LookupFailure("connect refused 10.0.0.3".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"error": "Unable to verify number"}));
    }
}
