use thiserror::Error;

use crate::state::SessionStatus;

/// Request-level failures of the dispatch gate and number lookup.
///
/// Messages are user-facing and end up verbatim in the `error` field of the
/// HTTP response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    #[error("WhatsApp is not ready")]
    NotReady { current: SessionStatus },
    #[error("{}", missing_field_message(.field))]
    MissingField { field: &'static str },
    #[error("Number does not have WhatsApp")]
    NotRegistered,
    #[error("Unable to verify number")]
    LookupFailure(String),
    #[error("{0}")]
    SendFailure(String),
}

fn missing_field_message(field: &str) -> String {
    match field {
        "messageId" => "MessageID is required".to_string(),
        "number" => "Phone number is required".to_string(),
        other => format!("{other} is required"),
    }
}

/// Pairing artifact could not be rendered.
#[derive(Error, Debug)]
#[error("pairing render failed: {0}")]
pub struct RenderError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_messages() {
        assert_eq!(
            GateError::MissingField { field: "messageId" }.to_string(),
            "MessageID is required"
        );
        assert_eq!(
            GateError::MissingField { field: "number" }.to_string(),
            "Phone number is required"
        );
    }

    #[test]
    fn send_failure_surfaces_backend_detail() {
        let err = GateError::SendFailure("WhatsApp backend returned status 500: boom".into());
        assert_eq!(err.to_string(), "WhatsApp backend returned status 500: boom");
    }
}
