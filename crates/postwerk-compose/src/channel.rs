// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Method-channel message types.
//
// Calls arrive as a method name plus a JSON argument map; replies are a
// success payload, a coded error, or "not implemented".

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use postwerk_core::error::{ComposerError, Result};

/// Channel the application layer talks to.
pub const CHANNEL_NAME: &str = "flutter_email_sender";

/// The only method this plugin implements.
pub const METHOD_SEND: &str = "send";

/// Error code for "no installed app can handle the action".
pub const CODE_NOT_AVAILABLE: &str = "not_available";

/// An inbound call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Value,
}

impl MethodCall {
    pub fn new(method: impl Into<String>, arguments: Value) -> Self {
        Self {
            method: method.into(),
            arguments,
        }
    }

    /// Decode the argument map. A missing map decodes like an empty one.
    pub fn decode_arguments<T: DeserializeOwned>(&self) -> Result<T> {
        let args = match &self.arguments {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        serde_json::from_value(args).map_err(|e| ComposerError::InvalidArguments(e.to_string()))
    }
}

/// Reply to a [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    Success {
        result: Value,
    },
    Error {
        code: String,
        message: String,
        details: Option<Value>,
    },
    NotImplemented,
}

impl MethodResponse {
    /// Success with no payload.
    pub fn success() -> Self {
        Self::Success { result: Value::Null }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn no_handler() -> Self {
        Self::error(CODE_NOT_AVAILABLE, "No email clients found!")
    }

    pub fn from_error(err: &ComposerError) -> Self {
        Self::error(err.channel_code(), err.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Error code, if this is an error reply.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Error { code, .. } => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use postwerk_core::types::SendRequest;
    use serde_json::json;

    #[test]
    fn null_arguments_decode_as_empty_request() {
        let call = MethodCall::new(METHOD_SEND, Value::Null);
        let req: SendRequest = call.decode_arguments().unwrap();
        assert_eq!(req, SendRequest::default());
    }

    #[test]
    fn wrong_types_are_invalid_arguments() {
        let call = MethodCall::new(METHOD_SEND, json!({ "recipients": "not-a-list" }));
        let err = call.decode_arguments::<SendRequest>().unwrap_err();
        assert!(matches!(err, ComposerError::InvalidArguments(_)));
        assert_eq!(MethodResponse::from_error(&err).error_code(), Some("error"));
    }

    #[test]
    fn responses_serialize_with_status_tag() {
        let value = serde_json::to_value(MethodResponse::no_handler()).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "error",
                "code": "not_available",
                "message": "No email clients found!",
                "details": null,
            })
        );
        assert_eq!(
            serde_json::to_value(MethodResponse::success()).unwrap(),
            json!({ "status": "success", "result": null })
        );
    }

    #[test]
    fn call_parses_from_json() {
        let call: MethodCall =
            serde_json::from_str(r#"{ "method": "send", "arguments": { "subject": "x" } }"#)
                .unwrap();
        assert_eq!(call.method, "send");
        let req: SendRequest = call.decode_arguments().unwrap();
        assert_eq!(req.subject.as_deref(), Some("x"));
    }
}
