//! Status object returned to the Lambda runtime.

use serde::{Deserialize, Serialize};

/// Fixed success status, shaped like an API Gateway proxy response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    /// JSON-encoded status text.
    pub body: String,
}

impl HandlerResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            status_code: 200,
            body: serde_json::Value::String(message.to_string()).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_shape() {
        let response = HandlerResponse::ok("Reply sent");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["body"], "\"Reply sent\"");
    }
}
