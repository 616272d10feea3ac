use super::{AlertDispatcher, DispatchError, MessageReceipt};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// Created message as returned by the Messages resource
#[derive(Debug, Deserialize)]
struct TwilioMessage {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    #[serde(default)]
    code: Option<u32>,
    message: String,
}

/// Sends alerts as SMS or WhatsApp messages through Twilio
pub struct TwilioDispatcher {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    base_url: String,
}

impl TwilioDispatcher {
    pub fn new(account_sid: String, auth_token: String, timeout_secs: u64) -> Result<Self, DispatchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| DispatchError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            account_sid,
            auth_token,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.account_sid
        )
    }
}

/// Turn a non-2xx Twilio response body into a readable error
fn rejection(status: u16, body: &str) -> DispatchError {
    let message = match serde_json::from_str::<TwilioErrorBody>(body) {
        Ok(TwilioErrorBody { code: Some(code), message }) => format!("{message} (code {code})"),
        Ok(TwilioErrorBody { code: None, message }) => message,
        Err(_) => body.trim().to_string(),
    };
    DispatchError::Rejected { status, message }
}

#[async_trait]
impl AlertDispatcher for TwilioDispatcher {
    fn name(&self) -> &'static str {
        "Twilio"
    }

    async fn send(&self, body: &str, from: &str, to: &str) -> Result<MessageReceipt, DispatchError> {
        if to.trim().is_empty() {
            return Err(DispatchError::InvalidRecipient("recipient is empty".to_string()));
        }

        log::debug!("Posting message to Twilio for {to}");

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("Body", body), ("From", from), ("To", to)])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(rejection(status.as_u16(), &text));
        }

        let message: TwilioMessage = serde_json::from_str(&text)
            .map_err(|e| DispatchError::Network(format!("Unexpected Twilio response: {e}")))?;
        log::debug!(
            "Twilio accepted message {} with status {}",
            message.sid,
            message.status.as_deref().unwrap_or("unknown")
        );

        Ok(MessageReceipt { message_id: message.sid })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url() {
        let mut dispatcher =
            TwilioDispatcher::new("AC123".to_string(), "token".to_string(), 30).unwrap();
        assert_eq!(
            dispatcher.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );

        dispatcher.base_url = "http://localhost:8080/".to_string();
        assert_eq!(
            dispatcher.messages_url(),
            "http://localhost:8080/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn test_rejection_parses_twilio_error_body() {
        let body = r#"{"code": 21211, "message": "The 'To' number is not a valid phone number.", "status": 400}"#;
        match rejection(400, body) {
            DispatchError::Rejected { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "The 'To' number is not a valid phone number. (code 21211)");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_rejection_falls_back_to_raw_body() {
        match rejection(502, " Bad Gateway \n") {
            DispatchError::Rejected { message, .. } => assert_eq!(message, "Bad Gateway"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_recipient_is_rejected_locally() {
        let dispatcher =
            TwilioDispatcher::new("AC123".to_string(), "token".to_string(), 30).unwrap();
        let result = dispatcher.send("hello", "+10000000000", " ").await;
        assert!(matches!(result, Err(DispatchError::InvalidRecipient(_))));
    }

    #[test]
    fn test_created_message_parsing() {
        let body = r#"{"sid": "SM0123456789abcdef", "status": "queued", "body": "hi"}"#;
        let message: TwilioMessage = serde_json::from_str(body).unwrap();
        assert_eq!(message.sid, "SM0123456789abcdef");
        assert_eq!(message.status.as_deref(), Some("queued"));
    }
}
