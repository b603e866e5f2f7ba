use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::transcript::Message;

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct ChatReply {
    reply: String,
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Sends the full conversation so far and returns the assistant's reply.
    /// Any non-2xx status or unparseable body is an error; callers treat all
    /// failures alike.
    pub async fn send_message(&self, messages: &[Message]) -> Result<String> {
        let url = format!("{}/chat/message", self.base_url);

        let request = ChatRequest { messages };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Chat request failed with status: {}",
                response.status()
            ));
        }

        let chat_reply: ChatReply = response.json().await?;
        Ok(chat_reply.reply)
    }

    /// Ends the server-side session. The session itself is managed entirely
    /// by the server; this client only triggers the teardown.
    pub async fn logout(&self) -> Result<()> {
        let url = format!("{}/logout", self.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow!("Logout failed with status: {}", response.status()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Role;

    #[test]
    fn test_request_wire_shape() {
        let messages = vec![
            Message {
                role: Role::User,
                content: "Hello".to_string(),
            },
            Message {
                role: Role::Assistant,
                content: "Hi there".to_string(),
            },
        ];
        let request = ChatRequest {
            messages: &messages,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "messages": [
                    { "role": "user", "content": "Hello" },
                    { "role": "assistant", "content": "Hi there" },
                ]
            })
        );
    }

    #[test]
    fn test_reply_parse_ignores_extra_fields() {
        let body = r#"{"reply": "X", "usage": {"tokens": 42}}"#;
        let reply: ChatReply = serde_json::from_str(body).unwrap();
        assert_eq!(reply.reply, "X");
    }

    #[test]
    fn test_reply_missing_field_is_error() {
        let body = r#"{"error": "Not authenticated"}"#;
        assert!(serde_json::from_str::<ChatReply>(body).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = BackendClient::new("http://localhost:5000/");
        assert_eq!(backend.base_url, "http://localhost:5000");
    }
}
