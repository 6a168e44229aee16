//! Request/response contracts for the two server endpoints
//!
//! Both endpoints are plain HTTP consumed with `gloo_net`. The types here
//! are the whole contract the client relies on; anything else the server
//! sends is ignored.

use gloo_net::http::Request;
use serde::{Deserialize, Deserializer, Serialize};
use web_sys::{Blob, FormData};

use crate::{config, utils};

/// Body for POST /api/chat. An empty `message` with a fresh `user_id`
/// is the session-priming call; its response is never rendered.
#[derive(Clone, Debug, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: String,
}

/// Body of a successful chat response.
///
/// `reply` is tri-state: a present string, an explicit `null`, or the
/// field missing entirely. Each maps to a different UI outcome, so the
/// deserializer keeps presence and nullability apart.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChatResponse {
    #[serde(default, deserialize_with = "some_if_present")]
    pub reply: Option<Option<String>>,
}

/// What the controller should do with a chat response
#[derive(Clone, Debug, PartialEq)]
pub enum ReplyOutcome {
    /// Render as an assistant message and re-derive the option row from it
    Answer(String),
    /// Server declined to produce a turn; restore defaults, render nothing
    SilentAck,
    /// Payload parsed but carried no usable reply
    NoAnswer,
}

impl ChatResponse {
    pub fn outcome(self) -> ReplyOutcome {
        match self.reply {
            Some(Some(text)) if !text.is_empty() => ReplyOutcome::Answer(text),
            // Explicit "" or null both mean a deliberate empty turn
            Some(_) => ReplyOutcome::SilentAck,
            None => ReplyOutcome::NoAnswer,
        }
    }
}

/// Outer Option = field present at all, inner Option = non-null
fn some_if_present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Body of a transcription response. A present `error` routes to the
/// failure path regardless of the other fields.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TranscribeResponse {
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Send one conversational turn (or the priming call) to the chat endpoint
pub async fn send_chat(session_id: &str, message: &str) -> Result<ChatResponse, String> {
    let body = ChatRequest {
        message: message.to_string(),
        user_id: session_id.to_string(),
    };

    let response = Request::post(&utils::api_url(config::CHAT_ENDPOINT))
        .json(&body)
        .map_err(|e| format!("Failed to encode chat request: {:?}", e))?
        .send()
        .await
        .map_err(|e| format!("Chat request failed: {:?}", e))?;

    if !response.ok() {
        return Err(format!("Chat endpoint returned status {}", response.status()));
    }

    response
        .json::<ChatResponse>()
        .await
        .map_err(|e| format!("Failed to decode chat response: {:?}", e))
}

/// Upload an assembled audio clip for transcription
pub async fn send_transcription(
    session_id: &str,
    audio: &Blob,
    mime_type: &str,
) -> Result<TranscribeResponse, String> {
    let form = FormData::new().map_err(|e| format!("Failed to create form data: {:?}", e))?;
    let filename = format!("clip.{}", mime_subtype(mime_type));
    form.append_with_blob_and_filename("audio", audio, &filename)
        .map_err(|e| format!("Failed to attach audio clip: {:?}", e))?;
    form.append_with_str("user_id", session_id)
        .map_err(|e| format!("Failed to attach user id: {:?}", e))?;

    let response = Request::post(&utils::api_url(config::TRANSCRIBE_ENDPOINT))
        .body(form)
        .map_err(|e| format!("Failed to build transcription request: {:?}", e))?
        .send()
        .await
        .map_err(|e| format!("Transcription request failed: {:?}", e))?;

    if !response.ok() {
        return Err(format!(
            "Transcription endpoint returned status {}",
            response.status()
        ));
    }

    response
        .json::<TranscribeResponse>()
        .await
        .map_err(|e| format!("Failed to decode transcription response: {:?}", e))
}

/// Container subtype for the uploaded filename ("audio/webm;codecs=opus" -> "webm")
pub fn mime_subtype(mime: &str) -> &str {
    mime.split(';')
        .next()
        .and_then(|media| media.split('/').nth(1))
        .filter(|subtype| !subtype.is_empty())
        .unwrap_or("webm")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_with_content_is_an_answer() {
        let response: ChatResponse = serde_json::from_str(r#"{"reply": "1) A\n2) B"}"#).unwrap();
        assert_eq!(
            response.outcome(),
            ReplyOutcome::Answer("1) A\n2) B".to_string())
        );
    }

    #[test]
    fn test_empty_reply_is_a_silent_ack() {
        let response: ChatResponse = serde_json::from_str(r#"{"reply": ""}"#).unwrap();
        assert_eq!(response.outcome(), ReplyOutcome::SilentAck);
    }

    #[test]
    fn test_null_reply_is_a_silent_ack() {
        let response: ChatResponse = serde_json::from_str(r#"{"reply": null}"#).unwrap();
        assert_eq!(response.outcome(), ReplyOutcome::SilentAck);
    }

    #[test]
    fn test_missing_reply_is_no_answer() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"user_message": "hello"}"#).unwrap();
        assert_eq!(response.outcome(), ReplyOutcome::NoAnswer);
    }

    #[test]
    fn test_transcribe_response_fields_all_optional() {
        let response: TranscribeResponse = serde_json::from_str("{}").unwrap();
        assert!(response.transcript.is_none());
        assert!(response.reply.is_none());
        assert!(response.error.is_none());

        let response: TranscribeResponse =
            serde_json::from_str(r#"{"transcript": "hi", "reply": "hello"}"#).unwrap();
        assert_eq!(response.transcript.as_deref(), Some("hi"));
        assert_eq!(response.reply.as_deref(), Some("hello"));
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let body = ChatRequest {
            message: "hello".to_string(),
            user_id: "web-123".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["message"], "hello");
        assert_eq!(json["user_id"], "web-123");
    }

    #[test]
    fn test_mime_subtype_derivation() {
        assert_eq!(mime_subtype("audio/webm;codecs=opus"), "webm");
        assert_eq!(mime_subtype("audio/ogg;codecs=opus"), "ogg");
        assert_eq!(mime_subtype("audio/mp4"), "mp4");
        // Degenerate tags fall back to the default container
        assert_eq!(mime_subtype(""), "webm");
        assert_eq!(mime_subtype("audio/"), "webm");
    }
}
