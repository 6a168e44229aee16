//! Static configuration: copy, quick replies, endpoints, capture limits

use crate::components::reply_options::QuickReply;

/// Greeting rendered locally as the first assistant turn
pub const WELCOME_MESSAGE: &str = "Hello! I'm your assistant. I can help you with:\n\n\
    1) Creating a request\n\
    2) Course enrollment\n\
    3) Benefits and aid\n\
    4) Library appointments\n\
    5) On-duty pharmacies\n\n\
    You can also just type your question directly.";

/// Shown when the chat endpoint responds but carries nothing usable
pub const MSG_NO_ANSWER: &str = "Sorry, I couldn't come up with an answer. Please try again.";

/// Shown on any transport failure or non-success status from the chat endpoint
pub const MSG_TRANSPORT_FAILURE: &str =
    "Sorry, something went wrong reaching the server. Please try again.";

/// Shown when the transcription round-trip fails for any reason
pub const MSG_TRANSCRIBE_FAILURE: &str =
    "Sorry, I couldn't understand the recording. Please try again.";

/// Shown when the browser has no audio capture support
pub const MSG_CAPTURE_UNSUPPORTED: &str =
    "Voice input is not supported in this browser. Please type your message instead.";

/// Shown when microphone access is denied or fails
pub const MSG_MIC_DENIED: &str =
    "I couldn't access your microphone. Please check permissions and try again.";

/// Confirmation prompt for the reset affordance
pub const RESET_CONFIRM_PROMPT: &str =
    "Start a new conversation? The current thread will be cleared.";

pub const CHAT_ENDPOINT: &str = "/api/chat";
pub const TRANSCRIBE_ENDPOINT: &str = "/api/transcribe";

/// Hard stop for a single recording
pub const RECORDING_CEILING_MS: u32 = 90_000;

/// Refresh period for the elapsed-time readout
pub const RECORDING_TICK_MS: u32 = 250;

/// Container/codec identifiers probed in order; first supported wins
pub const MIME_PREFERENCES: [&str; 4] = [
    "audio/webm;codecs=opus",
    "audio/webm",
    "audio/ogg;codecs=opus",
    "audio/mp4",
];

/// Fallback tag when the platform never reported a supported format
pub const DEFAULT_MIME: &str = "audio/webm";

/// The static suggestion row shown whenever the last assistant turn
/// carried no numbered menu
pub fn default_quick_replies() -> Vec<QuickReply> {
    vec![
        QuickReply {
            label: "Create a request",
            text: "I'd like to create a request",
            auto_send: true,
        },
        QuickReply {
            label: "Courses",
            text: "I want to enroll in a course",
            auto_send: true,
        },
        QuickReply {
            label: "Pharmacies",
            text: "Which pharmacies are on duty?",
            auto_send: true,
        },
        QuickReply {
            label: "Ask something else",
            text: "I have a different question: ",
            auto_send: false,
        },
    ]
}
