//! Message bubbles and wait indicators for the conversation thread

use yew::prelude::*;

/// Who produced a message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

/// One immutable entry in the visible thread
#[derive(Clone, Debug, PartialEq)]
pub struct ChatMessage {
    pub text: String,
    pub sender: Sender,
    /// Localized time label minted when the message was created
    pub sent_at: String,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            text: text.into(),
            sender,
            sent_at: now_time_label(),
        }
    }
}

/// Which round-trip the transient indicator bubble is waiting on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingKind {
    /// Chat request outstanding
    Awaiting,
    /// Transcription upload outstanding
    Decoding,
}

/// Localized wall-clock label, e.g. "14:32:05"
#[cfg(target_arch = "wasm32")]
fn now_time_label() -> String {
    js_sys::Date::new_0()
        .to_locale_time_string("default")
        .as_string()
        .unwrap_or_default()
}

// Unit tests run natively, where js_sys is unavailable.
#[cfg(not(target_arch = "wasm32"))]
fn now_time_label() -> String {
    String::new()
}

/// Props for a single message bubble
#[derive(Properties, PartialEq)]
pub struct MessageBubbleProps {
    pub message: ChatMessage,
}

#[function_component(MessageBubble)]
pub fn message_bubble(props: &MessageBubbleProps) -> Html {
    let sender_class = match props.message.sender {
        Sender::User => "user",
        Sender::Assistant => "assistant",
    };

    html! {
        <div class={classes!("message", sender_class)}>
            <div class="message-text">{ render_multiline(&props.message.text) }</div>
            <div class="message-time">{ &props.message.sent_at }</div>
        </div>
    }
}

/// Props for the transient wait indicator
#[derive(Properties, PartialEq)]
pub struct PendingIndicatorProps {
    pub kind: PendingKind,
}

#[function_component(PendingIndicator)]
pub fn pending_indicator(props: &PendingIndicatorProps) -> Html {
    let label = match props.kind {
        PendingKind::Awaiting => "Typing\u{2026}",
        PendingKind::Decoding => "Transcribing\u{2026}",
    };

    html! {
        <div class={classes!("message", "assistant", "pending")}>
            <div class="message-text">{ label }</div>
        </div>
    }
}

/// Assistant menus span several lines; keep the breaks visible
fn render_multiline(text: &str) -> Html {
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len().saturating_sub(1);
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            html! {
                <>
                    { *line }
                    if i < last { <br /> }
                </>
            }
        })
        .collect::<Html>()
}
