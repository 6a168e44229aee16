//! ChatView component - the conversation controller
//!
//! Owns every piece of shared mutable state: the active session, the
//! message thread, the option row, the composer value and the busy flag.
//! The busy flag is the only concurrency guard in the client; it totally
//! orders submissions, and its release is unconditional on every outcome
//! path of both round-trips.

use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlTextAreaElement, KeyboardEvent};
use yew::prelude::*;

use crate::api::{self, ChatResponse, ReplyOutcome, TranscribeResponse};
use crate::components::reply_options::{options_for_reply, OptionRow, PickedReply, ReplyOptions};
use crate::components::transcript::{
    ChatMessage, MessageBubble, PendingIndicator, PendingKind, Sender,
};
use crate::components::voice_input::{RecordedClip, VoiceInput};
use crate::config;
use crate::session::ClientSession;

pub enum ChatViewMsg {
    UpdateInput(String),
    Submit,
    ChatDone(Result<ChatResponse, String>),
    Pick(PickedReply),
    RecordingChanged(bool),
    ClipReady(RecordedClip),
    TranscribeDone(Result<TranscribeResponse, String>),
    CaptureFailed(String),
    Reset,
}

pub struct ChatView {
    session: ClientSession,
    messages: Vec<ChatMessage>,
    /// Transient wait bubble; always cleared before any outcome render
    pending: Option<PendingKind>,
    /// Replaced wholesale after every assistant turn
    options: OptionRow,
    input_value: String,
    /// True while a chat or transcription round-trip is outstanding
    busy: bool,
    is_recording: bool,
    /// A clip that finished while a chat round-trip was outstanding;
    /// submitted as soon as the lock clears, never dropped
    pending_clip: Option<RecordedClip>,
    /// Focus the composer on the next render, once it is enabled again
    needs_focus: bool,
    input_ref: NodeRef,
    messages_ref: NodeRef,
}

/// Park the clip while the lock is held, pass it through otherwise
fn park_or_pass<T>(busy: bool, slot: &mut Option<T>, clip: T) -> Option<T> {
    if busy {
        *slot = Some(clip);
        None
    } else {
        Some(clip)
    }
}

/// Only the transcription round-trip locks the record toggle; a chat
/// submission leaves recording available, so a running capture can be
/// stopped (or hit its ceiling) while the request is outstanding.
fn record_toggle_locked(pending: Option<PendingKind>) -> bool {
    pending == Some(PendingKind::Decoding)
}

/// Resetting mid-round-trip or mid-recording would strand the response
/// or the capture against a stale session id
fn reset_blocked(busy: bool, recording: bool) -> bool {
    busy || recording
}

impl Component for ChatView {
    type Message = ChatViewMsg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        let session = ClientSession::new();
        Self::prime_session(session.id.clone());
        Self {
            session,
            messages: vec![ChatMessage::new(config::WELCOME_MESSAGE, Sender::Assistant)],
            pending: None,
            options: OptionRow::default_quick(),
            input_value: String::new(),
            busy: false,
            is_recording: false,
            pending_clip: None,
            needs_focus: false,
            input_ref: NodeRef::default(),
            messages_ref: NodeRef::default(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            ChatViewMsg::UpdateInput(value) => {
                self.input_value = value;
                true
            }
            ChatViewMsg::Submit => self.handle_submit(ctx),
            ChatViewMsg::ChatDone(result) => {
                let changed = self.handle_chat_done(result);
                self.dispatch_parked_clip(ctx);
                changed
            }
            ChatViewMsg::Pick(picked) => {
                self.input_value = picked.text;
                self.needs_focus = true;
                if picked.auto_send {
                    ctx.link().send_message(ChatViewMsg::Submit);
                }
                true
            }
            ChatViewMsg::RecordingChanged(recording) => {
                self.is_recording = recording;
                true
            }
            ChatViewMsg::ClipReady(clip) => {
                match park_or_pass(self.busy, &mut self.pending_clip, clip) {
                    Some(clip) => self.submit_clip(ctx, clip),
                    None => false,
                }
            }
            ChatViewMsg::TranscribeDone(result) => {
                let changed = self.handle_transcribe_done(result);
                self.dispatch_parked_clip(ctx);
                changed
            }
            ChatViewMsg::CaptureFailed(message) => {
                self.messages
                    .push(ChatMessage::new(message, Sender::Assistant));
                true
            }
            ChatViewMsg::Reset => self.handle_reset(),
        }
    }

    fn rendered(&mut self, _ctx: &Context<Self>, _first_render: bool) {
        // Keep the thread pinned to the newest entry
        if let Some(element) = self.messages_ref.cast::<Element>() {
            element.set_scroll_top(element.scroll_height());
        }
        // Focusing happens after the render so the composer's disabled
        // attribute has already been lifted; a focus() call from update()
        // would hit a still-disabled node and do nothing.
        if self.needs_focus {
            self.needs_focus = false;
            self.focus_composer();
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();

        let handle_submit = link.callback(|e: SubmitEvent| {
            e.prevent_default();
            ChatViewMsg::Submit
        });
        let handle_input = link.callback(|e: InputEvent| {
            let input: HtmlTextAreaElement = e.target_unchecked_into();
            ChatViewMsg::UpdateInput(input.value())
        });
        let handle_keydown = link.batch_callback(|e: KeyboardEvent| {
            // Enter submits, Shift+Enter inserts a newline
            if e.key() == "Enter" && !e.shift_key() {
                e.prevent_default();
                Some(ChatViewMsg::Submit)
            } else {
                None
            }
        });
        let on_reset = link.callback(|_| ChatViewMsg::Reset);
        let on_pick = link.callback(ChatViewMsg::Pick);
        let on_recording_change = link.callback(ChatViewMsg::RecordingChanged);
        let on_clip = link.callback(ChatViewMsg::ClipReady);
        let on_capture_error = link.callback(ChatViewMsg::CaptureFailed);

        html! {
            <div class="chat-view">
                <header class="chat-header">
                    <h1>{ "Assistant" }</h1>
                    <button
                        type="button"
                        class="reset-button"
                        disabled={reset_blocked(self.busy, self.is_recording)}
                        onclick={on_reset}
                    >
                        { "New conversation" }
                    </button>
                </header>

                <div class="chat-messages" ref={self.messages_ref.clone()}>
                    {
                        self.messages.iter().map(|message| html! {
                            <MessageBubble message={message.clone()} />
                        }).collect::<Html>()
                    }
                    if let Some(kind) = self.pending {
                        <PendingIndicator {kind} />
                    }
                </div>

                <ReplyOptions row={self.options.clone()} disabled={self.busy} {on_pick} />

                <form class="chat-composer" onsubmit={handle_submit}>
                    <textarea
                        ref={self.input_ref.clone()}
                        class="composer-input"
                        placeholder="Type your message\u{2026}"
                        value={self.input_value.clone()}
                        oninput={handle_input}
                        onkeydown={handle_keydown}
                        disabled={self.busy}
                        rows="1"
                    />
                    <VoiceInput
                        {on_recording_change}
                        {on_clip}
                        on_error={on_capture_error}
                        disabled={record_toggle_locked(self.pending)}
                    />
                    <button type="submit" class="send-button" disabled={self.busy}>
                        { "Send" }
                    </button>
                </form>
            </div>
        }
    }
}

impl ChatView {
    /// The send cycle. No-op on empty input or while a request is already
    /// outstanding - that check is the single in-flight guarantee.
    fn handle_submit(&mut self, ctx: &Context<Self>) -> bool {
        let text = self.input_value.trim().to_string();
        if text.is_empty() || self.busy {
            return false;
        }

        self.busy = true;
        // Optimistic echo, rendered before the request goes out
        self.messages
            .push(ChatMessage::new(text.clone(), Sender::User));
        self.input_value.clear();
        self.pending = Some(PendingKind::Awaiting);

        let session_id = self.session.id.clone();
        let link = ctx.link().clone();
        spawn_local(async move {
            let result = api::send_chat(&session_id, &text).await;
            // Delivered on every path, so the busy lock always releases
            link.send_message(ChatViewMsg::ChatDone(result));
        });
        true
    }

    fn handle_chat_done(&mut self, result: Result<ChatResponse, String>) -> bool {
        self.pending = None;
        self.busy = false;

        match result {
            Ok(response) => match response.outcome() {
                ReplyOutcome::Answer(text) => {
                    self.options = options_for_reply(&text);
                    self.messages.push(ChatMessage::new(text, Sender::Assistant));
                }
                ReplyOutcome::SilentAck => {
                    self.options = OptionRow::default_quick();
                }
                ReplyOutcome::NoAnswer => {
                    self.messages
                        .push(ChatMessage::new(config::MSG_NO_ANSWER, Sender::Assistant));
                    self.options = OptionRow::default_quick();
                }
            },
            Err(e) => {
                log::error!("Chat round-trip failed: {}", e);
                self.messages.push(ChatMessage::new(
                    config::MSG_TRANSPORT_FAILURE,
                    Sender::Assistant,
                ));
                self.options = OptionRow::default_quick();
            }
        }

        self.needs_focus = true;
        true
    }

    /// Hand a parked clip over once the busy lock has cleared
    fn dispatch_parked_clip(&mut self, ctx: &Context<Self>) {
        if let Some(clip) = self.pending_clip.take() {
            ctx.link().send_message(ChatViewMsg::ClipReady(clip));
        }
    }

    /// Submit an assembled recording for transcription. This round-trip
    /// takes the full three-way lock: busy disables composer and send,
    /// and the decoding indicator locks the record toggle too.
    fn submit_clip(&mut self, ctx: &Context<Self>, clip: RecordedClip) -> bool {
        self.busy = true;
        self.pending = Some(PendingKind::Decoding);

        let session_id = self.session.id.clone();
        let link = ctx.link().clone();
        spawn_local(async move {
            let result = api::send_transcription(&session_id, &clip.blob, &clip.mime_type).await;
            link.send_message(ChatViewMsg::TranscribeDone(result));
        });
        true
    }

    fn handle_transcribe_done(&mut self, result: Result<TranscribeResponse, String>) -> bool {
        self.pending = None;
        self.busy = false;

        match result {
            Ok(response) => {
                if let Some(error) = response.error {
                    log::error!("Transcription rejected: {}", error);
                    self.push_transcribe_failure();
                } else {
                    // The transcript is informational only - the server has
                    // already answered it, so it is never re-sent.
                    if let Some(transcript) = response.transcript.filter(|t| !t.is_empty()) {
                        self.messages
                            .push(ChatMessage::new(transcript, Sender::User));
                    }
                    match response.reply.filter(|r| !r.is_empty()) {
                        Some(reply) => {
                            self.options = options_for_reply(&reply);
                            self.messages
                                .push(ChatMessage::new(reply, Sender::Assistant));
                        }
                        None => {
                            self.options = OptionRow::default_quick();
                        }
                    }
                }
            }
            Err(e) => {
                log::error!("Transcription round-trip failed: {}", e);
                self.push_transcribe_failure();
            }
        }

        self.needs_focus = true;
        true
    }

    fn push_transcribe_failure(&mut self) {
        self.messages.push(ChatMessage::new(
            config::MSG_TRANSCRIBE_FAILURE,
            Sender::Assistant,
        ));
        self.options = OptionRow::default_quick();
    }

    /// Clear the thread, mint a fresh session id and re-render the one
    /// welcome turn. Gated by a confirmation dialog, and unavailable
    /// while a round-trip or a recording is in progress.
    fn handle_reset(&mut self) -> bool {
        if reset_blocked(self.busy, self.is_recording) {
            return false;
        }
        if !gloo::dialogs::confirm(config::RESET_CONFIRM_PROMPT) {
            return false;
        }

        self.session = ClientSession::new();
        self.messages = vec![ChatMessage::new(config::WELCOME_MESSAGE, Sender::Assistant)];
        self.options = OptionRow::default_quick();
        self.input_value.clear();
        self.pending = None;
        self.pending_clip = None;
        Self::prime_session(self.session.id.clone());
        true
    }

    /// Establish server-side state for a fresh id. The response is never
    /// rendered; failures are logged and the user retries by chatting.
    fn prime_session(session_id: String) {
        spawn_local(async move {
            if let Err(e) = api::send_chat(&session_id, "").await {
                log::warn!("Session priming failed: {}", e);
            }
        });
    }

    fn focus_composer(&self) {
        if let Some(input) = self.input_ref.cast::<HtmlTextAreaElement>() {
            let _ = input.focus();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_view() -> ChatView {
        ChatView {
            session: ClientSession::new(),
            messages: vec![],
            pending: None,
            options: OptionRow::default_quick(),
            input_value: String::new(),
            busy: false,
            is_recording: false,
            pending_clip: None,
            needs_focus: false,
            input_ref: NodeRef::default(),
            messages_ref: NodeRef::default(),
        }
    }

    fn reply(text: &str) -> ChatResponse {
        ChatResponse {
            reply: Some(Some(text.to_string())),
        }
    }

    #[test]
    fn test_chat_done_unlocks_and_defers_focus() {
        let mut view = idle_view();
        view.busy = true;
        view.pending = Some(PendingKind::Awaiting);

        assert!(view.handle_chat_done(Ok(reply("All done"))));

        assert!(!view.busy);
        assert!(view.pending.is_none());
        // Focus waits for the re-render that re-enables the composer
        assert!(view.needs_focus);
        let last = view.messages.last().unwrap();
        assert_eq!(last.text, "All done");
        assert_eq!(last.sender, Sender::Assistant);
    }

    #[test]
    fn test_silent_ack_renders_no_message() {
        let mut view = idle_view();
        view.busy = true;
        view.handle_chat_done(Ok(ChatResponse { reply: Some(None) }));

        assert!(view.messages.is_empty());
        assert_eq!(view.options, OptionRow::default_quick());
        assert!(!view.busy);
    }

    #[test]
    fn test_missing_reply_renders_no_answer_bubble() {
        let mut view = idle_view();
        view.busy = true;
        view.handle_chat_done(Ok(ChatResponse::default()));

        assert_eq!(view.messages.last().unwrap().text, config::MSG_NO_ANSWER);
        assert_eq!(view.options, OptionRow::default_quick());
    }

    #[test]
    fn test_transport_failure_releases_lock() {
        let mut view = idle_view();
        view.busy = true;
        view.pending = Some(PendingKind::Awaiting);
        view.handle_chat_done(Err("connection refused".to_string()));

        assert!(!view.busy);
        assert!(view.pending.is_none());
        assert!(view.needs_focus);
        assert_eq!(
            view.messages.last().unwrap().text,
            config::MSG_TRANSPORT_FAILURE
        );
    }

    #[test]
    fn test_menu_reply_swaps_option_row_to_choices() {
        let mut view = idle_view();
        view.busy = true;
        view.handle_chat_done(Ok(reply("Pick one:\n1) A\n2) B")));

        match &view.options {
            OptionRow::Choices(choices) => assert_eq!(choices.len(), 2),
            OptionRow::Quick(_) => panic!("expected choices"),
        }
    }

    #[test]
    fn test_transcribe_done_unlocks_and_defers_focus() {
        let mut view = idle_view();
        view.busy = true;
        view.pending = Some(PendingKind::Decoding);

        view.handle_transcribe_done(Ok(TranscribeResponse {
            transcript: Some("two please".to_string()),
            reply: Some("Noted!".to_string()),
            error: None,
        }));

        assert!(!view.busy);
        assert!(view.pending.is_none());
        assert!(view.needs_focus);
        assert_eq!(view.messages.len(), 2);
        assert_eq!(view.messages[0].sender, Sender::User);
        assert_eq!(view.messages[0].text, "two please");
        assert_eq!(view.messages[1].sender, Sender::Assistant);
    }

    #[test]
    fn test_transcribe_error_field_routes_to_failure() {
        let mut view = idle_view();
        view.busy = true;
        view.handle_transcribe_done(Ok(TranscribeResponse {
            transcript: Some("ignored".to_string()),
            reply: Some("ignored".to_string()),
            error: Some("no speech detected".to_string()),
        }));

        assert_eq!(view.messages.len(), 1);
        assert_eq!(
            view.messages.last().unwrap().text,
            config::MSG_TRANSCRIBE_FAILURE
        );
        assert!(!view.busy);
    }

    #[test]
    fn test_clip_parked_while_request_outstanding() {
        // A recording can end (manually or via the ceiling) while a chat
        // round-trip holds the lock; the clip must survive until the lock
        // clears instead of being dropped.
        let mut slot = None;
        assert_eq!(park_or_pass(true, &mut slot, "clip"), None);
        assert_eq!(slot, Some("clip"));

        let mut slot = None;
        assert_eq!(park_or_pass(false, &mut slot, "clip"), Some("clip"));
        assert_eq!(slot, None);
    }

    #[test]
    fn test_record_toggle_locked_only_while_transcribing() {
        assert!(!record_toggle_locked(None));
        assert!(!record_toggle_locked(Some(PendingKind::Awaiting)));
        assert!(record_toggle_locked(Some(PendingKind::Decoding)));
    }

    #[test]
    fn test_reset_blocked_while_busy_or_recording() {
        assert!(!reset_blocked(false, false));
        assert!(reset_blocked(true, false));
        assert!(reset_blocked(false, true));
        assert!(reset_blocked(true, true));
    }
}
