//! Voice Input Component
//!
//! Records microphone audio with the MediaRecorder API. The component is
//! a two-state machine (idle / recording): starting negotiates a
//! container format and arms a UI tick plus a hard 90 second ceiling;
//! stopping - manual or forced - assembles the captured chunks into one
//! clip and hands it to the parent for transcription.

use gloo::timers::callback::{Interval, Timeout};
use gloo::utils::window;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    Blob, BlobEvent, BlobPropertyBag, MediaRecorder, MediaRecorderOptions, MediaStream,
    MediaStreamConstraints, MediaStreamTrack, RecordingState,
};
use yew::prelude::*;

use crate::config;

/// Check that the browser can capture and encode audio
fn is_capture_supported() -> bool {
    let Some(window) = web_sys::window() else {
        return false;
    };
    if window.navigator().media_devices().is_err() {
        return false;
    }
    js_sys::Reflect::get(&window, &JsValue::from_str("MediaRecorder"))
        .map(|ctor| !ctor.is_undefined() && !ctor.is_null())
        .unwrap_or(false)
}

/// First explicitly supported entry of the preference list, if any
fn negotiate_mime<F>(is_supported: F) -> Option<&'static str>
where
    F: Fn(&str) -> bool,
{
    config::MIME_PREFERENCES
        .iter()
        .copied()
        .find(|mime| is_supported(mime))
}

/// Elapsed readout, e.g. 75 seconds -> "1:15"
fn format_elapsed(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// An assembled capture, tagged with its negotiated container format
#[derive(Clone)]
pub struct RecordedClip {
    pub blob: Blob,
    pub mime_type: String,
}

/// Props for the VoiceInput component
#[derive(Properties, PartialEq)]
pub struct VoiceInputProps {
    /// Callback when recording starts or stops
    pub on_recording_change: Callback<bool>,
    /// Callback with the assembled clip once a recording ends
    pub on_clip: Callback<RecordedClip>,
    /// Callback when capture fails (unsupported browser, denied mic, ...)
    pub on_error: Callback<String>,
    /// Whether the toggle is locked (transcription round-trip outstanding)
    #[prop_or(false)]
    pub disabled: bool,
}

pub enum VoiceInputMsg {
    Toggle,
    StreamReady(MediaStream),
    Chunk(Blob),
    Tick,
    CeilingReached,
    RecorderStopped,
    Failed(String),
}

/// Everything scoped to one recording. Dropping this cancels both timers,
/// detaches the recorder callbacks and releases the hardware stream, so
/// every exit path tears down the same way.
struct ActiveRecording {
    recorder: MediaRecorder,
    stream: MediaStream,
    mime_type: Option<&'static str>,
    started_at: f64,
    chunks: Vec<Blob>,
    tick: Option<Interval>,
    ceiling: Option<Timeout>,
    _on_data: Closure<dyn FnMut(BlobEvent)>,
    _on_stop: Closure<dyn FnMut(web_sys::Event)>,
}

impl Drop for ActiveRecording {
    fn drop(&mut self) {
        self.tick.take();
        self.ceiling.take();
        self.recorder.set_ondataavailable(None);
        self.recorder.set_onstop(None);
        if self.recorder.state() == RecordingState::Recording {
            let _ = self.recorder.stop();
        }
        for track in self.stream.get_tracks().iter() {
            let track: MediaStreamTrack = track.unchecked_into();
            track.stop();
        }
    }
}

/// Microphone toggle with a live elapsed-time readout
pub struct VoiceInput {
    recording: Option<ActiveRecording>,
    elapsed_secs: u32,
}

impl Component for VoiceInput {
    type Message = VoiceInputMsg;
    type Properties = VoiceInputProps;

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            recording: None,
            elapsed_secs: 0,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            VoiceInputMsg::Toggle => {
                if ctx.props().disabled {
                    return false;
                }
                if self.recording.is_some() {
                    self.begin_stop(ctx);
                    return true;
                }

                if !is_capture_supported() {
                    ctx.props()
                        .on_error
                        .emit(config::MSG_CAPTURE_UNSUPPORTED.to_string());
                    return false;
                }

                let link = ctx.link().clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match acquire_microphone().await {
                        Ok(stream) => link.send_message(VoiceInputMsg::StreamReady(stream)),
                        Err(e) => link.send_message(VoiceInputMsg::Failed(e)),
                    }
                });
                false
            }
            VoiceInputMsg::StreamReady(stream) => {
                if self.recording.is_some() {
                    // A recording raced in; release the surplus stream.
                    release_stream(&stream);
                    return false;
                }
                match self.start_recording(ctx, stream) {
                    Ok(()) => {
                        ctx.props().on_recording_change.emit(true);
                        true
                    }
                    Err(e) => {
                        ctx.link().send_message(VoiceInputMsg::Failed(e));
                        false
                    }
                }
            }
            VoiceInputMsg::Chunk(blob) => {
                if let Some(rec) = self.recording.as_mut() {
                    rec.chunks.push(blob);
                }
                false
            }
            VoiceInputMsg::Tick => {
                if let Some(rec) = self.recording.as_ref() {
                    self.elapsed_secs = ((js_sys::Date::now() - rec.started_at) / 1000.0) as u32;
                    return true;
                }
                false
            }
            VoiceInputMsg::CeilingReached => {
                if self.recording.is_some() {
                    log::info!("Recording hit the {}ms ceiling", config::RECORDING_CEILING_MS);
                    self.begin_stop(ctx);
                    return true;
                }
                false
            }
            VoiceInputMsg::RecorderStopped => {
                let Some(rec) = self.recording.take() else {
                    return false;
                };
                let mime = rec.mime_type.unwrap_or(config::DEFAULT_MIME);
                let parts = js_sys::Array::new();
                for chunk in &rec.chunks {
                    parts.push(chunk.as_ref());
                }
                let options = BlobPropertyBag::new();
                options.set_type(mime);
                // An empty chunk list still yields a (zero-byte) clip; the
                // server is the one rejecting degenerate input.
                match Blob::new_with_blob_sequence_and_options(parts.as_ref(), &options) {
                    Ok(blob) => ctx.props().on_clip.emit(RecordedClip {
                        blob,
                        mime_type: mime.to_string(),
                    }),
                    Err(e) => {
                        log::error!("Failed to assemble audio clip: {:?}", e);
                        ctx.props()
                            .on_error
                            .emit(config::MSG_TRANSCRIBE_FAILURE.to_string());
                    }
                }
                true
            }
            VoiceInputMsg::Failed(e) => {
                log::error!("Voice capture error: {}", e);
                let was_recording = self.recording.take().is_some();
                self.elapsed_secs = 0;
                if was_recording {
                    ctx.props().on_recording_change.emit(false);
                }
                ctx.props().on_error.emit(config::MSG_MIC_DENIED.to_string());
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let is_recording = self.recording.is_some();
        let onclick = ctx.link().callback(|_| VoiceInputMsg::Toggle);

        let button_class = classes!(
            "voice-button",
            is_recording.then_some("recording"),
            ctx.props().disabled.then_some("disabled"),
        );
        let title = if is_recording {
            "Stop recording"
        } else {
            "Start voice input"
        };

        html! {
            <>
                if is_recording {
                    <span class="recording-elapsed">{ format_elapsed(self.elapsed_secs) }</span>
                }
                <button
                    type="button"
                    class={button_class}
                    onclick={onclick}
                    disabled={ctx.props().disabled}
                    title={title}
                >
                    if is_recording {
                        <span class="voice-icon recording-icon">{ "\u{23F9}" }</span>
                    } else {
                        <span class="voice-icon mic-icon">{ "\u{1F3A4}" }</span>
                    }
                </button>
            </>
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        // Tears down timers, callbacks and the stream in one go
        self.recording = None;
    }
}

impl VoiceInput {
    /// Wire up the recorder, its callbacks and both timers, then start
    fn start_recording(&mut self, ctx: &Context<Self>, stream: MediaStream) -> Result<(), String> {
        let mime_type = negotiate_mime(MediaRecorder::is_type_supported);

        let recorder = match mime_type {
            Some(mime) => {
                let options = MediaRecorderOptions::new();
                options.set_mime_type(mime);
                MediaRecorder::new_with_media_stream_and_media_recorder_options(&stream, &options)
            }
            // Nothing on the preference list is supported; let the
            // platform pick whatever default it has.
            None => MediaRecorder::new_with_media_stream(&stream),
        }
        .map_err(|e| {
            release_stream(&stream);
            format!("Failed to create recorder: {:?}", e)
        })?;

        let link = ctx.link().clone();
        let on_data = Closure::wrap(Box::new(move |event: BlobEvent| {
            if let Some(blob) = event.data() {
                link.send_message(VoiceInputMsg::Chunk(blob));
            }
        }) as Box<dyn FnMut(BlobEvent)>);
        recorder.set_ondataavailable(Some(on_data.as_ref().unchecked_ref()));

        let link = ctx.link().clone();
        let on_stop = Closure::wrap(Box::new(move |_: web_sys::Event| {
            link.send_message(VoiceInputMsg::RecorderStopped);
        }) as Box<dyn FnMut(web_sys::Event)>);
        recorder.set_onstop(Some(on_stop.as_ref().unchecked_ref()));

        recorder.start().map_err(|e| {
            release_stream(&stream);
            format!("Failed to start recorder: {:?}", e)
        })?;

        let tick_link = ctx.link().clone();
        let tick = Interval::new(config::RECORDING_TICK_MS, move || {
            tick_link.send_message(VoiceInputMsg::Tick);
        });
        let ceiling_link = ctx.link().clone();
        let ceiling = Timeout::new(config::RECORDING_CEILING_MS, move || {
            ceiling_link.send_message(VoiceInputMsg::CeilingReached);
        });

        self.elapsed_secs = 0;
        self.recording = Some(ActiveRecording {
            recorder,
            stream,
            mime_type,
            started_at: js_sys::Date::now(),
            chunks: Vec::new(),
            tick: Some(tick),
            ceiling: Some(ceiling),
            _on_data: on_data,
            _on_stop: on_stop,
        });
        Ok(())
    }

    /// Shared stop path for the manual toggle and the ceiling timer.
    /// The session itself lives on until the recorder's stop event has
    /// flushed the final data chunk.
    fn begin_stop(&mut self, ctx: &Context<Self>) {
        if let Some(rec) = self.recording.as_mut() {
            rec.tick.take();
            rec.ceiling.take();
            if let Err(e) = rec.recorder.stop() {
                log::warn!("Recorder stop failed: {:?}", e);
                ctx.link().send_message(VoiceInputMsg::RecorderStopped);
            }
        }
        self.elapsed_secs = 0;
        ctx.props().on_recording_change.emit(false);
    }
}

/// Request a live microphone stream
async fn acquire_microphone() -> Result<MediaStream, String> {
    let navigator = window().navigator();
    let media_devices = navigator
        .media_devices()
        .map_err(|_| "Failed to get media devices".to_string())?;

    let constraints = MediaStreamConstraints::new();
    constraints.set_audio(&JsValue::TRUE);
    constraints.set_video(&JsValue::FALSE);

    let promise = media_devices
        .get_user_media_with_constraints(&constraints)
        .map_err(|_| "Failed to request microphone access".to_string())?;

    JsFuture::from(promise)
        .await
        .map_err(|e| format!("Microphone access denied: {:?}", e))?
        .dyn_into()
        .map_err(|_| "Invalid media stream".to_string())
}

fn release_stream(stream: &MediaStream) {
    for track in stream.get_tracks().iter() {
        let track: MediaStreamTrack = track.unchecked_into();
        track.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negotiation_takes_first_supported() {
        let mime = negotiate_mime(|m| m == "audio/webm" || m == "audio/mp4");
        assert_eq!(mime, Some("audio/webm"));
    }

    #[test]
    fn test_negotiation_respects_preference_order() {
        // Everything supported: the opus/webm entry wins
        let mime = negotiate_mime(|_| true);
        assert_eq!(mime, Some("audio/webm;codecs=opus"));
    }

    #[test]
    fn test_negotiation_yields_none_when_unsupported() {
        assert_eq!(negotiate_mime(|_| false), None);
    }

    #[test]
    fn test_elapsed_formatting() {
        assert_eq!(format_elapsed(0), "0:00");
        assert_eq!(format_elapsed(9), "0:09");
        assert_eq!(format_elapsed(75), "1:15");
        assert_eq!(format_elapsed(90), "1:30");
    }
}
