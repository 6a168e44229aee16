mod chat_view;
pub mod reply_options;
mod transcript;
mod voice_input;

pub use chat_view::ChatView;
