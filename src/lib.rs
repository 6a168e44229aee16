mod api;
mod choices;
mod components;
mod config;
mod session;
pub mod utils;

use components::ChatView;
use yew::prelude::*;

#[function_component(App)]
fn app() -> Html {
    html! { <ChatView /> }
}

#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn run_app() {
    wasm_logger::init(wasm_logger::Config::default());
    yew::Renderer::<App>::new().render();
}
