//! The row of suggested next inputs under the composer
//!
//! The row is a single value replaced wholesale after every assistant
//! turn - never patched in place - so stale click handlers can't survive
//! a re-render. Two shapes exist: the configured quick replies, and the
//! numbered choices parsed out of the last assistant message.

use yew::prelude::*;

use crate::choices::{parse_choices, Choice};
use crate::config;

/// A configured, static suggested phrase
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuickReply {
    /// Shown on the button
    pub label: &'static str,
    /// Placed into the composer
    pub text: &'static str,
    /// Whether activating also submits immediately
    pub auto_send: bool,
}

/// What activating an option hands back to the controller
#[derive(Clone, Debug, PartialEq)]
pub struct PickedReply {
    pub text: String,
    pub auto_send: bool,
}

/// The current option row, in one of its two shapes
#[derive(Clone, Debug, PartialEq)]
pub enum OptionRow {
    Quick(Vec<QuickReply>),
    Choices(Vec<Choice>),
}

impl OptionRow {
    /// The fallback row shown when no menu is on offer
    pub fn default_quick() -> Self {
        OptionRow::Quick(config::default_quick_replies())
    }
}

impl Default for OptionRow {
    fn default() -> Self {
        Self::default_quick()
    }
}

/// Selection policy, evaluated once per assistant turn: a message with a
/// parsable menu gets choice buttons, anything else gets the defaults.
pub fn options_for_reply(reply: &str) -> OptionRow {
    let choices = parse_choices(reply);
    if choices.is_empty() {
        OptionRow::default_quick()
    } else {
        OptionRow::Choices(choices)
    }
}

fn pick_from_quick(reply: &QuickReply) -> PickedReply {
    PickedReply {
        text: reply.text.to_string(),
        auto_send: reply.auto_send,
    }
}

/// Choices answer a menu, so activation always submits
fn pick_from_choice(choice: &Choice) -> PickedReply {
    PickedReply {
        text: choice.number.to_string(),
        auto_send: true,
    }
}

/// Props for the option row
#[derive(Properties, PartialEq)]
pub struct ReplyOptionsProps {
    pub row: OptionRow,
    pub disabled: bool,
    pub on_pick: Callback<PickedReply>,
}

#[function_component(ReplyOptions)]
pub fn reply_options(props: &ReplyOptionsProps) -> Html {
    let buttons: Vec<Html> = match &props.row {
        OptionRow::Quick(replies) => replies
            .iter()
            .map(|reply| {
                let picked = pick_from_quick(reply);
                let on_pick = props.on_pick.clone();
                let onclick = Callback::from(move |_| on_pick.emit(picked.clone()));
                html! {
                    <button
                        type="button"
                        class="option-button quick"
                        disabled={props.disabled}
                        {onclick}
                    >
                        { reply.label }
                    </button>
                }
            })
            .collect(),
        OptionRow::Choices(choices) => choices
            .iter()
            .map(|choice| {
                let picked = pick_from_choice(choice);
                let on_pick = props.on_pick.clone();
                let onclick = Callback::from(move |_| on_pick.emit(picked.clone()));
                html! {
                    <button
                        type="button"
                        class="option-button choice"
                        disabled={props.disabled}
                        {onclick}
                    >
                        { format!("{}) {}", choice.number, choice.label) }
                    </button>
                }
            })
            .collect(),
    };

    html! {
        <div class="reply-options">
            { for buttons }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_prefers_parsed_choices() {
        let row = options_for_reply("Pick one:\n1) A\n2) B");
        match row {
            OptionRow::Choices(choices) => {
                assert_eq!(choices.len(), 2);
                assert_eq!(choices[0].number, 1);
                assert_eq!(choices[1].label, "B");
            }
            OptionRow::Quick(_) => panic!("expected choices"),
        }
    }

    #[test]
    fn test_policy_falls_back_to_quick_defaults() {
        let row = options_for_reply("Plain prose, no menu here.");
        match row {
            OptionRow::Quick(replies) => {
                assert_eq!(replies, config::default_quick_replies());
            }
            OptionRow::Choices(_) => panic!("expected quick replies"),
        }
    }

    #[test]
    fn test_policy_is_deterministic() {
        // Re-evaluating the same turn must yield the same row, so a full
        // replace can never accumulate duplicate buttons.
        let text = "1) First\n2) Second";
        assert_eq!(options_for_reply(text), options_for_reply(text));
    }

    #[test]
    fn test_choice_activation_submits_the_bare_number() {
        let choice = Choice {
            number: 4,
            label: "Library appointments".to_string(),
        };
        let picked = pick_from_choice(&choice);
        assert_eq!(picked.text, "4");
        assert!(picked.auto_send);
    }

    #[test]
    fn test_quick_activation_honours_auto_send_flag() {
        let manual = QuickReply {
            label: "Ask",
            text: "I have a question: ",
            auto_send: false,
        };
        let picked = pick_from_quick(&manual);
        assert_eq!(picked.text, "I have a question: ");
        assert!(!picked.auto_send);
    }
}
