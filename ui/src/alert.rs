use dioxus::prelude::*;
use types::roster::{Notice, Tone};

/// A dismissible message, e.g. the result of the last admin action.
#[component]
pub fn Alert(notice: Notice, on_dismiss: EventHandler<()>) -> Element {
    let class = match notice.tone {
        Tone::Success => "alert alert-success",
        Tone::Failure => "alert alert-error",
    };

    rsx! {
        div { class, role: "alert",
            span { class: "alert-text", "{notice.text}" }
            button {
                class: "alert-close",
                title: "Dismiss",
                onclick: move |_| on_dismiss.call(()),
                "×"
            }
        }
    }
}
