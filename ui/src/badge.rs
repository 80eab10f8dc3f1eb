use dioxus::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeTone {
    Success,
    Danger,
    Neutral,
}

#[component]
pub fn Badge(tone: BadgeTone, children: Element) -> Element {
    let class = match tone {
        BadgeTone::Success => "badge badge-success",
        BadgeTone::Danger => "badge badge-danger",
        BadgeTone::Neutral => "badge",
    };

    rsx! {
        span { class, {children} }
    }
}
