use dioxus::prelude::*;
use types::display_time;
use ui::{Badge, BadgeTone};

use crate::{Route, session::use_session};

#[component]
pub fn Dashboard() -> Element {
    let session = use_session();

    use_effect(move || session.revalidate());

    let Some(user) = session.current() else {
        return rsx! {};
    };
    let tone = if user.is_admin() {
        BadgeTone::Success
    } else {
        BadgeTone::Neutral
    };

    rsx! {
        div {
            div { class: "page-header",
                h1 { class: "page-title", "Dashboard" }
                p { class: "page-subtitle", "Welcome, {user.email_or_unknown()}" }
            }
            div { class: "dashboard-grid",
                div { class: "card",
                    div { class: "card-header",
                        h2 { class: "card-title", "Your account" }
                    }
                    dl { class: "detail-list",
                        dt { "Email" }
                        dd { "{user.email_or_unknown()}" }
                        dt { "Role" }
                        dd {
                            Badge { tone, "{user.role.label()}" }
                        }
                        dt { "Session valid until" }
                        dd { "{display_time(user.expires_at)}" }
                    }
                    div { class: "card-actions",
                        a {
                            href: "/auth/sign-out",
                            rel: "external",
                            class: "btn btn-secondary",
                            onclick: move |_| session.sign_out(),
                            "Sign out"
                        }
                    }
                }
                if user.is_admin() {
                    Link {
                        to: Route::AdminDashboard {},
                        class: "dashboard-card",
                        h3 { class: "dashboard-card-title", "Manage Users" }
                        p { class: "dashboard-card-desc",
                            "Create, edit and remove accounts, and search the user directory."
                        }
                    }
                }
            }
        }
    }
}
