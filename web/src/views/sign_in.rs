use dioxus::prelude::*;

use crate::{Route, session::use_session};

#[derive(Clone, Copy, PartialEq)]
enum Tab {
    SignIn,
    ForgotPassword,
}

#[component]
pub fn SignIn(notice: Option<String>, info: Option<String>) -> Element {
    let session = use_session();
    let mut tab = use_signal(|| Tab::SignIn);

    // Already signed in: skip the form.
    if let Some(current) = session.current() {
        return rsx! {
            div { class: "login-page",
                div { class: "login-card",
                    div { class: "login-header",
                        h1 { class: "login-title", "TSVGlobal HRMS" }
                        p { class: "login-subtitle", "Signed in as {current.email_or_unknown()}" }
                    }
                    Link {
                        to: Route::Dashboard {},
                        class: "btn btn-primary login-btn",
                        "Continue to dashboard"
                    }
                }
            }
        };
    }

    rsx! {
        div { class: "login-page",
            div { class: "login-card",
                div { class: "login-header",
                    h1 { class: "login-title", "TSVGlobal HRMS" }
                    p { class: "login-subtitle", "Sign in to your account" }
                }

                if let Some(text) = notice.filter(|text| !text.is_empty()) {
                    div { class: "alert alert-error", role: "alert", "{text}" }
                }
                if let Some(text) = info.filter(|text| !text.is_empty()) {
                    div { class: "alert alert-success", role: "status", "{text}" }
                }

                div { class: "tabs",
                    button {
                        r#type: "button",
                        class: if tab() == Tab::SignIn { "tab active" } else { "tab" },
                        onclick: move |_| tab.set(Tab::SignIn),
                        "Sign In"
                    }
                    button {
                        r#type: "button",
                        class: if tab() == Tab::ForgotPassword { "tab active" } else { "tab" },
                        onclick: move |_| tab.set(Tab::ForgotPassword),
                        "Forgot Password"
                    }
                }

                {
                    match tab() {
                        Tab::SignIn => rsx! {
                            form {
                                action: "/auth/sign-in",
                                method: "post",
                                div { class: "form-group",
                                    label { class: "form-label", r#for: "email", "Email" }
                                    input {
                                        id: "email",
                                        name: "email",
                                        class: "form-input",
                                        r#type: "email",
                                        placeholder: "you@example.com",
                                        autocomplete: "email",
                                        required: true,
                                    }
                                }
                                div { class: "form-group",
                                    label { class: "form-label", r#for: "password", "Password" }
                                    input {
                                        id: "password",
                                        name: "password",
                                        class: "form-input",
                                        r#type: "password",
                                        autocomplete: "current-password",
                                        required: true,
                                    }
                                }
                                button {
                                    r#type: "submit",
                                    class: "btn btn-primary login-btn",
                                    "Sign In"
                                }
                            }
                        },
                        Tab::ForgotPassword => rsx! {
                            form {
                                action: "/auth/recover",
                                method: "post",
                                p { class: "form-hint",
                                    "Enter your email and we'll send you a link to reset your password."
                                }
                                div { class: "form-group",
                                    label { class: "form-label", r#for: "recover-email", "Email" }
                                    input {
                                        id: "recover-email",
                                        name: "email",
                                        class: "form-input",
                                        r#type: "email",
                                        placeholder: "you@example.com",
                                        required: true,
                                    }
                                }
                                button {
                                    r#type: "submit",
                                    class: "btn btn-primary login-btn",
                                    "Send Reset Link"
                                }
                            }
                        },
                    }
                }
            }
        }
    }
}
