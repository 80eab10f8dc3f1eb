use dioxus::prelude::*;

mod errors;
mod session;
mod views;

use session::{SessionProvider, use_session};
use types::access::{self, Access, Area};
use views::{AdminDashboard, Dashboard, SignIn};

#[derive(Debug, Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[route("/?:notice&:info")]
    SignIn { notice: Option<String>, info: Option<String> },
    #[layout(SessionGate)]
        #[route("/dashboard")]
        Dashboard {},
        #[route("/admin")]
        AdminDashboard {},
}

impl Route {
    pub fn sign_in() -> Self {
        Route::SignIn {
            notice: None,
            info: None,
        }
    }

    /// Which access tier the page sits in.
    pub fn area(&self) -> Area {
        match self {
            Route::SignIn { .. } => Area::Public,
            Route::Dashboard {} => Area::Member,
            Route::AdminDashboard {} => Area::Admin,
        }
    }
}

fn main() {
    #[cfg(feature = "server")]
    {
        server::init_tracing();
        dioxus::serve(|| async move {
            let routes = server::init().await?;

            Ok(dioxus::server::router(App).merge(routes))
        });
    }

    #[cfg(all(feature = "web", not(feature = "server")))]
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Title { "TSVGlobal HRMS" }
        document::Link { rel: "icon", href: asset!("/assets/favicon.svg") }
        document::Link { rel: "stylesheet", href: asset!("/assets/main.css") }

        SuspenseBoundary {
            fallback: |_| rsx! { div { class: "loading", "Loading..." } },
            SessionProvider {
                Router::<Route> {}
            }
        }
    }
}

#[component]
fn NavLink(to: Route, children: Element) -> Element {
    let current_route: Route = use_route();
    let is_active = current_route == to;

    rsx! {
        Link {
            to,
            class: if is_active { "active" },
            {children}
        }
    }
}

/// Layout for every page that needs a session; redirects everyone else.
#[component]
fn SessionGate() -> Element {
    let session = use_session();
    let route: Route = use_route();
    let snapshot = session.snapshot();

    match access::decide(route.area(), &snapshot) {
        Access::Render => {}
        Access::Pending => {
            return rsx! {
                div { class: "loading", "Loading..." }
            };
        }
        Access::RedirectToSignIn => {
            navigator().replace(Route::sign_in());
            return rsx! {
                div { class: "loading", "Redirecting to sign in..." }
            };
        }
        Access::RedirectToDashboard => {
            navigator().replace(Route::Dashboard {});
            return rsx! {
                div { class: "loading", "Redirecting..." }
            };
        }
    }

    let Some(user) = snapshot.session else {
        return rsx! {};
    };
    let email = user.email_or_unknown().to_string();
    let initial = email
        .chars()
        .next()
        .unwrap_or('?')
        .to_uppercase()
        .to_string();

    rsx! {
        div { class: "app-layout",
            aside { class: "sidebar",
                div { class: "sidebar-header",
                    span { class: "sidebar-logo", "TSVGlobal HRMS" }
                }
                nav { class: "sidebar-nav",
                    NavLink { to: Route::Dashboard {}, "Dashboard" }
                    if user.is_admin() {
                        NavLink { to: Route::AdminDashboard {}, "Admin Dashboard" }
                    }
                }
                div { class: "sidebar-footer",
                    div { class: "sidebar-user",
                        div { class: "sidebar-avatar", "{initial}" }
                        div { class: "sidebar-user-info",
                            div { class: "sidebar-user-name", "{email}" }
                            div { class: "sidebar-user-role", "{user.role.label()}" }
                        }
                    }
                    a {
                        href: "/auth/sign-out",
                        rel: "external",
                        class: "sidebar-logout",
                        onclick: move |_| session.sign_out(),
                        "Sign out"
                    }
                }
            }
            main { class: "main-content",
                Outlet::<Route> {}
            }
        }
    }
}
