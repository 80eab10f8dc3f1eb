use dioxus::prelude::*;
use types::{AuthUser, MIN_PASSWORD_LEN, NewUser, UserChanges, display_time, roster::UserRoster};
use ui::{Alert, Badge, BadgeTone, Modal, Pager};

use crate::{errors, session::use_session};

/// What a finished admin action reports back to the page.
type Outcome = Result<&'static str, ServerFnError>;

#[component]
pub fn AdminDashboard() -> Element {
    let session = use_session();
    let mut roster = use_signal(UserRoster::default);
    let mut editing = use_signal(|| None::<AuthUser>);
    let mut deleting = use_signal(|| None::<AuthUser>);

    let mut refetch = move || {
        let ticket = roster.write().begin_fetch();
        spawn(async move {
            let result = api::list_users().await;
            if let Err(err) = &result
                && errors::is_unauthorized(err)
            {
                session.expire();
                return;
            }

            let result = result.map_err(|err| errors::describe(&err));
            match &result {
                Ok(users) => tracing::debug!(count = users.len(), "fetched users"),
                Err(error) => tracing::error!(%error, "failed to list users"),
            }
            roster.write().finish_fetch(ticket, result);
        });
    };

    let mut settle = move |outcome: Outcome| match outcome {
        Ok(message) => {
            roster.write().succeed(message);
            refetch();
        }
        Err(err) if errors::is_unauthorized(&err) => session.expire(),
        Err(err) => {
            let message = errors::describe(&err);
            tracing::error!(error = %message, "admin action failed");
            roster.write().fail(message);
        }
    };

    use_effect(move || {
        session.revalidate();
        refetch();
    });

    let (visible, page, page_count, loading, search, notice, total) = {
        let roster = roster.read();
        (
            roster.visible().into_iter().cloned().collect::<Vec<_>>(),
            roster.page(),
            roster.page_count(),
            roster.is_loading(),
            roster.search().to_string(),
            roster.notice().cloned(),
            roster.filtered().len(),
        )
    };

    rsx! {
        div {
            div { class: "page-header",
                div { class: "page-header-content",
                    h1 { class: "page-title", "Admin Dashboard" }
                    p { class: "page-subtitle", "Create, edit and remove user accounts." }
                }
            }

            if let Some(notice) = notice {
                Alert {
                    notice,
                    on_dismiss: move |_| roster.write().dismiss(),
                }
            }

            CreateUserCard { on_done: settle }

            div { class: "card",
                div { class: "card-header",
                    h2 { class: "card-title", "Users" }
                    input {
                        class: "form-input search-input",
                        r#type: "search",
                        placeholder: "Search by email...",
                        value: "{search}",
                        oninput: move |e| roster.write().set_search(e.value()),
                    }
                }

                if loading && visible.is_empty() {
                    div { class: "loading", "Loading users..." }
                } else if visible.is_empty() {
                    div { class: "empty-state",
                        if search.is_empty() { "No users yet." } else { "No users match your search." }
                    }
                } else {
                    div { class: "table-container",
                        table {
                            thead {
                                tr {
                                    th { "Email" }
                                    th { "Name" }
                                    th { "Role" }
                                    th { "Created At" }
                                    th { "Email Confirmed" }
                                    th { "Last Sign In" }
                                    th { "Actions" }
                                }
                            }
                            tbody {
                                for user in visible {
                                    UserRow {
                                        key: "{user.id}",
                                        user: user.clone(),
                                        on_edit: move |user| editing.set(Some(user)),
                                        on_delete: move |user| deleting.set(Some(user)),
                                    }
                                }
                            }
                        }
                    }
                    p { class: "text-muted", "{total} user(s)" }
                }

                Pager {
                    page,
                    page_count,
                    on_change: move |page| roster.write().set_page(page),
                }
            }

            if let Some(user) = editing() {
                EditUserModal {
                    user,
                    on_close: move |_| editing.set(None),
                    on_done: move |outcome: Outcome| {
                        if outcome.is_ok() {
                            editing.set(None);
                        }
                        settle(outcome);
                    },
                }
            }

            if let Some(user) = deleting() {
                DeleteUserModal {
                    user,
                    on_close: move |_| deleting.set(None),
                    on_done: move |outcome: Outcome| {
                        deleting.set(None);
                        settle(outcome);
                    },
                }
            }
        }
    }
}

fn name_cell(name: Option<&str>) -> &str {
    name.unwrap_or("N/A")
}

#[component]
fn UserRow(user: AuthUser, on_edit: EventHandler<AuthUser>, on_delete: EventHandler<AuthUser>) -> Element {
    let role_tone = if user.role.is_admin() {
        BadgeTone::Success
    } else {
        BadgeTone::Neutral
    };
    let last_sign_in = user
        .last_sign_in_at
        .map(display_time)
        .unwrap_or_else(|| "Never".to_string());
    let name = name_cell(user.name.as_deref()).to_string();
    let edit_user = user.clone();
    let delete_user = user.clone();

    rsx! {
        tr {
            td { "{user.email_or_blank()}" }
            td { "{name}" }
            td {
                Badge { tone: role_tone, "{user.role.label()}" }
            }
            td { "{display_time(user.created_at)}" }
            td {
                if user.is_confirmed() {
                    Badge { tone: BadgeTone::Success, "Yes" }
                } else {
                    Badge { tone: BadgeTone::Danger, "No" }
                }
            }
            td { "{last_sign_in}" }
            td { class: "table-actions",
                button {
                    class: "btn btn-secondary btn-sm",
                    onclick: move |_| on_edit.call(edit_user.clone()),
                    "Edit"
                }
                button {
                    class: "btn btn-danger btn-sm",
                    onclick: move |_| on_delete.call(delete_user.clone()),
                    "Delete"
                }
            }
        }
    }
}

#[component]
fn CreateUserCard(on_done: EventHandler<Outcome>) -> Element {
    let mut email = use_signal(String::new);
    let mut password = use_signal(String::new);
    let mut name = use_signal(String::new);
    let mut creating = use_signal(|| false);

    rsx! {
        div { class: "card",
            div { class: "card-header",
                h2 { class: "card-title", "Create User" }
            }
            form {
                class: "form-inline",
                onsubmit: move |e| {
                    e.prevent_default();
                    let new_user = NewUser::new(&email(), &password(), &name());
                    if let Err(error) = new_user.validate() {
                        on_done.call(Err(error.into()));
                        return;
                    }

                    spawn(async move {
                        creating.set(true);
                        match api::create_user(new_user).await {
                            Ok(created) => {
                                tracing::info!(user_id = %created.id, "created user");
                                email.set(String::new());
                                password.set(String::new());
                                name.set(String::new());
                                on_done.call(Ok("User created successfully"));
                            }
                            Err(err) => on_done.call(Err(err)),
                        }
                        creating.set(false);
                    });
                },
                div { class: "form-group",
                    label { class: "form-label", r#for: "new-email", "Email" }
                    input {
                        id: "new-email",
                        class: "form-input",
                        r#type: "email",
                        placeholder: "jane@example.com",
                        value: "{email}",
                        oninput: move |e| email.set(e.value()),
                    }
                }
                div { class: "form-group",
                    label { class: "form-label", r#for: "new-password", "Password" }
                    input {
                        id: "new-password",
                        class: "form-input",
                        r#type: "password",
                        placeholder: "At least {MIN_PASSWORD_LEN} characters",
                        autocomplete: "new-password",
                        value: "{password}",
                        oninput: move |e| password.set(e.value()),
                    }
                }
                div { class: "form-group",
                    label { class: "form-label", r#for: "new-name", "Name (optional)" }
                    input {
                        id: "new-name",
                        class: "form-input",
                        r#type: "text",
                        placeholder: "Jane Doe",
                        value: "{name}",
                        oninput: move |e| name.set(e.value()),
                    }
                }
                button {
                    r#type: "submit",
                    class: "btn btn-primary",
                    disabled: creating(),
                    if creating() { "Creating..." } else { "Create User" }
                }
            }
        }
    }
}

#[component]
fn EditUserModal(user: AuthUser, on_close: EventHandler<()>, on_done: EventHandler<Outcome>) -> Element {
    let mut email = use_signal(|| user.email_or_blank().to_string());
    let mut password = use_signal(String::new);
    let mut name = use_signal(|| user.name.clone().unwrap_or_default());
    let mut saving = use_signal(|| false);

    let user_id = user.id;
    let save = move |_| {
        let changes = UserChanges::between(&user, &email(), &password(), &name());
        if let Err(error) = changes.validate() {
            on_done.call(Err(error.into()));
            return;
        }

        spawn(async move {
            saving.set(true);
            let result = api::update_user(user_id, changes).await;
            saving.set(false);
            on_done.call(result.map(|_| "User updated successfully"));
        });
    };

    rsx! {
        Modal {
            title: "Edit User",
            busy: saving(),
            on_close,
            footer: rsx! {
                button {
                    class: "btn btn-secondary",
                    disabled: saving(),
                    onclick: move |_| on_close.call(()),
                    "Cancel"
                }
                button {
                    class: "btn btn-primary",
                    disabled: saving(),
                    onclick: save,
                    if saving() { "Saving..." } else { "Save Changes" }
                }
            },
            div { class: "form-group",
                label { class: "form-label", r#for: "edit-email", "Email" }
                input {
                    id: "edit-email",
                    class: "form-input",
                    r#type: "email",
                    value: "{email}",
                    oninput: move |e| email.set(e.value()),
                }
            }
            div { class: "form-group",
                label { class: "form-label", r#for: "edit-password", "New password" }
                input {
                    id: "edit-password",
                    class: "form-input",
                    r#type: "password",
                    placeholder: "Leave blank to keep the current password",
                    autocomplete: "new-password",
                    value: "{password}",
                    oninput: move |e| password.set(e.value()),
                }
            }
            div { class: "form-group",
                label { class: "form-label", r#for: "edit-name", "Name" }
                input {
                    id: "edit-name",
                    class: "form-input",
                    r#type: "text",
                    value: "{name}",
                    oninput: move |e| name.set(e.value()),
                }
            }
        }
    }
}

#[component]
fn DeleteUserModal(user: AuthUser, on_close: EventHandler<()>, on_done: EventHandler<Outcome>) -> Element {
    let mut deleting = use_signal(|| false);
    let user_id = user.id;

    rsx! {
        Modal {
            title: "Delete User",
            busy: deleting(),
            small: true,
            on_close,
            footer: rsx! {
                button {
                    class: "btn btn-secondary",
                    disabled: deleting(),
                    onclick: move |_| on_close.call(()),
                    "Cancel"
                }
                button {
                    class: "btn btn-danger",
                    disabled: deleting(),
                    onclick: move |_| {
                        spawn(async move {
                            deleting.set(true);
                            let result = api::delete_user(user_id).await;
                            deleting.set(false);
                            on_done.call(result.map(|()| "User deleted successfully"));
                        });
                    },
                    if deleting() { "Deleting..." } else { "Delete" }
                }
            },
            p {
                "Are you sure you want to delete "
                strong { "{user.email_or_blank()}" }
                "? This cannot be undone."
            }
        }
    }
}
