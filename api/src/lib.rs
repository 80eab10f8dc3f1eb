use dioxus::prelude::*;
use types::{AuthUser, NewUser, SessionInfo, UserChanges};
use uuid::Uuid;

/// The signed-in user, or `None` for anonymous visitors.
///
/// Failures other than a missing or rejected session are returned as errors,
/// so an outage is never mistaken for a sign-out.
#[post("/api/session")]
pub async fn current_session() -> ServerFnResult<Option<SessionInfo>> {
    match server::current_session().await {
        Ok(session) => Ok(Some(server::describe_session(&session).await)),
        Err(error) if error.is_unauthorized() => {
            tracing::debug!(?error, "no active session");
            Ok(None)
        }
        Err(error) => {
            tracing::warn!(?error, "could not check session");
            Err(error.into())
        }
    }
}

#[post("/api/users")]
pub async fn list_users() -> ServerFnResult<Vec<AuthUser>> {
    use types::UserDirectory;

    server::require_admin_session().await?;
    Ok(server::AUTH_CLIENT.list_users().await?)
}

#[post("/api/users/create")]
pub async fn create_user(new_user: NewUser) -> ServerFnResult<AuthUser> {
    use types::UserDirectory;

    let admin = server::require_admin_session().await?;
    let created = server::AUTH_CLIENT.create_user(&new_user).await?;
    tracing::info!(by = %admin.user_id, user_id = %created.id, "created user");
    Ok(created)
}

#[post("/api/users/update")]
pub async fn update_user(user_id: Uuid, changes: UserChanges) -> ServerFnResult<AuthUser> {
    use types::UserDirectory;

    let admin = server::require_admin_session().await?;
    let updated = server::AUTH_CLIENT.update_user(user_id, &changes).await?;
    tracing::info!(
        by = %admin.user_id,
        %user_id,
        email = changes.email.is_some(),
        password = changes.password.is_some(),
        name = changes.name.is_some(),
        "updated user"
    );
    Ok(updated)
}

#[post("/api/users/delete")]
pub async fn delete_user(user_id: Uuid) -> ServerFnResult<()> {
    use types::UserDirectory;

    let admin = server::require_admin_session().await?;
    server::AUTH_CLIENT.delete_user(user_id).await?;
    tracing::info!(by = %admin.user_id, %user_id, "deleted user");
    Ok(())
}
