mod auth_routes;
mod config;
mod gotrue;
mod signed_id;
pub mod storage;
#[cfg(test)]
mod test_env;

use axum::Router;
use axum::http::{HeaderMap, header};
use dioxus::fullstack::FullstackContext;
use jiff::Timestamp;
use tracing_subscriber::{EnvFilter, fmt};
use types::{Error, Result, SESSION_COOKIE_NAME, SessionInfo};

pub use crate::config::{CONFIG, Config};
pub use crate::gotrue::{AUTH_CLIENT, GoTrueClient};
use crate::storage::Session;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,server=debug,web=debug"));

    // The dev server may already have installed one.
    let _ = fmt().with_env_filter(filter).try_init();
}

pub async fn init() -> anyhow::Result<Router> {
    tracing::info!(
        supabase_url = %CONFIG.supabase_url,
        data_dir = %CONFIG.data_dir.display(),
        "starting"
    );
    storage::migrate().await?;
    Ok(auth_routes::auth_router())
}

/// Pull our session cookie out of a `Cookie` header.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;

    cookie::Cookie::split_parse(cookie_header)
        .filter_map(|cookie| cookie.ok())
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string())
}

/// The session behind the current request, refreshed if it's about to expire.
pub async fn current_session() -> Result<Session> {
    let headers: HeaderMap = FullstackContext::extract().await?;
    session_for(&headers).await
}

pub(crate) async fn session_for(headers: &HeaderMap) -> Result<Session> {
    let token = session_token(headers).ok_or_else(|| Error::unauthorized("not signed in"))?;

    let mut session = Session::find_token(&token)
        .await
        .map_err(|error| error.context("session not found").with_status(Error::UNAUTHORIZED))?;

    if session.needs_refresh(Timestamp::now()) {
        refresh(&mut session).await?;
    }

    Ok(session)
}

async fn refresh(session: &mut Session) -> Result<()> {
    match AUTH_CLIENT.refresh_session(session.refresh_token()).await {
        Ok(grant) => {
            session.replace_tokens(grant).await?;
            tracing::debug!(user_id = %session.user_id(), "refreshed access token");
            Ok(())
        }
        // Only the auth service turning the refresh token down ends the
        // session; an outage leaves it in place for the next attempt.
        Err(error) if error.status() == Error::BAD_REQUEST => {
            tracing::info!(user_id = %session.user_id(), ?error, "refresh rejected, ending session");
            session.delete().await?;
            Err(Error::unauthorized("your session has expired, please sign in again"))
        }
        Err(error) => {
            tracing::warn!(user_id = %session.user_id(), ?error, "refresh failed, keeping session");
            Err(error
                .context("could not refresh your session")
                .with_status(Error::BAD_GATEWAY))
        }
    }
}

/// What the browser gets to see about a session.
pub async fn describe_session(session: &Session) -> SessionInfo {
    SessionInfo {
        user_id: session.user_id(),
        email: session.email().map(str::to_string),
        role: AUTH_CLIENT.role_of(session.user_id()).await,
        expires_at: session.expires_at(),
    }
}

/// Require a signed-in admin, returning their session.
pub async fn require_admin_session() -> Result<SessionInfo> {
    let session = current_session().await?;
    let info = describe_session(&session).await;

    if !info.is_admin() {
        tracing::warn!(user_id = %info.user_id, "non-admin attempted an admin action");
        return Err(Error::forbidden(format!(
            "access denied: {} is not an administrator",
            info.email_or_unknown()
        )));
    }

    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_env::{self, cookie_headers, grant};
    use axum::http::HeaderValue;
    use secrecy::ExposeSecret;
    use serde_json::json;
    use wiremock::{
        Mock, MockBuilder, ResponseTemplate,
        matchers::{body_partial_json, method, path, query_param},
    };

    /// A stored session whose access token expires in `expires_in` seconds.
    async fn stored_session(tag: &str, expires_in: i64) -> (Session, HeaderMap) {
        let session = Session::create(grant(tag, expires_in)).await.unwrap();
        let headers = cookie_headers(&session.as_token().unwrap());
        (session, headers)
    }

    fn refresh_request(tag: &str) -> MockBuilder {
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_partial_json(json!({ "refresh_token": format!("{tag}-refresh") })))
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn fresh_session_is_not_refreshed() {
        let server = test_env::auth_server().await;
        let (_, headers) = stored_session("lifecycle-fresh", 3600).await;
        let _refresh = refresh_request("lifecycle-fresh")
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount_as_scoped(server)
            .await;

        let session = session_for(&headers).await.unwrap();
        assert_eq!(session.access_token().expose_secret(), "lifecycle-fresh-access");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn expiring_session_is_refreshed_in_place() {
        let server = test_env::auth_server().await;
        let (original, headers) = stored_session("lifecycle-refresh", 10).await;
        let _refresh = refresh_request("lifecycle-refresh")
            .respond_with(
                ResponseTemplate::new(200).set_body_json(test_env::grant_json("lifecycle-renewed", 3600)),
            )
            .expect(1)
            .mount_as_scoped(server)
            .await;

        let session = session_for(&headers).await.unwrap();
        assert_eq!(session.access_token().expose_secret(), "lifecycle-renewed-access");
        assert!(!session.needs_refresh(Timestamp::now()));

        let stored = Session::find_token(&original.as_token().unwrap())
            .await
            .unwrap();
        assert_eq!(stored.refresh_token().expose_secret(), "lifecycle-renewed-refresh");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn rejected_refresh_ends_session() {
        let server = test_env::auth_server().await;
        let (original, headers) = stored_session("lifecycle-revoked", 10).await;
        let _refresh = refresh_request("lifecycle-revoked")
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid Refresh Token: Already Used",
            })))
            .mount_as_scoped(server)
            .await;

        let error = session_for(&headers).await.unwrap_err();
        assert!(error.is_unauthorized());
        assert!(Session::find_token(&original.as_token().unwrap()).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn outage_during_refresh_keeps_session() {
        let server = test_env::auth_server().await;
        let (original, headers) = stored_session("lifecycle-outage", 10).await;
        let _refresh = refresh_request("lifecycle-outage")
            .respond_with(ResponseTemplate::new(503))
            .mount_as_scoped(server)
            .await;

        let error = session_for(&headers).await.unwrap_err();
        assert_eq!(error.status(), Error::BAD_GATEWAY);

        let stored = Session::find_token(&original.as_token().unwrap()).await.unwrap();
        assert_eq!(stored.refresh_token().expose_secret(), "lifecycle-outage-refresh");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_or_forged_cookie_is_unauthorized() {
        test_env::auth_server().await;

        let error = session_for(&HeaderMap::new()).await.unwrap_err();
        assert!(error.is_unauthorized());

        let forged = cookie_headers(&format!("{}.bogus", uuid::Uuid::now_v7().simple()));
        let error = session_for(&forged).await.unwrap_err();
        assert!(error.is_unauthorized());
    }

    #[test]
    fn finds_session_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; hrms_session=abc.def; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn missing_cookie_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_token(&headers), None);
    }
}
