use axum::{
    Form, Router,
    http::{HeaderMap, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use cookie::{Cookie, SameSite};
use serde::Deserialize;
use types::{Error, Result, SESSION_COOKIE_NAME};

use crate::{AUTH_CLIENT, CONFIG, session_token, storage::Session};

const SIGN_IN_FAILED: &str = "Sign-in failed, please try again";

/// Query keys the sign-in page reads: `notice` for failures, `info` otherwise.
const NOTICE: &str = "notice";
const INFO: &str = "info";

pub fn auth_router() -> Router {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/recover", post(recover))
        .route("/auth/sign-out", get(sign_out))
}

#[derive(Deserialize)]
struct SignInForm {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RecoverForm {
    email: String,
}

async fn sign_in(Form(form): Form<SignInForm>) -> Response {
    match sign_in_inner(form).await {
        Ok(cookie) => (
            AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
            Redirect::to("/dashboard"),
        )
            .into_response(),
        Err(error) => {
            tracing::info!(?error, "sign-in failed");
            notice_redirect(NOTICE, &user_message(&error, SIGN_IN_FAILED)).into_response()
        }
    }
}

async fn sign_in_inner(form: SignInForm) -> Result<Cookie<'static>> {
    let grant = AUTH_CLIENT
        .sign_in_with_password(form.email.trim(), &form.password)
        .await?;

    let session = Session::create(grant).await?;
    tracing::info!(user_id = %session.user_id(), "signed in");

    Ok(session_cookie(session.as_token()?, CONFIG.secure_cookies))
}

async fn recover(Form(form): Form<RecoverForm>) -> Redirect {
    let result = AUTH_CLIENT
        .reset_password_for_email(form.email.trim(), CONFIG.reset_redirect_url.as_ref())
        .await;

    match result {
        Ok(()) => notice_redirect(INFO, "Password reset email sent!"),
        Err(error) => {
            tracing::info!(?error, "password reset request failed");
            notice_redirect(NOTICE, &user_message(&error, "Could not send the reset email"))
        }
    }
}

async fn sign_out(headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = session_token(&headers)
        && let Ok(session) = Session::find_token(&token).await
    {
        // Revoking upstream is best effort; the local session goes regardless.
        if let Err(error) = AUTH_CLIENT.sign_out(session.access_token()).await {
            tracing::warn!(?error, "failed to revoke token upstream");
        }
        if let Err(error) = session.delete().await {
            tracing::error!(?error, "failed to delete session");
        }
        tracing::info!(user_id = %session.user_id(), "signed out");
    }

    let cookie = Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::ZERO)
        .build();

    (
        AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
        Redirect::to("/"),
    )
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Only client errors carry a message worth showing; the rest are logged.
fn user_message(error: &Error, fallback: &str) -> String {
    if error.status() == Error::BAD_REQUEST {
        error.to_string()
    } else {
        fallback.to_string()
    }
}

fn notice_redirect(key: &str, message: &str) -> Redirect {
    Redirect::to(&notice_location(key, message))
}

fn notice_location(key: &str, message: &str) -> String {
    // `byte_serialize` writes spaces as `+` and a literal `+` as `%2B`.
    let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
    format!("/?{key}={}", encoded.replace('+', "%20"))
}
