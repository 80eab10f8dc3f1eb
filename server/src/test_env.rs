//! Process-wide fixtures for tests that go through `CONFIG`, `AUTH_CLIENT`
//! and the session database.
//!
//! Configuration is read once per process, so every such test shares one
//! mock auth service and one scratch database. Tests keep out of each
//! other's way by tagging their tokens and emails, and mount their mocks
//! with `mount_as_scoped`.

use std::sync::LazyLock;

use axum::http::{HeaderMap, HeaderValue, header};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::OnceCell;
use types::SESSION_COOKIE_NAME;
use uuid::Uuid;
use wiremock::MockServer;

use crate::gotrue::TokenGrant;

struct TestEnv {
    server: MockServer,
    _data_dir: TempDir,
}

static ENV: LazyLock<TestEnv> = LazyLock::new(|| {
    // The mock server runs on its own thread; this runtime only drives
    // start-up.
    let server = std::thread::spawn(|| {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("test runtime")
            .block_on(MockServer::start())
    })
    .join()
    .expect("mock auth service");

    let data_dir = tempfile::tempdir().expect("scratch data dir");
    let vars = [
        ("HRMS_SUPABASE_URL", server.uri()),
        ("HRMS_ANON_KEY", "anon-key".to_string()),
        ("HRMS_SERVICE_ROLE_KEY", "service-key".to_string()),
        ("HRMS_SIGNING_SECRET", "test-signing-secret".to_string()),
        ("HRMS_DB_SECRET", "test-db-secret".to_string()),
        ("HRMS_DATA_DIR", data_dir.path().display().to_string()),
        ("HRMS_SECURE_COOKIES", "false".to_string()),
    ];
    for (key, value) in vars {
        // SAFETY: runs once, before any test has read the configuration.
        unsafe { std::env::set_var(key, value) };
    }

    TestEnv {
        server,
        _data_dir: data_dir,
    }
});

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// The mock auth service behind `AUTH_CLIENT`, with the database migrated.
pub(crate) async fn auth_server() -> &'static MockServer {
    let env = &*ENV;
    MIGRATED
        .get_or_init(|| async {
            crate::storage::migrate().await.expect("migrate test database");
        })
        .await;
    &env.server
}

/// A token response whose tokens are `<tag>-access` and `<tag>-refresh`.
pub(crate) fn grant_json(tag: &str, expires_in: i64) -> Value {
    json!({
        "access_token": format!("{tag}-access"),
        "refresh_token": format!("{tag}-refresh"),
        "token_type": "bearer",
        "expires_in": expires_in,
        "user": {
            "id": Uuid::now_v7(),
            "email": format!("{tag}@example.com"),
            "created_at": "2024-01-02T03:04:05Z",
        },
    })
}

pub(crate) fn grant(tag: &str, expires_in: i64) -> TokenGrant {
    serde_json::from_value(grant_json(tag, expires_in)).expect("token grant")
}

/// Request headers carrying `token` as our session cookie.
pub(crate) fn cookie_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let cookie = format!("{SESSION_COOKIE_NAME}={token}");
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&cookie).expect("cookie header"),
    );
    headers
}
