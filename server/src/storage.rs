use dioxus::fullstack::Lazy;
use jiff::Timestamp;
use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use types::Result;

use crate::CONFIG;
pub use session::Session;

mod session;

static POOL: Lazy<SqlitePool> = Lazy::new(|| async {
    let db_path = CONFIG.data_dir.join("db.sqlite");

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .pragma("key", CONFIG.db_secret.expose_secret())
        .create_if_missing(true);

    SqlitePool::connect_with(options).await
});

pub async fn migrate() -> Result<()> {
    std::fs::create_dir_all(&CONFIG.data_dir)?;
    sqlx::migrate!("../migrations").run(&*POOL).await?;

    let purged = Session::purge_stale(Timestamp::now()).await?;
    if purged > 0 {
        tracing::info!(purged, "removed stale sessions");
    }
    Ok(())
}
