use jiff::{SignedDuration, Timestamp};
use jiff_sqlx::{Timestamp as SqlxTimestamp, ToSqlx};
use secrecy::{ExposeSecret, SecretString};
use types::Result;
use uuid::Uuid;

use crate::{gotrue::TokenGrant, signed_id::SignedId, storage::POOL};

/// Refresh the access token once it is this close to expiring.
const REFRESH_MARGIN: SignedDuration = SignedDuration::from_secs(60);

/// Sessions whose access token lapsed longer ago than this are purged.
pub const STALE_AFTER: SignedDuration = SignedDuration::from_hours(24 * 30);

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    user_id: Uuid,
    email: Option<String>,
    access_token: String,
    refresh_token: String,
    expires_at: SqlxTimestamp,
}

/// A signed-in browser, backed by a row in `sessions`.
///
/// The browser only ever sees the signed id; tokens stay here.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    user_id: Uuid,
    email: Option<String>,
    access_token: SecretString,
    refresh_token: SecretString,
    expires_at: Timestamp,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            email: row.email,
            access_token: row.access_token.into(),
            refresh_token: row.refresh_token.into(),
            expires_at: row.expires_at.to_jiff(),
        }
    }
}

impl Session {
    pub fn new(grant: TokenGrant) -> Result<Self> {
        let expires_at = grant.expiry()?;

        Ok(Self {
            id: Uuid::now_v7(),
            user_id: grant.user.id,
            email: grant.user.email,
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            expires_at,
        })
    }

    pub async fn create(grant: TokenGrant) -> Result<Self> {
        let session = Self::new(grant)?;
        session.insert().await?;
        Ok(session)
    }

    pub async fn find(id: Uuid) -> Result<Self> {
        let row: SessionRow = sqlx::query_as(
            r#"
            SELECT id, user_id, email, access_token, refresh_token, expires_at
            FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&*POOL)
        .await?;

        Ok(row.into())
    }

    /// Find session by signed token (cookie value).
    pub async fn find_token(token: &str) -> Result<Self> {
        let uuid = Uuid::from_token(token)?;
        Self::find(uuid).await
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &SecretString {
        &self.refresh_token
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn needs_refresh(&self, now: Timestamp) -> bool {
        now + REFRESH_MARGIN >= self.expires_at
    }

    pub fn as_token(&self) -> Result<String> {
        self.id.as_token()
    }

    /// Swap in freshly issued tokens, keeping the same session id.
    pub async fn replace_tokens(&mut self, grant: TokenGrant) -> Result<()> {
        self.expires_at = grant.expiry()?;
        self.access_token = grant.access_token;
        self.refresh_token = grant.refresh_token;
        self.email = grant.user.email;

        let expires_at = self.expires_at.to_sqlx();
        sqlx::query(
            r#"
            UPDATE sessions
            SET access_token = ?, refresh_token = ?, email = ?, expires_at = ?
            WHERE id = ?
            "#,
        )
        .bind(self.access_token.expose_secret())
        .bind(self.refresh_token.expose_secret())
        .bind(&self.email)
        .bind(expires_at)
        .bind(self.id)
        .execute(&*POOL)
        .await?;

        Ok(())
    }

    pub async fn insert(&self) -> Result<()> {
        let expires_at = self.expires_at.to_sqlx();
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, email, access_token, refresh_token, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(&self.email)
        .bind(self.access_token.expose_secret())
        .bind(self.refresh_token.expose_secret())
        .bind(expires_at)
        .execute(&*POOL)
        .await?;

        Ok(())
    }

    /// Drop sessions nobody has used for [`STALE_AFTER`]. Returns how many went.
    pub async fn purge_stale(now: Timestamp) -> Result<u64> {
        let cutoff = (now - STALE_AFTER).to_sqlx();
        let result = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE expires_at < ?
            "#,
        )
        .bind(cutoff)
        .execute(&*POOL)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete(&self) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE id = ?
            "#,
        )
        .bind(self.id)
        .execute(&*POOL)
        .await?;

        Ok(())
    }
}
