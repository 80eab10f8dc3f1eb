use std::{collections::HashMap, sync::LazyLock};

use jiff::{SignedDuration, Timestamp};
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use types::{AuthUser, Error, NewUser, Result, Role, UserChanges, UserDirectory};
use url::Url;
use uuid::Uuid;

use crate::CONFIG;

/// How many accounts to ask for per admin listing page.
const LIST_PAGE_SIZE: usize = 1000;

pub static AUTH_CLIENT: LazyLock<GoTrueClient> = LazyLock::new(|| {
    GoTrueClient::new(
        CONFIG.supabase_url.clone(),
        CONFIG.anon_key.clone(),
        CONFIG.service_role_key.clone(),
    )
    .with_role_table(&CONFIG.role_table)
});

pub(crate) trait ReqwestExt {
    async fn try_send<T: DeserializeOwned>(self) -> Result<T>;

    /// Send and check the status, ignoring whatever body comes back.
    async fn try_send_empty(self) -> Result<()>;
}

impl ReqwestExt for RequestBuilder {
    async fn try_send<T: DeserializeOwned>(self) -> Result<T> {
        let response = checked(self.send().await?).await?;
        let body = response.bytes().await?;

        match serde_json::from_slice(&body) {
            Ok(r) => Ok(r),
            Err(error) => {
                tracing::debug!(?error, len = body.len(), "failed to parse response");
                Err(Error::from(error).with_status(Error::BAD_GATEWAY))
            }
        }
    }

    async fn try_send_empty(self) -> Result<()> {
        checked(self.send().await?).await?;
        Ok(())
    }
}

/// Turn a non-2xx response into an error carrying the service's own message.
async fn checked(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    tracing::warn!(status = status.as_u16(), %message, "auth service rejected request");

    let code = if status.is_client_error() {
        Error::BAD_REQUEST
    } else {
        Error::BAD_GATEWAY
    };
    Err(Error::msg(message).with_status(code))
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["msg", "message", "error_description", "error"]
        .iter()
        .find_map(|key| value.get(key)?.as_str().map(str::to_string))
}

/// A user as the auth service's admin API returns it.
#[derive(Debug, Deserialize)]
pub struct UserRecord {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: Timestamp,
    #[serde(default)]
    pub email_confirmed_at: Option<Timestamp>,
    #[serde(default)]
    pub last_sign_in_at: Option<Timestamp>,
    #[serde(default)]
    pub user_metadata: HashMap<String, Value>,
}

impl UserRecord {
    fn into_user(self, role: Role) -> AuthUser {
        let name = self
            .user_metadata
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        AuthUser {
            id: self.id,
            email: self.email.filter(|email| !email.is_empty()),
            name,
            role,
            created_at: self.created_at,
            email_confirmed_at: self.email_confirmed_at,
            last_sign_in_at: self.last_sign_in_at,
        }
    }
}

/// Tokens handed out on sign-in or refresh.
#[derive(Deserialize)]
pub struct TokenGrant {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: UserRecord,
}

impl TokenGrant {
    pub fn expiry(&self) -> Result<Timestamp> {
        match self.expires_at {
            Some(at) => Ok(Timestamp::from_second(at)?),
            None => Ok(Timestamp::now() + SignedDuration::from_secs(self.expires_in)),
        }
    }
}

#[derive(Deserialize)]
struct UserPage {
    users: Vec<UserRecord>,
}

#[derive(Deserialize)]
struct RoleRow {
    #[serde(default)]
    user_id: Option<Uuid>,
    #[serde(default)]
    role: Option<String>,
}

/// Client for the hosted auth service (GoTrue) and its REST table API.
#[derive(Clone)]
pub struct GoTrueClient {
    client: Client,
    base_url: Url,
    anon_key: SecretString,
    service_key: SecretString,
    role_table: String,
}

impl GoTrueClient {
    pub fn new(base_url: Url, anon_key: SecretString, service_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            base_url,
            anon_key,
            service_key,
            role_table: "users".into(),
        }
    }

    pub fn with_role_table(mut self, table: &str) -> Self {
        self.role_table = table.to_string();
        self
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(path)?;
        Ok(self.client.request(method, url))
    }

    /// A request made on behalf of an anonymous visitor.
    fn public(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self
            .request(method, path)?
            .header("apikey", self.anon_key.expose_secret()))
    }

    /// A request made as the signed-in user.
    fn as_user(&self, method: Method, path: &str, token: &SecretString) -> Result<RequestBuilder> {
        Ok(self
            .public(method, path)?
            .bearer_auth(token.expose_secret()))
    }

    /// A request with the service role, which bypasses row-level security.
    fn admin(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self
            .request(method, path)?
            .header("apikey", self.service_key.expose_secret())
            .bearer_auth(self.service_key.expose_secret()))
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<TokenGrant> {
        self.public(Method::POST, "/auth/v1/token")?
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .try_send()
            .await
    }

    pub async fn refresh_session(&self, refresh_token: &SecretString) -> Result<TokenGrant> {
        self.public(Method::POST, "/auth/v1/token")?
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token.expose_secret() }))
            .try_send()
            .await
    }

    pub async fn sign_out(&self, access_token: &SecretString) -> Result<()> {
        self.as_user(Method::POST, "/auth/v1/logout", access_token)?
            .try_send_empty()
            .await
    }

    /// Ask the service to email a password-reset link.
    pub async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: Option<&Url>,
    ) -> Result<()> {
        let mut request = self
            .public(Method::POST, "/auth/v1/recover")?
            .json(&json!({ "email": email }));
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to.as_str())]);
        }
        request.try_send_empty().await
    }

    /// Look up a user's role in the role table.
    ///
    /// Fails to least privilege: a query error or a missing row means
    /// [`Role::Member`].
    pub async fn role_of(&self, user_id: Uuid) -> Role {
        let filter = format!("eq.{user_id}");
        let query = [("select", "role"), ("user_id", filter.as_str()), ("limit", "1")];

        match self.role_rows(&query).await {
            Ok(rows) => match rows.into_iter().next().and_then(|row| row.role) {
                Some(role) => Role::parse(&role),
                None => {
                    tracing::warn!(%user_id, "no role row for user, treating as member");
                    Role::Member
                }
            },
            Err(error) => {
                tracing::warn!(%user_id, ?error, "role lookup failed, treating as member");
                Role::Member
            }
        }
    }

    /// Every role row, keyed by user. Empty if the lookup fails.
    async fn all_roles(&self) -> HashMap<Uuid, Role> {
        match self.all_role_rows().await {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|row| Some((row.user_id?, Role::parse(row.role.as_deref()?))))
                .collect(),
            Err(error) => {
                tracing::warn!(?error, "role listing failed, treating everyone as member");
                HashMap::new()
            }
        }
    }

    /// The role table may cap a single response, so read it in pages.
    async fn all_role_rows(&self) -> Result<Vec<RoleRow>> {
        let mut rows = Vec::new();
        let limit = LIST_PAGE_SIZE.to_string();

        loop {
            let offset = rows.len().to_string();
            let query = [
                ("select", "user_id,role"),
                ("order", "user_id"),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ];
            let batch = self.role_rows(&query).await?;

            let done = batch.len() < LIST_PAGE_SIZE;
            rows.extend(batch);
            if done {
                break;
            }
        }

        Ok(rows)
    }

    async fn role_rows(&self, query: &[(&str, &str)]) -> Result<Vec<RoleRow>> {
        self.admin(Method::GET, &format!("/rest/v1/{}", self.role_table))?
            .query(query)
            .try_send()
            .await
    }

    async fn list_records(&self) -> Result<Vec<UserRecord>> {
        let mut records = Vec::new();
        let per_page = LIST_PAGE_SIZE.to_string();

        for page in 1.. {
            let batch = self
                .admin(Method::GET, "/auth/v1/admin/users")?
                .query(&[("page", page.to_string()), ("per_page", per_page.clone())])
                .try_send::<UserPage>()
                .await?
                .users;

            let done = batch.len() < LIST_PAGE_SIZE;
            records.extend(batch);
            if done {
                break;
            }
        }

        Ok(records)
    }
}

impl UserDirectory for GoTrueClient {
    async fn list_users(&self) -> Result<Vec<AuthUser>> {
        let records = self.list_records().await?;
        let roles = self.all_roles().await;

        Ok(records
            .into_iter()
            .map(|record| {
                let role = roles.get(&record.id).copied().unwrap_or_default();
                record.into_user(role)
            })
            .collect())
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<AuthUser> {
        new_user.validate()?;

        let mut body = json!({
            "email": new_user.email,
            "password": new_user.password,
            "email_confirm": true,
        });
        if let Some(name) = &new_user.name {
            body["user_metadata"] = json!({ "name": name });
        }

        let record: UserRecord = self
            .admin(Method::POST, "/auth/v1/admin/users")?
            .json(&body)
            .try_send()
            .await?;
        Ok(record.into_user(Role::Member))
    }

    async fn update_user(&self, user_id: Uuid, changes: &UserChanges) -> Result<AuthUser> {
        changes.validate()?;

        let mut body = json!({});
        if let Some(email) = &changes.email {
            body["email"] = json!(email);
        }
        if let Some(password) = &changes.password {
            body["password"] = json!(password);
        }
        if let Some(name) = &changes.name {
            body["user_metadata"] = json!({ "name": name });
        }

        let record: UserRecord = self
            .admin(Method::PUT, &format!("/auth/v1/admin/users/{user_id}"))?
            .json(&body)
            .try_send()
            .await?;
        let role = self.role_of(user_id).await;
        Ok(record.into_user(role))
    }

    async fn delete_user(&self, user_id: Uuid) -> Result<()> {
        self.admin(Method::DELETE, &format!("/auth/v1/admin/users/{user_id}"))?
            .try_send_empty()
            .await
    }
}
