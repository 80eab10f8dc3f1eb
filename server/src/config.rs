use std::{path::PathBuf, sync::LazyLock};

use secrecy::SecretString;
use serde::Deserialize;
use types::Result;
use url::Url;

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| match Config::load() {
    Ok(config) => config,
    Err(error) => panic!("invalid configuration: {error:?}"),
});

/// Server settings, read from `hrms.toml` (optional) and `HRMS_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the hosted project, e.g. `https://abc.supabase.co`.
    pub supabase_url: Url,
    pub anon_key: SecretString,
    pub service_role_key: SecretString,
    /// Key for signing session cookies.
    pub signing_secret: SecretString,
    /// SQLCipher key for the local session database.
    pub db_secret: SecretString,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Where password-reset emails should send the user back to.
    #[serde(default)]
    pub reset_redirect_url: Option<Url>,
    #[serde(default = "default_role_table")]
    pub role_table: String,
    #[serde(default = "default_secure_cookies")]
    pub secure_cookies: bool,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_role_table() -> String {
    "users".into()
}

fn default_secure_cookies() -> bool {
    true
}

impl Config {
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("hrms").required(false))
            .add_source(config::Environment::with_prefix("HRMS"));

        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        Ok(builder.build()?.try_deserialize()?)
    }
}
