use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use types::{Error, Result};
use uuid::Uuid;

use crate::CONFIG;

type HmacSha256 = Hmac<Sha256>;

/// Session ids travel to the browser as `<uuid>.<hmac>`.
pub trait SignedId: Sized {
    fn from_token(token: &str) -> Result<Self>;
    fn as_token(&self) -> Result<String>;
}

impl SignedId for Uuid {
    fn from_token(token: &str) -> Result<Self> {
        verify(token, &CONFIG.signing_secret)
    }

    fn as_token(&self) -> Result<String> {
        sign(*self, &CONFIG.signing_secret)
    }
}

fn sign(id: Uuid, secret: &SecretString) -> Result<String> {
    let id_str = id.simple().to_string();
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())?;
    mac.update(id_str.as_bytes());
    let signature = BASE64_URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{id_str}.{signature}"))
}

fn verify(token: &str, secret: &SecretString) -> Result<Uuid> {
    let invalid = || Error::unauthorized("invalid session token");

    let (id_str, signature_b64) = token.split_once('.').ok_or_else(invalid)?;

    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())?;
    mac.update(id_str.as_bytes());
    let signature = BASE64_URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| invalid())?;
    mac.verify_slice(&signature).map_err(|_| invalid())?;

    Uuid::parse_str(id_str).map_err(|_| invalid())
}
