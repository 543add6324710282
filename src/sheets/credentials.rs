//! Google OAuth2 credentials loaded from a JSON key file.
//!
//! Two key file types are understood:
//! - `service_account`: an RS256-signed JWT is exchanged for an access token
//!   (JWT-bearer grant).
//! - `authorized_user`: the stored refresh token is exchanged for an access
//!   token (refresh-token grant).

use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::Client;
use ring::signature::RsaKeyPair;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{MirrorError, Result};

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_SKEW_SECS: i64 = 60;

const JWT_LIFETIME_SECS: i64 = 3600;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    ServiceAccount(ServiceAccount),
    AuthorizedUser(AuthorizedUser),
}

#[derive(Deserialize)]
pub struct ServiceAccount {
    pub client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    token_uri: Option<String>,
}

#[derive(Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    client_secret: String,
    refresh_token: String,
}

#[derive(Serialize)]
struct JwtHeader<'a> {
    alg: &'static str,
    typ: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<&'a str>,
}

#[derive(Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// A bearer token and the instant it stops being valid.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// True if the token is expired or will be within the refresh skew.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_SKEW_SECS) >= self.expires_at
    }
}

impl Credentials {
    pub fn try_from_str(input: &str) -> Result<Self> {
        serde_json::from_str(input)
            .map_err(|e| MirrorError::Sink(format!("Failed to parse credentials file: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            MirrorError::Sink(format!(
                "Failed to read credentials file {}: {e}",
                path.display()
            ))
        })?;
        Self::try_from_str(&contents)
    }

    /// Exchange these credentials for an access token.
    ///
    /// `default_token_uri` is used for `authorized_user` keys and for
    /// service account keys that do not name their own `token_uri`.
    pub fn fetch_access_token(
        &self,
        client: &Client,
        scope: &str,
        default_token_uri: &str,
    ) -> Result<AccessToken> {
        match self {
            Credentials::ServiceAccount(sa) => {
                let token_uri = sa.token_uri.as_deref().unwrap_or(default_token_uri);
                let jwt = sa.signed_jwt(scope, token_uri, Utc::now())?;
                let params = [("grant_type", JWT_BEARER_GRANT), ("assertion", jwt.as_str())];
                request_token(client, token_uri, &params)
            }
            Credentials::AuthorizedUser(user) => {
                let params = [
                    ("grant_type", "refresh_token"),
                    ("client_id", user.client_id.as_str()),
                    ("client_secret", user.client_secret.as_str()),
                    ("refresh_token", user.refresh_token.as_str()),
                ];
                request_token(client, default_token_uri, &params)
            }
        }
    }
}

impl ServiceAccount {
    /// Build the signed JWT assertion for the token exchange.
    pub fn signed_jwt(&self, scope: &str, audience: &str, now: DateTime<Utc>) -> Result<String> {
        let iat = now.timestamp();
        let claims = JwtClaims {
            iss: &self.client_email,
            scope,
            aud: audience,
            iat,
            exp: iat + JWT_LIFETIME_SECS,
        };
        let header = JwtHeader {
            alg: "RS256",
            typ: "JWT",
            kid: self.private_key_id.as_deref(),
        };

        let header_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let claims_b64 = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{header_b64}.{claims_b64}");

        let key_pair = self.key_pair()?;
        let mut signature = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(
                &ring::signature::RSA_PKCS1_SHA256,
                &ring::rand::SystemRandom::new(),
                signing_input.as_bytes(),
                &mut signature,
            )
            .map_err(|_| MirrorError::Sink("Failed to sign JWT".into()))?;

        Ok(format!(
            "{signing_input}.{}",
            BASE64_URL_SAFE_NO_PAD.encode(&signature)
        ))
    }

    fn key_pair(&self) -> Result<RsaKeyPair> {
        let mut reader = std::io::Cursor::new(self.private_key.as_bytes());
        let item = rustls_pemfile::read_one(&mut reader)
            .map_err(|e| MirrorError::Sink(format!("Invalid PEM private key: {e}")))?;
        match item {
            Some(rustls_pemfile::Item::Pkcs8Key(der)) => {
                RsaKeyPair::from_pkcs8(der.secret_pkcs8_der())
                    .map_err(|e| MirrorError::Sink(format!("Rejected PKCS#8 private key: {e}")))
            }
            Some(rustls_pemfile::Item::Pkcs1Key(der)) => {
                RsaKeyPair::from_der(der.secret_pkcs1_der())
                    .map_err(|e| MirrorError::Sink(format!("Rejected PKCS#1 private key: {e}")))
            }
            _ => Err(MirrorError::Sink("No RSA private key in credentials".into())),
        }
    }
}

fn request_token(
    client: &Client,
    token_uri: &str,
    params: &[(&str, &str)],
) -> Result<AccessToken> {
    let resp = client.post(token_uri).form(params).send()?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(MirrorError::Sink(format!(
            "Token endpoint returned {status}: {body}"
        )));
    }

    let tok: TokenResponse = resp.json()?;
    let expires_at = Some(tok.expires_in)
        .filter(|secs| *secs > 0)
        .and_then(Duration::try_seconds)
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .ok_or_else(|| {
            MirrorError::Sink(format!(
                "Token endpoint returned invalid expires_in: {}",
                tok.expires_in
            ))
        })?;
    Ok(AccessToken {
        token: tok.access_token,
        expires_at,
    })
}
