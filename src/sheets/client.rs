use chrono::Utc;
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::credentials::{AccessToken, Credentials};
use crate::catalog::USER_AGENT;
use crate::config::SheetsConfig;
use crate::error::{MirrorError, Result};

/// Minimal Google Sheets v4 client: authorize, then append rows.
///
/// Credentials are read from disk on first use and the access token is
/// cached until it is about to expire.
pub struct SheetsClient {
    config: SheetsConfig,
    timeout: Duration,
    http: Option<Client>,
    credentials: Option<Credentials>,
    token: Option<AccessToken>,
}

impl SheetsClient {
    pub fn new(config: SheetsConfig, timeout: Duration) -> Self {
        Self {
            config,
            timeout,
            http: None,
            credentials: None,
            token: None,
        }
    }

    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }

    fn http(&mut self) -> Result<Client> {
        let client = match self.http.take() {
            Some(client) => client,
            None => Client::builder()
                .timeout(self.timeout)
                .user_agent(USER_AGENT)
                .build()?,
        };
        // reqwest clients are reference-counted handles
        self.http = Some(client.clone());
        Ok(client)
    }

    /// Return a valid bearer token, loading credentials and refreshing the
    /// token as needed.
    pub fn access_token(&mut self) -> Result<String> {
        if let Some(token) = &self.token {
            if !token.is_expired(Utc::now()) {
                return Ok(token.token.clone());
            }
            debug!("Access token expired, refreshing");
        }

        if self.credentials.is_none() {
            self.credentials = Some(Credentials::from_file(&self.config.credentials_path)?);
        }
        let client = self.http()?;
        let credentials = self
            .credentials
            .as_ref()
            .ok_or_else(|| MirrorError::Sink("Credentials not loaded".into()))?;

        let token =
            credentials.fetch_access_token(&client, &self.config.scope, &self.config.token_uri)?;
        debug!(expires_at = %token.expires_at, "Obtained spreadsheet access token");
        let value = token.token.clone();
        self.token = Some(token);
        Ok(value)
    }

    /// The `values:append` endpoint for the configured sheet.
    pub fn append_url(&self) -> Result<Url> {
        let base = &self.config.api_base;
        let mut url = Url::parse(base).map_err(|e| {
            MirrorError::InvalidArgument(format!("Invalid Sheets API base '{base}': {e}"))
        })?;
        let range = format!("{}:append", quote_sheet_name(&self.config.sheet_name));
        let id = self.config.spreadsheet_id.as_str();
        url.path_segments_mut()
            .map_err(|_| {
                MirrorError::InvalidArgument("Sheets API base cannot be a base URL".into())
            })?
            .pop_if_empty()
            .extend(["spreadsheets", id, "values", range.as_str()]);
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");
        Ok(url)
    }

    /// Append `rows` after the last non-empty row of the sheet.
    pub fn append_rows(&mut self, rows: &[Vec<String>]) -> Result<()> {
        let token = self.access_token()?;
        let url = self.append_url()?;
        let body = json!({
            "majorDimension": "ROWS",
            "values": rows,
        });

        let resp = self
            .http()?
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(MirrorError::Sink(format!(
                "Sheets append returned {status}: {text}"
            )));
        }

        let reply: Value = resp.json()?;
        let updated_range = reply
            .get("updates")
            .and_then(|u| u.get("updatedRange"))
            .and_then(Value::as_str)
            .unwrap_or("");
        info!(rows = rows.len(), range = updated_range, "Rows appended to spreadsheet");
        Ok(())
    }
}

/// A1-notation sheet reference: `'name'` with embedded quotes doubled.
fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}
