use std::path::PathBuf;
use std::time::Duration;

pub const API_URL: &str = "https://api.apromstal.kz/api/products/";
pub const PRODUCT_BASE_URL: &str = "https://apromstal.kz/products/";

pub const LOCAL_JSON_FILE: &str = "products.json";
pub const LAST_URL_FILE: &str = "last_url.txt";
pub const CREDENTIALS_FILE: &str = "credintails.json";

pub const SPREADSHEET_ID: &str = "1y_IUnjRHsdEKMDVOYBAFFEAJmzNa9_DJrA_E-10dqac";
pub const SHEET_NAME: &str = "Лист1";

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const PAGE_DELAY: Duration = Duration::from_secs(10);

/// Everything a run needs, fixed at construction.
///
/// Built from the constants above by [`MirrorConfig::default`]; use
/// [`CatalogMirrorBuilder`](crate::CatalogMirrorBuilder) to override
/// individual fields.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Root of the paginated catalog, used when no checkpoint exists.
    pub api_url: String,
    /// Explicit first URL, bypassing the checkpoint file.
    pub start_url: Option<String>,
    pub mirror_path: PathBuf,
    pub checkpoint_path: PathBuf,
    pub sheets: Option<SheetsConfig>,
    pub timeout: Duration,
    pub page_delay: Duration,
}

/// Spreadsheet target and credential location.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub credentials_path: PathBuf,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Each row is this prefix followed by the product slug.
    pub row_base_url: String,
    pub api_base: String,
    /// Token endpoint for `authorized_user` credentials. Service accounts
    /// carry their own `token_uri`.
    pub token_uri: String,
    pub scope: String,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from(CREDENTIALS_FILE),
            spreadsheet_id: SPREADSHEET_ID.to_string(),
            sheet_name: SHEET_NAME.to_string(),
            row_base_url: PRODUCT_BASE_URL.to_string(),
            api_base: SHEETS_API_BASE.to_string(),
            token_uri: GOOGLE_TOKEN_URI.to_string(),
            scope: SPREADSHEETS_SCOPE.to_string(),
        }
    }
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            api_url: API_URL.to_string(),
            start_url: None,
            mirror_path: PathBuf::from(LOCAL_JSON_FILE),
            checkpoint_path: PathBuf::from(LAST_URL_FILE),
            sheets: Some(SheetsConfig::default()),
            timeout: REQUEST_TIMEOUT,
            page_delay: PAGE_DELAY,
        }
    }
}
