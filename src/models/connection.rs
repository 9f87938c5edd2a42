pub const DEFAULT_API_VERSION: &str = "4.1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings the HTTP client is built from, after environment overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    pub api_url: String,
    pub username: String,
    pub access_token: String,
    pub api_version: String,
    pub request_timeout_secs: u64,
    pub auto_load_directory: bool,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            username: String::new(),
            access_token: String::new(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            auto_load_directory: true,
        }
    }
}
