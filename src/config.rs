use std::{env, path::PathBuf};

pub const DEFAULT_API_URL: &str = "https://api.leadtech.solutions";
pub const DEFAULT_SESSION_PATH: &str = "data/session.json";

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    pub port: u16,
    pub api_url: String,
    pub session_path: PathBuf,
    pub currency_symbol: String,
    pub date_format: String,
    /// Treat a 401 from any data endpoint as the end of the session.
    pub logout_on_unauthorized: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            api_url: DEFAULT_API_URL.to_string(),
            session_path: PathBuf::from(DEFAULT_SESSION_PATH),
            currency_symbol: "₹".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            logout_on_unauthorized: true,
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(defaults.port);
        let api_url = lookup("ADMIN_API_URL")
            .filter(|value| !value.trim().is_empty())
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        let session_path = lookup("ADMIN_SESSION_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_path);
        let currency_symbol = lookup("ADMIN_CURRENCY_SYMBOL").unwrap_or(defaults.currency_symbol);
        let date_format = lookup("ADMIN_DATE_FORMAT")
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.date_format);
        let logout_on_unauthorized = lookup("ADMIN_LOGOUT_ON_UNAUTHORIZED")
            .map(|value| !matches!(value.trim(), "0" | "false" | "no" | "off"))
            .unwrap_or(defaults.logout_on_unauthorized);

        Self {
            port,
            api_url,
            session_path,
            currency_symbol,
            date_format,
            logout_on_unauthorized,
        }
    }
}
