use std::path::PathBuf;

use reqwest::Url;

#[derive(Clone)]
pub struct AppConfig {
    pub api_base_url: Url,
    pub api_token: Option<String>,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub slow_request_timeout_secs: u64,
    pub user_agent: String,
    pub currency: String,
    pub geocoder_url: Url,
    pub cache_dir: PathBuf,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("slow_request_timeout_secs", &self.slow_request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("currency", &self.currency)
            .field("geocoder_url", &self.geocoder_url.as_str())
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}
